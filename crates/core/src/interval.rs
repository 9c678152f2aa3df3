use std::{
    f64::consts::{FRAC_PI_2, PI, TAU},
    fmt,
    ops::{Add, Div, Mul, Neg, Sub},
};

use crate::{IntervalError, Scalar, Truth};

/// A closed interval `[lo, hi]` of real numbers.
///
/// Intervals are the enclosure arithmetic used to evaluate expressions over
/// boxes of states. Every operation returns an interval that contains the
/// image of its arguments; a degenerate interval (`lo == hi`) behaves like an
/// exact point.
///
/// Bounds are computed with ordinary floating-point operations and are not
/// outward rounded.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde-derive", derive(serde::Serialize, serde::Deserialize))]
pub struct Interval {
    lo: f64,
    hi: f64,
}

impl Interval {
    /// The interval containing every real number.
    pub const ENTIRE: Interval = Interval {
        lo: f64::NEG_INFINITY,
        hi: f64::INFINITY,
    };

    /// Creates an interval from its bounds.
    ///
    /// # Errors
    ///
    /// Returns an [`IntervalError`] if either bound is NaN or `lo > hi`.
    pub fn new(lo: f64, hi: f64) -> Result<Self, IntervalError> {
        if lo.is_nan() || hi.is_nan() {
            return Err(IntervalError::NaN);
        }
        if lo > hi {
            return Err(IntervalError::Inverted { lo, hi });
        }
        Ok(Self { lo, hi })
    }

    /// Creates the degenerate interval `[value, value]`.
    #[must_use]
    pub fn point(value: f64) -> Self {
        Self {
            lo: value,
            hi: value,
        }
    }

    /// Builds an interval from two values in either order.
    ///
    /// NaN propagates into the bounds and is caught by [`Scalar::is_finite`].
    fn spanning(a: f64, b: f64) -> Self {
        if a <= b {
            Self { lo: a, hi: b }
        } else if b < a {
            Self { lo: b, hi: a }
        } else {
            Self { lo: f64::NAN, hi: f64::NAN }
        }
    }

    #[must_use]
    pub fn lo(&self) -> f64 {
        self.lo
    }

    #[must_use]
    pub fn hi(&self) -> f64 {
        self.hi
    }

    #[must_use]
    pub fn midpoint(&self) -> f64 {
        if self.is_point() {
            self.lo
        } else {
            0.5 * (self.lo + self.hi)
        }
    }

    /// Half the width of the interval.
    #[must_use]
    pub fn radius(&self) -> f64 {
        0.5 * (self.hi - self.lo)
    }

    #[must_use]
    pub fn width(&self) -> f64 {
        self.hi - self.lo
    }

    #[allow(clippy::float_cmp)]
    #[must_use]
    pub fn is_point(&self) -> bool {
        self.lo == self.hi
    }

    #[must_use]
    pub fn contains(&self, value: f64) -> bool {
        self.lo <= value && value <= self.hi
    }

    /// Returns `true` if `other` lies entirely inside `self`.
    #[must_use]
    pub fn encloses(&self, other: &Interval) -> bool {
        self.lo <= other.lo && other.hi <= self.hi
    }

    /// Returns the smallest interval containing both `self` and `other`.
    #[must_use]
    pub fn hull(&self, other: &Interval) -> Interval {
        Interval {
            lo: self.lo.min(other.lo),
            hi: self.hi.max(other.hi),
        }
    }

    /// Returns the intersection, or `None` if the intervals are disjoint.
    #[must_use]
    pub fn intersection(&self, other: &Interval) -> Option<Interval> {
        let lo = self.lo.max(other.lo);
        let hi = self.hi.min(other.hi);
        (lo <= hi).then_some(Interval { lo, hi })
    }

    /// Widens the interval by `amount` on both sides.
    #[must_use]
    pub fn inflate(&self, amount: f64) -> Interval {
        Interval {
            lo: self.lo - amount,
            hi: self.hi + amount,
        }
    }

    /// Returns `true` if some `phase + 2kπ` lies in the interval.
    fn contains_phase(&self, phase: f64) -> bool {
        let k = ((self.lo - phase) / TAU).ceil();
        phase + k * TAU <= self.hi
    }
}

impl Add for Interval {
    type Output = Interval;
    fn add(self, rhs: Interval) -> Interval {
        Interval {
            lo: self.lo + rhs.lo,
            hi: self.hi + rhs.hi,
        }
    }
}

impl Sub for Interval {
    type Output = Interval;
    fn sub(self, rhs: Interval) -> Interval {
        Interval {
            lo: self.lo - rhs.hi,
            hi: self.hi - rhs.lo,
        }
    }
}

impl Mul for Interval {
    type Output = Interval;
    fn mul(self, rhs: Interval) -> Interval {
        if self.is_point() && rhs.is_point() {
            return Interval::point(self.lo * rhs.lo);
        }
        let products = [
            self.lo * rhs.lo,
            self.lo * rhs.hi,
            self.hi * rhs.lo,
            self.hi * rhs.hi,
        ];
        let lo = products.iter().copied().fold(f64::INFINITY, f64::min);
        let hi = products.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        Interval { lo, hi }
    }
}

impl Div for Interval {
    type Output = Interval;
    fn div(self, rhs: Interval) -> Interval {
        if rhs.contains(0.0) {
            return Interval::ENTIRE;
        }
        if self.is_point() && rhs.is_point() {
            return Interval::point(self.lo / rhs.lo);
        }
        self * Interval::spanning(1.0 / rhs.lo, 1.0 / rhs.hi)
    }
}

impl Neg for Interval {
    type Output = Interval;
    fn neg(self) -> Interval {
        Interval {
            lo: -self.hi,
            hi: -self.lo,
        }
    }
}

impl Scalar for Interval {
    fn constant(value: f64) -> Self {
        Interval::point(value)
    }

    fn powi(&self, n: i32) -> Self {
        if self.is_point() {
            return Interval::point(self.lo.powi(n));
        }
        if n == 0 {
            return Interval::point(1.0);
        }
        if n < 0 {
            return Interval::point(1.0) / self.powi(-n);
        }
        let a = self.lo.powi(n);
        let b = self.hi.powi(n);
        if n % 2 == 0 && self.contains(0.0) {
            Interval { lo: 0.0, hi: a.max(b) }
        } else {
            Interval::spanning(a, b)
        }
    }

    fn sin(&self) -> Self {
        if self.is_point() {
            return Interval::point(self.lo.sin());
        }
        if self.width() >= TAU {
            return Interval { lo: -1.0, hi: 1.0 };
        }
        let mut range = Interval::spanning(self.lo.sin(), self.hi.sin());
        if self.contains_phase(FRAC_PI_2) {
            range.hi = 1.0;
        }
        if self.contains_phase(-FRAC_PI_2) {
            range.lo = -1.0;
        }
        range
    }

    fn cos(&self) -> Self {
        if self.is_point() {
            return Interval::point(self.lo.cos());
        }
        if self.width() >= TAU {
            return Interval { lo: -1.0, hi: 1.0 };
        }
        let mut range = Interval::spanning(self.lo.cos(), self.hi.cos());
        if self.contains_phase(0.0) {
            range.hi = 1.0;
        }
        if self.contains_phase(PI) {
            range.lo = -1.0;
        }
        range
    }

    fn exp(&self) -> Self {
        Interval {
            lo: self.lo.exp(),
            hi: self.hi.exp(),
        }
    }

    fn sqrt(&self) -> Self {
        // A negative lower bound yields NaN, reported as non-finite.
        Interval {
            lo: self.lo.sqrt(),
            hi: self.hi.sqrt(),
        }
    }

    fn is_finite(&self) -> bool {
        self.lo.is_finite() && self.hi.is_finite()
    }

    fn leq(&self, other: &Self) -> Truth {
        if self.hi <= other.lo {
            Truth::True
        } else if self.lo > other.hi {
            Truth::False
        } else {
            Truth::Indeterminate
        }
    }
}

impl From<f64> for Interval {
    fn from(value: f64) -> Self {
        Interval::point(value)
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_point() {
            write!(f, "{{{}}}", self.lo)
        } else {
            write!(f, "[{}, {}]", self.lo, self.hi)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_relative_eq;

    fn iv(lo: f64, hi: f64) -> Interval {
        Interval::new(lo, hi).unwrap()
    }

    #[test]
    fn rejects_invalid_bounds() {
        assert_eq!(Interval::new(f64::NAN, 1.0), Err(IntervalError::NaN));
        assert!(matches!(
            Interval::new(2.0, 1.0),
            Err(IntervalError::Inverted { .. })
        ));
    }

    #[test]
    fn arithmetic_encloses_results() {
        let a = iv(1.0, 2.0);
        let b = iv(-1.0, 3.0);

        assert_eq!(a + b, iv(0.0, 5.0));
        assert_eq!(a - b, iv(-2.0, 3.0));
        assert_eq!(a * b, iv(-2.0, 6.0));
        assert_eq!(-a, iv(-2.0, -1.0));
        assert_eq!(a / iv(2.0, 4.0), iv(0.25, 1.0));
    }

    #[test]
    fn division_by_zero_is_unbounded() {
        let q = iv(1.0, 2.0) / iv(-1.0, 1.0);
        assert!(!q.is_finite());
    }

    #[test]
    fn even_powers_of_straddling_intervals_start_at_zero() {
        assert_eq!(iv(-2.0, 1.0).powi(2), iv(0.0, 4.0));
        assert_eq!(iv(-2.0, 1.0).powi(3), iv(-8.0, 1.0));
    }

    #[test]
    fn trigonometric_ranges_include_extrema() {
        let s = iv(0.0, PI).sin();
        assert_relative_eq!(s.hi(), 1.0);
        assert!(s.lo() <= 0.0 && s.lo() > -1e-12);

        let c = iv(-0.5, 0.5).cos();
        assert_relative_eq!(c.hi(), 1.0);
        assert_relative_eq!(c.lo(), 0.5_f64.cos());

        assert_eq!(iv(0.0, 7.0).sin(), iv(-1.0, 1.0));
    }

    #[test]
    fn points_stay_exact() {
        let x = Interval::point(0.3);
        assert!((x * x).is_point());
        assert_relative_eq!(x.sin().lo(), 0.3_f64.sin());
    }

    #[test]
    fn comparisons_are_three_valued() {
        assert_eq!(iv(0.0, 0.1).leq(&Interval::point(0.1)), Truth::True);
        assert_eq!(iv(0.2, 0.3).leq(&Interval::point(0.1)), Truth::False);
        assert_eq!(iv(0.0, 0.3).leq(&Interval::point(0.1)), Truth::Indeterminate);
        assert_eq!(iv(1.0, 2.0).geq(&Interval::point(1.0)), Truth::True);
    }

    #[test]
    fn hull_and_intersection() {
        let a = iv(0.0, 1.0);
        let b = iv(2.0, 3.0);
        assert_eq!(a.hull(&b), iv(0.0, 3.0));
        assert_eq!(a.intersection(&b), None);
        assert_eq!(a.intersection(&iv(0.5, 4.0)), Some(iv(0.5, 1.0)));
    }
}
