use std::{
    fmt::Debug,
    ops::{Add, Div, Mul, Neg, Sub},
};

/// The three-valued result of evaluating a predicate over an enclosure.
///
/// A predicate is `True` when it holds for every point of the enclosure,
/// `False` when it holds for none, and `Indeterminate` when the enclosure
/// straddles the predicate's boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde-derive", derive(serde::Serialize, serde::Deserialize))]
pub enum Truth {
    True,
    False,
    Indeterminate,
}

impl Truth {
    /// Kleene conjunction.
    #[must_use]
    pub fn and(self, other: Truth) -> Truth {
        match (self, other) {
            (Truth::False, _) | (_, Truth::False) => Truth::False,
            (Truth::True, Truth::True) => Truth::True,
            _ => Truth::Indeterminate,
        }
    }

    /// Returns `true` if the predicate holds everywhere.
    #[must_use]
    pub fn is_true(self) -> bool {
        self == Truth::True
    }

    /// Returns `true` if the predicate holds nowhere.
    #[must_use]
    pub fn is_false(self) -> bool {
        self == Truth::False
    }

    /// Returns `true` if the predicate may hold somewhere.
    #[must_use]
    pub fn is_possible(self) -> bool {
        self != Truth::False
    }
}

impl From<bool> for Truth {
    fn from(value: bool) -> Self {
        if value { Truth::True } else { Truth::False }
    }
}

/// A numeric type that expressions can be evaluated over.
///
/// `f64` evaluates a single concrete point exactly, while
/// [`Interval`](crate::Interval) evaluates a guaranteed enclosure of every
/// value the expression can take over a box of inputs.
pub trait Scalar:
    Clone
    + Debug
    + Send
    + Sync
    + Add<Output = Self>
    + Sub<Output = Self>
    + Mul<Output = Self>
    + Div<Output = Self>
    + Neg<Output = Self>
{
    /// Lifts a real constant into the scalar type.
    fn constant(value: f64) -> Self;

    /// Raises to an integer power.
    #[must_use]
    fn powi(&self, n: i32) -> Self;

    #[must_use]
    fn sin(&self) -> Self;

    #[must_use]
    fn cos(&self) -> Self;

    #[must_use]
    fn exp(&self) -> Self;

    #[must_use]
    fn sqrt(&self) -> Self;

    /// Returns `true` if the value (or every bound of it) is finite.
    fn is_finite(&self) -> bool;

    /// Evaluates `self <= other`.
    fn leq(&self, other: &Self) -> Truth;

    /// Evaluates `self >= other`.
    fn geq(&self, other: &Self) -> Truth {
        other.leq(self)
    }
}

impl Scalar for f64 {
    fn constant(value: f64) -> Self {
        value
    }

    fn powi(&self, n: i32) -> Self {
        f64::powi(*self, n)
    }

    fn sin(&self) -> Self {
        f64::sin(*self)
    }

    fn cos(&self) -> Self {
        f64::cos(*self)
    }

    fn exp(&self) -> Self {
        f64::exp(*self)
    }

    fn sqrt(&self) -> Self {
        f64::sqrt(*self)
    }

    fn is_finite(&self) -> bool {
        f64::is_finite(*self)
    }

    fn leq(&self, other: &Self) -> Truth {
        Truth::from(self <= other)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kleene_conjunction() {
        assert_eq!(Truth::True.and(Truth::True), Truth::True);
        assert_eq!(Truth::True.and(Truth::Indeterminate), Truth::Indeterminate);
        assert_eq!(Truth::Indeterminate.and(Truth::False), Truth::False);
        assert_eq!(Truth::False.and(Truth::True), Truth::False);
    }

    #[test]
    fn point_comparisons_are_exact() {
        assert_eq!(1.0_f64.leq(&1.0), Truth::True);
        assert_eq!(1.5_f64.leq(&1.0), Truth::False);
        assert_eq!(1.0_f64.geq(&1.5), Truth::False);
        assert!(!Truth::False.is_possible());
        assert!(Truth::Indeterminate.is_possible());
    }
}
