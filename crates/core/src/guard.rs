use std::{collections::BTreeSet, fmt, sync::Arc};

use crate::{EvalError, Expr, Interval, Scalar, Truth, Valuation};

/// A predicate over continuous quantities.
///
/// Guards enable transitions and, as location invariants, constrain where
/// continuous evolution may go. They are evaluated over enclosures to a
/// three-valued [`Truth`].
#[derive(Debug, Clone, PartialEq)]
pub enum Guard {
    /// Always satisfied.
    True,
    /// `lhs <= rhs`.
    Leq(Expr, Expr),
    /// `lhs >= rhs`.
    Geq(Expr, Expr),
    /// Conjunction of guards.
    And(Vec<Guard>),
}

/// Which side of zero satisfies a [`Comparison`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sense {
    /// Satisfied when the residual is `<= 0`.
    NonPositive,
    /// Satisfied when the residual is `>= 0`.
    NonNegative,
}

/// An atomic comparison `residual <= 0` or `residual >= 0`.
#[derive(Debug, Clone, PartialEq)]
pub struct Comparison {
    pub residual: Expr,
    pub sense: Sense,
}

impl Guard {
    pub fn leq(lhs: impl Into<Expr>, rhs: impl Into<Expr>) -> Self {
        Guard::Leq(lhs.into(), rhs.into())
    }

    pub fn geq(lhs: impl Into<Expr>, rhs: impl Into<Expr>) -> Self {
        Guard::Geq(lhs.into(), rhs.into())
    }

    /// Conjoins two guards, flattening nested conjunctions and dropping `True`.
    #[must_use]
    pub fn and(self, other: Guard) -> Guard {
        Guard::all([self, other])
    }

    /// Conjoins any number of guards.
    pub fn all(guards: impl IntoIterator<Item = Guard>) -> Guard {
        let mut terms = Vec::new();
        for guard in guards {
            match guard {
                Guard::True => {}
                Guard::And(inner) => terms.extend(inner),
                other => terms.push(other),
            }
        }
        match terms.len() {
            0 => Guard::True,
            1 => terms.pop().unwrap_or(Guard::True),
            _ => Guard::And(terms),
        }
    }

    /// Evaluates the guard over an interval valuation.
    ///
    /// # Errors
    ///
    /// Returns an [`EvalError`] if a side of a comparison cannot be evaluated.
    pub fn eval<V>(&self, valuation: &V) -> Result<Truth, EvalError>
    where
        V: Valuation<Interval> + ?Sized,
    {
        self.eval_with::<Interval, V>(valuation)
    }

    /// Evaluates the guard over any scalar valuation.
    ///
    /// # Errors
    ///
    /// Returns an [`EvalError`] if a side of a comparison cannot be evaluated.
    pub fn eval_with<T, V>(&self, valuation: &V) -> Result<Truth, EvalError>
    where
        T: Scalar,
        V: Valuation<T> + ?Sized,
    {
        match self {
            Guard::True => Ok(Truth::True),
            Guard::Leq(lhs, rhs) => {
                let a: T = lhs.eval(valuation)?;
                let b: T = rhs.eval(valuation)?;
                Ok(a.leq(&b))
            }
            Guard::Geq(lhs, rhs) => {
                let a: T = lhs.eval(valuation)?;
                let b: T = rhs.eval(valuation)?;
                Ok(a.geq(&b))
            }
            Guard::And(terms) => {
                let mut truth = Truth::True;
                for term in terms {
                    truth = truth.and(term.eval_with::<T, V>(valuation)?);
                    if truth.is_false() {
                        break;
                    }
                }
                Ok(truth)
            }
        }
    }

    /// Returns the atomic comparisons of the guard.
    #[must_use]
    pub fn comparisons(&self) -> Vec<Comparison> {
        match self {
            Guard::True => Vec::new(),
            Guard::Leq(lhs, rhs) => vec![Comparison {
                residual: lhs.clone() - rhs.clone(),
                sense: Sense::NonPositive,
            }],
            Guard::Geq(lhs, rhs) => vec![Comparison {
                residual: lhs.clone() - rhs.clone(),
                sense: Sense::NonNegative,
            }],
            Guard::And(terms) => terms.iter().flat_map(Guard::comparisons).collect(),
        }
    }

    /// Returns the names of all variables the guard reads.
    #[must_use]
    pub fn variables(&self) -> BTreeSet<Arc<str>> {
        match self {
            Guard::True => BTreeSet::new(),
            Guard::Leq(lhs, rhs) | Guard::Geq(lhs, rhs) => {
                let mut names = lhs.variables();
                names.extend(rhs.variables());
                names
            }
            Guard::And(terms) => terms.iter().flat_map(Guard::variables).collect(),
        }
    }

    /// Returns every expression the guard contains.
    #[must_use]
    pub fn expressions(&self) -> Vec<&Expr> {
        match self {
            Guard::True => Vec::new(),
            Guard::Leq(lhs, rhs) | Guard::Geq(lhs, rhs) => vec![lhs, rhs],
            Guard::And(terms) => terms.iter().flat_map(Guard::expressions).collect(),
        }
    }
}

impl Default for Guard {
    fn default() -> Self {
        Guard::True
    }
}

impl fmt::Display for Guard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Guard::True => f.write_str("true"),
            Guard::Leq(lhs, rhs) => write!(f, "{lhs}<={rhs}"),
            Guard::Geq(lhs, rhs) => write!(f, "{lhs}>={rhs}"),
            Guard::And(terms) => {
                for (i, term) in terms.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" && ")?;
                    }
                    write!(f, "{term}")?;
                }
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::collections::BTreeMap;

    use crate::Variable;

    fn env(x: Interval) -> BTreeMap<Arc<str>, Interval> {
        [(Arc::from("x"), x)].into()
    }

    #[test]
    fn evaluates_over_enclosures() {
        let x = Variable::new("x");
        let guard = Guard::leq(&x, 0.1);

        assert_eq!(guard.eval(&env(Interval::point(0.1))).unwrap(), Truth::True);
        assert_eq!(guard.eval(&env(Interval::point(0.2))).unwrap(), Truth::False);
        assert_eq!(
            guard.eval(&env(Interval::new(0.0, 0.2).unwrap())).unwrap(),
            Truth::Indeterminate
        );
    }

    #[test]
    fn conjunction_flattens_and_short_circuits() {
        let x = Variable::new("x");
        let guard = Guard::True
            .and(Guard::geq(&x, 0.0))
            .and(Guard::leq(&x, 1.0).and(Guard::True));

        assert!(matches!(&guard, Guard::And(terms) if terms.len() == 2));
        assert_eq!(guard.to_string(), "x>=0 && x<=1");
        assert_eq!(guard.eval(&env(Interval::point(2.0))).unwrap(), Truth::False);
        assert_eq!(Guard::all([]), Guard::True);
    }

    #[test]
    fn comparisons_expose_residuals() {
        let x = Variable::new("x");
        let comparisons = Guard::geq(&x, 1.0).comparisons();

        assert_eq!(comparisons.len(), 1);
        assert_eq!(comparisons[0].sense, Sense::NonNegative);
        assert_eq!(comparisons[0].residual.to_string(), "x-1");
    }

    #[test]
    fn point_evaluation() {
        let x = Variable::new("x");
        let values: BTreeMap<Arc<str>, f64> = [(Arc::from("x"), 0.05)].into();
        let truth = Guard::leq(&x, 0.1).eval_with::<f64, _>(&values).unwrap();
        assert_eq!(truth, Truth::True);
    }
}
