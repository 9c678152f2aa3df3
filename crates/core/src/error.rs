use std::sync::Arc;

use thiserror::Error;

/// Errors that can occur when evaluating an expression.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvalError {
    /// The expression reads a quantity the valuation does not bind.
    #[error("quantity `{name}` has no value")]
    Unbound { name: Arc<str> },

    /// The expression produced a non-finite value or an unbounded range.
    ///
    /// For example, a division by an interval containing zero, or the square
    /// root of a negative value.
    #[error("expression `{expr}` is not finite")]
    NonFinite { expr: String },
}

/// Error returned when constructing an invalid [`Interval`](crate::Interval).
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum IntervalError {
    #[error("interval bound is NaN")]
    NaN,

    #[error("interval lower bound {lo} exceeds upper bound {hi}")]
    Inverted { lo: f64, hi: f64 },
}

/// Errors that can occur when building an [`Enclosure`](crate::Enclosure).
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SpaceError {
    #[error("expected {expected} bounds, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("variable `{name}` is not part of the space")]
    UnknownVariable { name: Arc<str> },
}
