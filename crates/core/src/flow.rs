use crate::{Enclosure, EvalError, Scalar, Space};

/// The right-hand side of an autonomous ODE `x' = f(x)` over a [`Space`].
///
/// The evolution engine hands the active dynamics of a composite location to
/// a [`FlowSolver`] through this trait. Implementations must accept any
/// [`Scalar`], so the same field can be integrated pointwise or over
/// interval enclosures.
pub trait VectorField {
    /// The state space the field is defined on.
    fn space(&self) -> &Space;

    /// Evaluates `f(state)`, one derivative per space coordinate.
    ///
    /// # Errors
    ///
    /// Returns an [`EvalError`] if any right-hand side cannot be evaluated.
    fn derivative<T: Scalar>(&self, state: &[T]) -> Result<Vec<T>, EvalError>;
}

/// The result of advancing an enclosure by one flow step.
#[derive(Debug, Clone, PartialEq)]
pub struct FlowStep {
    /// Enclosure of the states at the end of the step.
    pub reached: Enclosure,

    /// Enclosure of every state visited during the step, endpoints included.
    pub swept: Enclosure,
}

/// A continuous-flow solver: the black-box capability that integrates the
/// active differential assignments.
///
/// The evolution engine only decides *when* and *for how long* to flow; all
/// numeric integration and enclosure arithmetic is delegated here. Solvers
/// are shared read-only across branch workers.
pub trait FlowSolver: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Advances `initial` under `field` for exactly `duration`.
    ///
    /// A zero duration returns `initial` as both the reached and swept set.
    ///
    /// # Errors
    ///
    /// Returns [`Self::Error`] if the solver cannot produce an enclosure
    /// for the requested step.
    fn step<F>(&self, field: &F, initial: &Enclosure, duration: f64) -> Result<FlowStep, Self::Error>
    where
        F: VectorField + ?Sized;
}
