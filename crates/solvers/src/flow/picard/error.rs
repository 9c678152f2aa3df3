use braid_core::{EvalError, SpaceError};
use thiserror::Error;

/// Errors that can occur while computing a flow enclosure.
#[derive(Debug, Error)]
pub enum Error {
    #[error("flow duration must be finite and non-negative, got {duration}")]
    InvalidDuration { duration: f64 },

    /// No substep down to `substep` validated, `offset` into the flow step.
    #[error(
        "no a-priori enclosure found {offset} into the flow step, \
         down to substep {substep} with {iters} attempts each"
    )]
    NoEnclosure {
        offset: f64,
        substep: f64,
        iters: usize,
    },

    #[error("vector field evaluation failed")]
    Field(#[from] EvalError),

    #[error(transparent)]
    Space(#[from] SpaceError),
}
