use braid_core::{EvalError, SpaceError};
use thiserror::Error;

/// Errors that can occur during point integration.
#[derive(Debug, Error)]
pub enum Error {
    #[error("point integration needs a point initial set, got radius {radius}")]
    NotAPoint { radius: f64 },

    #[error("flow duration must be finite and non-negative, got {duration}")]
    InvalidDuration { duration: f64 },

    #[error("vector field evaluation failed")]
    Field(#[from] EvalError),

    #[error(transparent)]
    Space(#[from] SpaceError),
}
