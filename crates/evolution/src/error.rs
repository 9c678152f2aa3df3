use std::{error::Error as StdError, sync::Arc};

use braid_core::{EvalError, SpaceError};
use thiserror::Error;

/// Errors that abort an evolution.
///
/// Branch-local outcomes such as blocking or an oversized enclosure are not
/// errors; they are recorded as a branch [`Termination`](crate::Termination).
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid config: {reason}")]
    InvalidConfig { reason: &'static str },

    #[error("evolution time must be finite and non-negative, got {time}")]
    InvalidTime { time: f64 },

    #[error(transparent)]
    Automaton(#[from] braid_automata::Error),

    #[error("initial set constrains `{name}`, which is not a state variable")]
    NotAStateVariable { name: Arc<str> },

    #[error("initial set leaves `{name}` unconstrained")]
    Unconstrained { name: Arc<str> },

    #[error("initial constraints on `{name}` have an empty intersection")]
    EmptyConstraint { name: Arc<str> },

    #[error("evaluation failed in location {location}")]
    Eval {
        location: String,
        #[source]
        source: EvalError,
    },

    /// The solver failed on the flow step starting at `time`.
    #[error("flow solver failed in location {location} on the step from t={time}")]
    Solver {
        location: String,
        time: f64,
        #[source]
        source: Box<dyn StdError + Send + Sync>,
    },

    #[error("orbit exceeds {limit} branches")]
    TooManyBranches { limit: usize },

    #[error(transparent)]
    Space(#[from] SpaceError),
}

impl Error {
    pub(crate) fn eval(location: &impl ToString, source: EvalError) -> Self {
        Self::Eval {
            location: location.to_string(),
            source,
        }
    }

    pub(crate) fn solver<E: StdError + Send + Sync + 'static>(
        location: &impl ToString,
        time: f64,
        err: E,
    ) -> Self {
        Self::Solver {
            location: location.to_string(),
            time,
            source: Box::new(err),
        }
    }
}
