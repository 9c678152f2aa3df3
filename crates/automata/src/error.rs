use std::sync::Arc;

use thiserror::Error;

/// A construction-time defect in an atomic automaton.
///
/// Every variant names the offending automaton. Malformed models are
/// rejected outright; there is no partial construction.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MalformedModel {
    #[error("automaton `{automaton}` has no locations")]
    NoLocations { automaton: Arc<str> },

    #[error("automaton `{automaton}` declares location `{location}` more than once")]
    DuplicateLocation {
        automaton: Arc<str>,
        location: Arc<str>,
    },

    #[error(
        "automaton `{automaton}`: `{quantity}` has more than one {kind} assignment in location `{location}`"
    )]
    DuplicateAssignment {
        automaton: Arc<str>,
        location: Arc<str>,
        quantity: Arc<str>,
        kind: &'static str,
    },

    #[error(
        "automaton `{automaton}`: `{quantity}` is both algebraic and differential in location `{location}`"
    )]
    ConflictingAssignment {
        automaton: Arc<str>,
        location: Arc<str>,
        quantity: Arc<str>,
    },

    #[error(
        "automaton `{automaton}`: `{quantity}` is differential in one location and algebraic in another"
    )]
    MixedRole {
        automaton: Arc<str>,
        quantity: Arc<str>,
    },

    #[error("automaton `{automaton}`: transition references undeclared location `{location}`")]
    UndeclaredLocation {
        automaton: Arc<str>,
        location: Arc<str>,
    },

    #[error("automaton `{automaton}`: transition references undeclared event `{event}`")]
    UndeclaredEvent {
        automaton: Arc<str>,
        event: Arc<str>,
    },

    #[error("automaton `{automaton}`: `{quantity}` is reset more than once on event `{event}`")]
    DuplicateReset {
        automaton: Arc<str>,
        event: Arc<str>,
        quantity: Arc<str>,
    },

    #[error(
        "automaton `{automaton}`: `{quantity}` names a constant that clashes with another constant or variable"
    )]
    NameClash {
        automaton: Arc<str>,
        quantity: Arc<str>,
    },

    #[error("automaton `{automaton}` appears more than once in a composition")]
    DuplicateAutomaton { automaton: Arc<str> },
}

/// Member automata that define the same quantity incompatibly.
///
/// Raised by composition (and, for algebraic loops and missing
/// definitions, when a composite location is first instantiated). Locations
/// are rendered as `automaton|location` pairs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConflictingDynamics {
    #[error("`{quantity}` is defined in both `{first}` and `{second}`")]
    SharedDefinition {
        quantity: Arc<str>,
        first: String,
        second: String,
    },

    #[error("`{quantity}` is reset by both `{first}` and `{second}` on shared event `{event}`")]
    SharedReset {
        event: Arc<str>,
        quantity: Arc<str>,
        first: Arc<str>,
        second: Arc<str>,
    },

    #[error("`{automaton}` resets `{quantity}` on `{event}`, but it is not a state variable")]
    NonStateReset {
        automaton: Arc<str>,
        event: Arc<str>,
        quantity: Arc<str>,
    },

    #[error("algebraic loop through {quantities:?} in location {location}")]
    AlgebraicLoop {
        location: String,
        quantities: Vec<Arc<str>>,
    },

    #[error("`{quantity}` has no definition in location {location}")]
    UndefinedQuantity { location: String, quantity: Arc<str> },
}

/// Errors from building or querying automata.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    #[error(transparent)]
    MalformedModel(#[from] MalformedModel),

    #[error(transparent)]
    ConflictingDynamics(#[from] ConflictingDynamics),

    #[error("no member automaton named `{automaton}`")]
    UnknownAutomaton { automaton: Arc<str> },

    #[error("automaton `{automaton}` has no location `{location}`")]
    UnknownLocation {
        automaton: Arc<str>,
        location: Arc<str>,
    },

    #[error("no location given for member automaton `{automaton}`")]
    MissingLocation { automaton: Arc<str> },

    #[error("location {location} does not belong to this composite")]
    ForeignLocation { location: String },
}
