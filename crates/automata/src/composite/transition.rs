use braid_core::{Guard, ResetAssignment};

use super::CompositeLocation;
use crate::{Event, EventKind, TransitionId};

/// Identifies a composite transition by its event and participating member
/// transitions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TransitionKey {
    pub event: Event,
    pub participants: Vec<(usize, TransitionId)>,
}

/// A transition of a composite automaton.
///
/// Private events have a single participant. A shared event yields one
/// composite transition per combination of participant transitions; its
/// guard is the conjunction and its reset the union of theirs. The
/// transition is urgent if any participant is.
#[derive(Debug, Clone, PartialEq)]
pub struct CompositeTransition {
    pub event: Event,
    pub kind: EventKind,
    pub target: CompositeLocation,
    pub guard: Guard,
    pub reset: Vec<ResetAssignment>,
    pub participants: Vec<(usize, TransitionId)>,
}

impl CompositeTransition {
    #[must_use]
    pub fn key(&self) -> TransitionKey {
        TransitionKey {
            event: self.event.clone(),
            participants: self.participants.clone(),
        }
    }

    #[must_use]
    pub fn is_urgent(&self) -> bool {
        self.kind == EventKind::Urgent
    }
}
