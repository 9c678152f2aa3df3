use std::{collections::BTreeMap, sync::Arc};

use braid_automata::{CompositeLocation, Event};
use braid_core::{Enclosure, Interval};

/// How a sample was produced.
#[derive(Debug, Clone, PartialEq)]
pub enum SampleKind {
    /// The initial set of the root branch.
    Initial,
    /// The end of a flow step.
    Flow,
    /// The state right after a discrete transition.
    Jump { event: Event },
}

/// The set swept by the flow step that produced a sample.
#[derive(Debug, Clone, PartialEq)]
pub struct Sweep {
    /// Time at which the flow step started.
    pub start: f64,
    pub state: Enclosure,
    pub auxiliary: BTreeMap<Arc<str>, Interval>,
}

/// One recorded point of an orbit: a hybrid state at a hybrid time.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    pub time: f64,
    pub transitions: usize,
    pub location: CompositeLocation,
    pub state: Enclosure,
    pub auxiliary: BTreeMap<Arc<str>, Interval>,
    pub swept: Option<Sweep>,
    pub kind: SampleKind,
}

impl Sample {
    /// Bounds of a state variable or auxiliary quantity.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<Interval> {
        self.state
            .get(name)
            .or_else(|| self.auxiliary.get(name).copied())
    }

    /// Bounds of `name` over the whole flow step ending at this sample.
    #[must_use]
    pub fn swept_get(&self, name: &str) -> Option<Interval> {
        match &self.swept {
            Some(sweep) => sweep
                .state
                .get(name)
                .or_else(|| sweep.auxiliary.get(name).copied()),
            None => self.get(name),
        }
    }

    /// The time window this sample covers.
    #[must_use]
    pub fn span(&self) -> (f64, f64) {
        match &self.swept {
            Some(sweep) => (sweep.start, self.time),
            None => (self.time, self.time),
        }
    }

    #[must_use]
    pub fn is_jump(&self) -> bool {
        matches!(self.kind, SampleKind::Jump { .. })
    }
}
