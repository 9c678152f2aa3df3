use std::fmt;

use braid_automata::Event;

use super::Sample;

/// Index of a branch within its [`Orbit`](super::Orbit).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BranchId(pub usize);

impl fmt::Display for BranchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Why a branch stopped being evolved.
#[derive(Debug, Clone, PartialEq)]
pub enum Termination {
    /// The time budget was reached.
    TimeExpired,

    /// The discrete-transition budget was reached.
    StepBudgetExpired,

    /// The branch can make no further progress.
    Blocked(BlockCause),

    /// The enclosure grew beyond the configured radius.
    EnclosureTooLarge { radius: f64 },
}

impl fmt::Display for Termination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TimeExpired => write!(f, "time expired"),
            Self::StepBudgetExpired => write!(f, "step budget expired"),
            Self::Blocked(cause) => write!(f, "blocked: {cause}"),
            Self::EnclosureTooLarge { radius } => write!(f, "enclosure radius {radius} too large"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum BlockCause {
    /// The invariant fails and no transition is enabled.
    Deadlock,

    /// The outgoing transitions, urgent ones among them, can never become
    /// enabled under the current dynamics.
    UnreachableGuards { events: Vec<Event> },
}

impl fmt::Display for BlockCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Deadlock => write!(f, "invariant violated with no enabled transition"),
            Self::UnreachableGuards { events } => {
                let names: Vec<&str> = events.iter().map(Event::name).collect();
                write!(f, "guards of {} are unreachable", names.join(", "))
            }
        }
    }
}

/// A single non-branching trajectory segment of an orbit.
///
/// A branch forked from `parent` shares the parent's first `fork` samples
/// and continues with its own. The root branch has no parent.
#[derive(Debug, Clone, PartialEq)]
pub struct Branch {
    pub id: BranchId,
    pub parent: Option<BranchId>,
    pub fork: usize,
    pub samples: Vec<Sample>,
    pub termination: Termination,
}

impl Branch {
    /// The branch's own samples, in time order.
    pub fn samples(&self) -> std::slice::Iter<'_, Sample> {
        self.samples.iter()
    }

    #[must_use]
    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }
}
