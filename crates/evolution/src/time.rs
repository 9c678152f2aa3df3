use std::fmt;

/// The evolution budget: maximum continuous time and discrete transitions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EvolutionTime {
    pub time: f64,
    pub transitions: usize,
}

impl EvolutionTime {
    #[must_use]
    pub fn new(time: f64, transitions: usize) -> Self {
        Self { time, transitions }
    }
}

impl fmt::Display for EvolutionTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.time, self.transitions)
    }
}

/// How non-determinism is resolved during evolution.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Semantics {
    /// Over-approximate: every enabled continuation becomes a branch.
    #[default]
    Upper,

    /// A single trajectory: the first enabled transition in declaration
    /// order fires and no flow-on continuation is kept.
    Lower,
}
