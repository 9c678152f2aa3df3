use braid_solvers::crossing;

/// Configuration for an [`Evolver`](crate::Evolver).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Configuration {
    /// Longest single flow step.
    pub maximum_step_size: f64,

    /// Branches whose enclosure radius exceeds this end as
    /// [`Termination::EnclosureTooLarge`](crate::Termination::EnclosureTooLarge).
    pub maximum_enclosure_radius: f64,

    /// Bisection settings for locating guard crossings within a flow step.
    pub crossing: crossing::Config,

    /// Evolve the branches of a round on the rayon thread pool.
    pub parallel: bool,

    /// Upper bound on the number of branches in one orbit.
    pub maximum_branches: usize,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            maximum_step_size: 1.25,
            maximum_enclosure_radius: f64::INFINITY,
            crossing: crossing::Config::default(),
            parallel: true,
            maximum_branches: 1024,
        }
    }
}

impl Configuration {
    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the step size is not finite and positive, the
    /// radius bound is NaN or not positive, the crossing settings are
    /// invalid, or no branches are allowed.
    pub fn validate(&self) -> Result<(), &'static str> {
        if !self.maximum_step_size.is_finite() || self.maximum_step_size <= 0.0 {
            return Err("maximum_step_size must be finite and positive");
        }
        if self.maximum_enclosure_radius.is_nan() || self.maximum_enclosure_radius <= 0.0 {
            return Err("maximum_enclosure_radius must be positive");
        }
        if self.maximum_branches == 0 {
            return Err("maximum_branches must be at least 1");
        }
        self.crossing.validate()
    }
}
