use thiserror::Error;

/// Configuration for the Picard enclosure solver.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Config {
    max_substep: f64,
    min_substep: f64,
    max_iters: usize,
    inflation: f64,
}

/// Errors that can occur when validating a Picard solver config.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    #[error("max_substep must be finite and positive")]
    MaxSubstep,

    #[error("min_substep must be positive and no larger than max_substep")]
    MinSubstep,

    #[error("max_iters must be at least 1")]
    MaxIters,

    #[error("inflation must be finite and positive")]
    Inflation,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_substep: 1e-2,
            min_substep: 1e-5,
            max_iters: 20,
            inflation: 1e-1,
        }
    }
}

impl Config {
    /// Creates a validated config.
    ///
    /// # Errors
    ///
    /// Returns an error if a parameter is out of range.
    pub fn new(
        max_substep: f64,
        min_substep: f64,
        max_iters: usize,
        inflation: f64,
    ) -> Result<Self, ConfigError> {
        if !max_substep.is_finite() || max_substep <= 0.0 {
            return Err(ConfigError::MaxSubstep);
        }
        if min_substep.is_nan() || min_substep <= 0.0 || min_substep > max_substep {
            return Err(ConfigError::MinSubstep);
        }
        if max_iters == 0 {
            return Err(ConfigError::MaxIters);
        }
        if !inflation.is_finite() || inflation <= 0.0 {
            return Err(ConfigError::Inflation);
        }
        Ok(Self {
            max_substep,
            min_substep,
            max_iters,
            inflation,
        })
    }

    /// Returns the longest substep taken inside one flow step.
    #[must_use]
    pub fn max_substep(&self) -> f64 {
        self.max_substep
    }

    /// Returns the shortest substep the solver halves down to before failing.
    #[must_use]
    pub fn min_substep(&self) -> f64 {
        self.min_substep
    }

    /// Returns the number of widening attempts per substep.
    #[must_use]
    pub fn max_iters(&self) -> usize {
        self.max_iters
    }

    /// Returns the relative widening applied when a candidate box fails.
    #[must_use]
    pub fn inflation(&self) -> f64 {
        self.inflation
    }
}
