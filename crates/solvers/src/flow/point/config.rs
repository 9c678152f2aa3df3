use thiserror::Error;

/// Integration method of a [`PointIntegrator`](super::PointIntegrator).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Method {
    /// Forward Euler: `x + h f(x)`.
    Euler,
    /// Classical fourth-order Runge-Kutta.
    #[default]
    Rk4,
}

/// Configuration for the point integrator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Config {
    method: Method,
    max_substep: f64,
}

/// Errors that can occur when validating a point integrator config.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    #[error("max_substep must be finite and positive")]
    MaxSubstep,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            method: Method::Rk4,
            max_substep: 1e-2,
        }
    }
}

impl Config {
    /// Creates a validated config.
    ///
    /// # Errors
    ///
    /// Returns an error if `max_substep` is not finite and positive.
    pub fn new(method: Method, max_substep: f64) -> Result<Self, ConfigError> {
        if !max_substep.is_finite() || max_substep <= 0.0 {
            return Err(ConfigError::MaxSubstep);
        }
        Ok(Self {
            method,
            max_substep,
        })
    }

    #[must_use]
    pub fn method(&self) -> Method {
        self.method
    }

    /// Returns the longest substep taken inside one flow step.
    #[must_use]
    pub fn max_substep(&self) -> f64 {
        self.max_substep
    }
}
