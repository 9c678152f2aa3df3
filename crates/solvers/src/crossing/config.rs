/// Configuration for the crossing search.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Config {
    pub max_iters: usize,
    pub time_tol: f64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_iters: 100,
            time_tol: 1e-9,
        }
    }
}

impl Config {
    /// Validates the iteration budget and time tolerance.
    ///
    /// # Errors
    ///
    /// Returns an error if `max_iters` is zero, or if `time_tol` is zero,
    /// negative, or non-finite.
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.max_iters == 0 {
            return Err("max_iters must be at least 1");
        }
        if !self.time_tol.is_finite() || self.time_tol <= 0.0 {
            return Err("time_tol must be finite and positive");
        }
        Ok(())
    }
}
