//! Point integration of a single exact state.
//!
//! The initial enclosure must be a point. Each flow step is divided into
//! equal substeps no longer than [`Config::max_substep`], each advanced with
//! the configured [`Method`]:
//!
//! ```text
//! Euler: x_{n+1} = x_n + h f(x_n)
//! Rk4:   x_{n+1} = x_n + h (k1 + 2 k2 + 2 k3 + k4) / 6
//! ```
//!
//! The swept set is the hull of the substep states, which is exact for
//! monotone trajectories between substeps.

mod config;
mod error;

pub use config::{Config, ConfigError, Method};
pub use error::Error;

use std::sync::Arc;

use braid_core::{
    Enclosure, FlowSolver, FlowStep, Interval, Space, StepIntegrable, VectorField,
};
use tracing::trace;

/// A [`FlowSolver`] for point initial sets.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PointIntegrator {
    config: Config,
}

impl PointIntegrator {
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    fn advance<F>(&self, field: &F, state: &Vec<f64>, h: f64) -> Result<Vec<f64>, Error>
    where
        F: VectorField + ?Sized,
    {
        let k1 = field.derivative(state)?;
        match self.config.method() {
            Method::Euler => Ok(state.step(&k1, h)),
            Method::Rk4 => {
                let k2 = field.derivative(&state.step(&k1, h / 2.0))?;
                let k3 = field.derivative(&state.step(&k2, h / 2.0))?;
                let k4 = field.derivative(&state.step(&k3, h))?;
                let slope: Vec<f64> = (0..state.len())
                    .map(|i| (k1[i] + 2.0 * k2[i] + 2.0 * k3[i] + k4[i]) / 6.0)
                    .collect();
                Ok(state.step(&slope, h))
            }
        }
    }
}

impl FlowSolver for PointIntegrator {
    type Error = Error;

    fn step<F>(&self, field: &F, initial: &Enclosure, duration: f64) -> Result<FlowStep, Error>
    where
        F: VectorField + ?Sized,
    {
        if !initial.is_point() {
            return Err(Error::NotAPoint {
                radius: initial.radius(),
            });
        }
        if !duration.is_finite() || duration < 0.0 {
            return Err(Error::InvalidDuration { duration });
        }
        if duration == 0.0 {
            return Ok(FlowStep {
                reached: initial.clone(),
                swept: initial.clone(),
            });
        }

        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let substeps = (duration / self.config.max_substep()).ceil().max(1.0) as usize;
        let h = duration / substeps as f64;

        let mut state = initial.midpoint();
        let mut swept: Vec<Interval> = initial.bounds().to_vec();

        for _ in 0..substeps {
            state = self.advance(field, &state, h)?;
            for (bounds, &value) in swept.iter_mut().zip(&state) {
                *bounds = bounds.hull(&Interval::point(value));
            }
        }

        trace!(duration, substeps, "point flow step");

        let space: Arc<Space> = Arc::clone(initial.space());
        Ok(FlowStep {
            reached: Enclosure::point(Arc::clone(&space), &state)?,
            swept: Enclosure::new(space, swept)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_relative_eq;
    use braid_core::{EvalError, Scalar, Variable};

    /// `x' = v`, `v' = -x`: a unit harmonic oscillator.
    struct Oscillator {
        space: Space,
    }

    impl Oscillator {
        fn new() -> Self {
            Self {
                space: Space::new([Variable::new("x"), Variable::new("v")]),
            }
        }
    }

    impl VectorField for Oscillator {
        fn space(&self) -> &Space {
            &self.space
        }

        fn derivative<T: Scalar>(&self, state: &[T]) -> Result<Vec<T>, EvalError> {
            Ok(vec![state[1].clone(), -state[0].clone()])
        }
    }

    fn start(field: &Oscillator, x: f64, v: f64) -> Enclosure {
        Enclosure::point(Arc::new(field.space().clone()), &[x, v]).unwrap()
    }

    #[test]
    fn rk4_tracks_the_exact_solution() {
        let field = Oscillator::new();
        let solver = PointIntegrator::new(Config::new(Method::Rk4, 0.01).unwrap());

        let step = solver.step(&field, &start(&field, 1.0, 0.0), 1.0).unwrap();

        assert_relative_eq!(step.reached.get("x").unwrap().lo(), 1.0_f64.cos(), epsilon = 1e-9);
        assert_relative_eq!(step.reached.get("v").unwrap().lo(), -1.0_f64.sin(), epsilon = 1e-9);
        assert!(step.reached.is_point());
    }

    #[test]
    fn euler_matches_the_hand_computation() {
        let field = Oscillator::new();
        let solver = PointIntegrator::new(Config::new(Method::Euler, 0.5).unwrap());

        let step = solver.step(&field, &start(&field, 1.0, 0.0), 1.0).unwrap();

        // (1, 0) -> (1, -0.5) -> (0.75, -1.0)
        assert_relative_eq!(step.reached.get("x").unwrap().lo(), 0.75);
        assert_relative_eq!(step.reached.get("v").unwrap().lo(), -1.0);
    }

    #[test]
    fn swept_set_hulls_the_substeps() {
        let field = Oscillator::new();
        let solver = PointIntegrator::new(Config::new(Method::Euler, 0.5).unwrap());

        let step = solver.step(&field, &start(&field, 1.0, 0.0), 1.0).unwrap();

        let v = step.swept.get("v").unwrap();
        assert_relative_eq!(v.lo(), -1.0);
        assert_relative_eq!(v.hi(), 0.0);
        assert!(step.swept.encloses(&step.reached));
    }

    #[test]
    fn zero_duration_returns_initial() {
        let field = Oscillator::new();
        let initial = start(&field, 0.3, 0.2);

        let step = PointIntegrator::default().step(&field, &initial, 0.0).unwrap();

        assert_eq!(step.reached, initial);
        assert_eq!(step.swept, initial);
    }

    #[test]
    fn rejects_boxes_and_bad_durations() {
        let field = Oscillator::new();
        let solver = PointIntegrator::default();

        let initial = start(&field, 0.0, 0.0)
            .with("x", Interval::new(-1.0, 1.0).unwrap())
            .unwrap();
        assert!(matches!(
            solver.step(&field, &initial, 1.0),
            Err(Error::NotAPoint { .. })
        ));

        assert!(matches!(
            solver.step(&field, &start(&field, 0.0, 0.0), -1.0),
            Err(Error::InvalidDuration { .. })
        ));
    }

    #[test]
    fn config_validates_substep() {
        assert_eq!(Config::new(Method::Euler, 0.0), Err(ConfigError::MaxSubstep));
        assert_eq!(
            Config::new(Method::Euler, f64::NAN),
            Err(ConfigError::MaxSubstep)
        );
    }
}
