//! Interval enclosures of flows via a validated Picard iteration.
//!
//! For each substep of length `h` from the box `X`, the solver looks for an
//! a-priori enclosure `B` with
//!
//! ```text
//! X + [0, h] f(B) ⊆ B
//! ```
//!
//! starting from the Euler guess `X + [0, h] f(X)` and widening until the
//! inclusion holds. Every trajectory from `X` then stays in `B` over the
//! substep, and its end point lies in `X + h f(B)`. The swept set of a flow
//! step is the hull of the validated substep boxes.
//!
//! A substep that cannot be validated is halved and retried, down to the
//! configured minimum. The rest of the flow step keeps the shorter substep.
//!
//! Enclosures are first order and subject to the wrapping effect, so they
//! grow with the flow duration even for contracting dynamics.

mod config;
mod error;

pub use config::{Config, ConfigError};
pub use error::Error;

use std::sync::Arc;

use braid_core::{Enclosure, FlowSolver, FlowStep, Interval, VectorField};
use tracing::trace;

/// Width floor for widening degenerate candidate boxes.
const MIN_WIDENING: f64 = 1e-12;

/// A [`FlowSolver`] producing interval enclosures.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PicardSolver {
    config: Config,
}

impl PicardSolver {
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Returns `(reached, swept)` for one substep, or `None` if no a-priori
    /// enclosure validates within the iteration budget.
    fn substep<F>(
        &self,
        field: &F,
        x: &[Interval],
        h: f64,
    ) -> Result<Option<(Vec<Interval>, Vec<Interval>)>, Error>
    where
        F: VectorField + ?Sized,
    {
        let window = Interval::point(0.0).hull(&Interval::point(h));
        let picard = |b: &[Interval]| -> Result<Vec<Interval>, Error> {
            let rates = field.derivative(b)?;
            Ok(x.iter().zip(rates).map(|(&xi, fi)| xi + window * fi).collect())
        };

        let mut candidate = picard(x)?;
        for _ in 0..self.config.max_iters() {
            let trial: Vec<Interval> = candidate
                .iter()
                .map(|b| b.inflate(self.config.inflation() * (b.radius() + MIN_WIDENING)))
                .collect();
            let image = picard(&trial)?;

            if trial.iter().zip(&image).all(|(t, i)| t.encloses(i)) {
                let rates = field.derivative(&image)?;
                let reached = x
                    .iter()
                    .zip(&image)
                    .zip(rates)
                    .map(|((&xi, bi), fi)| {
                        let end = xi + Interval::point(h) * fi;
                        end.intersection(bi).unwrap_or(end)
                    })
                    .collect();
                return Ok(Some((reached, image)));
            }

            candidate = trial.iter().zip(&image).map(|(t, i)| t.hull(i)).collect();
        }

        Ok(None)
    }
}

impl FlowSolver for PicardSolver {
    type Error = Error;

    fn step<F>(&self, field: &F, initial: &Enclosure, duration: f64) -> Result<FlowStep, Error>
    where
        F: VectorField + ?Sized,
    {
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
        let mut h = duration / substeps as f64;

        let mut state = initial.bounds().to_vec();
        let mut swept = state.clone();
        let mut elapsed = 0.0;
        let mut taken = 0_usize;

        while elapsed < duration {
            let remaining = duration - elapsed;
            let last = remaining <= h;
            let length = if last { remaining } else { h };

            let Some((reached, enclosure)) = self.substep(field, &state, length)? else {
                if h / 2.0 < self.config.min_substep() {
                    return Err(Error::NoEnclosure {
                        offset: elapsed,
                        substep: length,
                        iters: self.config.max_iters(),
                    });
                }
                h /= 2.0;
                trace!(offset = elapsed, substep = h, "halving picard substep");
                continue;
            };

            for (hull, b) in swept.iter_mut().zip(&enclosure) {
                *hull = hull.hull(b);
            }
            state = reached;
            elapsed = if last { duration } else { elapsed + length };
            taken += 1;
        }

        let space = Arc::clone(initial.space());
        let reached = Enclosure::new(Arc::clone(&space), state)?;
        trace!(duration, substeps = taken, radius = reached.radius(), "picard flow step");

        Ok(FlowStep {
            reached,
            swept: Enclosure::new(space, swept)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_relative_eq;
    use braid_core::{EvalError, Scalar, Space, Variable};

    /// `x' = rate * x + drift`.
    struct Linear {
        space: Space,
        rate: f64,
        drift: f64,
    }

    impl Linear {
        fn new(rate: f64, drift: f64) -> Self {
            Self {
                space: Space::new([Variable::new("x")]),
                rate,
                drift,
            }
        }

        fn start(&self, lo: f64, hi: f64) -> Enclosure {
            Enclosure::new(
                Arc::new(self.space.clone()),
                vec![Interval::new(lo, hi).unwrap()],
            )
            .unwrap()
        }
    }

    impl VectorField for Linear {
        fn space(&self) -> &Space {
            &self.space
        }

        fn derivative<T: Scalar>(&self, state: &[T]) -> Result<Vec<T>, EvalError> {
            Ok(vec![
                T::constant(self.rate) * state[0].clone() + T::constant(self.drift),
            ])
        }
    }

    #[test]
    fn constant_drift_is_exact() {
        let field = Linear::new(0.0, 1.0);
        let solver = PicardSolver::new(Config::new(0.1, 1e-3, 20, 0.1).unwrap());

        let step = solver.step(&field, &field.start(0.0, 1.0), 0.5).unwrap();

        let x = step.reached.get("x").unwrap();
        assert_relative_eq!(x.lo(), 0.5, epsilon = 1e-12);
        assert_relative_eq!(x.hi(), 1.5, epsilon = 1e-12);

        let swept = step.swept.get("x").unwrap();
        assert!(swept.lo() <= 0.0 && swept.hi() >= 1.5);
    }

    #[test]
    fn decay_is_enclosed() {
        let field = Linear::new(-1.0, 0.0);
        let solver = PicardSolver::default();

        let step = solver.step(&field, &field.start(1.0, 1.0), 1.0).unwrap();

        let x = step.reached.get("x").unwrap();
        assert!(x.contains((-1.0_f64).exp()));
        assert!(x.radius() < 0.05);
        assert!(step.swept.get("x").unwrap().contains(1.0));
    }

    #[test]
    fn box_initial_sets_enclose_every_corner() {
        let field = Linear::new(-0.5, 0.2);
        let solver = PicardSolver::default();

        let step = solver.step(&field, &field.start(-1.0, 1.0), 2.0).unwrap();

        let x = step.reached.get("x").unwrap();
        for x0 in [-1.0, 0.0, 1.0] {
            // x(t) = 0.4 + (x0 - 0.4) e^{-t/2}
            let exact = 0.4 + (x0 - 0.4) * (-1.0_f64).exp();
            assert!(x.contains(exact), "{exact} not in {x}");
        }
    }

    #[test]
    fn zero_duration_returns_initial() {
        let field = Linear::new(1.0, 0.0);
        let initial = field.start(0.0, 1.0);

        let step = PicardSolver::default().step(&field, &initial, 0.0).unwrap();

        assert_eq!(step.reached, initial);
        assert_eq!(step.swept, initial);
    }

    #[test]
    fn rejects_negative_duration() {
        let field = Linear::new(1.0, 0.0);
        let result = PicardSolver::default().step(&field, &field.start(0.0, 0.0), -0.1);
        assert!(matches!(result, Err(Error::InvalidDuration { .. })));
    }

    #[test]
    fn stiff_substeps_are_halved_until_they_validate() {
        // x' = -150 x: a 0.01 substep cannot be validated, 0.005 can.
        let field = Linear::new(-150.0, 0.0);
        let initial = field.start(1.0, 1.0);

        let solver = PicardSolver::new(Config::new(0.01, 1e-3, 20, 0.1).unwrap());
        let step = solver.step(&field, &initial, 0.01).unwrap();
        let x = step.reached.get("x").unwrap();
        assert!(x.contains((-1.5_f64).exp()), "{x}");
        assert!(step.swept.get("x").unwrap().contains(1.0));

        let rigid = PicardSolver::new(Config::new(0.01, 0.01, 20, 0.1).unwrap());
        match rigid.step(&field, &initial, 0.01) {
            Err(Error::NoEnclosure {
                offset, substep, ..
            }) => {
                assert_relative_eq!(offset, 0.0);
                assert_relative_eq!(substep, 0.01);
            }
            other => panic!("expected no enclosure, got {other:?}"),
        }
    }

    #[test]
    fn config_validation() {
        assert_eq!(Config::new(0.0, 1e-3, 10, 0.1), Err(ConfigError::MaxSubstep));
        assert_eq!(Config::new(0.1, 0.0, 10, 0.1), Err(ConfigError::MinSubstep));
        assert_eq!(Config::new(0.1, 0.2, 10, 0.1), Err(ConfigError::MinSubstep));
        assert_eq!(Config::new(0.1, 1e-3, 0, 0.1), Err(ConfigError::MaxIters));
        assert_eq!(Config::new(0.1, 1e-3, 10, -1.0), Err(ConfigError::Inflation));
    }
}
