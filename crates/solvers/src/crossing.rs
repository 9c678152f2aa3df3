//! Bisection for the earliest time an event is reached during a flow step.
//!
//! The caller supplies a monotone predicate `reached(s)`: whether the event
//! is possibly reached somewhere in `[0, s]`. Typical predicates flow for
//! `s` and test a guard over the swept set. Given `reached(horizon)`, the
//! search halves the bracket `[lower, upper]` with `reached(lower) == false`
//! and `reached(upper) == true` until its width is at most
//! `time_tol` or the iteration budget runs out.
//!
//! # Example
//!
//! ```
//! use braid_solvers::crossing::{self, Config};
//!
//! // x(t) = 1 - t reaches x <= 0.25 at t = 0.75.
//! let window = crossing::earliest(2.0, &Config::default(), |s| {
//!     Ok::<_, std::convert::Infallible>(1.0 - s <= 0.25)
//! })
//! .unwrap()
//! .expect("reached before the horizon");
//!
//! assert!(window.upper - 0.75 <= 1e-9 && window.upper >= 0.75);
//! ```

mod config;

pub use config::Config;

use tracing::trace;

/// The bracket in which the event is first reached.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Crossing {
    /// Latest time known to precede the event.
    pub lower: f64,

    /// Earliest time known to reach the event.
    pub upper: f64,

    /// Number of predicate evaluations after the initial check.
    pub iters: usize,
}

impl Crossing {
    #[must_use]
    pub fn width(&self) -> f64 {
        self.upper - self.lower
    }
}

/// Finds the earliest time in `(0, horizon]` at which `reached` holds.
///
/// The predicate is assumed false at time zero. Returns `None` if the event
/// is not reached by `horizon`.
///
/// # Errors
///
/// Propagates the first error returned by `reached`.
pub fn earliest<P, E>(horizon: f64, config: &Config, mut reached: P) -> Result<Option<Crossing>, E>
where
    P: FnMut(f64) -> Result<bool, E>,
{
    if !reached(horizon)? {
        return Ok(None);
    }

    let mut lower = 0.0;
    let mut upper = horizon;
    let mut iters = 0;

    while upper - lower > config.time_tol && iters < config.max_iters {
        let mid = 0.5 * (lower + upper);
        if mid <= lower || mid >= upper {
            break;
        }
        if reached(mid)? {
            upper = mid;
        } else {
            lower = mid;
        }
        iters += 1;
    }

    trace!(lower, upper, iters, "crossing bracketed");
    Ok(Some(Crossing {
        lower,
        upper,
        iters,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::convert::Infallible;

    use approx::assert_relative_eq;

    fn never_fails(result: bool) -> Result<bool, Infallible> {
        Ok(result)
    }

    #[test]
    fn brackets_a_linear_crossing() {
        let config = Config {
            max_iters: 100,
            time_tol: 1e-10,
        };
        let window = earliest(10.0, &config, |s| never_fails(0.5 - 0.1 * s <= 0.1))
            .unwrap()
            .unwrap();

        assert!(window.width() <= 1e-10);
        assert!(window.upper >= 4.0 - 1e-12);
        assert_relative_eq!(window.upper, 4.0, epsilon = 1e-9);
    }

    #[test]
    fn unreached_event_returns_none() {
        let window = earliest(1.0, &Config::default(), |_| never_fails(false)).unwrap();
        assert_eq!(window, None);
    }

    #[test]
    fn respects_iteration_budget() {
        let config = Config {
            max_iters: 3,
            time_tol: 1e-12,
        };
        let mut calls = 0;
        let window = earliest(8.0, &config, |s| {
            calls += 1;
            never_fails(s > 1.0)
        })
        .unwrap()
        .unwrap();

        assert_eq!(window.iters, 3);
        assert_eq!(calls, 4);
        // 8 -> [0, 4] -> [0, 2] -> [1, 2]
        assert_relative_eq!(window.lower, 1.0);
        assert_relative_eq!(window.upper, 2.0);
    }

    #[test]
    fn propagates_predicate_errors() {
        let result = earliest(1.0, &Config::default(), |s| {
            if s < 1.0 { Err("flow failed") } else { Ok(true) }
        });
        assert_eq!(result, Err("flow failed"));
    }

    #[test]
    fn config_rejects_bad_tolerance() {
        assert!(Config::default().validate().is_ok());

        let zero = Config {
            time_tol: 0.0,
            ..Config::default()
        };
        assert!(zero.validate().is_err());

        let infinite = Config {
            time_tol: f64::INFINITY,
            ..Config::default()
        };
        assert!(infinite.validate().is_err());
    }

    #[test]
    fn config_rejects_an_empty_iteration_budget() {
        let config = Config {
            max_iters: 0,
            ..Config::default()
        };
        assert_eq!(config.validate(), Err("max_iters must be at least 1"));
    }
}
