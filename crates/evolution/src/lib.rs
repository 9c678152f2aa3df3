//! Reachability evolution for composite hybrid automata.
//!
//! Starting from a [`HybridSet`], an [`Evolver`] computes an [`Orbit`]: a
//! tree of branches, each a sequence of [`Sample`]s alternating continuous
//! flow with discrete jumps, ending in a [`Termination`]. Continuous flow is
//! delegated to an injected [`FlowSolver`](braid_core::FlowSolver).
//!
//! # Example
//!
//! ```
//! use braid_automata::{AtomicAutomaton, Event, EventKind, compose};
//! use braid_core::{Dynamics, Guard, Variable, dot, next};
//! use braid_evolution::{Configuration, EvolutionTime, HybridSet, Semantics, Termination, evolve};
//! use braid_solvers::flow::PointIntegrator;
//!
//! let x = Variable::new("x");
//! let clock = AtomicAutomaton::builder("clock")
//!     .new_mode("running", Dynamics::from(vec![dot(&x).be(1.0)]))
//!     .new_transition(
//!         "running",
//!         &Event::new("tick"),
//!         "running",
//!         vec![next(&x).be(0.0)],
//!         Guard::geq(&x, 1.0),
//!         EventKind::Urgent,
//!     )
//!     .build()
//!     .unwrap();
//! let system = compose(vec![clock]).unwrap();
//!
//! let orbit = evolve(
//!     &system,
//!     PointIntegrator::default(),
//!     Configuration::default(),
//!     &HybridSet::new(&[("clock", "running")]).with(&x, 0.0),
//!     EvolutionTime::new(3.5, 10),
//!     Semantics::Upper,
//! )
//! .unwrap();
//!
//! assert_eq!(orbit.jump_times("tick").len(), 3);
//! assert_eq!(orbit.branches()[0].termination, Termination::TimeExpired);
//! ```

mod config;
mod error;
mod evolver;
mod initial;
mod orbit;
mod time;

pub use config::Configuration;
pub use error::Error;
pub use evolver::{Action, Evolver, Progress, evolve};
pub use initial::HybridSet;
pub use orbit::{
    BlockCause, Branch, BranchId, Orbit, Sample, SampleKind, Status, Sweep, Termination,
};
pub use time::{EvolutionTime, Semantics};
