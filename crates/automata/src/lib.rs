//! Hybrid automata for the Braid framework.
//!
//! An [`AtomicAutomaton`] is a single discrete-continuous state machine:
//! locations tagged with the [`Dynamics`](braid_core::Dynamics) active while
//! resident, and labeled transitions between them. Several atomic automata
//! are synchronized into a [`CompositeAutomaton`] by [`compose`]:
//!
//! - composite locations are tuples of member locations, instantiated lazily
//!   as they are reached
//! - quantities with the same name are the same quantity across members
//! - events declared by more than one member fire in lock-step
//!
//! # Example
//!
//! ```
//! use braid_automata::{AtomicAutomaton, Event, EventKind, compose};
//! use braid_core::{Dynamics, Guard, Variable, dot, next};
//!
//! let x = Variable::new("x");
//! let tick = Event::new("tick");
//!
//! let clock = AtomicAutomaton::builder("clock")
//!     .new_mode("running", Dynamics::from(vec![dot(&x).be(1.0)]))
//!     .new_transition(
//!         "running",
//!         &tick,
//!         "running",
//!         vec![next(&x).be(0.0)],
//!         Guard::geq(&x, 1.0),
//!         EventKind::Urgent,
//!     )
//!     .build()
//!     .unwrap();
//!
//! let system = compose(vec![clock]).unwrap();
//! assert_eq!(system.state_space().len(), 1);
//! ```

mod atomic;
mod composite;
mod error;

pub use atomic::{
    AtomicAutomaton, AtomicAutomatonBuilder, Event, EventKind, Location, LocationId, Transition,
    TransitionId, TransitionRecord,
};
pub use composite::{
    CompositeAutomaton, CompositeLocation, CompositeTransition, DiscreteGraph, Mode,
    TransitionKey, compose,
};
pub use error::{ConflictingDynamics, Error, MalformedModel};
