//! Solvers for the Braid framework.
//!
//! - [`flow`]: [`FlowSolver`](braid_core::FlowSolver) implementations that
//!   advance state enclosures under a vector field
//! - [`crossing`]: bisection for the earliest time a flow first reaches an
//!   event, such as a guard becoming possibly satisfied

pub mod crossing;
pub mod flow;
