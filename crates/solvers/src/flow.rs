//! Continuous-flow solvers.
//!
//! Both solvers advance an [`Enclosure`](braid_core::Enclosure) for a fixed
//! duration, splitting it into substeps no longer than a configured maximum:
//!
//! - [`point`]: classical integration of a single exact state (Euler or
//!   RK4); fast and precise for simulation of point initial sets
//! - [`picard`]: first-order interval enclosures of every trajectory
//!   starting in a box, via a validated Picard iteration

pub mod picard;
pub mod point;

pub use picard::PicardSolver;
pub use point::{Method, PointIntegrator};
