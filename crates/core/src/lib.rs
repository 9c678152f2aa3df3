//! Core types for the Braid hybrid-automaton framework.
//!
//! This crate defines the shared vocabulary that automata, solvers, and the
//! evolution engine build on:
//!
//! - [`Variable`], [`Constant`]: named continuous quantities
//! - [`Expr`]: plain-data expressions over quantities, evaluable over any
//!   [`Scalar`] (exact `f64` points or [`Interval`] enclosures)
//! - [`Assignment`]: algebraic (`let_`), differential (`dot`), and reset
//!   (`next`) bindings, grouped per location into [`Dynamics`]
//! - [`Guard`]: predicates over quantities with three-valued [`Truth`]
//! - [`Space`], [`Enclosure`]: named state spaces and boxes over them
//! - [`VectorField`], [`FlowSolver`]: the injected continuous-flow
//!   capability consumed by the evolution engine
//! - [`Observer`]: hooks for monitoring or stopping long computations

mod assignment;
mod error;
mod expr;
mod flow;
mod guard;
mod interval;
mod observer;
mod quantity;
mod scalar;
mod space;
mod step;

pub use assignment::{
    Algebraic, AlgebraicAssignment, Assignment, Differential, DifferentialAssignment, Dynamics,
    Reset, ResetAssignment, Target, dot, dots, let_, lets, next, nexts,
};
pub use error::{EvalError, IntervalError, SpaceError};
pub use expr::{BinaryOp, Expr, UnaryOp, cos, exp, sin, sqrt};
pub use flow::{FlowSolver, FlowStep, VectorField};
pub use guard::{Comparison, Guard, Sense};
pub use interval::Interval;
pub use observer::Observer;
pub use quantity::{Constant, Variable};
pub use scalar::{Scalar, Truth};
pub use space::{Enclosure, Environment, Space, Valuation};
pub use step::StepIntegrable;
