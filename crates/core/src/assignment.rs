use std::{fmt, marker::PhantomData};

use crate::{Expr, Variable};

/// Marker for algebraic assignments: `q = f(...)`, holding instantaneously
/// while the containing location is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Algebraic {}

/// Marker for differential assignments: `dq/dt = f(...)`, integrated while
/// the containing location is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Differential {}

/// Marker for reset assignments: `q' = f(...)`, applied at the instant a
/// transition fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reset {}

/// Binds one quantity to an expression over other quantities.
///
/// The kind parameter distinguishes algebraic, differential, and reset
/// assignments at the type level so they cannot be mixed up when building a
/// location or transition.
#[derive(Debug, Clone, PartialEq)]
pub struct Assignment<K> {
    target: Variable,
    expr: Expr,
    kind: PhantomData<K>,
}

pub type AlgebraicAssignment = Assignment<Algebraic>;
pub type DifferentialAssignment = Assignment<Differential>;
pub type ResetAssignment = Assignment<Reset>;

impl<K> Assignment<K> {
    #[must_use]
    pub fn target(&self) -> &Variable {
        &self.target
    }

    #[must_use]
    pub fn expr(&self) -> &Expr {
        &self.expr
    }
}

impl fmt::Display for Assignment<Algebraic> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.target, self.expr)
    }
}

impl fmt::Display for Assignment<Differential> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "dot({})={}", self.target, self.expr)
    }
}

impl fmt::Display for Assignment<Reset> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "next({})={}", self.target, self.expr)
    }
}

/// The left-hand side of an assignment under construction.
#[derive(Debug, Clone)]
pub struct Target<K> {
    target: Variable,
    kind: PhantomData<K>,
}

impl<K> Target<K> {
    /// Completes the assignment with its right-hand side.
    pub fn be(self, expr: impl Into<Expr>) -> Assignment<K> {
        Assignment {
            target: self.target,
            expr: expr.into(),
            kind: PhantomData,
        }
    }
}

fn target<K>(variable: &Variable) -> Target<K> {
    Target {
        target: variable.clone(),
        kind: PhantomData,
    }
}

fn zip_all<K>(targets: &[&Variable], exprs: Vec<Expr>) -> Vec<Assignment<K>> {
    assert_eq!(
        targets.len(),
        exprs.len(),
        "assignment needs one expression per target"
    );
    targets
        .iter()
        .zip(exprs)
        .map(|(var, expr)| target(var).be(expr))
        .collect()
}

/// Starts an algebraic assignment: `let_(&x).be(expr)`.
#[must_use]
pub fn let_(variable: &Variable) -> Target<Algebraic> {
    target(variable)
}

/// Starts a differential assignment: `dot(&x).be(expr)`.
#[must_use]
pub fn dot(variable: &Variable) -> Target<Differential> {
    target(variable)
}

/// Starts a reset assignment: `next(&x).be(expr)`.
#[must_use]
pub fn next(variable: &Variable) -> Target<Reset> {
    target(variable)
}

/// Builds algebraic assignments pairwise from targets and expressions.
///
/// # Panics
///
/// Panics if the slices have different lengths.
pub fn lets(targets: &[&Variable], exprs: impl IntoIterator<Item = Expr>) -> Vec<AlgebraicAssignment> {
    zip_all(targets, exprs.into_iter().collect())
}

/// Builds differential assignments pairwise from targets and expressions.
///
/// # Panics
///
/// Panics if the slices have different lengths.
pub fn dots(
    targets: &[&Variable],
    exprs: impl IntoIterator<Item = Expr>,
) -> Vec<DifferentialAssignment> {
    zip_all(targets, exprs.into_iter().collect())
}

/// Builds reset assignments pairwise from targets and expressions.
///
/// # Panics
///
/// Panics if the slices have different lengths.
pub fn nexts(targets: &[&Variable], exprs: impl IntoIterator<Item = Expr>) -> Vec<ResetAssignment> {
    zip_all(targets, exprs.into_iter().collect())
}

/// The assignments active while resident in one location.
///
/// A state variable without a differential assignment in a location has
/// rate zero there.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dynamics {
    pub algebraic: Vec<AlgebraicAssignment>,
    pub differential: Vec<DifferentialAssignment>,
}

impl Dynamics {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_algebraic(mut self, assignments: impl IntoIterator<Item = AlgebraicAssignment>) -> Self {
        self.algebraic.extend(assignments);
        self
    }

    #[must_use]
    pub fn with_differential(
        mut self,
        assignments: impl IntoIterator<Item = DifferentialAssignment>,
    ) -> Self {
        self.differential.extend(assignments);
        self
    }
}

impl From<Vec<AlgebraicAssignment>> for Dynamics {
    fn from(algebraic: Vec<AlgebraicAssignment>) -> Self {
        Self {
            algebraic,
            differential: Vec::new(),
        }
    }
}

impl From<Vec<DifferentialAssignment>> for Dynamics {
    fn from(differential: Vec<DifferentialAssignment>) -> Self {
        Self {
            algebraic: Vec::new(),
            differential,
        }
    }
}
