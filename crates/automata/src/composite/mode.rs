use std::{
    collections::{BTreeMap, HashMap},
    sync::Arc,
};

use braid_core::{
    AlgebraicAssignment, Environment, EvalError, Expr, Guard, Scalar, Space, VectorField,
};
use petgraph::{
    algo::{tarjan_scc, toposort},
    graph::{DiGraph, NodeIndex},
};

use super::{CompositeLocation, CompositeTransition};
use crate::ConflictingDynamics;

/// The instantiated dynamics of one composite location.
///
/// A mode merges the member locations' assignments: algebraic assignments
/// are kept in dependency order, and each state variable gets the rate from
/// whichever member integrates it (zero if none does here). Modes are built
/// on demand by [`CompositeAutomaton::mode`](super::CompositeAutomaton::mode).
#[derive(Debug, Clone)]
pub struct Mode {
    location: CompositeLocation,
    space: Arc<Space>,
    algebraic: Vec<AlgebraicAssignment>,
    rates: Vec<Expr>,
    invariant: Guard,
    transitions: Vec<CompositeTransition>,
    inlined: BTreeMap<Arc<str>, Expr>,
}

impl Mode {
    pub(crate) fn new(
        location: CompositeLocation,
        space: Arc<Space>,
        algebraic: Vec<AlgebraicAssignment>,
        rates: Vec<Expr>,
        invariant: Guard,
        transitions: Vec<CompositeTransition>,
    ) -> Self {
        let mut inlined = BTreeMap::new();
        for assignment in &algebraic {
            let expr = assignment.expr().substitute(&inlined);
            inlined.insert(assignment.target().key().clone(), expr);
        }
        Self {
            location,
            space,
            algebraic,
            rates,
            invariant,
            transitions,
            inlined,
        }
    }

    #[must_use]
    pub fn location(&self) -> &CompositeLocation {
        &self.location
    }

    /// Algebraic assignments, each after everything it reads.
    #[must_use]
    pub fn algebraic(&self) -> &[AlgebraicAssignment] {
        &self.algebraic
    }

    /// Right-hand sides, one per state variable.
    #[must_use]
    pub fn rates(&self) -> &[Expr] {
        &self.rates
    }

    /// Rate of a state variable in this mode.
    #[must_use]
    pub fn rate(&self, name: &str) -> Option<&Expr> {
        self.space.index_of(name).map(|i| &self.rates[i])
    }

    #[must_use]
    pub fn invariant(&self) -> &Guard {
        &self.invariant
    }

    /// Outgoing transitions, in declaration order.
    #[must_use]
    pub fn transitions(&self) -> &[CompositeTransition] {
        &self.transitions
    }

    /// Binds the algebraic quantities for `state` into an environment.
    ///
    /// # Errors
    ///
    /// Returns an [`EvalError`] if an algebraic right-hand side fails.
    pub fn environment<'a, T: Scalar>(
        &'a self,
        state: &'a [T],
    ) -> Result<Environment<'a, T>, EvalError> {
        let mut env = Environment::new(&self.space, state);
        for assignment in &self.algebraic {
            let value: T = assignment.expr().eval(&env)?;
            env.bind(assignment.target().key().clone(), value);
        }
        Ok(env)
    }

    /// Values of the algebraic quantities at `state`.
    ///
    /// # Errors
    ///
    /// Returns an [`EvalError`] if an algebraic right-hand side fails.
    pub fn auxiliary<T: Scalar>(&self, state: &[T]) -> Result<BTreeMap<Arc<str>, T>, EvalError> {
        Ok(self.environment(state)?.into_auxiliary())
    }

    /// Rewrites `expr` over state variables only, inlining algebraic quantities.
    #[must_use]
    pub fn inline(&self, expr: &Expr) -> Expr {
        expr.substitute(&self.inlined)
    }

    /// Time derivative of `expr` along the flow of this mode.
    #[must_use]
    pub fn lie_derivative(&self, expr: &Expr) -> Expr {
        let expr = self.inline(expr);
        self.space
            .variables()
            .iter()
            .zip(&self.rates)
            .fold(Expr::zero(), |acc, (var, rate)| {
                let partial = expr.derivative(var.name());
                if partial.value() == Some(0.0) {
                    acc
                } else {
                    acc + partial * self.inline(rate)
                }
            })
    }
}

impl VectorField for Mode {
    fn space(&self) -> &Space {
        &self.space
    }

    fn derivative<T: Scalar>(&self, state: &[T]) -> Result<Vec<T>, EvalError> {
        let env = self.environment(state)?;
        self.rates.iter().map(|rate| rate.eval(&env)).collect()
    }
}

/// Orders algebraic assignments so that each follows the quantities it reads.
pub(super) fn order_algebraic(
    location: &CompositeLocation,
    assignments: Vec<AlgebraicAssignment>,
) -> Result<Vec<AlgebraicAssignment>, ConflictingDynamics> {
    let mut graph = DiGraph::<usize, ()>::new();

    let node_map: HashMap<&str, NodeIndex> = assignments
        .iter()
        .enumerate()
        .map(|(index, a)| (a.target().name(), graph.add_node(index)))
        .collect();

    for (to_index, assignment) in assignments.iter().enumerate() {
        for name in assignment.expr().variables() {
            if let Some(&from) = node_map.get(&*name) {
                graph.add_edge(from, NodeIndex::new(to_index), ());
            }
        }
    }

    match toposort(&graph, None) {
        Ok(order) => Ok(order
            .into_iter()
            .map(|node| assignments[graph[node]].clone())
            .collect()),
        Err(cycle) => {
            let start = cycle.node_id();
            let component = tarjan_scc(&graph)
                .into_iter()
                .find(|scc| scc.contains(&start))
                .unwrap_or_else(|| vec![start]);
            let mut quantities: Vec<Arc<str>> = component
                .into_iter()
                .map(|node| assignments[graph[node]].target().key().clone())
                .collect();
            quantities.sort();
            Err(ConflictingDynamics::AlgebraicLoop {
                location: location.to_string(),
                quantities,
            })
        }
    }
}
