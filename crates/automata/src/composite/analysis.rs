use std::collections::{HashMap, VecDeque};

use braid_core::{Dynamics, Guard};
use petgraph::{
    graph::{DiGraph, NodeIndex},
    visit::EdgeRef,
};
use tracing::debug;

use super::{CompositeAutomaton, CompositeLocation};
use crate::{AtomicAutomaton, Error, Event, Location, LocationId, Transition};

/// The discrete skeleton of a composite automaton: reachable locations and
/// the events connecting them, with guards ignored.
#[derive(Debug, Clone, Default)]
pub struct DiscreteGraph {
    graph: DiGraph<CompositeLocation, Event>,
    index: HashMap<CompositeLocation, NodeIndex>,
}

impl DiscreteGraph {
    fn node(&mut self, location: CompositeLocation) -> (NodeIndex, bool) {
        if let Some(&node) = self.index.get(&location) {
            return (node, false);
        }
        let node = self.graph.add_node(location.clone());
        self.index.insert(location, node);
        (node, true)
    }

    #[must_use]
    pub fn graph(&self) -> &DiGraph<CompositeLocation, Event> {
        &self.graph
    }

    /// Reachable locations, in discovery order.
    pub fn locations(&self) -> impl Iterator<Item = &CompositeLocation> + '_ {
        self.graph.node_weights()
    }

    #[must_use]
    pub fn contains(&self, location: &CompositeLocation) -> bool {
        self.index.contains_key(location)
    }

    /// `(source, event, target)` triples, in discovery order.
    pub fn edges(
        &self,
    ) -> impl Iterator<Item = (&CompositeLocation, &Event, &CompositeLocation)> + '_ {
        self.graph.edge_references().map(|edge| {
            (
                &self.graph[edge.source()],
                edge.weight(),
                &self.graph[edge.target()],
            )
        })
    }

    #[must_use]
    pub fn location_count(&self) -> usize {
        self.graph.node_count()
    }

    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }
}

impl CompositeAutomaton {
    /// Explores every composite location reachable from `initial` through
    /// transitions, ignoring guards and continuous state.
    pub fn discrete_reachability(
        &self,
        initial: impl IntoIterator<Item = CompositeLocation>,
    ) -> DiscreteGraph {
        let mut reached = DiscreteGraph::default();
        let mut queue = VecDeque::new();

        for location in initial {
            let (node, fresh) = reached.node(location.clone());
            if fresh {
                queue.push_back((node, location));
            }
        }

        while let Some((source, location)) = queue.pop_front() {
            for transition in self.transitions_from(&location) {
                let (target, fresh) = reached.node(transition.target.clone());
                reached.graph.add_edge(source, target, transition.event);
                if fresh {
                    queue.push_back((target, transition.target));
                }
            }
        }

        debug!(
            locations = reached.location_count(),
            transitions = reached.edge_count(),
            "discrete reachability",
        );
        reached
    }

    /// Builds the full product as a single atomic automaton named `name`.
    ///
    /// Product locations are named by joining member location names with
    /// `|`, in member order; events keep their names. Composing the result
    /// with further automata behaves like composing the members directly.
    ///
    /// # Errors
    ///
    /// Returns an error if the product cannot be validated as an atomic
    /// automaton, which signals a conflict between members.
    pub fn flatten(&self, name: &str) -> Result<AtomicAutomaton, Error> {
        let mut locations = Vec::new();
        let mut transitions = Vec::new();

        for ids in self.product() {
            let location = self.location_from_ids(ids);
            let label = product_name(&location);

            let mut dynamics = Dynamics::new();
            let mut invariants = Vec::new();
            for (member, component) in self.components.iter().enumerate() {
                let local = component.location(location.local(member));
                dynamics = dynamics
                    .with_algebraic(local.dynamics().algebraic.iter().cloned())
                    .with_differential(local.dynamics().differential.iter().cloned());
                invariants.push(local.invariant().clone());
            }
            locations.push(Location::new(label.clone(), dynamics).with_invariant(Guard::all(invariants)));

            for transition in self.transitions_from(&location) {
                transitions.push(Transition::new(
                    label.clone(),
                    &transition.event,
                    product_name(&transition.target),
                    transition.reset,
                    transition.guard,
                    transition.kind,
                ));
            }
        }

        let events = self.events().cloned().collect();
        Ok(AtomicAutomaton::new(name, locations, events, transitions)?)
    }

    /// Every tuple of member location ids, in lexicographic order.
    fn product(&self) -> Vec<Vec<LocationId>> {
        self.components.iter().fold(vec![Vec::new()], |tuples, component| {
            tuples
                .into_iter()
                .flat_map(|prefix| {
                    component.location_ids().map(move |id| {
                        let mut tuple = prefix.clone();
                        tuple.push(id);
                        tuple
                    })
                })
                .collect()
        })
    }
}

fn product_name(location: &CompositeLocation) -> String {
    location
        .labels()
        .map(|(_, name)| name)
        .collect::<Vec<_>>()
        .join("|")
}
