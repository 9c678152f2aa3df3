mod analysis;
mod location;
mod mode;
mod transition;

use std::{
    collections::{BTreeMap, BTreeSet},
    fmt,
    sync::Arc,
};

use braid_core::{Expr, Guard, Space, Variable};
use tracing::debug;

use crate::{
    AtomicAutomaton, ConflictingDynamics, Error, Event, EventKind, Location, LocationId,
    MalformedModel, TransitionId,
};

pub use analysis::DiscreteGraph;
pub use location::CompositeLocation;
pub use mode::Mode;
pub use transition::{CompositeTransition, TransitionKey};

/// The synchronized product of atomic automata.
///
/// Locations are never enumerated up front: [`mode`](Self::mode) and
/// [`transitions`](Self::transitions) instantiate a composite location only
/// when asked, so the cost tracks what evolution actually reaches.
#[derive(Debug, Clone)]
pub struct CompositeAutomaton {
    components: Vec<AtomicAutomaton>,
    participants: BTreeMap<Event, Vec<usize>>,
    space: Arc<Space>,
    auxiliary: Vec<Variable>,
}

/// Composes atomic automata into a [`CompositeAutomaton`].
///
/// # Errors
///
/// Returns [`MalformedModel::DuplicateAutomaton`] if two members share a
/// name, or a [`ConflictingDynamics`] if members define the same quantity,
/// reset the same quantity on a shared event, or reset a quantity that is
/// not a state variable.
pub fn compose(components: Vec<AtomicAutomaton>) -> Result<CompositeAutomaton, Error> {
    CompositeAutomaton::new(components)
}

impl CompositeAutomaton {
    /// See [`compose`].
    ///
    /// # Errors
    ///
    /// See [`compose`].
    pub fn new(components: Vec<AtomicAutomaton>) -> Result<Self, Error> {
        let mut names = BTreeSet::new();
        for component in &components {
            if !names.insert(component.key().clone()) {
                return Err(MalformedModel::DuplicateAutomaton {
                    automaton: component.key().clone(),
                }
                .into());
            }
        }

        check_definitions(&components)?;

        let mut participants: BTreeMap<Event, Vec<usize>> = BTreeMap::new();
        for (index, component) in components.iter().enumerate() {
            for event in component.events() {
                participants.entry(event.clone()).or_default().push(index);
            }
        }

        check_shared_resets(&components, &participants)?;

        let space = Arc::new(Space::new(
            components
                .iter()
                .flat_map(|c| c.state_variables().iter().cloned()),
        ));

        let mut auxiliary: Vec<Variable> = Vec::new();
        for variable in components.iter().flat_map(|c| c.auxiliary_variables()) {
            if !auxiliary.contains(variable) {
                auxiliary.push(variable.clone());
            }
        }

        for component in &components {
            for transition in component.transitions() {
                for assignment in &transition.reset {
                    if !space.contains(assignment.target().name()) {
                        return Err(ConflictingDynamics::NonStateReset {
                            automaton: component.key().clone(),
                            event: transition.event.key().clone(),
                            quantity: assignment.target().key().clone(),
                        }
                        .into());
                    }
                }
            }
        }

        debug!(
            members = components.len(),
            state = space.len(),
            auxiliary = auxiliary.len(),
            shared = participants.values().filter(|p| p.len() > 1).count(),
            "composed automaton",
        );

        Ok(Self {
            components,
            participants,
            space,
            auxiliary,
        })
    }

    #[must_use]
    pub fn components(&self) -> &[AtomicAutomaton] {
        &self.components
    }

    /// Decomposes into the member automata, in composition order.
    #[must_use]
    pub fn into_components(self) -> Vec<AtomicAutomaton> {
        self.components
    }

    #[must_use]
    pub fn component(&self, name: &str) -> Option<&AtomicAutomaton> {
        self.components.iter().find(|c| c.name() == name)
    }

    #[must_use]
    pub fn member_index(&self, name: &str) -> Option<usize> {
        self.components.iter().position(|c| c.name() == name)
    }

    /// The state space: every variable some member integrates.
    #[must_use]
    pub fn state_space(&self) -> &Arc<Space> {
        &self.space
    }

    /// Variables defined algebraically by some member.
    #[must_use]
    pub fn auxiliary_variables(&self) -> &[Variable] {
        &self.auxiliary
    }

    /// Every declared event.
    pub fn events(&self) -> impl Iterator<Item = &Event> + '_ {
        self.participants.keys()
    }

    /// Indices of the members that declare `event`.
    #[must_use]
    pub fn participants(&self, event: &Event) -> &[usize] {
        self.participants.get(event).map_or(&[], Vec::as_slice)
    }

    /// Whether `event` is declared by more than one member.
    #[must_use]
    pub fn is_shared(&self, event: &Event) -> bool {
        self.participants(event).len() > 1
    }

    /// Whether `location` is a location of this composite: one valid
    /// location per member, labelled with this composite's names.
    #[must_use]
    pub fn contains(&self, location: &CompositeLocation) -> bool {
        location.ids().len() == self.components.len()
            && self
                .components
                .iter()
                .zip(location.ids())
                .zip(location.labels())
                .all(|((component, id), (automaton, name))| {
                    component.name() == automaton
                        && component
                            .locations()
                            .get(id.index())
                            .is_some_and(|local| local.name() == name)
                })
    }

    fn check(&self, location: &CompositeLocation) -> Result<(), Error> {
        if self.contains(location) {
            Ok(())
        } else {
            Err(Error::ForeignLocation {
                location: location.to_string(),
            })
        }
    }

    /// Resolves a composite location from `(automaton, location)` names.
    ///
    /// # Errors
    ///
    /// Fails if a name is unknown or a member has no location given.
    pub fn location(&self, pairs: &[(&str, &str)]) -> Result<CompositeLocation, Error> {
        for (automaton, _) in pairs {
            if self.component(automaton).is_none() {
                return Err(Error::UnknownAutomaton {
                    automaton: Arc::from(*automaton),
                });
            }
        }

        let mut ids = Vec::with_capacity(self.components.len());
        for component in &self.components {
            let Some((_, name)) = pairs.iter().find(|(a, _)| *a == component.name()) else {
                return Err(Error::MissingLocation {
                    automaton: component.key().clone(),
                });
            };
            let id = component
                .location_id(name)
                .ok_or_else(|| Error::UnknownLocation {
                    automaton: component.key().clone(),
                    location: Arc::from(*name),
                })?;
            ids.push(id);
        }
        Ok(self.location_from_ids(ids))
    }

    pub(crate) fn location_from_ids(&self, ids: Vec<LocationId>) -> CompositeLocation {
        let labels = self
            .components
            .iter()
            .zip(&ids)
            .map(|(c, &id)| (c.key().clone(), c.location(id).key().clone()))
            .collect();
        CompositeLocation::new(ids, labels)
    }

    /// The location `automaton` occupies within `location`, or `None` if
    /// either does not belong to this composite.
    #[must_use]
    pub fn project<'a>(
        &'a self,
        location: &CompositeLocation,
        automaton: &str,
    ) -> Option<&'a Location> {
        if !self.contains(location) {
            return None;
        }
        let member = self.member_index(automaton)?;
        Some(self.components[member].location(location.local(member)))
    }

    /// Outgoing transitions of a composite location, in declaration order.
    ///
    /// Members are visited in composition order and their transitions in
    /// declaration order. A shared event is emitted at its first
    /// participant, once per combination of participant transitions, and is
    /// blocked if some participant has no transition on it here.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ForeignLocation`] if `location` does not belong to
    /// this composite.
    pub fn transitions(
        &self,
        location: &CompositeLocation,
    ) -> Result<Vec<CompositeTransition>, Error> {
        self.check(location)?;
        Ok(self.transitions_from(location))
    }

    pub(crate) fn transitions_from(&self, location: &CompositeLocation) -> Vec<CompositeTransition> {
        let mut result = Vec::new();

        for (member, component) in self.components.iter().enumerate() {
            for &id in component.outgoing(location.local(member)) {
                let event = &component.transition(id).event;
                let participants = self.participants(event);

                if participants.len() <= 1 {
                    result.push(self.synchronize(location, event, &[(member, id)]));
                    continue;
                }
                if participants[0] != member {
                    continue;
                }

                let mut combinations: Vec<Vec<(usize, TransitionId)>> = vec![vec![(member, id)]];
                for &other in &participants[1..] {
                    let choices: Vec<TransitionId> = self.components[other]
                        .outgoing_on(location.local(other), event)
                        .collect();
                    combinations = combinations
                        .into_iter()
                        .flat_map(|prefix| {
                            choices.iter().map(move |&choice| {
                                let mut next = prefix.clone();
                                next.push((other, choice));
                                next
                            })
                        })
                        .collect();
                }

                result.extend(
                    combinations
                        .iter()
                        .map(|parts| self.synchronize(location, event, parts)),
                );
            }
        }

        result
    }

    fn synchronize(
        &self,
        source: &CompositeLocation,
        event: &Event,
        participants: &[(usize, TransitionId)],
    ) -> CompositeTransition {
        let mut ids = source.ids().to_vec();
        let mut guards = Vec::with_capacity(participants.len());
        let mut reset = Vec::new();
        let mut kind = EventKind::Permissive;

        for &(member, id) in participants {
            let record = self.components[member].transition(id);
            ids[member] = record.target;
            guards.push(record.guard.clone());
            reset.extend(record.reset.iter().cloned());
            if record.kind == EventKind::Urgent {
                kind = EventKind::Urgent;
            }
        }

        CompositeTransition {
            event: event.clone(),
            kind,
            target: self.location_from_ids(ids),
            guard: Guard::all(guards),
            reset,
            participants: participants.to_vec(),
        }
    }

    /// Instantiates the dynamics of a composite location.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ForeignLocation`] if `location` does not belong to
    /// this composite, [`ConflictingDynamics::AlgebraicLoop`] if the merged
    /// algebraic assignments depend on each other cyclically, or
    /// [`ConflictingDynamics::UndefinedQuantity`] if the dynamics, invariant,
    /// or an outgoing transition reads a quantity that nothing defines here.
    pub fn mode(&self, location: &CompositeLocation) -> Result<Mode, Error> {
        self.check(location)?;
        let mut algebraic = Vec::new();
        let mut differential: BTreeMap<Arc<str>, Expr> = BTreeMap::new();
        let mut invariants = Vec::with_capacity(self.components.len());

        for (member, component) in self.components.iter().enumerate() {
            let local = component.location(location.local(member));
            algebraic.extend(local.dynamics().algebraic.iter().cloned());
            for assignment in &local.dynamics().differential {
                differential.insert(assignment.target().key().clone(), assignment.expr().clone());
            }
            invariants.push(local.invariant().clone());
        }

        let algebraic = mode::order_algebraic(location, algebraic)?;
        let rates: Vec<Expr> = self
            .space
            .variables()
            .iter()
            .map(|var| differential.remove(var.name()).unwrap_or_else(Expr::zero))
            .collect();
        let invariant = Guard::all(invariants);
        let transitions = self.transitions_from(location);

        let mut defined: BTreeSet<&str> = self.space.variables().iter().map(Variable::name).collect();
        defined.extend(algebraic.iter().map(|a| a.target().name()));

        let mut reads: Vec<&Expr> = Vec::new();
        reads.extend(algebraic.iter().map(|a| a.expr()));
        reads.extend(&rates);
        reads.extend(invariant.expressions());
        for transition in &transitions {
            reads.extend(transition.guard.expressions());
            reads.extend(transition.reset.iter().map(|r| r.expr()));
        }
        for expr in reads {
            if let Some(missing) = expr.variables().into_iter().find(|v| !defined.contains(&**v)) {
                return Err(ConflictingDynamics::UndefinedQuantity {
                    location: location.to_string(),
                    quantity: missing,
                }
                .into());
            }
        }

        Ok(Mode::new(
            location.clone(),
            Arc::clone(&self.space),
            algebraic,
            rates,
            invariant,
            transitions,
        ))
    }
}

/// Rejects quantities defined (algebraically or differentially) by more
/// than one member.
///
/// Any pair of member locations can be active together, so an overlap in
/// defined quantities anywhere is a conflict.
fn check_definitions(components: &[AtomicAutomaton]) -> Result<(), ConflictingDynamics> {
    let mut owners: BTreeMap<Arc<str>, String> = BTreeMap::new();

    for component in components {
        let mut own: BTreeMap<Arc<str>, String> = BTreeMap::new();
        for location in component.locations() {
            let dynamics = location.dynamics();
            let targets = dynamics
                .algebraic
                .iter()
                .map(|a| a.target())
                .chain(dynamics.differential.iter().map(|d| d.target()));
            for target in targets {
                let label = format!("{}|{}", component.name(), location.name());
                if let Some(first) = owners.get(target.key()) {
                    return Err(ConflictingDynamics::SharedDefinition {
                        quantity: target.key().clone(),
                        first: first.clone(),
                        second: label,
                    });
                }
                own.entry(target.key().clone()).or_insert(label);
            }
        }
        owners.extend(own);
    }

    Ok(())
}

/// Rejects two members resetting the same quantity on a shared event.
fn check_shared_resets(
    components: &[AtomicAutomaton],
    participants: &BTreeMap<Event, Vec<usize>>,
) -> Result<(), ConflictingDynamics> {
    for (event, members) in participants.iter().filter(|(_, m)| m.len() > 1) {
        let mut resetters: BTreeMap<Arc<str>, Arc<str>> = BTreeMap::new();
        for &member in members {
            let component = &components[member];
            let targets: BTreeSet<Arc<str>> = component
                .transitions()
                .iter()
                .filter(|t| &t.event == event)
                .flat_map(|t| t.reset.iter().map(|r| r.target().key().clone()))
                .collect();
            for target in targets {
                if let Some(first) = resetters.get(&target) {
                    return Err(ConflictingDynamics::SharedReset {
                        event: event.key().clone(),
                        quantity: target,
                        first: first.clone(),
                        second: component.key().clone(),
                    });
                }
                resetters.insert(target, component.key().clone());
            }
        }
    }
    Ok(())
}

impl fmt::Display for CompositeAutomaton {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for component in &self.components {
            write!(f, "{component}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests;
