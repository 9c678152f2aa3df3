mod builder;

use std::{
    collections::{BTreeMap, BTreeSet, HashMap},
    fmt,
    sync::Arc,
};

use braid_core::{Dynamics, Expr, Guard, ResetAssignment, Variable};

use crate::MalformedModel;

pub use builder::AtomicAutomatonBuilder;

/// Index of a location within its [`AtomicAutomaton`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LocationId(pub(crate) usize);

impl LocationId {
    #[must_use]
    pub fn index(self) -> usize {
        self.0
    }
}

/// Index of a transition within its [`AtomicAutomaton`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TransitionId(pub(crate) usize);

impl TransitionId {
    #[must_use]
    pub fn index(self) -> usize {
        self.0
    }
}

/// A discrete event label.
///
/// Events are identified by name. An event declared by two or more members
/// of a composition is shared, and its transitions fire synchronously.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Event(Arc<str>);

impl Event {
    pub fn new(name: impl Into<Arc<str>>) -> Self {
        Self(name.into())
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn key(&self) -> &Arc<str> {
        &self.0
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Whether an enabled transition must or may fire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// Fires as soon as its guard becomes true; flow may not continue past it.
    Urgent,
    /// May fire whenever its guard holds; flow may also continue.
    Permissive,
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventKind::Urgent => f.write_str("urgent"),
            EventKind::Permissive => f.write_str("permissive"),
        }
    }
}

/// A location: a discrete mode together with its dynamics and invariant.
#[derive(Debug, Clone, PartialEq)]
pub struct Location {
    name: Arc<str>,
    dynamics: Dynamics,
    invariant: Guard,
}

impl Location {
    pub fn new(name: impl Into<Arc<str>>, dynamics: Dynamics) -> Self {
        Self {
            name: name.into(),
            dynamics,
            invariant: Guard::True,
        }
    }

    /// Adds an invariant that must hold while the location is active.
    #[must_use]
    pub fn with_invariant(mut self, invariant: Guard) -> Self {
        self.invariant = self.invariant.and(invariant);
        self
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn dynamics(&self) -> &Dynamics {
        &self.dynamics
    }

    #[must_use]
    pub fn invariant(&self) -> &Guard {
        &self.invariant
    }

    pub(crate) fn key(&self) -> &Arc<str> {
        &self.name
    }
}

/// A transition declaration, with source and target locations given by name.
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub source: Arc<str>,
    pub event: Event,
    pub target: Arc<str>,
    pub reset: Vec<ResetAssignment>,
    pub guard: Guard,
    pub kind: EventKind,
}

impl Transition {
    pub fn new(
        source: impl Into<Arc<str>>,
        event: &Event,
        target: impl Into<Arc<str>>,
        reset: Vec<ResetAssignment>,
        guard: Guard,
        kind: EventKind,
    ) -> Self {
        Self {
            source: source.into(),
            event: event.clone(),
            target: target.into(),
            reset,
            guard,
            kind,
        }
    }
}

/// A validated transition stored in an [`AtomicAutomaton`].
#[derive(Debug, Clone, PartialEq)]
pub struct TransitionRecord {
    pub source: LocationId,
    pub event: Event,
    pub target: LocationId,
    pub reset: Vec<ResetAssignment>,
    pub guard: Guard,
    pub kind: EventKind,
}

/// A single hybrid automaton.
///
/// Locations and transitions live in arenas addressed by [`LocationId`] and
/// [`TransitionId`], with an adjacency list of outgoing transitions per
/// location. Construction validates the whole model; see [`MalformedModel`]
/// for what is rejected.
#[derive(Debug, Clone, PartialEq)]
pub struct AtomicAutomaton {
    name: Arc<str>,
    locations: Vec<Location>,
    events: Vec<Event>,
    transitions: Vec<TransitionRecord>,
    outgoing: Vec<Vec<TransitionId>>,
    location_index: HashMap<Arc<str>, LocationId>,
    state_variables: Vec<Variable>,
    auxiliary_variables: Vec<Variable>,
    constants: BTreeMap<Arc<str>, f64>,
}

impl AtomicAutomaton {
    /// Validates and builds an automaton.
    ///
    /// Duplicate event declarations are merged. Transitions keep their
    /// declaration order, which is also the order they are offered in.
    ///
    /// # Errors
    ///
    /// Returns a [`MalformedModel`] describing the first defect found.
    pub fn new(
        name: impl Into<Arc<str>>,
        locations: Vec<Location>,
        events: Vec<Event>,
        transitions: Vec<Transition>,
    ) -> Result<Self, MalformedModel> {
        let name: Arc<str> = name.into();

        if locations.is_empty() {
            return Err(MalformedModel::NoLocations { automaton: name });
        }

        let mut location_index = HashMap::with_capacity(locations.len());
        for (i, location) in locations.iter().enumerate() {
            if location_index
                .insert(location.key().clone(), LocationId(i))
                .is_some()
            {
                return Err(MalformedModel::DuplicateLocation {
                    automaton: name,
                    location: location.key().clone(),
                });
            }
        }

        let (state_variables, auxiliary_variables) = classify_quantities(&name, &locations)?;

        let mut declared = Vec::with_capacity(events.len());
        for event in events {
            if !declared.contains(&event) {
                declared.push(event);
            }
        }

        let mut records = Vec::with_capacity(transitions.len());
        let mut outgoing = vec![Vec::new(); locations.len()];
        for transition in transitions {
            let record = resolve_transition(&name, &location_index, &declared, transition)?;
            outgoing[record.source.0].push(TransitionId(records.len()));
            records.push(record);
        }

        let constants = collect_constants(&name, &locations, &records)?;

        Ok(Self {
            name,
            locations,
            events: declared,
            transitions: records,
            outgoing,
            location_index,
            state_variables,
            auxiliary_variables,
            constants,
        })
    }

    /// Starts an incremental [`AtomicAutomatonBuilder`].
    pub fn builder(name: impl Into<Arc<str>>) -> AtomicAutomatonBuilder {
        AtomicAutomatonBuilder::new(name)
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn key(&self) -> &Arc<str> {
        &self.name
    }

    #[must_use]
    pub fn locations(&self) -> &[Location] {
        &self.locations
    }

    #[must_use]
    pub fn location(&self, id: LocationId) -> &Location {
        &self.locations[id.0]
    }

    /// Looks up a location by name.
    #[must_use]
    pub fn location_id(&self, name: &str) -> Option<LocationId> {
        self.location_index.get(name).copied()
    }

    pub fn location_ids(&self) -> impl Iterator<Item = LocationId> + '_ {
        (0..self.locations.len()).map(LocationId)
    }

    #[must_use]
    pub fn events(&self) -> &[Event] {
        &self.events
    }

    #[must_use]
    pub fn declares(&self, event: &Event) -> bool {
        self.events.contains(event)
    }

    #[must_use]
    pub fn transitions(&self) -> &[TransitionRecord] {
        &self.transitions
    }

    #[must_use]
    pub fn transition(&self, id: TransitionId) -> &TransitionRecord {
        &self.transitions[id.0]
    }

    /// Returns the outgoing transitions of a location, in declaration order.
    #[must_use]
    pub fn outgoing(&self, location: LocationId) -> &[TransitionId] {
        &self.outgoing[location.0]
    }

    /// Transitions leaving `location` on `event`.
    pub fn outgoing_on<'a>(
        &'a self,
        location: LocationId,
        event: &'a Event,
    ) -> impl Iterator<Item = TransitionId> + 'a {
        self.outgoing[location.0]
            .iter()
            .copied()
            .filter(move |id| &self.transitions[id.0].event == event)
    }

    /// Variables with a differential assignment in some location.
    #[must_use]
    pub fn state_variables(&self) -> &[Variable] {
        &self.state_variables
    }

    /// Variables with an algebraic assignment in some location.
    #[must_use]
    pub fn auxiliary_variables(&self) -> &[Variable] {
        &self.auxiliary_variables
    }

    #[must_use]
    pub fn constants(&self) -> &BTreeMap<Arc<str>, f64> {
        &self.constants
    }

    /// Returns the transitions as name-based declarations.
    ///
    /// Feeding these back into [`AtomicAutomaton::new`] with the same
    /// locations and events rebuilds an identical automaton.
    #[must_use]
    pub fn declarations(&self) -> Vec<Transition> {
        self.transitions
            .iter()
            .map(|record| Transition {
                source: self.locations[record.source.0].key().clone(),
                event: record.event.clone(),
                target: self.locations[record.target.0].key().clone(),
                reset: record.reset.clone(),
                guard: record.guard.clone(),
                kind: record.kind,
            })
            .collect()
    }
}

/// Splits assigned quantities into state (differential) and auxiliary
/// (algebraic) variables, rejecting in-location duplicates and mixed roles.
fn classify_quantities(
    automaton: &Arc<str>,
    locations: &[Location],
) -> Result<(Vec<Variable>, Vec<Variable>), MalformedModel> {
    let mut state: Vec<Variable> = Vec::new();
    let mut auxiliary: Vec<Variable> = Vec::new();

    for location in locations {
        let mut algebraic = BTreeSet::new();
        for assignment in &location.dynamics.algebraic {
            let target = assignment.target();
            if !algebraic.insert(target.key().clone()) {
                return Err(MalformedModel::DuplicateAssignment {
                    automaton: automaton.clone(),
                    location: location.key().clone(),
                    quantity: target.key().clone(),
                    kind: "algebraic",
                });
            }
            if !auxiliary.contains(target) {
                auxiliary.push(target.clone());
            }
        }

        let mut differential = BTreeSet::new();
        for assignment in &location.dynamics.differential {
            let target = assignment.target();
            if !differential.insert(target.key().clone()) {
                return Err(MalformedModel::DuplicateAssignment {
                    automaton: automaton.clone(),
                    location: location.key().clone(),
                    quantity: target.key().clone(),
                    kind: "differential",
                });
            }
            if algebraic.contains(target.key()) {
                return Err(MalformedModel::ConflictingAssignment {
                    automaton: automaton.clone(),
                    location: location.key().clone(),
                    quantity: target.key().clone(),
                });
            }
            if !state.contains(target) {
                state.push(target.clone());
            }
        }
    }

    if let Some(mixed) = state.iter().find(|v| auxiliary.contains(*v)) {
        return Err(MalformedModel::MixedRole {
            automaton: automaton.clone(),
            quantity: mixed.key().clone(),
        });
    }

    Ok((state, auxiliary))
}

fn resolve_transition(
    automaton: &Arc<str>,
    location_index: &HashMap<Arc<str>, LocationId>,
    events: &[Event],
    transition: Transition,
) -> Result<TransitionRecord, MalformedModel> {
    let lookup = |name: &Arc<str>| {
        location_index
            .get(name)
            .copied()
            .ok_or_else(|| MalformedModel::UndeclaredLocation {
                automaton: automaton.clone(),
                location: name.clone(),
            })
    };
    let source = lookup(&transition.source)?;
    let target = lookup(&transition.target)?;

    if !events.contains(&transition.event) {
        return Err(MalformedModel::UndeclaredEvent {
            automaton: automaton.clone(),
            event: transition.event.key().clone(),
        });
    }

    let mut targets = BTreeSet::new();
    for assignment in &transition.reset {
        if !targets.insert(assignment.target().key().clone()) {
            return Err(MalformedModel::DuplicateReset {
                automaton: automaton.clone(),
                event: transition.event.key().clone(),
                quantity: assignment.target().key().clone(),
            });
        }
    }

    Ok(TransitionRecord {
        source,
        event: transition.event,
        target,
        reset: transition.reset,
        guard: transition.guard,
        kind: transition.kind,
    })
}

/// Collects every named constant, rejecting conflicting values and names
/// shared with a variable.
fn collect_constants(
    automaton: &Arc<str>,
    locations: &[Location],
    transitions: &[TransitionRecord],
) -> Result<BTreeMap<Arc<str>, f64>, MalformedModel> {
    let mut expressions: Vec<&Expr> = Vec::new();
    let mut variables: BTreeSet<Arc<str>> = BTreeSet::new();

    for location in locations {
        for assignment in &location.dynamics.algebraic {
            variables.insert(assignment.target().key().clone());
            expressions.push(assignment.expr());
        }
        for assignment in &location.dynamics.differential {
            variables.insert(assignment.target().key().clone());
            expressions.push(assignment.expr());
        }
        expressions.extend(location.invariant.expressions());
    }
    for transition in transitions {
        for assignment in &transition.reset {
            variables.insert(assignment.target().key().clone());
            expressions.push(assignment.expr());
        }
        expressions.extend(transition.guard.expressions());
    }
    for expr in &expressions {
        variables.extend(expr.variables());
    }

    let mut constants: BTreeMap<Arc<str>, f64> = BTreeMap::new();
    for constant in expressions.iter().flat_map(|expr| expr.constants()) {
        let clash = || MalformedModel::NameClash {
            automaton: automaton.clone(),
            quantity: Arc::from(constant.name()),
        };
        if variables.contains(constant.name()) {
            return Err(clash());
        }
        match constants.get(constant.name()) {
            Some(&value) if value.to_bits() != constant.value().to_bits() => return Err(clash()),
            Some(_) => {}
            None => {
                constants.insert(Arc::from(constant.name()), constant.value());
            }
        }
    }

    Ok(constants)
}

impl fmt::Display for AtomicAutomaton {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}:", self.name)?;
        for (i, location) in self.locations.iter().enumerate() {
            writeln!(f, "  location {}:", location.name)?;
            for assignment in &location.dynamics.algebraic {
                writeln!(f, "    {assignment}")?;
            }
            for assignment in &location.dynamics.differential {
                writeln!(f, "    {assignment}")?;
            }
            if location.invariant != Guard::True {
                writeln!(f, "    invariant {}", location.invariant)?;
            }
            for id in &self.outgoing[i] {
                let transition = &self.transitions[id.0];
                write!(
                    f,
                    "    {} -> {} when {} ({})",
                    transition.event,
                    self.locations[transition.target.0].name,
                    transition.guard,
                    transition.kind,
                )?;
                for assignment in &transition.reset {
                    write!(f, " {assignment}")?;
                }
                writeln!(f)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use braid_core::{Constant, dot, dots, let_, next};

    fn counter() -> AtomicAutomaton {
        let x = Variable::new("x");
        let tick = Event::new("tick");
        let rate = Constant::new("rate", 2.0);

        AtomicAutomaton::builder("counter")
            .new_mode("up", Dynamics::from(vec![dot(&x).be(&rate)]))
            .new_mode("down", Dynamics::from(vec![dot(&x).be(-rate.clone())]))
            .new_transition(
                "up",
                &tick,
                "down",
                vec![next(&x).be(&x)],
                Guard::geq(&x, 1.0),
                EventKind::Urgent,
            )
            .new_transition(
                "down",
                &tick,
                "up",
                vec![],
                Guard::leq(&x, 0.0),
                EventKind::Permissive,
            )
            .build()
            .unwrap()
    }

    #[test]
    fn arena_layout() {
        let automaton = counter();

        assert_eq!(automaton.locations().len(), 2);
        assert_eq!(automaton.events(), &[Event::new("tick")]);

        let up = automaton.location_id("up").unwrap();
        let down = automaton.location_id("down").unwrap();
        assert_eq!(automaton.outgoing(up), &[TransitionId(0)]);
        assert_eq!(automaton.outgoing(down), &[TransitionId(1)]);
        assert_eq!(automaton.transition(TransitionId(0)).target, down);

        assert_eq!(automaton.state_variables(), &[Variable::new("x")]);
        assert!(automaton.auxiliary_variables().is_empty());
        assert_eq!(automaton.constants().get("rate"), Some(&2.0));
    }

    #[test]
    fn declarations_rebuild_the_same_automaton() {
        let automaton = counter();

        let rebuilt = AtomicAutomaton::new(
            automaton.name(),
            automaton.locations().to_vec(),
            automaton.events().to_vec(),
            automaton.declarations(),
        )
        .unwrap();

        assert_eq!(rebuilt, automaton);
    }

    #[test]
    fn rejects_empty_automaton() {
        let result = AtomicAutomaton::new("empty", vec![], vec![], vec![]);
        assert!(matches!(result, Err(MalformedModel::NoLocations { .. })));
    }

    #[test]
    fn rejects_duplicate_location() {
        let result = AtomicAutomaton::builder("twice")
            .new_mode("a", Dynamics::new())
            .new_mode("a", Dynamics::new())
            .build();
        assert!(matches!(
            result,
            Err(MalformedModel::DuplicateLocation { location, .. }) if &*location == "a"
        ));
    }

    #[test]
    fn rejects_duplicate_assignment() {
        let x = Variable::new("x");
        let result = AtomicAutomaton::builder("dup")
            .new_mode(
                "a",
                Dynamics::from(dots(&[&x, &x], [Expr::literal(1.0), Expr::literal(2.0)])),
            )
            .build();
        assert!(matches!(
            result,
            Err(MalformedModel::DuplicateAssignment { kind: "differential", .. })
        ));
    }

    #[test]
    fn rejects_algebraic_and_differential_in_one_location() {
        let x = Variable::new("x");
        let dynamics = Dynamics::new()
            .with_algebraic([let_(&x).be(1.0)])
            .with_differential([dot(&x).be(0.0)]);
        let result = AtomicAutomaton::builder("both")
            .new_mode("a", dynamics)
            .build();
        assert!(matches!(
            result,
            Err(MalformedModel::ConflictingAssignment { .. })
        ));
    }

    #[test]
    fn rejects_mixed_roles_across_locations() {
        let x = Variable::new("x");
        let result = AtomicAutomaton::builder("mixed")
            .new_mode("a", Dynamics::from(vec![dot(&x).be(1.0)]))
            .new_mode("b", Dynamics::from(vec![let_(&x).be(1.0)]))
            .build();
        assert!(matches!(result, Err(MalformedModel::MixedRole { .. })));
    }

    #[test]
    fn rejects_undeclared_location_and_event() {
        let go = Event::new("go");
        let result = AtomicAutomaton::builder("dangling")
            .new_mode("a", Dynamics::new())
            .new_transition("a", &go, "b", vec![], Guard::True, EventKind::Urgent)
            .build();
        assert!(matches!(
            result,
            Err(MalformedModel::UndeclaredLocation { location, .. }) if &*location == "b"
        ));

        let result = AtomicAutomaton::new(
            "silent",
            vec![Location::new("a", Dynamics::new())],
            vec![],
            vec![Transition::new(
                "a",
                &go,
                "a",
                vec![],
                Guard::True,
                EventKind::Urgent,
            )],
        );
        assert!(matches!(result, Err(MalformedModel::UndeclaredEvent { .. })));
    }

    #[test]
    fn rejects_duplicate_reset() {
        let x = Variable::new("x");
        let go = Event::new("go");
        let result = AtomicAutomaton::builder("resets")
            .new_mode("a", Dynamics::from(vec![dot(&x).be(1.0)]))
            .new_transition(
                "a",
                &go,
                "a",
                vec![next(&x).be(0.0), next(&x).be(1.0)],
                Guard::True,
                EventKind::Urgent,
            )
            .build();
        assert!(matches!(result, Err(MalformedModel::DuplicateReset { .. })));
    }

    #[test]
    fn rejects_constant_clashes() {
        let x = Variable::new("x");
        let result = AtomicAutomaton::builder("clash")
            .new_mode("a", Dynamics::from(vec![dot(&x).be(Constant::new("x", 1.0))]))
            .build();
        assert!(matches!(result, Err(MalformedModel::NameClash { .. })));

        let result = AtomicAutomaton::builder("values")
            .new_mode(
                "a",
                Dynamics::from(vec![dot(&x).be(Constant::new("k", 1.0) + Constant::new("k", 2.0))]),
            )
            .build();
        assert!(matches!(result, Err(MalformedModel::NameClash { .. })));
    }

    #[test]
    fn display_lists_modes_and_transitions() {
        let text = counter().to_string();
        assert!(text.starts_with("counter:"));
        assert!(text.contains("dot(x)=rate"));
        assert!(text.contains("tick -> down when x>=1 (urgent) next(x)=x"));
    }
}
