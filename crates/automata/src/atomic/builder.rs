use std::sync::Arc;

use braid_core::{Dynamics, Guard, ResetAssignment};

use super::{AtomicAutomaton, Event, EventKind, Location, Transition};
use crate::MalformedModel;

/// Builds an [`AtomicAutomaton`] one declaration at a time.
///
/// Events used by [`new_transition`](Self::new_transition) are declared
/// implicitly; [`new_event`](Self::new_event) declares an event that has no
/// transitions here but must still synchronize with other members.
/// Validation is deferred to [`build`](Self::build).
#[derive(Debug, Clone)]
pub struct AtomicAutomatonBuilder {
    name: Arc<str>,
    locations: Vec<Location>,
    events: Vec<Event>,
    transitions: Vec<Transition>,
    invariants: Vec<(Arc<str>, Guard)>,
}

impl AtomicAutomatonBuilder {
    pub fn new(name: impl Into<Arc<str>>) -> Self {
        Self {
            name: name.into(),
            locations: Vec::new(),
            events: Vec::new(),
            transitions: Vec::new(),
            invariants: Vec::new(),
        }
    }

    /// Declares a location with the given dynamics.
    #[must_use]
    pub fn new_mode(mut self, name: impl Into<Arc<str>>, dynamics: Dynamics) -> Self {
        self.locations.push(Location::new(name, dynamics));
        self
    }

    /// Declares a fully specified location.
    #[must_use]
    pub fn new_location(mut self, location: Location) -> Self {
        self.locations.push(location);
        self
    }

    /// Conjoins `invariant` onto a location's invariant.
    ///
    /// The location may be declared before or after this call.
    #[must_use]
    pub fn new_invariant(mut self, location: impl Into<Arc<str>>, invariant: Guard) -> Self {
        self.invariants.push((location.into(), invariant));
        self
    }

    #[must_use]
    pub fn new_event(mut self, event: &Event) -> Self {
        self.declare(event);
        self
    }

    /// Declares a transition, declaring its event if needed.
    #[must_use]
    pub fn new_transition(
        mut self,
        source: impl Into<Arc<str>>,
        event: &Event,
        target: impl Into<Arc<str>>,
        reset: Vec<ResetAssignment>,
        guard: Guard,
        kind: EventKind,
    ) -> Self {
        self.declare(event);
        self.transitions
            .push(Transition::new(source, event, target, reset, guard, kind));
        self
    }

    fn declare(&mut self, event: &Event) {
        if !self.events.contains(event) {
            self.events.push(event.clone());
        }
    }

    /// Validates the declarations.
    ///
    /// # Errors
    ///
    /// Returns a [`MalformedModel`] if the declarations do not form a valid
    /// automaton.
    pub fn build(mut self) -> Result<AtomicAutomaton, MalformedModel> {
        for (name, invariant) in self.invariants {
            let Some(location) = self.locations.iter_mut().find(|l| *l.key() == name) else {
                return Err(MalformedModel::UndeclaredLocation {
                    automaton: self.name,
                    location: name,
                });
            };
            let current = std::mem::take(&mut location.invariant);
            location.invariant = current.and(invariant);
        }
        AtomicAutomaton::new(self.name, self.locations, self.events, self.transitions)
    }
}
