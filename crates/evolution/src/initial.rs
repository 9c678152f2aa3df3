use std::{collections::BTreeMap, sync::Arc};

use braid_automata::{CompositeAutomaton, CompositeLocation};
use braid_core::{Enclosure, Interval, Variable};

use crate::Error;

/// An initial hybrid set: one composite location and a box over the
/// composite state space.
///
/// The box is described by per-variable constraints. A value pins a
/// variable to a point, an [`Interval`] bounds it; repeated constraints on
/// the same variable intersect. Every state variable of the composite must
/// be constrained.
///
/// ```
/// use braid_core::{Interval, Variable};
/// use braid_evolution::HybridSet;
///
/// let x = Variable::new("x");
/// let set = HybridSet::new(&[("clock", "run")])
///     .with(&x, 0.0)
///     .with(&x, Interval::new(-1.0, 1.0).unwrap());
/// assert_eq!(set.constraints().count(), 2);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct HybridSet {
    location: Vec<(Arc<str>, Arc<str>)>,
    constraints: Vec<(Variable, Interval)>,
}

impl HybridSet {
    /// Starts a set in the location given by `(automaton, location)` pairs.
    #[must_use]
    pub fn new(location: &[(&str, &str)]) -> Self {
        Self {
            location: location
                .iter()
                .map(|&(automaton, name)| (Arc::from(automaton), Arc::from(name)))
                .collect(),
            constraints: Vec::new(),
        }
    }

    /// Adds a constraint on `variable`.
    #[must_use]
    pub fn with(mut self, variable: &Variable, bounds: impl Into<Interval>) -> Self {
        self.constraints.push((variable.clone(), bounds.into()));
        self
    }

    pub fn location(&self) -> impl Iterator<Item = (&str, &str)> + '_ {
        self.location.iter().map(|(a, l)| (&**a, &**l))
    }

    pub fn constraints(&self) -> impl Iterator<Item = (&Variable, Interval)> + '_ {
        self.constraints.iter().map(|(v, b)| (v, *b))
    }

    /// Resolves the set against `system`.
    ///
    /// # Errors
    ///
    /// Fails if the location cannot be resolved, a constraint names a
    /// quantity that is not a state variable, a state variable is left
    /// unconstrained, or the constraints on one variable are disjoint.
    pub fn resolve(
        &self,
        system: &CompositeAutomaton,
    ) -> Result<(CompositeLocation, Enclosure), Error> {
        let pairs: Vec<(&str, &str)> = self.location().collect();
        let location = system.location(&pairs)?;

        let space = system.state_space();
        let mut bounds: BTreeMap<&str, Interval> = BTreeMap::new();
        for (variable, constraint) in &self.constraints {
            if !space.contains(variable.name()) {
                return Err(Error::NotAStateVariable {
                    name: variable.key().clone(),
                });
            }
            let merged = match bounds.get(variable.name()) {
                Some(existing) => existing.intersection(constraint).ok_or_else(|| {
                    Error::EmptyConstraint {
                        name: variable.key().clone(),
                    }
                })?,
                None => *constraint,
            };
            bounds.insert(variable.name(), merged);
        }

        let mut state = Vec::with_capacity(space.len());
        for variable in space.variables() {
            let value = bounds
                .get(variable.name())
                .ok_or_else(|| Error::Unconstrained {
                    name: variable.key().clone(),
                })?;
            state.push(*value);
        }

        Ok((location, Enclosure::new(Arc::clone(space), state)?))
    }
}
