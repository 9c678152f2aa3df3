use std::{
    collections::{BTreeMap, HashMap},
    fmt,
    sync::Arc,
};

use crate::{Interval, SpaceError, Variable};

/// A source of values for named quantities.
pub trait Valuation<T> {
    /// Returns the value bound to `name`, if any.
    fn value(&self, name: &str) -> Option<T>;
}

impl<T: Clone> Valuation<T> for BTreeMap<Arc<str>, T> {
    fn value(&self, name: &str) -> Option<T> {
        self.get(name).cloned()
    }
}

impl<T: Clone> Valuation<T> for HashMap<Arc<str>, T> {
    fn value(&self, name: &str) -> Option<T> {
        self.get(name).cloned()
    }
}

/// An ordered set of variables defining the coordinates of a state vector.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Space {
    variables: Vec<Variable>,
    index: HashMap<Arc<str>, usize>,
}

impl Space {
    /// Creates a space from variables, keeping the first occurrence of each name.
    pub fn new(variables: impl IntoIterator<Item = Variable>) -> Self {
        let mut space = Self::default();
        for var in variables {
            if !space.index.contains_key(var.name()) {
                space.index.insert(var.key().clone(), space.variables.len());
                space.variables.push(var);
            }
        }
        space
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.variables.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }

    #[must_use]
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    #[must_use]
    pub fn variables(&self) -> &[Variable] {
        &self.variables
    }
}

/// A box over a [`Space`]: one [`Interval`] per coordinate.
///
/// An enclosure is the guaranteed bounding representation of a set of
/// continuous states. A point enclosure (every interval degenerate)
/// represents a single concrete state.
#[derive(Debug, Clone, PartialEq)]
pub struct Enclosure {
    space: Arc<Space>,
    bounds: Vec<Interval>,
}

impl Enclosure {
    /// Creates an enclosure from one interval per space coordinate.
    ///
    /// # Errors
    ///
    /// Returns [`SpaceError::DimensionMismatch`] if the number of bounds
    /// differs from the dimension of the space.
    pub fn new(space: Arc<Space>, bounds: Vec<Interval>) -> Result<Self, SpaceError> {
        if space.len() != bounds.len() {
            return Err(SpaceError::DimensionMismatch {
                expected: space.len(),
                actual: bounds.len(),
            });
        }
        Ok(Self { space, bounds })
    }

    /// Creates a point enclosure from one value per space coordinate.
    ///
    /// # Errors
    ///
    /// Returns [`SpaceError::DimensionMismatch`] on a length mismatch.
    pub fn point(space: Arc<Space>, values: &[f64]) -> Result<Self, SpaceError> {
        Self::new(space, values.iter().copied().map(Interval::point).collect())
    }

    #[must_use]
    pub fn space(&self) -> &Arc<Space> {
        &self.space
    }

    #[must_use]
    pub fn bounds(&self) -> &[Interval] {
        &self.bounds
    }

    /// Returns the bounds of a named variable.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<Interval> {
        self.space.index_of(name).map(|i| self.bounds[i])
    }

    /// Returns a copy with the named variable's bounds replaced.
    ///
    /// # Errors
    ///
    /// Returns [`SpaceError::UnknownVariable`] if the name is not in the space.
    pub fn with(&self, name: &str, bounds: Interval) -> Result<Self, SpaceError> {
        let index = self
            .space
            .index_of(name)
            .ok_or_else(|| SpaceError::UnknownVariable { name: name.into() })?;
        let mut next = self.clone();
        next.bounds[index] = bounds;
        Ok(next)
    }

    /// The largest coordinate radius.
    #[must_use]
    pub fn radius(&self) -> f64 {
        self.bounds
            .iter()
            .map(Interval::radius)
            .fold(0.0, f64::max)
    }

    #[must_use]
    pub fn is_point(&self) -> bool {
        self.bounds.iter().all(Interval::is_point)
    }

    #[must_use]
    pub fn midpoint(&self) -> Vec<f64> {
        self.bounds.iter().map(Interval::midpoint).collect()
    }

    /// Returns the smallest box containing both enclosures.
    ///
    /// # Panics
    ///
    /// Panics if the enclosures are over different spaces.
    #[must_use]
    pub fn hull(&self, other: &Enclosure) -> Enclosure {
        assert_eq!(
            self.space, other.space,
            "cannot take the hull of enclosures over different spaces"
        );
        Enclosure {
            space: Arc::clone(&self.space),
            bounds: self
                .bounds
                .iter()
                .zip(&other.bounds)
                .map(|(a, b)| a.hull(b))
                .collect(),
        }
    }

    /// Returns `true` if `other` lies inside `self` coordinate-wise.
    #[must_use]
    pub fn encloses(&self, other: &Enclosure) -> bool {
        self.space == other.space
            && self
                .bounds
                .iter()
                .zip(&other.bounds)
                .all(|(a, b)| a.encloses(b))
    }

    /// Iterates over `(variable, bounds)` pairs in space order.
    pub fn iter(&self) -> impl Iterator<Item = (&Variable, Interval)> + '_ {
        self.space.variables().iter().zip(self.bounds.iter().copied())
    }
}

impl Valuation<Interval> for Enclosure {
    fn value(&self, name: &str) -> Option<Interval> {
        self.get(name)
    }
}

impl fmt::Display for Enclosure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (i, (var, bounds)) in self.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{var}: {bounds}")?;
        }
        f.write_str("}")
    }
}

/// A state vector over a space plus the auxiliary quantities derived from it.
///
/// Used while evaluating a location's dynamics: algebraic assignments are
/// evaluated in dependency order and bound into `auxiliary` before the
/// differential right-hand sides read them.
#[derive(Debug)]
pub struct Environment<'a, T> {
    space: &'a Space,
    state: &'a [T],
    auxiliary: BTreeMap<Arc<str>, T>,
}

impl<'a, T> Environment<'a, T> {
    pub fn new(space: &'a Space, state: &'a [T]) -> Self {
        Self {
            space,
            state,
            auxiliary: BTreeMap::new(),
        }
    }

    pub fn bind(&mut self, name: Arc<str>, value: T) {
        self.auxiliary.insert(name, value);
    }

    /// Consumes the environment, returning the auxiliary bindings.
    #[must_use]
    pub fn into_auxiliary(self) -> BTreeMap<Arc<str>, T> {
        self.auxiliary
    }
}

impl<T: Clone> Valuation<T> for Environment<'_, T> {
    fn value(&self, name: &str) -> Option<T> {
        match self.space.index_of(name) {
            Some(i) => self.state.get(i).cloned(),
            None => self.auxiliary.get(name).cloned(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_relative_eq;

    fn space() -> Arc<Space> {
        Arc::new(Space::new(["x", "y", "x"].map(Variable::new)))
    }

    #[test]
    fn space_deduplicates_names() {
        let s = space();
        assert_eq!(s.len(), 2);
        assert_eq!(s.index_of("y"), Some(1));
        assert!(!s.contains("z"));
    }

    #[test]
    fn enclosure_dimension_is_checked() {
        let result = Enclosure::point(space(), &[1.0]);
        assert!(matches!(
            result,
            Err(SpaceError::DimensionMismatch {
                expected: 2,
                actual: 1
            })
        ));
    }

    #[test]
    fn radius_hull_and_lookup() {
        let a = Enclosure::point(space(), &[1.0, 2.0]).unwrap();
        let b = a.with("y", Interval::new(1.0, 4.0).unwrap()).unwrap();

        assert!(a.is_point());
        assert!(!b.is_point());
        assert_relative_eq!(b.radius(), 1.5);
        assert_eq!(b.get("x"), Some(Interval::point(1.0)));
        assert!(b.encloses(&a));
        assert!(b.hull(&a).encloses(&b));
        assert!(a.with("z", Interval::point(0.0)).is_err());
    }

    #[test]
    fn environment_reads_state_then_auxiliary() {
        let s = space();
        let state = [1.0, 2.0];
        let mut env = Environment::new(&s, &state);
        env.bind("aux".into(), 5.0);

        assert_eq!(env.value("y"), Some(2.0));
        assert_eq!(env.value("aux"), Some(5.0));
        assert_eq!(env.value("missing"), None);
    }
}
