use std::{
    cmp::Ordering,
    collections::BTreeMap,
    fmt,
    hash::{Hash, Hasher},
    sync::Arc,
};

use crate::LocationId;

/// A location of a composite automaton: one location per member.
///
/// Identity is the tuple of member location ids; the labels only serve
/// display and name-based queries.
#[derive(Debug, Clone)]
pub struct CompositeLocation {
    ids: Arc<[LocationId]>,
    labels: Arc<[(Arc<str>, Arc<str>)]>,
}

impl CompositeLocation {
    pub(crate) fn new(ids: Vec<LocationId>, labels: Vec<(Arc<str>, Arc<str>)>) -> Self {
        debug_assert_eq!(ids.len(), labels.len());
        Self {
            ids: ids.into(),
            labels: labels.into(),
        }
    }

    /// Member location ids, in member order.
    #[must_use]
    pub fn ids(&self) -> &[LocationId] {
        &self.ids
    }

    #[must_use]
    pub fn local(&self, member: usize) -> LocationId {
        self.ids[member]
    }

    /// `(automaton, location)` name pairs, in member order.
    pub fn labels(&self) -> impl Iterator<Item = (&str, &str)> + '_ {
        self.labels.iter().map(|(a, l)| (&**a, &**l))
    }

    /// Name of the active location of `automaton`, if it is a member.
    #[must_use]
    pub fn location_of(&self, automaton: &str) -> Option<&str> {
        self.labels
            .iter()
            .find(|(a, _)| &**a == automaton)
            .map(|(_, l)| &**l)
    }

    /// Member locations keyed by automaton name.
    ///
    /// Unlike [`ids`](Self::ids), this does not depend on member order, so it
    /// compares locations of compositions built in different orders.
    #[must_use]
    pub fn label_map(&self) -> BTreeMap<Arc<str>, Arc<str>> {
        self.labels.iter().cloned().collect()
    }
}

impl PartialEq for CompositeLocation {
    fn eq(&self, other: &Self) -> bool {
        self.ids == other.ids
    }
}

impl Eq for CompositeLocation {}

impl Hash for CompositeLocation {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.ids.hash(state);
    }
}

impl PartialOrd for CompositeLocation {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for CompositeLocation {
    fn cmp(&self, other: &Self) -> Ordering {
        self.ids.cmp(&other.ids)
    }
}

impl fmt::Display for CompositeLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("(")?;
        for (i, (automaton, location)) in self.labels.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{automaton}|{location}")?;
        }
        f.write_str(")")
    }
}
