use std::{fmt, sync::Arc};

/// A named real-valued continuous variable.
///
/// Identity is by name: two `Variable`s with the same name denote the same
/// quantity. This is how automata share quantities when they are composed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Variable(Arc<str>);

impl Variable {
    pub fn new(name: impl Into<Arc<str>>) -> Self {
        Self(name.into())
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.0
    }

    /// Returns the shared name handle.
    #[must_use]
    pub fn key(&self) -> &Arc<str> {
        &self.0
    }
}

impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A named real constant, immutable for the lifetime of a model.
#[derive(Debug, Clone, PartialEq)]
pub struct Constant {
    name: Arc<str>,
    value: f64,
}

impl Constant {
    pub fn new(name: impl Into<Arc<str>>, value: f64) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn value(&self) -> f64 {
        self.value
    }
}

impl fmt::Display for Constant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}
