//! Addressing of nested property levels
//!
//! Each level of the property tree is a `{properties, required}` pair. The
//! root level lives in `parameters`; an object-typed property owns a level;
//! an array whose items are objects owns a level inside `items`.

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathStep {
    /// Descend into the named property
    Property(String),
    /// Descend into the item schema of the current array property
    Items,
}

/// Location of one property level, relative to the root tree
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct TreePath(Vec<PathStep>);

impl TreePath {
    pub fn root() -> Self {
        Self(Vec::new())
    }

    /// Level owned by the object property `name` at this level
    pub fn child(&self, name: &str) -> Self {
        let mut steps = self.0.clone();
        steps.push(PathStep::Property(name.to_string()));
        Self(steps)
    }

    /// Level owned by the item object of the array property `name`
    pub fn items(&self, name: &str) -> Self {
        let mut steps = self.0.clone();
        steps.push(PathStep::Property(name.to_string()));
        steps.push(PathStep::Items);
        Self(steps)
    }

    pub fn steps(&self) -> &[PathStep] {
        &self.0
    }

    /// Number of object levels below the root
    pub fn depth(&self) -> usize {
        self.0
            .iter()
            .filter(|step| matches!(step, PathStep::Property(_)))
            .count()
    }
}

impl fmt::Display for TreePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "$")?;
        for step in &self.0 {
            match step {
                PathStep::Property(name) => write!(f, ".{}", name)?,
                PathStep::Items => write!(f, "[]")?,
            }
        }
        Ok(())
    }
}
