//! Function descriptor model and the recursive property-tree editor

mod model;
mod path;
mod tree;

pub use model::{Properties, PropertyDefinition, PropertyType, SchemaDescriptor};
pub use path::{PathStep, TreePath};
pub use tree::{EditError, FieldChange, PropertyNaming, PropertyTree, TreeEdit};
