//! Copy-on-write editing of property trees
//!
//! Every edit takes a tree by reference and returns a replacement tree, or
//! `None` when the edit has no effect (a rename onto an existing name, for
//! example). Nested levels are reached through a [`TreePath`]; the edit is
//! applied at that level and each ancestor definition is rebuilt on the way
//! back up.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::model::{Properties, PropertyDefinition, PropertyType};
use super::path::{PathStep, TreePath};

/// Errors for edits that address something that is not there
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EditError {
    #[error("no property named '{0}'")]
    UnknownProperty(String),
    #[error("property '{0}' is not an object")]
    NotAnObject(String),
    #[error("property '{0}' is not an array")]
    NotAnArray(String),
}

/// How `AddProperty` picks the name of a new property
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PropertyNaming {
    /// `property_<count + 1>`; can land on a taken name after removals,
    /// in which case the existing property is replaced
    #[default]
    LiveCount,
    /// First `property_<n>` with `n >= count + 1` that is not taken
    NextFree,
}

/// A single field change on a named property
#[derive(Debug, Clone, PartialEq)]
pub enum FieldChange {
    Type(PropertyType),
    Description(String),
    /// Type of the items of an array property
    ItemType(PropertyType),
}

/// One editor interaction on a property level
#[derive(Debug, Clone, PartialEq)]
pub enum TreeEdit {
    Rename { from: String, to: String },
    Change { name: String, change: FieldChange },
    ToggleRequired(String),
    Add(PropertyNaming),
    Remove(String),
}

/// One level of the property tree: the properties and the names among
/// them that are required
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PropertyTree {
    pub properties: Properties,
    pub required: Vec<String>,
}

impl PropertyTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&PropertyDefinition> {
        self.properties.get(name)
    }

    pub fn is_required(&self, name: &str) -> bool {
        self.required.iter().any(|r| r == name)
    }

    /// Apply an edit to this level
    pub fn apply(&self, edit: &TreeEdit) -> Result<Option<PropertyTree>, EditError> {
        match edit {
            TreeEdit::Rename { from, to } => Ok(self.rename(from, to)),
            TreeEdit::Change { name, change } => self.change(name, change).map(Some),
            TreeEdit::ToggleRequired(name) => self.toggle_required(name).map(Some),
            TreeEdit::Add(naming) => Ok(Some(self.add_property(*naming))),
            TreeEdit::Remove(name) => self.remove(name).map(Some),
        }
    }

    /// Apply an edit to the level at `path`, returning the new root
    pub fn apply_at(
        &self,
        path: &TreePath,
        edit: &TreeEdit,
    ) -> Result<Option<PropertyTree>, EditError> {
        update_tree(self, path.steps(), &|tree| tree.apply(edit))
    }

    /// Read the level at `path`
    pub fn subtree(&self, path: &TreePath) -> Result<PropertyTree, EditError> {
        tree_at(self, path.steps())
    }

    /// Rename a property, keeping its definition and position.
    ///
    /// Empty names, unknown sources and names already in use are ignored.
    pub fn rename(&self, from: &str, to: &str) -> Option<PropertyTree> {
        if to.is_empty() || from == to || !self.properties.contains_key(from) {
            return None;
        }
        if self.properties.contains_key(to) {
            tracing::debug!("Rename of '{}' to '{}' ignored: name in use", from, to);
            return None;
        }

        let rename = |name: &String| {
            if name == from {
                to.to_string()
            } else {
                name.clone()
            }
        };
        let properties = self
            .properties
            .iter()
            .map(|(name, def)| (rename(name), def.clone()))
            .collect();
        // Raw text may have left a stale `to` in the required set
        let mut required: Vec<String> = Vec::with_capacity(self.required.len());
        for name in self.required.iter().map(rename) {
            if !required.contains(&name) {
                required.push(name);
            }
        }

        Some(PropertyTree {
            properties,
            required,
        })
    }

    /// Set one field of a property
    pub fn change(&self, name: &str, change: &FieldChange) -> Result<PropertyTree, EditError> {
        let mut def = self
            .properties
            .get(name)
            .cloned()
            .ok_or_else(|| EditError::UnknownProperty(name.to_string()))?;

        match change {
            FieldChange::Type(kind) => def.set_type(*kind),
            FieldChange::Description(text) => def.set_description(text.clone()),
            FieldChange::ItemType(kind) => {
                if def.kind != PropertyType::Array {
                    return Err(EditError::NotAnArray(name.to_string()));
                }
                def.set_item_type(*kind);
            }
        }

        let mut next = self.clone();
        next.properties.insert(name.to_string(), def);
        Ok(next)
    }

    /// Add the name to the required set if absent, remove it if present
    pub fn toggle_required(&self, name: &str) -> Result<PropertyTree, EditError> {
        if !self.properties.contains_key(name) {
            return Err(EditError::UnknownProperty(name.to_string()));
        }
        let mut next = self.clone();
        if next.is_required(name) {
            next.required.retain(|r| r != name);
        } else {
            next.required.push(name.to_string());
        }
        Ok(next)
    }

    /// Name the next added property would get
    pub fn next_property_name(&self, naming: PropertyNaming) -> String {
        let mut n = self.properties.len() + 1;
        if naming == PropertyNaming::NextFree {
            while self.properties.contains_key(&property_name(n)) {
                n += 1;
            }
        }
        property_name(n)
    }

    /// Add a string property with an empty description
    pub fn add_property(&self, naming: PropertyNaming) -> PropertyTree {
        let name = self.next_property_name(naming);
        if self.properties.contains_key(&name) {
            tracing::warn!("Added property replaces existing '{}'", name);
        }
        let mut next = self.clone();
        next.properties.insert(name, PropertyDefinition::new_property());
        next
    }

    /// Remove a property and drop it from the required set
    pub fn remove(&self, name: &str) -> Result<PropertyTree, EditError> {
        if !self.properties.contains_key(name) {
            return Err(EditError::UnknownProperty(name.to_string()));
        }
        let mut next = self.clone();
        next.properties.shift_remove(name);
        next.required.retain(|r| r != name);
        Ok(next)
    }
}

fn property_name(n: usize) -> String {
    format!("property_{}", n)
}

fn tree_at(tree: &PropertyTree, steps: &[PathStep]) -> Result<PropertyTree, EditError> {
    match steps.split_first() {
        None => Ok(tree.clone()),
        Some((PathStep::Property(name), rest)) => {
            let def = tree
                .get(name)
                .ok_or_else(|| EditError::UnknownProperty(name.clone()))?;
            definition_tree_at(name, def, rest)
        }
        Some((PathStep::Items, _)) => Err(EditError::NotAnArray("$".to_string())),
    }
}

fn definition_tree_at(
    name: &str,
    def: &PropertyDefinition,
    steps: &[PathStep],
) -> Result<PropertyTree, EditError> {
    if let Some((PathStep::Items, rest)) = steps.split_first() {
        let items = array_items(name, def)?;
        return definition_tree_at(name, items, rest);
    }
    let tree = def
        .object_tree()
        .ok_or_else(|| EditError::NotAnObject(name.to_string()))?;
    tree_at(&tree, steps)
}

fn update_tree<F>(
    tree: &PropertyTree,
    steps: &[PathStep],
    edit: &F,
) -> Result<Option<PropertyTree>, EditError>
where
    F: Fn(&PropertyTree) -> Result<Option<PropertyTree>, EditError>,
{
    match steps.split_first() {
        None => edit(tree),
        Some((PathStep::Property(name), rest)) => {
            let def = tree
                .get(name)
                .ok_or_else(|| EditError::UnknownProperty(name.clone()))?;
            let Some(updated) = update_definition(name, def, rest, edit)? else {
                return Ok(None);
            };
            let mut next = tree.clone();
            next.properties.insert(name.clone(), updated);
            Ok(Some(next))
        }
        Some((PathStep::Items, _)) => Err(EditError::NotAnArray("$".to_string())),
    }
}

fn update_definition<F>(
    name: &str,
    def: &PropertyDefinition,
    steps: &[PathStep],
    edit: &F,
) -> Result<Option<PropertyDefinition>, EditError>
where
    F: Fn(&PropertyTree) -> Result<Option<PropertyTree>, EditError>,
{
    if let Some((PathStep::Items, rest)) = steps.split_first() {
        let items = array_items(name, def)?;
        let Some(updated) = update_definition(name, items, rest, edit)? else {
            return Ok(None);
        };
        let mut next = def.clone();
        next.items = Some(Box::new(updated));
        return Ok(Some(next));
    }

    let tree = def
        .object_tree()
        .ok_or_else(|| EditError::NotAnObject(name.to_string()))?;
    let Some(updated) = update_tree(&tree, steps, edit)? else {
        return Ok(None);
    };
    let mut next = def.clone();
    next.set_tree(updated);
    Ok(Some(next))
}

fn array_items<'a>(
    name: &str,
    def: &'a PropertyDefinition,
) -> Result<&'a PropertyDefinition, EditError> {
    match (def.kind, def.items.as_deref()) {
        (PropertyType::Array, Some(items)) => Ok(items),
        _ => Err(EditError::NotAnArray(name.to_string())),
    }
}
