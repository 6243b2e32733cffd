//! Schema controller: keeps the descriptor and its JSON text in sync
//!
//! Structured edits (descriptor fields, property tree edits) regenerate the
//! text buffer. Raw text edits are stored verbatim and parsed back into the
//! descriptor when they are valid; when they are not, the descriptor keeps
//! its last good state and an error is recorded, so in-progress typing is
//! never thrown away.

use serde_json::Value;
use thiserror::Error;

use crate::schema::{
    EditError, Properties, PropertyNaming, PropertyTree, SchemaDescriptor, TreeEdit, TreePath,
};

/// Message shown when the buffer is not a parseable descriptor
pub const PARSE_ERROR_MESSAGE: &str = "Invalid JSON schema. Please correct any syntax errors.";

/// Message shown after a successful validation
pub const VALID_MESSAGE: &str = "Schema is valid!";

/// Errors surfaced to the user
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    /// The buffer is not JSON
    #[error("{}", PARSE_ERROR_MESSAGE)]
    Parse { detail: String },
    /// The buffer is JSON, but an array, string or other non-object
    #[error("Schema must be a JSON object.")]
    NotAnObject,
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

/// Reasons a parseable buffer fails validation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Schema must include name, description, and parameters.")]
    MissingFields,
    #[error("Parameters must be of type 'object'.")]
    ParametersNotObject,
}

impl SchemaError {
    fn parse(err: serde_json::Error) -> Self {
        if err.is_data() {
            return SchemaError::NotAnObject;
        }
        SchemaError::Parse {
            detail: err.to_string(),
        }
    }

    /// The buffer could not be adopted, so the descriptor is older than it
    pub fn is_stale(&self) -> bool {
        matches!(self, SchemaError::Parse { .. } | SchemaError::NotAnObject)
    }
}

/// Top-level text fields of the descriptor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DescriptorField {
    Name,
    Description,
}

/// Fields to shallow-merge into `parameters`; `None` leaves a field as is
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParametersPatch {
    pub properties: Option<Properties>,
    pub required: Option<Vec<String>>,
}

impl From<PropertyTree> for ParametersPatch {
    fn from(tree: PropertyTree) -> Self {
        Self {
            properties: Some(tree.properties),
            required: Some(tree.required),
        }
    }
}

/// Owns the descriptor and the text buffer shown in the preview
#[derive(Debug, Clone)]
pub struct SchemaController {
    descriptor: SchemaDescriptor,
    buffer: String,
    error: Option<SchemaError>,
    naming: PropertyNaming,
}

impl SchemaController {
    pub fn new(naming: PropertyNaming) -> Self {
        let mut controller = Self {
            descriptor: SchemaDescriptor::new(),
            buffer: String::new(),
            error: None,
            naming,
        };
        controller.regenerate();
        controller
    }

    pub fn descriptor(&self) -> &SchemaDescriptor {
        &self.descriptor
    }

    /// Current raw JSON text
    pub fn buffer(&self) -> &str {
        &self.buffer
    }

    /// Error to display, if any
    pub fn error(&self) -> Option<&SchemaError> {
        self.error.as_ref()
    }

    /// Set the name or description
    pub fn update_field(&mut self, field: DescriptorField, value: impl Into<String>) {
        let value = value.into();
        match field {
            DescriptorField::Name => self.descriptor.set_name(value),
            DescriptorField::Description => self.descriptor.set_description(value),
        }
        self.regenerate();
    }

    /// Shallow-merge into `parameters`
    pub fn update_parameters(&mut self, patch: ParametersPatch) {
        let params = self.descriptor.parameters_mut();
        if let Some(properties) = patch.properties {
            params.set_properties(properties);
        }
        if let Some(required) = patch.required {
            params.set_required(required);
        }
        self.regenerate();
    }

    /// Apply a property tree edit at `path` below the root tree.
    ///
    /// Returns whether anything changed; no-op edits leave the buffer alone.
    pub fn edit_tree(&mut self, path: &TreePath, edit: &TreeEdit) -> Result<bool, EditError> {
        match self.editable_root()?.apply_at(path, edit)? {
            Some(updated) => {
                tracing::debug!("Tree edit at {}: {:?}", path, edit);
                self.update_parameters(updated.into());
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Add a property at `path`, returning its name
    pub fn add_property(&mut self, path: &TreePath) -> Result<String, EditError> {
        let name = self
            .editable_root()?
            .subtree(path)?
            .next_property_name(self.naming);
        self.edit_tree(path, &TreeEdit::Add(self.naming))?;
        Ok(name)
    }

    fn editable_root(&self) -> Result<PropertyTree, EditError> {
        self.descriptor
            .editable_root()
            .ok_or_else(|| EditError::NotAnObject("parameters".to_string()))
    }

    /// Replace the buffer with user-typed text and try to adopt it
    pub fn edit_raw_text(&mut self, text: impl Into<String>) {
        self.buffer = text.into();
        match SchemaDescriptor::from_json(&self.buffer) {
            Ok(descriptor) => {
                self.descriptor = descriptor;
                self.error = None;
            }
            Err(e) => {
                tracing::debug!("Raw text not adopted: {}", e);
                self.error = Some(SchemaError::parse(e));
            }
        }
    }

    /// Shallow check of the buffer; records the outcome as the current error
    pub fn validate(&mut self) -> Result<(), SchemaError> {
        let result = check(&self.buffer);
        match &result {
            Ok(()) => {
                tracing::info!("Schema '{}' validated", self.descriptor.name());
                self.error = None;
            }
            Err(e) => {
                tracing::info!("Validation failed: {}", e);
                self.error = Some(e.clone());
            }
        }
        result
    }

    fn regenerate(&mut self) {
        match self.descriptor.to_json() {
            Ok(text) => {
                self.buffer = text;
                if self.error.as_ref().is_some_and(SchemaError::is_stale) {
                    self.error = None;
                }
            }
            Err(e) => tracing::error!("Failed to serialize descriptor: {}", e),
        }
    }
}

impl Default for SchemaController {
    fn default() -> Self {
        Self::new(PropertyNaming::default())
    }
}

/// Validate JSON text as a function descriptor.
///
/// Only the top level is checked: `name`, `description` and `parameters`
/// must be present and truthy, and `parameters.type` must be `"object"`.
pub fn check(text: &str) -> Result<(), SchemaError> {
    let value: Value = serde_json::from_str(text).map_err(SchemaError::parse)?;

    let has = |key: &str| value.get(key).is_some_and(is_truthy);
    if !(has("name") && has("description") && has("parameters")) {
        return Err(ValidationError::MissingFields.into());
    }
    if value["parameters"].get("type").and_then(Value::as_str) != Some("object") {
        return Err(ValidationError::ParametersNotObject.into());
    }
    Ok(())
}

/// JavaScript truthiness of a JSON value
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{FieldChange, PropertyDefinition, PropertyType};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn controller() -> SchemaController {
        SchemaController::new(PropertyNaming::LiveCount)
    }

    #[test]
    fn test_new_controller_buffer_matches_descriptor() {
        let ctl = controller();
        assert_eq!(ctl.buffer(), SchemaDescriptor::new().to_json().unwrap());
        assert_eq!(ctl.error(), None);
    }

    #[test]
    fn test_update_field_regenerates_buffer() {
        let mut ctl = controller();
        ctl.update_field(DescriptorField::Name, "get_weather");
        ctl.update_field(DescriptorField::Description, "Forecast lookup");

        let value: Value = serde_json::from_str(ctl.buffer()).unwrap();
        assert_eq!(value["name"], "get_weather");
        assert_eq!(value["description"], "Forecast lookup");
        assert!(ctl.buffer().contains("\n  \"name\": \"get_weather\""));
    }

    #[test]
    fn test_add_property_to_empty_descriptor() {
        let mut ctl = controller();
        let name = ctl.add_property(&TreePath::root()).unwrap();
        assert_eq!(name, "property_1");

        let tree = ctl.descriptor().root_tree();
        assert_eq!(tree.properties.len(), 1);
        assert_eq!(tree.get("property_1"), Some(&PropertyDefinition::new_property()));
        assert!(tree.required.is_empty());

        insta::assert_snapshot!(ctl.buffer(), @r#"
        {
          "name": "",
          "description": "",
          "parameters": {
            "type": "object",
            "properties": {
              "property_1": {
                "type": "string",
                "description": ""
              }
            },
            "required": []
          }
        }
        "#);
    }

    #[test]
    fn test_remove_required_property() {
        let mut ctl = controller();
        let root = TreePath::root();
        ctl.add_property(&root).unwrap();
        ctl.edit_tree(
            &root,
            &TreeEdit::Rename {
                from: "property_1".into(),
                to: "x".into(),
            },
        )
        .unwrap();
        ctl.edit_tree(&root, &TreeEdit::ToggleRequired("x".into()))
            .unwrap();
        assert_eq!(ctl.descriptor().root_tree().required, vec!["x"]);

        ctl.edit_tree(&root, &TreeEdit::Remove("x".into())).unwrap();
        assert!(ctl.descriptor().root_tree().required.is_empty());
        let value: Value = serde_json::from_str(ctl.buffer()).unwrap();
        assert_eq!(value["parameters"]["required"], json!([]));
    }

    #[test]
    fn test_rename_collision_leaves_buffer_untouched() {
        let mut ctl = controller();
        let root = TreePath::root();
        ctl.add_property(&root).unwrap();
        ctl.add_property(&root).unwrap();
        let before = ctl.buffer().to_string();

        let changed = ctl
            .edit_tree(
                &root,
                &TreeEdit::Rename {
                    from: "property_1".into(),
                    to: "property_2".into(),
                },
            )
            .unwrap();
        assert!(!changed);
        assert_eq!(ctl.buffer(), before);
    }

    #[test]
    fn test_truncated_raw_text_keeps_descriptor() {
        let mut ctl = controller();
        ctl.update_field(DescriptorField::Name, "before");
        let descriptor = ctl.descriptor().clone();

        ctl.edit_raw_text(r#"{"name":"f""#);
        assert_eq!(ctl.buffer(), r#"{"name":"f""#);
        assert_eq!(ctl.descriptor(), &descriptor);
        assert!(matches!(ctl.error(), Some(SchemaError::Parse { .. })));
        assert_eq!(ctl.error().unwrap().to_string(), PARSE_ERROR_MESSAGE);
    }

    #[test]
    fn test_valid_raw_text_replaces_descriptor() {
        let mut ctl = controller();
        ctl.edit_raw_text("{");
        assert!(ctl.error().is_some());

        let text = r#"{"name": "f", "description": "d", "parameters": {"type": "object", "properties": {"q": {"type": "string"}}, "required": ["q"]}}"#;
        ctl.edit_raw_text(text);
        assert_eq!(ctl.error(), None);
        assert_eq!(ctl.buffer(), text);
        assert_eq!(ctl.descriptor().name(), "f");
        assert_eq!(ctl.descriptor().root_tree().required, vec!["q"]);
    }

    #[test]
    fn test_non_object_raw_text_keeps_descriptor() {
        let mut ctl = controller();
        ctl.edit_raw_text("[]");
        assert_eq!(ctl.error(), Some(&SchemaError::NotAnObject));
        assert_eq!(ctl.error().unwrap().to_string(), "Schema must be a JSON object.");
        assert_eq!(ctl.descriptor(), &SchemaDescriptor::new());

        ctl.update_field(DescriptorField::Name, "f");
        assert_eq!(ctl.error(), None);
    }

    #[test]
    fn test_off_model_values_are_adopted() {
        let mut ctl = controller();
        ctl.edit_raw_text(r#"{"name": 5}"#);
        assert_eq!(ctl.error(), None);
        assert_eq!(ctl.descriptor().name(), "");
        assert_eq!(ctl.descriptor().extra["name"], json!(5));

        ctl.update_field(DescriptorField::Description, "d");
        let value: Value = serde_json::from_str(ctl.buffer()).unwrap();
        assert_eq!(value, json!({"description": "d", "name": 5}));
    }

    #[test]
    fn test_integer_property_survives_builder_edit() {
        let mut ctl = controller();
        let text = json!({
            "name": "get_weather",
            "description": "Forecast lookup",
            "parameters": {
                "type": "object",
                "properties": {"days": {"type": "integer"}},
                "required": ["days"]
            }
        })
        .to_string();
        ctl.edit_raw_text(text.clone());
        assert_eq!(ctl.error(), None);
        assert_eq!(ctl.buffer(), text);
        assert_eq!(ctl.descriptor().name(), "get_weather");
        assert_eq!(ctl.descriptor().root_tree().required, vec!["days"]);

        ctl.update_field(DescriptorField::Name, "get_forecast");
        let name = ctl.add_property(&TreePath::root()).unwrap();
        assert_eq!(name, "property_2");

        let value: Value = serde_json::from_str(ctl.buffer()).unwrap();
        assert_eq!(value["name"], "get_forecast");
        assert_eq!(value["parameters"]["properties"]["days"], json!({"type": "integer"}));
        assert_eq!(value["parameters"]["required"], json!(["days"]));
        assert!(ctl.buffer().contains("\"integer\""));
    }

    #[test]
    fn test_raw_root_tree_is_not_overwritten() {
        let mut ctl = controller();
        let text = r#"{"name": "f", "parameters": {"type": "object", "properties": {"a": 1}}}"#;
        ctl.edit_raw_text(text);
        assert_eq!(ctl.error(), None);

        assert_eq!(
            ctl.add_property(&TreePath::root()),
            Err(EditError::NotAnObject("parameters".into()))
        );
        assert_eq!(ctl.buffer(), text);
    }

    #[test]
    fn test_structured_edit_after_parse_error_restores_buffer() {
        let mut ctl = controller();
        ctl.edit_raw_text("{ broken");
        ctl.update_field(DescriptorField::Name, "f");

        assert_eq!(ctl.error(), None);
        let value: Value = serde_json::from_str(ctl.buffer()).unwrap();
        assert_eq!(value["name"], "f");
    }

    #[test]
    fn test_validate_parameters_type() {
        let mut ctl = controller();
        ctl.edit_raw_text(
            r#"{"name": "f", "description": "d", "parameters": {"type": "string"}}"#,
        );
        assert_eq!(ctl.error(), None);

        let err = ctl.validate().unwrap_err();
        assert_eq!(
            err,
            SchemaError::Validation(ValidationError::ParametersNotObject)
        );
        assert_eq!(err.to_string(), "Parameters must be of type 'object'.");
        assert_eq!(ctl.error(), Some(&err));
    }

    #[test]
    fn test_validate_success() {
        let mut ctl = controller();
        ctl.edit_raw_text(
            json!({
                "name": "f",
                "description": "d",
                "parameters": {"type": "object", "properties": {}, "required": []}
            })
            .to_string(),
        );
        assert_eq!(ctl.validate(), Ok(()));
        assert_eq!(ctl.error(), None);
    }

    #[test]
    fn test_validate_clears_previous_error() {
        let mut ctl = controller();
        assert!(ctl.validate().is_err());
        ctl.update_field(DescriptorField::Name, "f");
        ctl.update_field(DescriptorField::Description, "d");
        assert_eq!(ctl.validate(), Ok(()));
        assert_eq!(ctl.error(), None);
    }

    #[test]
    fn test_validate_missing_fields() {
        let mut ctl = controller();
        let err = ctl.validate().unwrap_err();
        assert_eq!(
            err.to_string(),
            "Schema must include name, description, and parameters."
        );

        for text in [
            r#"{"description": "d", "parameters": {"type": "object"}}"#,
            r#"{"name": "f", "description": "", "parameters": {"type": "object"}}"#,
            r#"{"name": "f", "description": "d", "parameters": null}"#,
            r#"{"name": 0, "description": "d", "parameters": {"type": "object"}}"#,
            r#"[1, 2]"#,
        ] {
            assert_eq!(
                check(text),
                Err(SchemaError::Validation(ValidationError::MissingFields)),
                "{}",
                text
            );
        }
    }

    #[test]
    fn test_validate_does_not_mutate() {
        let mut ctl = controller();
        ctl.edit_raw_text("not json");
        let descriptor = ctl.descriptor().clone();
        let err = ctl.validate().unwrap_err();
        assert!(matches!(err, SchemaError::Parse { .. }));
        assert_eq!(ctl.buffer(), "not json");
        assert_eq!(ctl.descriptor(), &descriptor);
    }

    #[test]
    fn test_truthy_values_pass_presence_check() {
        assert_eq!(
            check(r#"{"name": 1, "description": true, "parameters": {"type": "object"}}"#),
            Ok(())
        );
        assert_eq!(
            check(r#"{"name": "f", "description": "d", "parameters": []}"#),
            Err(SchemaError::Validation(ValidationError::ParametersNotObject))
        );
    }

    #[test]
    fn test_update_parameters_is_shallow() {
        let mut ctl = controller();
        ctl.add_property(&TreePath::root()).unwrap();
        ctl.update_parameters(ParametersPatch {
            properties: None,
            required: Some(vec!["property_1".into()]),
        });
        let tree = ctl.descriptor().root_tree();
        assert_eq!(tree.properties.len(), 1);
        assert_eq!(tree.required, vec!["property_1"]);
    }

    #[test]
    fn test_nested_edit_round_trips_through_buffer() {
        let mut ctl = controller();
        let root = TreePath::root();
        ctl.add_property(&root).unwrap();
        ctl.edit_tree(
            &root,
            &TreeEdit::Change {
                name: "property_1".into(),
                change: FieldChange::Type(PropertyType::Array),
            },
        )
        .unwrap();
        ctl.edit_tree(
            &root,
            &TreeEdit::Change {
                name: "property_1".into(),
                change: FieldChange::ItemType(PropertyType::Object),
            },
        )
        .unwrap();
        ctl.add_property(&root.items("property_1")).unwrap();

        let reparsed = SchemaDescriptor::from_json(ctl.buffer()).unwrap();
        assert_eq!(&reparsed, ctl.descriptor());
        let value: Value = serde_json::from_str(ctl.buffer()).unwrap();
        assert_eq!(
            value["parameters"]["properties"]["property_1"]["items"]["properties"]["property_1"]
                ["type"],
            "string"
        );
    }
}
