//! Serializable shape of a function-calling descriptor
//!
//! The descriptor serializes to the object an LLM function-calling API
//! expects:
//!
//! ```json
//! {
//!   "name": "get_weather",
//!   "description": "Look up the forecast",
//!   "parameters": {
//!     "type": "object",
//!     "properties": { "city": { "type": "string", "description": "" } },
//!     "required": ["city"]
//!   }
//! }
//! ```
//!
//! Any JSON object is accepted. Keys the editor has no control for (`enum`,
//! `minimum`, ...) and known keys whose value does not fit the model (a
//! `"type": "integer"`, a numeric `name`) are kept verbatim in the `extra`
//! maps, so text typed into the preview survives a round trip. Setting a
//! field from the editor drops its raw counterpart.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::tree::PropertyTree;

/// Ordered mapping of property name to definition
pub type Properties = IndexMap<String, PropertyDefinition>;

/// The types offered by every type selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PropertyType {
    #[default]
    String,
    Number,
    Boolean,
    Object,
    Array,
    /// Missing, or not one of the above; the raw value stays in `extra`
    #[serde(skip_serializing)]
    Other,
}

impl PropertyType {
    /// Selector order
    pub const ALL: [PropertyType; 5] = [
        PropertyType::String,
        PropertyType::Number,
        PropertyType::Boolean,
        PropertyType::Object,
        PropertyType::Array,
    ];

    /// Wire name, as written in the `type` field
    pub fn as_str(&self) -> Option<&'static str> {
        match self {
            PropertyType::String => Some("string"),
            PropertyType::Number => Some("number"),
            PropertyType::Boolean => Some("boolean"),
            PropertyType::Object => Some("object"),
            PropertyType::Array => Some("array"),
            PropertyType::Other => None,
        }
    }

    /// Parse a `type` value the selector offers
    pub fn from_wire(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == Some(name))
    }

    /// Label shown in the selector
    pub fn label(&self) -> &'static str {
        match self {
            PropertyType::String => "String",
            PropertyType::Number => "Number",
            PropertyType::Boolean => "Boolean",
            PropertyType::Object => "Object",
            PropertyType::Array => "Array",
            PropertyType::Other => "Other",
        }
    }

    fn position(&self) -> Option<usize> {
        Self::ALL.iter().position(|t| t == self)
    }

    /// Next option in the selector, wrapping around
    pub fn next(self) -> Self {
        let len = Self::ALL.len();
        match self.position() {
            Some(i) => Self::ALL[(i + 1) % len],
            None => Self::ALL[0],
        }
    }

    /// Previous option in the selector, wrapping around
    pub fn prev(self) -> Self {
        let len = Self::ALL.len();
        match self.position() {
            Some(i) => Self::ALL[(i + len - 1) % len],
            None => Self::ALL[len - 1],
        }
    }

    fn is_other(&self) -> bool {
        *self == PropertyType::Other
    }
}

/// Schema of a single property
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "Map<String, Value>")]
pub struct PropertyDefinition {
    #[serde(rename = "type", skip_serializing_if = "PropertyType::is_other")]
    pub kind: PropertyType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Present iff `kind` is `Object`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub properties: Option<Properties>,
    /// Present iff `kind` is `Object`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub required: Option<Vec<String>>,
    /// Present iff `kind` is `Array`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<PropertyDefinition>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl PropertyDefinition {
    /// A bare definition of the given type, with no optional fields
    pub fn of_type(kind: PropertyType) -> Self {
        Self {
            kind,
            description: None,
            properties: None,
            required: None,
            items: None,
            extra: Map::new(),
        }
    }

    /// The definition given to a freshly added property
    pub fn new_property() -> Self {
        Self {
            description: Some(String::new()),
            ..Self::of_type(PropertyType::String)
        }
    }

    /// An object definition with empty properties and required set
    pub fn empty_object() -> Self {
        Self {
            properties: Some(Properties::new()),
            required: Some(Vec::new()),
            ..Self::of_type(PropertyType::Object)
        }
    }

    /// Switch the type, adding defaults for the new type and dropping the
    /// fields that no longer apply.
    ///
    /// Switching to `Object` or `Array` repeatedly keeps whatever nested
    /// data is already there.
    pub fn set_type(&mut self, kind: PropertyType) {
        self.drop_raw(&["type", "properties", "required", "items"]);
        match kind {
            PropertyType::Object => {
                self.properties.get_or_insert_with(Properties::new);
                self.required.get_or_insert_with(Vec::new);
                self.items = None;
            }
            PropertyType::Array => {
                self.items
                    .get_or_insert_with(|| Box::new(PropertyDefinition::of_type(PropertyType::String)));
                self.properties = None;
                self.required = None;
            }
            _ => {
                self.properties = None;
                self.required = None;
                self.items = None;
            }
        }
        self.kind = kind;
    }

    pub fn set_description(&mut self, text: String) {
        self.drop_raw(&["description"]);
        self.description = Some(text);
    }

    /// Set the type of the items, creating an items schema if there is none
    pub fn set_item_type(&mut self, kind: PropertyType) {
        if self.items.is_none() {
            self.drop_raw(&["items"]);
        }
        self.items
            .get_or_insert_with(|| Box::new(PropertyDefinition::of_type(PropertyType::String)))
            .set_type(kind);
    }

    /// Item type of an array definition
    pub fn item_type(&self) -> Option<PropertyType> {
        match self.kind {
            PropertyType::Array => self.items.as_ref().map(|items| items.kind),
            _ => None,
        }
    }

    /// Text for the type selector; unrecognised types show their raw value
    pub fn type_label(&self) -> String {
        match (self.kind, self.extra.get("type")) {
            (PropertyType::Other, Some(Value::String(raw))) => raw.clone(),
            (PropertyType::Other, Some(raw)) => raw.to_string(),
            (PropertyType::Other, None) => "(none)".to_string(),
            (kind, _) => kind.label().to_string(),
        }
    }

    /// The nested tree of an object definition.
    ///
    /// `None` as well when the nested fields are raw values the tree cannot
    /// hold, so edits cannot overwrite them.
    pub fn object_tree(&self) -> Option<PropertyTree> {
        if self.kind != PropertyType::Object || self.has_raw_tree() {
            return None;
        }
        Some(PropertyTree {
            properties: self.properties.clone().unwrap_or_default(),
            required: self.required.clone().unwrap_or_default(),
        })
    }

    /// Replace the nested tree (properties and required set)
    pub fn set_tree(&mut self, tree: PropertyTree) {
        self.set_properties(tree.properties);
        self.set_required(tree.required);
    }

    pub fn set_properties(&mut self, properties: Properties) {
        self.drop_raw(&["properties"]);
        self.properties = Some(properties);
    }

    pub fn set_required(&mut self, required: Vec<String>) {
        self.drop_raw(&["required"]);
        self.required = Some(required);
    }

    fn has_raw_tree(&self) -> bool {
        self.extra.contains_key("properties") || self.extra.contains_key("required")
    }

    fn drop_raw(&mut self, keys: &[&str]) {
        self.extra.retain(|key, _| !keys.contains(&key.as_str()));
    }
}

impl From<Map<String, Value>> for PropertyDefinition {
    fn from(map: Map<String, Value>) -> Self {
        let mut def = Self::of_type(PropertyType::Other);
        for (key, value) in map {
            let raw = match key.as_str() {
                "type" => match value.as_str().and_then(PropertyType::from_wire) {
                    Some(kind) => {
                        def.kind = kind;
                        None
                    }
                    None => Some(value),
                },
                "description" => match value {
                    Value::String(text) => {
                        def.description = Some(text);
                        None
                    }
                    other => Some(other),
                },
                "properties" => match value {
                    Value::Object(props) if props.values().all(Value::is_object) => {
                        def.properties = Some(
                            props
                                .into_iter()
                                .filter_map(|(name, value)| match value {
                                    Value::Object(map) => Some((name, Self::from(map))),
                                    _ => None,
                                })
                                .collect(),
                        );
                        None
                    }
                    other => Some(other),
                },
                "required" => match value {
                    Value::Array(names) if names.iter().all(Value::is_string) => {
                        def.required = Some(
                            names
                                .into_iter()
                                .filter_map(|name| match name {
                                    Value::String(name) => Some(name),
                                    _ => None,
                                })
                                .collect(),
                        );
                        None
                    }
                    other => Some(other),
                },
                "items" => match value {
                    Value::Object(map) => {
                        def.items = Some(Box::new(Self::from(map)));
                        None
                    }
                    other => Some(other),
                },
                _ => Some(value),
            };
            if let Some(value) = raw {
                def.extra.insert(key, value);
            }
        }
        def
    }
}

/// Top-level function descriptor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "Map<String, Value>")]
pub struct SchemaDescriptor {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parameters: Option<PropertyDefinition>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl SchemaDescriptor {
    pub fn new() -> Self {
        Self {
            name: Some(String::new()),
            description: Some(String::new()),
            parameters: Some(PropertyDefinition::empty_object()),
            extra: Map::new(),
        }
    }

    /// Parse a descriptor from JSON text.
    ///
    /// Fails with a syntax error for malformed JSON and with a data error
    /// when the top level is not an object.
    pub fn from_json(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }

    /// Pretty-printed JSON with two-space indentation
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn name(&self) -> &str {
        self.name.as_deref().unwrap_or_default()
    }

    pub fn description(&self) -> &str {
        self.description.as_deref().unwrap_or_default()
    }

    pub fn set_name(&mut self, name: String) {
        self.extra.retain(|key, _| key != "name");
        self.name = Some(name);
    }

    pub fn set_description(&mut self, description: String) {
        self.extra.retain(|key, _| key != "description");
        self.description = Some(description);
    }

    /// `parameters`, created as an empty object if missing or not an object
    pub fn parameters_mut(&mut self) -> &mut PropertyDefinition {
        if self.parameters.is_none() {
            self.extra.retain(|key, _| key != "parameters");
        }
        self.parameters
            .get_or_insert_with(PropertyDefinition::empty_object)
    }

    /// The root property tree, taken from `parameters` whatever its type
    pub fn root_tree(&self) -> PropertyTree {
        self.parameters
            .as_ref()
            .map(|params| PropertyTree {
                properties: params.properties.clone().unwrap_or_default(),
                required: params.required.clone().unwrap_or_default(),
            })
            .unwrap_or_default()
    }

    /// The root tree, unless `parameters` holds raw nested values that
    /// edits would overwrite
    pub fn editable_root(&self) -> Option<PropertyTree> {
        match &self.parameters {
            Some(params) if params.has_raw_tree() => None,
            _ => Some(self.root_tree()),
        }
    }
}

impl Default for SchemaDescriptor {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Map<String, Value>> for SchemaDescriptor {
    fn from(map: Map<String, Value>) -> Self {
        let mut descriptor = Self {
            name: None,
            description: None,
            parameters: None,
            extra: Map::new(),
        };
        for (key, value) in map {
            let raw = match (key.as_str(), value) {
                ("name", Value::String(name)) => {
                    descriptor.name = Some(name);
                    None
                }
                ("description", Value::String(text)) => {
                    descriptor.description = Some(text);
                    None
                }
                ("parameters", Value::Object(params)) => {
                    descriptor.parameters = Some(PropertyDefinition::from(params));
                    None
                }
                (_, value) => Some(value),
            };
            if let Some(value) = raw {
                descriptor.extra.insert(key, value);
            }
        }
        descriptor
    }
}
