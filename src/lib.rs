//! fnschema - A terminal editor for function-calling schema descriptors
//!
//! The editing core can be used as a library without the terminal UI.
//!
//! # Example
//!
//! ```no_run
//! use fnschema::{PropertyNaming, SchemaController, TreePath};
//!
//! let mut ctl = SchemaController::new(PropertyNaming::LiveCount);
//! ctl.edit_raw_text(r#"{"name":"get_weather","description":"Current weather"}"#);
//!
//! let name = ctl.add_property(&TreePath::root()).unwrap();
//! println!("added {}", name);
//!
//! match ctl.validate() {
//!     Ok(()) => println!("{}", ctl.buffer()),
//!     Err(e) => eprintln!("Error: {}", e),
//! }
//! ```

// Core modules (always available)
pub mod config;
pub mod controller;
pub mod schema;

// CLI-only modules
#[cfg(feature = "cli")]
pub mod app;
#[cfg(feature = "cli")]
pub mod ui;

// Re-export the public API
pub use config::Config;
pub use controller::{
    check, DescriptorField, ParametersPatch, SchemaController, SchemaError, ValidationError,
};
pub use schema::{
    EditError, FieldChange, PathStep, PropertyDefinition, PropertyNaming, PropertyTree,
    PropertyType, SchemaDescriptor, TreeEdit, TreePath,
};
