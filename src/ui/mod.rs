//! UI components for the TUI

mod dialog;
mod form;
mod preview;
mod status;
mod text;

pub use dialog::MessageDialog;
pub use form::{build_rows, Form, FormRow, RowTarget, RowValue};
pub use preview::Preview;
pub use status::{SchemaStatus, StatusBar};
pub use text::TextBuffer;
