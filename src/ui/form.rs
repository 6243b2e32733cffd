//! Builder form: the property tree laid out as focusable rows
//!
//! The descriptor is flattened into one row per control (name input, type
//! selector, description input, required checkbox, ...). Rows of nested
//! levels carry the [`TreePath`] of their level, so every interaction turns
//! into a single controller call at that path.
//!
//! Property names are edited in a draft that is only committed as a rename
//! when focus leaves the row or Enter is pressed. Every other text field is
//! pushed to the controller on each keystroke.

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget},
};

use crate::controller::{DescriptorField, SchemaController};
use crate::schema::{
    EditError, FieldChange, PropertyDefinition, PropertyTree, PropertyType, SchemaDescriptor,
    TreeEdit, TreePath,
};

use super::text::TextBuffer;

/// What a row controls
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowTarget {
    FunctionName,
    FunctionDescription,
    PropertyName { level: TreePath, name: String },
    PropertyType { level: TreePath, name: String },
    PropertyDescription { level: TreePath, name: String },
    ItemType { level: TreePath, name: String },
    Required { level: TreePath, name: String },
    AddProperty { level: TreePath },
}

impl RowTarget {
    /// The property this row belongs to, as (level, name)
    pub fn property(&self) -> Option<(&TreePath, &str)> {
        match self {
            RowTarget::PropertyName { level, name }
            | RowTarget::PropertyType { level, name }
            | RowTarget::PropertyDescription { level, name }
            | RowTarget::ItemType { level, name }
            | RowTarget::Required { level, name } => Some((level, name)),
            RowTarget::FunctionName
            | RowTarget::FunctionDescription
            | RowTarget::AddProperty { .. } => None,
        }
    }
}

/// Value displayed by a row
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowValue {
    Text(String),
    /// Selected type and its display text
    Choice(PropertyType, String),
    Check(bool),
    Button,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormRow {
    pub target: RowTarget,
    pub value: RowValue,
    /// Nesting level, 0 for the root properties
    pub depth: usize,
}

impl FormRow {
    fn new(target: RowTarget, value: RowValue, depth: usize) -> Self {
        Self {
            target,
            value,
            depth,
        }
    }

    pub fn is_text(&self) -> bool {
        matches!(self.value, RowValue::Text(_))
    }

    fn label(&self) -> &'static str {
        match self.target {
            RowTarget::FunctionName => "Function name: ",
            RowTarget::FunctionDescription => "Description: ",
            RowTarget::PropertyName { .. } => "▸ ",
            RowTarget::PropertyType { .. } => "  Type: ",
            RowTarget::PropertyDescription { .. } => "  Description: ",
            RowTarget::ItemType { .. } => "  Item type: ",
            RowTarget::Required { .. } => "  ",
            RowTarget::AddProperty { .. } => "",
        }
    }

    fn placeholder(&self) -> &'static str {
        match self.target {
            RowTarget::FunctionName => "Enter function name",
            RowTarget::FunctionDescription => "Enter function description",
            RowTarget::PropertyName { .. } => "Property name",
            _ => "Enter description",
        }
    }
}

/// Flatten a descriptor into form rows
pub fn build_rows(descriptor: &SchemaDescriptor) -> Vec<FormRow> {
    let mut rows = vec![
        FormRow::new(
            RowTarget::FunctionName,
            RowValue::Text(descriptor.name().to_string()),
            0,
        ),
        FormRow::new(
            RowTarget::FunctionDescription,
            RowValue::Text(descriptor.description().to_string()),
            0,
        ),
    ];
    if let Some(tree) = descriptor.editable_root() {
        push_level(&tree, &TreePath::root(), 0, &mut rows);
    }
    rows
}

fn push_level(tree: &PropertyTree, level: &TreePath, depth: usize, rows: &mut Vec<FormRow>) {
    for (name, def) in &tree.properties {
        let at = |make: fn(TreePath, String) -> RowTarget| make(level.clone(), name.clone());

        rows.push(FormRow::new(
            at(|level, name| RowTarget::PropertyName { level, name }),
            RowValue::Text(name.clone()),
            depth,
        ));
        rows.push(FormRow::new(
            at(|level, name| RowTarget::PropertyType { level, name }),
            RowValue::Choice(def.kind, def.type_label()),
            depth,
        ));
        rows.push(FormRow::new(
            at(|level, name| RowTarget::PropertyDescription { level, name }),
            RowValue::Text(def.description.clone().unwrap_or_default()),
            depth,
        ));

        if let Some(nested) = def.object_tree() {
            push_level(&nested, &level.child(name), depth + 1, rows);
        }
        if def.kind == PropertyType::Array {
            let items = def.items.as_deref();
            let value = match items {
                Some(items) => RowValue::Choice(items.kind, items.type_label()),
                None => {
                    RowValue::Choice(PropertyType::String, PropertyType::String.label().into())
                }
            };
            rows.push(FormRow::new(
                at(|level, name| RowTarget::ItemType { level, name }),
                value,
                depth,
            ));
            if let Some(nested) = items.and_then(PropertyDefinition::object_tree) {
                push_level(&nested, &level.items(name), depth + 1, rows);
            }
        }

        rows.push(FormRow::new(
            at(|level, name| RowTarget::Required { level, name }),
            RowValue::Check(tree.required.iter().any(|r| r == name)),
            depth,
        ));
    }
    rows.push(FormRow::new(
        RowTarget::AddProperty {
            level: level.clone(),
        },
        RowValue::Button,
        depth,
    ));
}

/// Text field being edited
#[derive(Debug, Clone)]
struct FieldEdit {
    target: RowTarget,
    text: TextBuffer,
}

/// Focus and in-progress edits of the builder form
#[derive(Debug, Clone, Default)]
pub struct Form {
    focus: usize,
    editing: Option<FieldEdit>,
    scroll: usize,
}

impl Form {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn focus(&self) -> usize {
        self.focus
    }

    pub fn focused_row(&self, ctl: &SchemaController) -> Option<FormRow> {
        build_rows(ctl.descriptor()).into_iter().nth(self.focus)
    }

    /// Uncommitted text of the focused field, if it is being edited
    pub fn draft(&self) -> Option<&str> {
        self.editing.as_ref().map(|e| e.text.content())
    }

    pub fn focus_next(&mut self, ctl: &mut SchemaController) {
        self.commit(ctl);
        let last = build_rows(ctl.descriptor()).len().saturating_sub(1);
        self.focus = (self.focus + 1).min(last);
    }

    pub fn focus_prev(&mut self, ctl: &mut SchemaController) {
        self.commit(ctl);
        self.focus = self.focus.saturating_sub(1);
        self.clamp(ctl);
    }

    /// Commit any pending edit and drop the field editor
    pub fn blur(&mut self, ctl: &mut SchemaController) {
        self.commit(ctl);
        self.clamp(ctl);
    }

    /// Keep focus on an existing row after the descriptor changed
    pub fn clamp(&mut self, ctl: &SchemaController) {
        let len = build_rows(ctl.descriptor()).len();
        self.focus = self.focus.min(len.saturating_sub(1));
    }

    /// Commit a pending rename; other fields are already live
    fn commit(&mut self, ctl: &mut SchemaController) {
        let Some(edit) = self.editing.take() else {
            return;
        };
        if let RowTarget::PropertyName { level, name } = edit.target {
            let rename = TreeEdit::Rename {
                from: name,
                to: edit.text.content().to_string(),
            };
            log_edit_error(ctl.edit_tree(&level, &rename));
        }
    }

    /// Type a character into the focused row
    pub fn insert_char(&mut self, ctl: &mut SchemaController, c: char) {
        let Some(row) = self.focused_row(ctl) else {
            return;
        };
        match row.value {
            RowValue::Text(_) => {
                self.field(&row).insert_char(c);
                self.push(ctl);
            }
            RowValue::Check(_) | RowValue::Button if c == ' ' => self.activate(ctl),
            _ => {}
        }
    }

    pub fn delete_char(&mut self, ctl: &mut SchemaController) {
        if let Some(row) = self.focused_row(ctl).filter(FormRow::is_text) {
            if self.field(&row).delete_char() {
                self.push(ctl);
            }
        }
    }

    pub fn delete_char_forward(&mut self, ctl: &mut SchemaController) {
        if let Some(row) = self.focused_row(ctl).filter(FormRow::is_text) {
            if self.field(&row).delete_char_forward() {
                self.push(ctl);
            }
        }
    }

    /// Left moves the text cursor, or selects the previous type
    pub fn left(&mut self, ctl: &mut SchemaController) {
        let Some(row) = self.focused_row(ctl) else {
            return;
        };
        match row.value {
            RowValue::Text(_) => self.field(&row).move_cursor_left(),
            RowValue::Choice(kind, _) => self.choose(ctl, &row.target, kind.prev()),
            _ => {}
        }
    }

    /// Right moves the text cursor, or selects the next type
    pub fn right(&mut self, ctl: &mut SchemaController) {
        let Some(row) = self.focused_row(ctl) else {
            return;
        };
        match row.value {
            RowValue::Text(_) => self.field(&row).move_cursor_right(),
            RowValue::Choice(kind, _) => self.choose(ctl, &row.target, kind.next()),
            _ => {}
        }
    }

    pub fn home(&mut self, ctl: &SchemaController) {
        if let Some(row) = self.focused_row(ctl).filter(FormRow::is_text) {
            self.field(&row).move_cursor_start();
        }
    }

    pub fn end(&mut self, ctl: &SchemaController) {
        if let Some(row) = self.focused_row(ctl).filter(FormRow::is_text) {
            self.field(&row).move_cursor_end();
        }
    }

    /// Enter: commit names, press buttons, toggle checkboxes, cycle types
    pub fn activate(&mut self, ctl: &mut SchemaController) {
        let Some(row) = self.focused_row(ctl) else {
            return;
        };
        match &row.target {
            RowTarget::PropertyName { .. } => self.blur(ctl),
            RowTarget::AddProperty { level } => {
                self.commit(ctl);
                match ctl.add_property(level) {
                    Ok(name) => tracing::debug!("Added '{}' at {}", name, level),
                    Err(e) => tracing::warn!("Add property failed: {}", e),
                }
            }
            RowTarget::Required { level, name } => {
                log_edit_error(ctl.edit_tree(level, &TreeEdit::ToggleRequired(name.clone())));
            }
            RowTarget::PropertyType { .. } | RowTarget::ItemType { .. } => {
                if let RowValue::Choice(kind, _) = row.value {
                    self.choose(ctl, &row.target, kind.next());
                }
            }
            RowTarget::FunctionName
            | RowTarget::FunctionDescription
            | RowTarget::PropertyDescription { .. } => self.focus_next(ctl),
        }
    }

    /// Remove the property the focused row belongs to
    pub fn remove_focused(&mut self, ctl: &mut SchemaController) {
        let Some(row) = self.focused_row(ctl) else {
            return;
        };
        let Some((level, name)) = row.target.property() else {
            return;
        };
        self.editing = None;
        log_edit_error(ctl.edit_tree(level, &TreeEdit::Remove(name.to_string())));
        self.clamp(ctl);
    }

    /// Adjust the scroll offset so the focused row is inside `height` rows
    pub fn ensure_visible(&mut self, height: usize) {
        if height == 0 {
            return;
        }
        if self.focus < self.scroll {
            self.scroll = self.focus;
        } else if self.focus >= self.scroll + height {
            self.scroll = self.focus + 1 - height;
        }
    }

    /// Field editor for `row`, started from the row's value if needed
    fn field(&mut self, row: &FormRow) -> &mut TextBuffer {
        if self
            .editing
            .as_ref()
            .map_or(true, |edit| edit.target != row.target)
        {
            self.editing = None;
        }
        let edit = self.editing.get_or_insert_with(|| {
            let value = match &row.value {
                RowValue::Text(text) => text.as_str(),
                _ => "",
            };
            FieldEdit {
                target: row.target.clone(),
                text: TextBuffer::with_content(value),
            }
        });
        &mut edit.text
    }

    /// Send the live value of the field being edited to the controller
    fn push(&mut self, ctl: &mut SchemaController) {
        let Some(edit) = &self.editing else {
            return;
        };
        let value = edit.text.content().to_string();
        match &edit.target {
            RowTarget::FunctionName => ctl.update_field(DescriptorField::Name, value),
            RowTarget::FunctionDescription => {
                ctl.update_field(DescriptorField::Description, value)
            }
            RowTarget::PropertyDescription { level, name } => {
                let change = TreeEdit::Change {
                    name: name.clone(),
                    change: FieldChange::Description(value),
                };
                log_edit_error(ctl.edit_tree(level, &change));
            }
            _ => {}
        }
    }

    fn choose(&mut self, ctl: &mut SchemaController, target: &RowTarget, kind: PropertyType) {
        let (level, name, change) = match target {
            RowTarget::PropertyType { level, name } => (level, name, FieldChange::Type(kind)),
            RowTarget::ItemType { level, name } => (level, name, FieldChange::ItemType(kind)),
            _ => return,
        };
        let edit = TreeEdit::Change {
            name: name.clone(),
            change,
        };
        log_edit_error(ctl.edit_tree(level, &edit));
    }

    pub fn widget<'a>(&'a self, ctl: &SchemaController, focused: bool) -> FormWidget<'a> {
        FormWidget {
            rows: build_rows(ctl.descriptor()),
            form: self,
            focused,
        }
    }
}

fn log_edit_error(result: Result<bool, EditError>) {
    if let Err(e) = result {
        tracing::warn!("Edit rejected: {}", e);
    }
}

/// Builder pane widget
pub struct FormWidget<'a> {
    rows: Vec<FormRow>,
    form: &'a Form,
    focused: bool,
}

impl FormWidget<'_> {
    fn row_line(&self, index: usize, row: &FormRow) -> Line<'static> {
        let is_focus = self.focused && index == self.form.focus;
        let indent = "│ ".repeat(row.depth);
        let mut spans = vec![
            Span::styled(indent, Style::default().fg(Color::DarkGray)),
            Span::styled(row.label(), Style::default().fg(Color::Gray)),
        ];

        let value_style = match row.target {
            RowTarget::PropertyName { .. } => Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
            _ => Style::default().fg(Color::White),
        };

        match &row.value {
            RowValue::Text(text) => {
                let editing = self
                    .form
                    .editing
                    .as_ref()
                    .filter(|edit| is_focus && edit.target == row.target);
                match editing {
                    Some(edit) => {
                        let (_, col) = edit.text.cursor_line_col();
                        let line =
                            TextBuffer::styled_line(edit.text.content(), Some(col), value_style);
                        spans.extend(line.spans);
                    }
                    None if text.is_empty() => {
                        spans.push(Span::styled(
                            row.placeholder(),
                            Style::default().fg(Color::DarkGray),
                        ));
                    }
                    None => spans.push(Span::styled(text.clone(), value_style)),
                }
            }
            RowValue::Choice(_, label) => {
                spans.push(Span::styled(
                    format!("◂ {} ▸", label),
                    Style::default().fg(Color::Yellow),
                ));
            }
            RowValue::Check(checked) => {
                let mark = if *checked { "[x]" } else { "[ ]" };
                spans.push(Span::styled(
                    format!("{} Required", mark),
                    Style::default().fg(Color::White),
                ));
            }
            RowValue::Button => {
                spans.push(Span::styled(
                    "+ Add property",
                    Style::default().fg(Color::Green),
                ));
            }
        }

        let line = Line::from(spans);
        if is_focus {
            line.style(Style::default().bg(Color::DarkGray))
        } else {
            line
        }
    }
}

impl Widget for FormWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let border = if self.focused {
            Color::Cyan
        } else {
            Color::DarkGray
        };
        let block = Block::default()
            .title(" Builder ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(border));

        let lines: Vec<Line> = self
            .rows
            .iter()
            .enumerate()
            .skip(self.form.scroll)
            .map(|(i, row)| self.row_line(i, row))
            .collect();

        Paragraph::new(lines).block(block).render(area, buf);
    }
}

#[cfg(test)]
#[path = "form_tests.rs"]
mod tests;
