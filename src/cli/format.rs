//! Plain-text rendering of views for CLI display.

use std::fmt::Write as _;

use serde_json::Value;

use crate::identifier;
use crate::model::{LogBrowseView, RecordView, View};
use crate::navigator::{EditForm, FieldChange, Navigator, SaveReport};

/// Shown in place of a `null` value.
const NULL_TEXT: &str = "(null)";

/// Render whatever the navigator currently displays.
pub(super) fn format_view(navigator: &Navigator) -> String {
    match navigator.current() {
        View::Home => "Enter an identifier, a URL, or a variable name to scan.\n".to_string(),
        View::Loading(loading) => format!("Loading {}...\n", loading.id),
        View::Error(error) => format!("Error ({}): {}\n", error.id, error.message),
        View::Record(record) => {
            let mut out = format_record(record, navigator.edit_form());
            if navigator.is_saving() {
                out.push_str("(saving...)\n");
            }
            out
        }
        View::LogBrowse(view) => {
            format_log(view, &navigator.visible_versions(), &navigator.changes())
        }
    }
}

/// Display text of a field value; strings are shown unquoted.
pub(super) fn value_text(value: &Value) -> String {
    match value {
        Value::Null => NULL_TEXT.to_string(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Record table. Values that look like identifiers are marked drillable.
///
/// In edit mode the form's values are shown, with `*` on modified fields
/// and read-only fields flagged.
fn format_record(record: &RecordView, form: Option<&EditForm>) -> String {
    let mut out = format!("{}  {}", record.object_name, record.id);
    if form.is_some() {
        out.push_str("  [editing]");
        if record.fields.is_empty() {
            out.push_str("  (no schema; nothing is editable)");
        }
    }
    out.push('\n');

    let width = record.data.keys().map(String::len).max().unwrap_or(0);
    let modified = form.map(EditForm::modified).unwrap_or_default();

    for (field, loaded) in &record.data {
        let value = form.and_then(|f| f.value(field)).unwrap_or(loaded);
        let marker = if modified.contains_key(field) { '*' } else { ' ' };

        let _ = write!(out, "{marker} {field:<width$}  {}", value_text(value));

        if let Value::String(s) = value
            && s != &record.id
            && identifier::is_identifier(s)
        {
            out.push_str("  [drill]");
        }
        if let Some(form) = form {
            if !form.contains(field) {
                out.push_str("  [read-only]");
            } else if let Some(definition) = record.fields.get(field) {
                let _ = write!(out, "  <{}>", definition.hint());
            }
        }
        out.push('\n');
    }
    out
}

/// Version list followed by the selected version's fields.
///
/// Fields changed since the previous shown version are marked `~` with
/// their former value.
fn format_log(view: &LogBrowseView, visible: &[usize], changes: &[FieldChange]) -> String {
    let selected = view.current_snapshot();
    let mut out = format!(
        "{}: version {} of {} ({} shown)\n",
        view.variable,
        selected.version,
        view.versions.len(),
        visible.len()
    );

    for &index in visible {
        let version = &view.versions[index];
        let cursor = if index == view.current { '>' } else { ' ' };
        let null = if version.is_null_equivalent() { "  null" } else { "" };
        let _ = writeln!(
            out,
            "{cursor} {:>3}  {}  line {}{null}",
            version.version, version.timestamp, version.line_number
        );
    }

    out.push('\n');
    let width = selected.data.keys().map(String::len).max().unwrap_or(0);
    for (field, value) in &selected.data {
        let change = changes.iter().find(|c| &c.field == field);
        let marker = if change.is_some() { '~' } else { ' ' };
        let _ = write!(out, "{marker} {field:<width$}  {}", value_text(value));
        match change.map(|c| c.previous.as_ref()) {
            Some(Some(previous)) => {
                let _ = write!(out, "  (was {})", value_text(previous));
            }
            Some(None) => out.push_str("  (new)"),
            None => {}
        }
        out.push('\n');
    }
    out
}

/// The displayed field mapping as pretty JSON, for scripting.
pub(super) fn format_json(view: &View) -> Result<String, String> {
    let data = view
        .data()
        .ok_or_else(|| format!("the {} view has no fields", view.kind()))?;
    serde_json::to_string_pretty(data).map_err(|e| format!("failed to serialize fields: {e}"))
}

/// Summary printed after a successful update.
pub(super) fn format_report(report: &SaveReport) -> String {
    let mut out = format!(
        "Updated {} {} ({} field(s))\n",
        report.object_name,
        report.id,
        report.changes.len()
    );
    for (field, value) in &report.changes {
        let _ = writeln!(out, "  {field} = {value}");
    }
    out
}
