//! In-flight edits of a record view.

use serde_json::Value;

use crate::model::{Fields, RecordView};

/// Editable values of one record, alongside the values it was loaded with.
///
/// Holds only fields the schema marks updateable; the identifier is never
/// among them.
#[derive(Debug, Clone, PartialEq)]
pub struct EditForm {
    original: Fields,
    values: Fields,
}

impl EditForm {
    pub fn new(record: &RecordView) -> Self {
        let original: Fields = record
            .data
            .iter()
            .filter(|(name, _)| record.fields.is_updateable(name))
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect();

        Self {
            values: original.clone(),
            original,
        }
    }

    pub fn contains(&self, field: &str) -> bool {
        self.values.contains_key(field)
    }

    pub fn value(&self, field: &str) -> Option<&Value> {
        self.values.get(field)
    }

    /// Set a field already known to be editable.
    pub(super) fn set(&mut self, field: &str, value: Value) {
        if let Some(slot) = self.values.get_mut(field) {
            *slot = value;
        }
    }

    /// Apply preset values onto the form.
    ///
    /// Only fields present in both the preset and the form change; every
    /// other field keeps its current value. Returns the fields applied.
    pub fn apply(&mut self, preset: &Fields) -> Vec<String> {
        let mut applied = Vec::new();
        for (field, value) in preset {
            if let Some(slot) = self.values.get_mut(field) {
                *slot = value.clone();
                applied.push(field.clone());
            }
        }
        applied
    }

    /// Every editable value, changed or not.
    pub fn all(&self) -> Fields {
        self.values.clone()
    }

    /// Values that differ from what was loaded.
    ///
    /// `null` compares equal to empty text, and line endings are
    /// normalized, so an untouched empty field is never reported.
    pub fn modified(&self) -> Fields {
        self.values
            .iter()
            .filter(|(field, value)| {
                let original = self.original.get(*field).unwrap_or(&Value::Null);
                comparable(value) != comparable(original)
            })
            .map(|(field, value)| (field.clone(), value.clone()))
            .collect()
    }
}

fn comparable(value: &Value) -> String {
    let text = match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };
    text.replace("\r\n", "\n").replace('\r', "\n")
}
