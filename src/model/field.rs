//! Field definitions: what the editor knows about each field of a type.
//!
//! Built once per record view by projecting the schema's raw field list into
//! a map keyed by field name. An absent schema yields an empty map, which
//! makes every field read-only plain text.

use std::collections::BTreeMap;

use serde_json::{Number, Value};

use super::record::Schema;

/// The identifier field is never editable, whatever the schema claims.
const ID_FIELD: &str = "Id";

/// Declared field type, collapsed to the kinds the editor distinguishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    Boolean,
    Picklist,
    Numeric,
    Date,
    TextArea,
    Text,
}

impl FieldType {
    /// Map a schema type name onto the closed set. Unknown names are text.
    pub fn from_declared(declared: &str) -> Self {
        match declared {
            "boolean" => Self::Boolean,
            "picklist" => Self::Picklist,
            "double" | "percent" | "currency" | "int" => Self::Numeric,
            "date" => Self::Date,
            "textarea" => Self::TextArea,
            _ => Self::Text,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PicklistOption {
    pub value: String,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldDefinition {
    pub name: String,
    pub label: String,
    pub updateable: bool,
    pub field_type: FieldType,
    /// The schema's own type name, kept for display (e.g. `currency`).
    pub declared_type: String,
    /// Ordered options; only populated for picklists.
    pub picklist: Vec<PicklistOption>,
}

impl FieldDefinition {
    /// Convert user-entered text into a typed value for this field.
    ///
    /// Empty input clears the field (`null`), except for booleans which must
    /// be explicit.
    pub fn coerce(&self, input: &str) -> Result<Value, String> {
        let input = input.trim_end_matches(['\r', '\n']);
        let label = if self.label.is_empty() {
            &self.name
        } else {
            &self.label
        };

        if input.is_empty() && self.field_type != FieldType::Boolean {
            return Ok(Value::Null);
        }

        match self.field_type {
            FieldType::Boolean => match input.to_ascii_lowercase().as_str() {
                "true" => Ok(Value::Bool(true)),
                "false" => Ok(Value::Bool(false)),
                _ => Err(format!("{label} expects true or false, got '{input}'")),
            },
            FieldType::Numeric => {
                let trimmed = input.trim();
                if let Ok(n) = trimmed.parse::<i64>() {
                    return Ok(Value::Number(n.into()));
                }
                trimmed
                    .parse::<f64>()
                    .ok()
                    .and_then(Number::from_f64)
                    .map(Value::Number)
                    .ok_or_else(|| {
                        format!(
                            "{label} expects a number ({}), got '{input}'",
                            self.declared_type
                        )
                    })
            }
            FieldType::Picklist => {
                if self.picklist.iter().any(|o| o.value == input) {
                    Ok(Value::String(input.to_string()))
                } else {
                    let allowed: Vec<&str> = self.picklist.iter().map(|o| o.value.as_str()).collect();
                    Err(format!(
                        "'{input}' is not a value of {label} (allowed: {})",
                        allowed.join(", ")
                    ))
                }
            }
            FieldType::Date => input
                .trim()
                .parse::<jiff::civil::Date>()
                .map(|d| Value::String(d.to_string()))
                .map_err(|e| format!("{label} expects a date (YYYY-MM-DD): {e}")),
            FieldType::TextArea | FieldType::Text => Ok(Value::String(input.to_string())),
        }
    }

    /// Short description of what the field accepts, for the editor.
    pub fn hint(&self) -> String {
        if self.field_type != FieldType::Picklist {
            return self.declared_type.clone();
        }
        let options: Vec<String> = self
            .picklist
            .iter()
            .map(|o| {
                if o.label == o.value {
                    o.value.clone()
                } else {
                    format!("{} ({})", o.value, o.label)
                }
            })
            .collect();
        format!("one of: {}", options.join(", "))
    }
}

/// Field definitions of one type, keyed by field name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldDefinitions(BTreeMap<String, FieldDefinition>);

impl FieldDefinitions {
    pub fn from_schema(schema: Option<&Schema>) -> Self {
        let Some(schema) = schema else {
            return Self::default();
        };

        let map = schema
            .fields
            .iter()
            .map(|raw| {
                let field_type = FieldType::from_declared(&raw.field_type);
                let picklist = if field_type == FieldType::Picklist {
                    raw.picklist_values
                        .iter()
                        .map(|p| PicklistOption {
                            value: p.value.clone(),
                            label: p.label.clone().unwrap_or_else(|| p.value.clone()),
                        })
                        .collect()
                } else {
                    Vec::new()
                };
                let definition = FieldDefinition {
                    name: raw.name.clone(),
                    label: raw.label.clone(),
                    updateable: raw.updateable,
                    field_type,
                    declared_type: raw.field_type.clone(),
                    picklist,
                };
                (raw.name.clone(), definition)
            })
            .collect();

        Self(map)
    }

    pub fn get(&self, name: &str) -> Option<&FieldDefinition> {
        self.0.get(name)
    }

    /// Whether the editor may change this field.
    pub fn is_updateable(&self, name: &str) -> bool {
        name != ID_FIELD && self.0.get(name).is_some_and(|f| f.updateable)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
