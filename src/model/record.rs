//! Envelopes returned by the record data service.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A field-name → value mapping, as displayed and as sent on update.
///
/// Backed by an ordered map, so iteration is sorted by field name.
pub type Fields = serde_json::Map<String, Value>;

/// Key the data CLI adds to every record with type/url bookkeeping.
const ATTRIBUTES_KEY: &str = "attributes";

/// JSON shape returned by a record fetch.
///
/// `result` is absent (or empty) when the record does not exist, which is a
/// semantic miss rather than a transport failure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecordEnvelope {
    #[serde(default)]
    pub result: Option<Fields>,
}

impl RecordEnvelope {
    pub fn new(result: Fields) -> Self {
        Self {
            result: Some(result),
        }
    }

    /// The record's fields without bookkeeping keys, or `None` on a miss.
    pub fn into_fields(self) -> Option<Fields> {
        let mut fields = self.result?;
        fields.remove(ATTRIBUTES_KEY);
        if fields.is_empty() {
            None
        } else {
            Some(fields)
        }
    }
}

/// JSON shape returned by a type schema fetch.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SchemaEnvelope {
    #[serde(default)]
    pub result: Option<Schema>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    #[serde(default)]
    pub fields: Vec<RawField>,
}

/// One entry of a schema's field list, as the data CLI reports it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawField {
    pub name: String,
    #[serde(default)]
    pub updateable: bool,
    #[serde(rename = "type", default)]
    pub field_type: String,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub picklist_values: Vec<RawPicklistValue>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawPicklistValue {
    pub value: String,
    #[serde(default)]
    pub label: Option<String>,
}
