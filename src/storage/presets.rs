//! Presets: named field-value mappings, one document per record type.

use std::collections::BTreeMap;
use std::path::PathBuf;

use jiff::Timestamp;
use serde::{Deserialize, Serialize};

use crate::model::Fields;

use super::{Result, Storage, StorageError, read_json, write_json};

/// Key the original record's identifier may be saved under; never applied.
const SOURCE_ID_KEY: &str = "_sourceId";

/// A saved set of field values for one type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Preset {
    pub fields: Fields,
    pub saved_at: Timestamp,
}

type PresetDocument = BTreeMap<String, Preset>;

impl Storage {
    /// Saves a preset, replacing any preset of the same name.
    pub fn save_preset(&self, object_name: &str, name: &str, fields: &Fields) -> Result<()> {
        let path = self.preset_path(object_name)?;
        let mut presets: PresetDocument = read_json(&path)?;
        presets.insert(
            name.to_string(),
            Preset {
                fields: fields.clone(),
                saved_at: Timestamp::now(),
            },
        );
        write_json(&path, &presets)
    }

    /// Lists preset names for a type, sorted.
    pub fn list_presets(&self, object_name: &str) -> Result<Vec<String>> {
        let presets: PresetDocument = read_json(&self.preset_path(object_name)?)?;
        Ok(presets.into_keys().collect())
    }

    /// Loads all presets for a type with their metadata.
    pub fn load_presets(&self, object_name: &str) -> Result<BTreeMap<String, Preset>> {
        read_json(&self.preset_path(object_name)?)
    }

    /// Loads one preset's field values, ready to apply to an edit form.
    pub fn load_preset(&self, object_name: &str, name: &str) -> Result<Fields> {
        let mut presets: PresetDocument = read_json(&self.preset_path(object_name)?)?;
        let mut preset = presets
            .remove(name)
            .ok_or_else(|| StorageError::PresetNotFound(name.to_string()))?;
        preset.fields.remove(SOURCE_ID_KEY);
        Ok(preset.fields)
    }

    fn preset_path(&self, object_name: &str) -> Result<PathBuf> {
        let valid = !object_name.is_empty()
            && object_name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_');
        if !valid {
            return Err(StorageError::InvalidTypeName(object_name.to_string()));
        }
        Ok(self.root.join("presets").join(format!("{object_name}.json")))
    }
}
