//! Settings profile transposition
//!
//! A settings profile is authored once for many models:
//!
//! ```json
//! {
//!     "Squelch": {
//!         "uv5r": { "name": "squelch", "value": 5 },
//!         "rt470": { "name": "sql", "value": 5 }
//!     }
//! }
//! ```
//!
//! [`transpose`] flattens it into the internal names of one model.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::error::ConfigError;
use crate::settings::SettingValue;

/// Target of one transposed setting
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProfileEntry {
    /// Human-readable label the entry was authored under
    pub pretty_name: String,
    pub value: SettingValue,
}

/// Profile flattened for one model, keyed by internal setting name
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct TransposedProfile {
    model: String,
    entries: BTreeMap<String, ProfileEntry>,
}

impl TransposedProfile {
    /// Model this profile was transposed for
    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn get(&self, name: &str) -> Option<&ProfileEntry> {
        self.entries.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries ordered by internal name
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ProfileEntry)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Parse and transpose a profile document in one step
    pub fn from_json_str(json: &str, model_id: &str) -> Result<Self, ConfigError> {
        let document: Value = serde_json::from_str(json)
            .map_err(|e| ConfigError::ProfileFormat(format!("not valid JSON: {}", e)))?;
        transpose(&document, model_id)
    }
}

/// Flatten an authored profile document for `model_id`
///
/// Labels without an entry for `model_id` are skipped. When two labels map
/// to the same internal name, the later label in document order wins.
pub fn transpose(document: &Value, model_id: &str) -> Result<TransposedProfile, ConfigError> {
    let labels = document.as_object().ok_or_else(|| {
        ConfigError::ProfileFormat("document must be an object of setting labels".to_string())
    })?;

    let mut entries = BTreeMap::new();

    for (label, per_model) in labels {
        let per_model = per_model.as_object().ok_or_else(|| {
            ConfigError::ProfileFormat(format!("'{}' must map model ids to settings", label))
        })?;

        let Some(target) = per_model.get(model_id) else {
            continue;
        };

        let (name, value) = parse_target(label, model_id, target)?;

        if let Some(previous) = entries.insert(
            name.clone(),
            ProfileEntry {
                pretty_name: label.clone(),
                value,
            },
        ) {
            debug!(
                "'{}' overrides '{}' for setting {} on {}",
                label, previous.pretty_name, name, model_id
            );
        }
    }

    Ok(TransposedProfile {
        model: model_id.to_string(),
        entries,
    })
}

fn parse_target(
    label: &str,
    model_id: &str,
    target: &Value,
) -> Result<(String, SettingValue), ConfigError> {
    let target = target.as_object().ok_or_else(|| {
        ConfigError::ProfileFormat(format!(
            "'{}' entry for {} must be an object with name and value",
            label, model_id
        ))
    })?;

    let name = target
        .get("name")
        .and_then(Value::as_str)
        .ok_or_else(|| {
            ConfigError::ProfileFormat(format!(
                "'{}' entry for {} has no string 'name'",
                label, model_id
            ))
        })?;

    let raw = target.get("value").ok_or_else(|| {
        ConfigError::ProfileFormat(format!("'{}' entry for {} has no 'value'", label, model_id))
    })?;

    let value = SettingValue::try_from(raw).map_err(|reason| {
        ConfigError::ProfileFormat(format!("'{}' entry for {}: {}", label, model_id, reason))
    })?;

    Ok((name.to_string(), value))
}
