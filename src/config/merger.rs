//! Deep merge algorithm for YAML values files.
//!
//! Values files are layered so later files override earlier ones.
//!
//! # Merge Rules
//!
//! - Objects are merged recursively
//! - Arrays are replaced entirely (not merged)
//! - Null values in overlay delete the corresponding key from base
//! - Scalars in overlay replace scalars in base

use serde_yaml::Value;

use crate::error::{PipewrightError, Result};

/// Deep merge two YAML values.
///
/// Later values override earlier values at the point of conflict.
/// Objects are merged recursively. Arrays are replaced entirely.
/// Null values in overlay delete the corresponding key from base.
pub fn deep_merge(base: &Value, overlay: &Value) -> Value {
    match (base, overlay) {
        (Value::Mapping(base_map), Value::Mapping(overlay_map)) => {
            let mut result = base_map.clone();

            for (key, overlay_value) in overlay_map {
                if overlay_value.is_null() {
                    result.remove(key);
                } else if let Some(base_value) = base_map.get(key) {
                    result.insert(key.clone(), deep_merge(base_value, overlay_value));
                } else {
                    result.insert(key.clone(), overlay_value.clone());
                }
            }

            Value::Mapping(result)
        }

        (_, overlay) => overlay.clone(),
    }
}

/// Merge multiple documents in order (later overrides earlier).
pub fn merge_configs(configs: &[Value]) -> Value {
    configs
        .iter()
        .fold(Value::Mapping(Default::default()), |acc, config| {
            deep_merge(&acc, config)
        })
}

/// Parse raw values files and merge them in the given order.
///
/// Empty documents contribute nothing. Any document whose top level is
/// not a mapping is rejected with `MergeError`.
pub fn merge_yaml_documents<B: AsRef<[u8]>>(documents: &[B]) -> Result<String> {
    let mut values = Vec::with_capacity(documents.len());

    for (index, raw) in documents.iter().enumerate() {
        let value: Value =
            serde_yaml::from_slice(raw.as_ref()).map_err(|e| PipewrightError::MergeError {
                message: format!("document {} is not valid yaml: {}", index + 1, e),
            })?;

        match value {
            Value::Null => continue,
            Value::Mapping(_) => values.push(value),
            _ => {
                return Err(PipewrightError::MergeError {
                    message: format!("document {} is not a yaml mapping", index + 1),
                })
            }
        }
    }

    serde_yaml::to_string(&merge_configs(&values)).map_err(|e| PipewrightError::MergeError {
        message: e.to_string(),
    })
}
