//! Structural comparison of YAML documents.

use serde_yaml::Value;

use crate::error::{PipewrightError, Result};

/// Whether two YAML documents hold the same data.
///
/// Formatting, comments and mapping key order are ignored. An empty
/// document equals an empty mapping.
pub fn documents_equal(left: &str, right: &str) -> Result<bool> {
    let left = parse(left, "first")?;
    let right = parse(right, "second")?;
    Ok(values_equal(&left, &right))
}

fn parse(document: &str, which: &str) -> Result<Value> {
    let value: Value =
        serde_yaml::from_str(document).map_err(|e| PipewrightError::CompareError {
            message: format!("{} document is not valid yaml: {}", which, e),
        })?;
    Ok(match value {
        Value::Null => Value::Mapping(Default::default()),
        other => other,
    })
}

fn values_equal(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Mapping(l), Value::Mapping(r)) => {
            l.len() == r.len()
                && l.iter()
                    .all(|(key, lv)| r.get(key).is_some_and(|rv| values_equal(lv, rv)))
        }
        (Value::Sequence(l), Value::Sequence(r)) => {
            l.len() == r.len() && l.iter().zip(r).all(|(lv, rv)| values_equal(lv, rv))
        }
        (Value::Tagged(l), Value::Tagged(r)) => {
            l.tag == r.tag && values_equal(&l.value, &r.value)
        }
        _ => left == right,
    }
}
