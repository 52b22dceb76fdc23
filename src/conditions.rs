//! Policy conditions
//!
//! Every field the browser posts must be matched by a condition in the
//! signed policy or S3 rejects the upload. [`build_conditions`] derives that
//! set from the form fields, the widget options and any explicit constraints.

use serde_json::Value;
use std::collections::BTreeMap;

use crate::types::{Options, PostData, UploadError, UploadResult};

/// Widget options whose value the browser may choose freely.
pub const PASS_THRU_OPTIONS: &[&str] = &["folder", "fileExt", "fileDesc"];

/// Fields the widget always posts.
pub const FILTERED_OPTIONS: &[&str] = &["filename"];

/// Form fields that carry the signature itself and are never constrained.
pub const EXCLUDED_KEYS: &[&str] = &["AWSAccessKeyId", "policy", "signature"];

/// A constraint on one posted field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Condition {
    /// Any value is accepted.
    Any,
    Exact(String),
    /// Serialized as a single exact match on the comma-joined values.
    List(Vec<String>),
    /// Named operator such as `starts-with`.
    Operation { op: String, value: String },
    /// Numeric bounds, written without an operator token.
    Range { start: u64, stop: u64 },
}

pub type ConditionMap = BTreeMap<String, Condition>;

impl Condition {
    pub fn starts_with(prefix: impl Into<String>) -> Self {
        Condition::Operation {
            op: "starts-with".to_string(),
            value: prefix.into(),
        }
    }

    pub fn operation(op: impl Into<String>, value: impl Into<String>) -> Self {
        Condition::Operation {
            op: op.into(),
            value: value.into(),
        }
    }

    pub fn range(start: u64, stop: u64) -> Self {
        Condition::Range { start, stop }
    }

    /// Interpret a JSON constraint for `field`.
    ///
    /// Accepted shapes: `null`, a string, an array of strings,
    /// `{"op": .., "value": ..}` and `{"start": .., "stop": ..}`.
    pub fn from_json(field: &str, value: &Value) -> UploadResult<Self> {
        let unsupported = |kind: &'static str| UploadError::UnsupportedCondition {
            field: field.to_string(),
            kind,
        };

        match value {
            Value::Null => Ok(Condition::Any),
            Value::String(s) => Ok(Condition::Exact(s.clone())),
            Value::Array(items) => items
                .iter()
                .map(|item| item.as_str().map(str::to_string))
                .collect::<Option<Vec<_>>>()
                .map(Condition::List)
                .ok_or_else(|| unsupported("array with non-string items")),
            Value::Object(map) => {
                if let (Some(op), Some(operand), 2) = (map.get("op"), map.get("value"), map.len()) {
                    let op = op.as_str().ok_or_else(|| unsupported("operation with non-string op"))?;
                    let operand = scalar_text(operand)
                        .ok_or_else(|| unsupported("operation with non-scalar value"))?;
                    return Ok(Condition::operation(op, operand));
                }
                if let (Some(start), Some(stop), 2) = (map.get("start"), map.get("stop"), map.len()) {
                    return match (start.as_u64(), stop.as_u64()) {
                        (Some(start), Some(stop)) => Ok(Condition::range(start, stop)),
                        _ => Err(unsupported("range with non-integer bounds")),
                    };
                }
                Err(unsupported("object"))
            }
            Value::Bool(_) => Err(unsupported("boolean")),
            Value::Number(_) => Err(unsupported("number")),
        }
    }
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

impl From<&str> for Condition {
    fn from(value: &str) -> Self {
        Condition::Exact(value.to_string())
    }
}

impl From<String> for Condition {
    fn from(value: String) -> Self {
        Condition::Exact(value)
    }
}

impl From<Vec<String>> for Condition {
    fn from(values: Vec<String>) -> Self {
        Condition::List(values)
    }
}

/// Parse a JSON object of constraints, failing on the first unsupported one.
pub fn parse_conditions(raw: &serde_json::Map<String, Value>) -> UploadResult<ConditionMap> {
    raw.iter()
        .map(|(field, value)| Ok((field.clone(), Condition::from_json(field, value)?)))
        .collect()
}

/// Merge form fields, widget options and explicit constraints into the
/// condition set the policy is signed over.
///
/// Explicit constraints override form fields of the same name. Excluded
/// keys are dropped even when passed explicitly.
pub fn build_conditions(
    options: &Options,
    post_data: &PostData,
    explicit: &ConditionMap,
) -> ConditionMap {
    let mut overlay = explicit.clone();

    for name in PASS_THRU_OPTIONS {
        if options.contains_key(*name) && !overlay.contains_key(*name) {
            overlay.insert(name.to_string(), Condition::Any);
        }
    }

    for name in FILTERED_OPTIONS {
        overlay.entry(name.to_string()).or_insert(Condition::Any);
    }

    let mut conditions: ConditionMap = post_data
        .iter()
        .map(|(field, value)| (field.clone(), Condition::Exact(value.clone())))
        .collect();
    conditions.extend(overlay);

    for key in EXCLUDED_KEYS {
        conditions.remove(*key);
    }

    conditions
}
