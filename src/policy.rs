//! S3 POST policy document
//!
//! The policy is assembled as text rather than through a JSON serializer:
//! the exact bytes are what gets signed, and the clause layout below is the
//! one S3 forms have always been issued with.

use chrono::{DateTime, Utc};

use crate::conditions::{Condition, ConditionMap};

/// Expiration timestamp layout, second precision with a literal `Z`.
pub const EXPIRATION_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

impl Condition {
    /// Render the policy clause constraining `name`.
    pub fn clause(&self, name: &str) -> String {
        match self {
            Condition::Any => format!(r#"["starts-with", "${}", ""]"#, name),
            Condition::Exact(value) => format!(r#"{{"{}": "{}" }}"#, name, value),
            Condition::List(values) => format!(r#"{{"{}": "{}" }}"#, name, values.join(",")),
            Condition::Operation { op, value } => {
                format!(r#"["{}", "${}", "{}"]"#, op, name, value)
            }
            // TODO: confirm whether ranges should lead with "content-length-range"; S3 expects it.
            Condition::Range { start, stop } => format!(r#"["{}", "{}", "{}"]"#, name, start, stop),
        }
    }
}

/// Build the policy text for `conditions`, valid until `expiration`.
pub fn build_post_policy(expiration: DateTime<Utc>, conditions: &ConditionMap) -> String {
    let clauses: Vec<String> = conditions
        .iter()
        .map(|(name, condition)| condition.clause(name))
        .collect();

    format!(
        r#"{{"expiration": "{}", "conditions": [{}]}}"#,
        expiration.format(EXPIRATION_FORMAT),
        clauses.join(", ")
    )
}
