// Type definitions and error taxonomy

use std::collections::BTreeMap;

/// Uploadify widget options, keyed by option or event-handler name.
pub type Options = serde_json::Map<String, serde_json::Value>;

/// Form fields posted to S3 alongside the file.
pub type PostData = BTreeMap<String, String>;

/// Every failure here is a configuration problem: the form cannot be built
/// from what the caller and the process settings provided.
#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("Attempted to initialize with unrecognized option '{0}'")]
    UnrecognizedOption(String),

    #[error("Missing required field '{0}'")]
    MissingField(String),

    #[error("Unexpected value type for condition '{field}': {kind}")]
    UnsupportedCondition { field: String, kind: &'static str },

    #[error("Failed to serialize options: {0}")]
    Json(#[from] serde_json::Error),
}

pub type UploadResult<T> = std::result::Result<T, UploadError>;
