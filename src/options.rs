//! Uploadify widget options
//!
//! The widget accepts a fixed set of display/behaviour options plus a fixed
//! set of event-handler callbacks. Anything else is rejected up front so a
//! typo never silently reaches the page.

use serde_json::Value;
use std::collections::BTreeMap;
use tracing::warn;

use crate::types::{Options, UploadError, UploadResult};

/// Display and behaviour options understood by the widget.
pub const UPLOADIFY_OPTIONS: &[&str] = &[
    "auto",
    "buttonImg",
    "buttonText",
    "cancelImg",
    "checkScript",
    "displayData",
    "expressInstall",
    "fileDataName",
    "fileDesc",
    "fileExt",
    "folder",
    "height",
    "hideButton",
    "method",
    "multi",
    "queueID",
    "queueSizeLimit",
    "removeCompleted",
    "rollover",
    "script",
    "scriptAccess",
    "scriptData",
    "simUploadLimit",
    "sizeLimit",
    "uploader",
    "width",
    "wmode",
];

/// Event-handler options. Their values are JavaScript, not strings.
pub const UPLOADIFY_METHODS: &[&str] = &[
    "onAllComplete",
    "onCancel",
    "onCheck",
    "onClearQueue",
    "onComplete",
    "onError",
    "onInit",
    "onOpen",
    "onProgress",
    "onQueueFull",
    "onSelect",
    "onSelectOnce",
    "onSWFReady",
];

pub fn is_handler(key: &str) -> bool {
    UPLOADIFY_METHODS.contains(&key)
}

pub fn is_recognized(key: &str) -> bool {
    UPLOADIFY_OPTIONS.contains(&key) || is_handler(key)
}

/// Reject the whole option set if any key is unknown.
pub fn validate_options(options: &Options) -> UploadResult<()> {
    match options.keys().find(|key| !is_recognized(key)) {
        Some(key) => {
            warn!(option = %key, "Rejecting unrecognized Uploadify option");
            Err(UploadError::UnrecognizedOption(key.clone()))
        }
        None => Ok(()),
    }
}

/// Values that can stand in as a field default. An empty default means
/// "no fallback exists".
pub trait Truthy {
    fn is_truthy(&self) -> bool;
}

impl Truthy for String {
    fn is_truthy(&self) -> bool {
        !self.is_empty()
    }
}

impl Truthy for Value {
    fn is_truthy(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Bool(b) => *b,
            Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
            Value::String(s) => !s.is_empty(),
            Value::Array(items) => !items.is_empty(),
            Value::Object(map) => !map.is_empty(),
        }
    }
}

/// String-keyed field maps that can be filled with defaults.
pub trait FieldMap {
    type Value: Truthy;

    fn has_field(&self, key: &str) -> bool;
    fn set_field(&mut self, key: &str, value: Self::Value);
}

impl FieldMap for Options {
    type Value = Value;

    fn has_field(&self, key: &str) -> bool {
        self.contains_key(key)
    }

    fn set_field(&mut self, key: &str, value: Value) {
        self.insert(key.to_string(), value);
    }
}

impl FieldMap for BTreeMap<String, String> {
    type Value = String;

    fn has_field(&self, key: &str) -> bool {
        self.contains_key(key)
    }

    fn set_field(&mut self, key: &str, value: String) {
        self.insert(key.to_string(), value);
    }
}

/// Fill `key` with `default` unless the caller already set it.
///
/// Fails with [`UploadError::MissingField`] when the key is absent and the
/// default is empty, which is how required settings without a fallback are
/// enforced.
pub fn set_default_if_absent<M: FieldMap>(
    map: &mut M,
    key: &str,
    default: M::Value,
) -> UploadResult<()> {
    if map.has_field(key) {
        return Ok(());
    }
    if !default.is_truthy() {
        return Err(UploadError::MissingField(key.to_string()));
    }
    map.set_field(key, default);
    Ok(())
}

/// Serialize options for embedding in a page.
///
/// Event-handler values are emitted as raw code: each is first written as a
/// quoted `%name%` placeholder, then the quoted placeholder is swapped for
/// the handler text in the serialized output.
pub fn options_to_json(options: &Options) -> UploadResult<String> {
    let mut rendered = options.clone();
    let mut substitutions = Vec::new();

    for (key, value) in options {
        if !is_handler(key) {
            continue;
        }
        let placeholder = format!("%{}%", key);
        let code = match value {
            Value::String(code) => code.clone(),
            other => other.to_string(),
        };
        substitutions.push((format!("\"{}\"", placeholder), code));
        rendered.insert(key.clone(), Value::String(placeholder));
    }

    let mut out = serde_json::to_string(&rendered)?;
    for (search, replace) in substitutions {
        out = out.replace(&search, &replace);
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn options(value: Value) -> Options {
        match value {
            Value::Object(map) => map,
            _ => panic!("test options must be an object"),
        }
    }

    #[test]
    fn test_recognized_options_validate() {
        let opts = options(json!({
            "auto": true,
            "buttonText": "Upload",
            "multi": false,
            "sizeLimit": 1048576,
            "onComplete": "handleComplete",
            "onError": "handleError",
        }));

        assert!(validate_options(&opts).is_ok());
        assert!(validate_options(&Options::new()).is_ok());
    }

    #[test]
    fn test_every_enumerated_key_is_recognized() {
        for key in UPLOADIFY_OPTIONS.iter().chain(UPLOADIFY_METHODS) {
            assert!(is_recognized(key), "{key} should be recognized");
        }
        assert!(is_handler("onSWFReady"));
        assert!(!is_handler("script"));
    }

    #[test]
    fn test_unrecognized_option_rejected() {
        let opts = options(json!({ "auto": true, "bucketName": "photos" }));

        match validate_options(&opts) {
            Err(UploadError::UnrecognizedOption(key)) => assert_eq!(key, "bucketName"),
            other => panic!("expected unrecognized option error, got {:?}", other),
        }
    }

    #[test]
    fn test_option_keys_are_case_sensitive() {
        let opts = options(json!({ "ButtonText": "Upload" }));
        assert!(validate_options(&opts).is_err());
    }

    #[test]
    fn test_set_default_keeps_existing_value() {
        let mut post_data = BTreeMap::new();
        post_data.insert("acl".to_string(), "public-read".to_string());

        set_default_if_absent(&mut post_data, "acl", "private".to_string()).unwrap();
        assert_eq!(post_data["acl"], "public-read");

        // An existing key wins even when no fallback exists.
        set_default_if_absent(&mut post_data, "acl", String::new()).unwrap();
        assert_eq!(post_data["acl"], "public-read");
    }

    #[test]
    fn test_set_default_fills_absent_key() {
        let mut opts = Options::new();

        set_default_if_absent(&mut opts, "cancelImg", json!("/media/cancel.png")).unwrap();
        assert_eq!(opts["cancelImg"], json!("/media/cancel.png"));
    }

    #[test]
    fn test_set_default_without_fallback_fails() {
        let mut post_data: BTreeMap<String, String> = BTreeMap::new();

        let result = set_default_if_absent(&mut post_data, "bucket", String::new());
        assert!(matches!(result, Err(UploadError::MissingField(ref key)) if key == "bucket"));
        assert!(post_data.is_empty());

        let mut opts = Options::new();
        for falsy in [Value::Null, json!(false), json!(0), json!(""), json!([]), json!({})] {
            assert!(set_default_if_absent(&mut opts, "uploader", falsy).is_err());
        }
        assert!(opts.is_empty());
    }

    #[test]
    fn test_options_json_substitutes_handlers() {
        let opts = options(json!({
            "auto": true,
            "onComplete": "function(event, id, file) { done(file); }",
        }));

        let out = options_to_json(&opts).unwrap();

        assert_eq!(
            out,
            r#"{"auto":true,"onComplete":function(event, id, file) { done(file); }}"#
        );
    }

    #[test]
    fn test_options_json_leaves_plain_options_quoted() {
        let opts = options(json!({ "buttonText": "onComplete", "script": "https://photos.s3.amazonaws.com" }));

        let out = options_to_json(&opts).unwrap();
        let parsed: Value = serde_json::from_str(&out).unwrap();

        assert_eq!(parsed["buttonText"], json!("onComplete"));
        assert_eq!(parsed["script"], json!("https://photos.s3.amazonaws.com"));
    }
}
