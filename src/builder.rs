//! Upload form construction
//!
//! [`UploadifyS3`] ties the pieces together: it validates and fills the
//! widget options, fills the S3 form fields, derives the policy conditions,
//! then signs the policy and hands everything back as one options map ready
//! to be embedded in a page.

use chrono::{DateTime, Duration, Utc};
use serde_json::Value;
use tracing::debug;

use crate::conditions::{build_conditions, parse_conditions, ConditionMap};
use crate::config::Config;
use crate::options::{options_to_json, set_default_if_absent, validate_options};
use crate::policy::build_post_policy;
use crate::signer::{sign, uri_encode};
use crate::types::{Options, PostData, UploadError, UploadResult};

/// A signed Uploadify configuration for one upload form.
#[derive(Debug, Clone)]
pub struct UploadifyS3 {
    options: Options,
    post_data: PostData,
    conditions: ConditionMap,
    policy_string: String,
    policy: String,
    signature: String,
}

impl UploadifyS3 {
    /// Build and sign a form that expires `config.default_form_lifetime`
    /// seconds from now.
    pub fn new(
        config: &Config,
        options: Options,
        post_data: PostData,
        conditions: ConditionMap,
    ) -> UploadResult<Self> {
        let expiration = Utc::now() + Duration::seconds(i64::from(config.default_form_lifetime));
        Self::with_expiration(config, options, post_data, conditions, expiration)
    }

    /// Like [`UploadifyS3::new`], with constraints given as JSON values.
    pub fn from_json(
        config: &Config,
        options: Options,
        post_data: PostData,
        conditions: &serde_json::Map<String, Value>,
    ) -> UploadResult<Self> {
        let conditions = parse_conditions(conditions)?;
        Self::new(config, options, post_data, conditions)
    }

    /// Build and sign a form with a fixed expiration instant.
    pub fn with_expiration(
        config: &Config,
        options: Options,
        mut post_data: PostData,
        conditions: ConditionMap,
        expiration: DateTime<Utc>,
    ) -> UploadResult<Self> {
        let mut merged = config.default_options.clone();
        merged.extend(options);
        let mut options = merged;

        validate_options(&options)?;

        set_default_if_absent(&mut options, "cancelImg", Value::String(config.default_cancel_img()))?;
        set_default_if_absent(&mut options, "uploader", Value::String(config.default_uploader()))?;

        set_default_if_absent(&mut post_data, "key", uri_encode(&config.default_key_pattern))?;
        set_default_if_absent(&mut post_data, "acl", config.default_acl.clone())?;
        set_default_if_absent(&mut post_data, "bucket", config.bucket_name.clone())?;

        // The configured key is required even when the form already carries one.
        if config.access_key_id.is_empty() {
            return Err(UploadError::MissingField("AWSAccessKeyId".to_string()));
        }
        set_default_if_absent(&mut post_data, "AWSAccessKeyId", uri_encode(&config.access_key_id))?;

        // Posts go to the bucket the form names, which may differ from the configured one.
        let script = config.bucket_url_for(&post_data["bucket"]);
        set_default_if_absent(&mut options, "script", Value::String(script))?;

        let conditions = build_conditions(&options, &post_data, &conditions);

        if config.secret_access_key.is_empty() {
            return Err(UploadError::MissingField("AWSSecretAccessKey".to_string()));
        }

        debug!(
            bucket = %post_data["bucket"],
            conditions = conditions.len(),
            expiration = %expiration,
            "Signing upload policy"
        );

        let policy_string = build_post_policy(expiration, &conditions);
        let signed = sign(&policy_string, &config.secret_access_key);

        post_data.insert("policy".to_string(), signed.policy.clone());
        post_data.insert("signature".to_string(), signed.signature.clone());

        let script_data = post_data
            .iter()
            .map(|(field, value)| (field.clone(), Value::String(value.clone())))
            .collect();
        options.insert("scriptData".to_string(), Value::Object(script_data));

        Ok(Self {
            options,
            post_data,
            conditions,
            policy_string,
            policy: signed.policy,
            signature: signed.signature,
        })
    }

    /// Widget options, including the signed form fields under `scriptData`.
    pub fn options(&self) -> &Options {
        &self.options
    }

    pub fn post_data(&self) -> &PostData {
        &self.post_data
    }

    pub fn conditions(&self) -> &ConditionMap {
        &self.conditions
    }

    /// The policy document exactly as signed.
    pub fn policy_string(&self) -> &str {
        &self.policy_string
    }

    /// Base64-encoded policy.
    pub fn policy(&self) -> &str {
        &self.policy
    }

    /// URI-escaped signature.
    pub fn signature(&self) -> &str {
        &self.signature
    }

    /// Options serialized for the page, event handlers left unquoted.
    pub fn options_json(&self) -> UploadResult<String> {
        options_to_json(&self.options)
    }

    pub fn into_options(self) -> Options {
        self.options
    }
}
