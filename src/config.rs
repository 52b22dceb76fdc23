use anyhow::{Context, Result};
use serde::Deserialize;
use std::env;
use std::fmt;
use std::path::Path;

use crate::types::Options;

const S3_HOST_SUFFIX: &str = "s3.amazonaws.com";

/// Process-wide upload settings, loaded once at startup and shared by
/// reference with every [`UploadifyS3`](crate::UploadifyS3) build.
#[derive(Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub access_key_id: String,
    #[serde(default)]
    pub secret_access_key: String,
    #[serde(default)]
    pub bucket_name: String,
    #[serde(default = "default_secure_urls")]
    pub secure_urls: bool,
    /// Explicit form action URL; derived from the bucket name when unset.
    #[serde(default)]
    pub bucket_url: Option<String>,
    #[serde(default = "default_acl")]
    pub default_acl: String,
    #[serde(default = "default_key_pattern")]
    pub default_key_pattern: String,
    /// Seconds a signed form stays valid.
    #[serde(default = "default_form_lifetime")]
    pub default_form_lifetime: u32,
    /// Base URL the widget assets (cancel image, flash uploader) are served from.
    #[serde(default = "default_media_url")]
    pub media_url: String,
    /// Widget options applied to every form before caller options.
    #[serde(default)]
    pub default_options: Options,
}

const ENV_PREFIX: &str = "UPLOADIFY";
const DEFAULT_OPTIONS_VAR: &str = "UPLOADIFY_DEFAULT_OPTIONS";

fn parse_default_options(raw: &str) -> Result<Options> {
    serde_json::from_str(raw).context("UPLOADIFY_DEFAULT_OPTIONS must be a JSON object")
}

fn parse_flag(raw: &str) -> Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        other => anyhow::bail!("unrecognized boolean '{}'", other),
    }
}

fn default_secure_urls() -> bool {
    true
}

fn default_acl() -> String {
    "private".to_string()
}

fn default_key_pattern() -> String {
    "${filename}".to_string()
}

fn default_form_lifetime() -> u32 {
    36000 // 10 hours
}

fn default_media_url() -> String {
    "/media/".to_string()
}

impl Config {
    pub fn new(
        access_key_id: impl Into<String>,
        secret_access_key: impl Into<String>,
        bucket_name: impl Into<String>,
    ) -> Self {
        Self {
            access_key_id: access_key_id.into(),
            secret_access_key: secret_access_key.into(),
            bucket_name: bucket_name.into(),
            secure_urls: default_secure_urls(),
            bucket_url: None,
            default_acl: default_acl(),
            default_key_pattern: default_key_pattern(),
            default_form_lifetime: default_form_lifetime(),
            media_url: default_media_url(),
            default_options: Options::new(),
        }
    }

    /// Load settings from `AWS_*`, `MEDIA_URL` and `UPLOADIFY_DEFAULT_OPTIONS`
    /// (a JSON object), reading a `.env` file first when one exists.
    ///
    /// `AWS_S3_SECURE_URLS` accepts `true`/`false`, `1`/`0`, `yes`/`no` and
    /// `on`/`off` in any case.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let default_options = match env::var(DEFAULT_OPTIONS_VAR) {
            Ok(raw) => parse_default_options(&raw)?,
            Err(_) => Options::new(),
        };

        Ok(Self {
            access_key_id: env::var("AWS_ACCESS_KEY_ID").unwrap_or_default(),
            secret_access_key: env::var("AWS_SECRET_ACCESS_KEY").unwrap_or_default(),
            bucket_name: env::var("AWS_BUCKET_NAME").unwrap_or_default(),
            secure_urls: match env::var("AWS_S3_SECURE_URLS") {
                Ok(raw) => parse_flag(&raw).context("AWS_S3_SECURE_URLS must be a boolean")?,
                Err(_) => default_secure_urls(),
            },
            bucket_url: env::var("AWS_BUCKET_URL").ok(),
            default_acl: env::var("AWS_DEFAULT_ACL").unwrap_or_else(|_| default_acl()),
            default_key_pattern: env::var("AWS_DEFAULT_KEY_PATTERN")
                .unwrap_or_else(|_| default_key_pattern()),
            default_form_lifetime: env::var("AWS_DEFAULT_FORM_LIFETIME")
                .unwrap_or_else(|_| default_form_lifetime().to_string())
                .parse()
                .context("AWS_DEFAULT_FORM_LIFETIME must be a number of seconds")?,
            media_url: env::var("MEDIA_URL").unwrap_or_else(|_| default_media_url()),
            default_options,
        })
    }

    /// Load settings from a file (TOML, JSON or YAML by extension), with
    /// `UPLOADIFY_`-prefixed environment variables layered on top.
    ///
    /// `UPLOADIFY_DEFAULT_OPTIONS` is read as JSON, as in [`Config::from_env`].
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_file_with_env(path.as_ref(), env::vars())
    }

    fn from_file_with_env(
        path: &Path,
        vars: impl IntoIterator<Item = (String, String)>,
    ) -> Result<Self> {
        let mut default_options = None;
        let mut overrides = ::config::Map::new();
        for (name, value) in vars {
            if name == DEFAULT_OPTIONS_VAR {
                default_options = Some(parse_default_options(&value)?);
            } else if name.starts_with(ENV_PREFIX) {
                overrides.insert(name, value);
            }
        }

        let settings = ::config::Config::builder()
            .add_source(::config::File::from(path))
            .add_source(
                ::config::Environment::with_prefix(ENV_PREFIX)
                    .try_parsing(true)
                    .source(Some(overrides)),
            )
            .build()
            .with_context(|| format!("Failed to read upload settings from {}", path.display()))?;

        let mut config: Self = settings
            .try_deserialize()
            .context("Invalid upload settings")?;
        if let Some(options) = default_options {
            config.default_options = options;
        }

        Ok(config)
    }

    pub fn with_bucket_url(mut self, bucket_url: impl Into<String>) -> Self {
        self.bucket_url = Some(bucket_url.into());
        self
    }

    pub fn with_secure_urls(mut self, secure_urls: bool) -> Self {
        self.secure_urls = secure_urls;
        self
    }

    pub fn with_default_acl(mut self, acl: impl Into<String>) -> Self {
        self.default_acl = acl.into();
        self
    }

    pub fn with_default_key_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.default_key_pattern = pattern.into();
        self
    }

    pub fn with_form_lifetime(mut self, seconds: u32) -> Self {
        self.default_form_lifetime = seconds;
        self
    }

    pub fn with_media_url(mut self, media_url: impl Into<String>) -> Self {
        self.media_url = media_url.into();
        self
    }

    pub fn with_default_options(mut self, options: Options) -> Self {
        self.default_options = options;
        self
    }

    /// URL the upload form posts to.
    pub fn bucket_url(&self) -> String {
        self.bucket_url_for(&self.bucket_name)
    }

    /// URL a form posting to `bucket` uses, unless an explicit URL is configured.
    pub fn bucket_url_for(&self, bucket: &str) -> String {
        match &self.bucket_url {
            Some(url) => url.clone(),
            None => {
                let scheme = if self.secure_urls { "https" } else { "http" };
                format!("{}://{}.{}", scheme, bucket, S3_HOST_SUFFIX)
            }
        }
    }

    pub fn default_cancel_img(&self) -> String {
        format!("{}uploadify/cancel.png", self.media_url)
    }

    pub fn default_uploader(&self) -> String {
        format!("{}uploadify/uploadify.swf", self.media_url)
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"<redacted>")
            .field("bucket_name", &self.bucket_name)
            .field("secure_urls", &self.secure_urls)
            .field("bucket_url", &self.bucket_url)
            .field("default_acl", &self.default_acl)
            .field("default_key_pattern", &self.default_key_pattern)
            .field("default_form_lifetime", &self.default_form_lifetime)
            .field("media_url", &self.media_url)
            .field("default_options", &self.default_options)
            .finish()
    }
}
