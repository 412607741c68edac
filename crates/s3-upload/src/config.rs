//! Configuration module
//!
//! Upload settings come from two layers: the process environment, captured once
//! into an [`UploadConfig`] when the uploader is built, and an optional
//! per-call [`UploadConfig`]. For every field the environment wins when it is
//! set; otherwise the call-site value is used.

use std::env;
use std::fmt;

use serde::Deserialize;

use crate::error::{UploadError, UploadResult};

pub const ENV_BUCKET: &str = "S3_UPLOAD_BUCKET";
pub const ENV_REGION: &str = "S3_UPLOAD_REGION";
pub const ENV_URL: &str = "S3_UPLOAD_URL";
pub const ENV_ENDPOINT: &str = "S3_UPLOAD_ENDPOINT";
pub const ENV_KEEP_ORIGINAL_URL: &str = "S3_UPLOAD_KEEP_ORIGINAL_URL";
pub const ENV_KEEP_ORIGINAL_FILENAME: &str = "S3_UPLOAD_KEEP_ORIGINAL_FILENAME";
pub const ENV_ACCESS_KEY_ID: &str = "S3_UPLOAD_ACCESS_KEY_ID";
pub const ENV_SECRET_ACCESS_KEY: &str = "S3_UPLOAD_SECRET_ACCESS_KEY";
const AWS_ACCESS_KEY_ID: &str = "AWS_ACCESS_KEY_ID";
const AWS_SECRET_ACCESS_KEY: &str = "AWS_SECRET_ACCESS_KEY";

/// Static access key pair.
#[derive(Clone, PartialEq, Eq, Deserialize)]
pub struct Credentials {
    #[serde(alias = "accessKeyId")]
    pub access_key_id: String,
    #[serde(alias = "secretAccessKey")]
    pub secret_access_key: String,
}

impl Credentials {
    pub fn new(access_key_id: impl Into<String>, secret_access_key: impl Into<String>) -> Self {
        Self {
            access_key_id: access_key_id.into(),
            secret_access_key: secret_access_key.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"<redacted>")
            .finish()
    }
}

/// One configuration layer. Every field is optional; unset fields defer to
/// the other layer.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct UploadConfig {
    pub region: Option<String>,
    pub bucket: Option<String>,
    /// Display URL substituted for the canonical S3 host in returned locations.
    pub url: Option<String>,
    /// Custom endpoint for S3-compatible providers (MinIO, Spaces, ...).
    pub endpoint: Option<String>,
    pub credentials: Option<Credentials>,
    #[serde(alias = "keepOriginalFilename")]
    pub keep_original_filename: Option<bool>,
    #[serde(alias = "keepOriginalUrl")]
    pub keep_original_url: Option<bool>,
}

impl UploadConfig {
    /// Capture the `S3_UPLOAD_*` environment, loading `.env` first if present.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build the environment layer from an arbitrary variable lookup.
    ///
    /// Empty values count as unset. Flags are only `Some(true)` when the
    /// variable is literally `"true"`. Credentials are only taken when both
    /// halves of the pair are available.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|value| !value.is_empty());
        let flag = |name: &str| var(name).filter(|value| value == "true").map(|_| true);

        let access_key_id = var(ENV_ACCESS_KEY_ID).or_else(|| var(AWS_ACCESS_KEY_ID));
        let secret_access_key =
            var(ENV_SECRET_ACCESS_KEY).or_else(|| var(AWS_SECRET_ACCESS_KEY));
        let credentials = match (access_key_id, secret_access_key) {
            (Some(id), Some(secret)) => Some(Credentials::new(id, secret)),
            _ => None,
        };

        Self {
            region: var(ENV_REGION),
            bucket: var(ENV_BUCKET),
            url: var(ENV_URL),
            endpoint: var(ENV_ENDPOINT),
            credentials,
            keep_original_filename: flag(ENV_KEEP_ORIGINAL_FILENAME),
            keep_original_url: flag(ENV_KEEP_ORIGINAL_URL),
        }
    }

    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    pub fn with_bucket(mut self, bucket: impl Into<String>) -> Self {
        self.bucket = Some(bucket.into());
        self
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    pub fn with_keep_original_filename(mut self, keep: bool) -> Self {
        self.keep_original_filename = Some(keep);
        self
    }

    pub fn with_keep_original_url(mut self, keep: bool) -> Self {
        self.keep_original_url = Some(keep);
        self
    }
}

/// Effective configuration for a single call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolvedConfig {
    pub region: String,
    pub bucket: String,
    pub url: Option<String>,
    pub endpoint: Option<String>,
    pub credentials: Option<Credentials>,
    pub keep_original_filename: bool,
    pub keep_original_url: bool,
}

impl ResolvedConfig {
    /// Merge the environment layer with an optional call-site layer.
    ///
    /// Region and bucket are checked first, in that order, so a missing region
    /// fails before anything else is looked at.
    pub fn resolve(env: &UploadConfig, call: Option<&UploadConfig>) -> UploadResult<Self> {
        let region = pick(env.region.as_ref(), call.and_then(|c| c.region.as_ref())).ok_or_else(
            || UploadError::Configuration("No region provided as env var or config".to_string()),
        )?;
        let bucket = pick(env.bucket.as_ref(), call.and_then(|c| c.bucket.as_ref())).ok_or_else(
            || UploadError::Configuration("No bucket provided as env var or config".to_string()),
        )?;

        let url = pick(env.url.as_ref(), call.and_then(|c| c.url.as_ref()));
        let endpoint = pick(env.endpoint.as_ref(), call.and_then(|c| c.endpoint.as_ref()));

        let keep_original_filename = env.keep_original_filename.unwrap_or(false)
            || call.and_then(|c| c.keep_original_filename).unwrap_or(false);
        let keep_original_url = env.keep_original_url.unwrap_or(false)
            || call.and_then(|c| c.keep_original_url).unwrap_or(false);

        // No partial merge: an env pair replaces the caller pair wholesale.
        let credentials = env
            .credentials
            .clone()
            .or_else(|| call.and_then(|c| c.credentials.clone()));

        Ok(Self {
            region,
            bucket,
            url,
            endpoint,
            credentials,
            keep_original_filename,
            keep_original_url,
        })
    }
}

fn pick(env: Option<&String>, call: Option<&String>) -> Option<String> {
    env.filter(|value| !value.is_empty())
        .or_else(|| call.filter(|value| !value.is_empty()))
        .cloned()
}
