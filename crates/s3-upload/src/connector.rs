//! Storage client seam
//!
//! Every upload and delete builds its own client through a [`StoreConnector`].
//! The production implementation is [`crate::S3Connector`]; tests plug in an
//! in-memory store.

use std::sync::Arc;

use async_trait::async_trait;
use object_store::ObjectStore;

use crate::config::{Credentials, ResolvedConfig};
use crate::error::UploadResult;
use crate::keys::canonical_location;

/// Canned ACL applied to uploaded objects.
pub const PUBLIC_READ_ACL: &str = "public-read";

/// Per-upload client settings.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UploadSettings {
    pub content_type: String,
    pub acl: &'static str,
}

impl UploadSettings {
    pub fn public_read(content_type: impl Into<String>) -> Self {
        Self {
            content_type: content_type.into(),
            acl: PUBLIC_READ_ACL,
        }
    }
}

/// Everything needed to construct a client for one call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConnectRequest {
    pub region: String,
    pub bucket: String,
    pub credentials: Option<Credentials>,
    pub endpoint: Option<String>,
    /// Present for uploads, absent for deletes.
    pub upload: Option<UploadSettings>,
}

impl ConnectRequest {
    pub fn for_delete(config: &ResolvedConfig) -> Self {
        Self {
            region: config.region.clone(),
            bucket: config.bucket.clone(),
            credentials: config.credentials.clone(),
            endpoint: config.endpoint.clone(),
            upload: None,
        }
    }

    pub fn for_upload(config: &ResolvedConfig, settings: UploadSettings) -> Self {
        Self {
            upload: Some(settings),
            ..Self::for_delete(config)
        }
    }
}

/// Builds storage clients.
#[async_trait]
pub trait StoreConnector: Send + Sync {
    /// Construct a client bound to the request's bucket.
    async fn connect(&self, request: &ConnectRequest) -> UploadResult<Arc<dyn ObjectStore>>;

    /// Canonical location the storage service reports for `key`.
    fn object_url(&self, request: &ConnectRequest, key: &str) -> String {
        canonical_location(
            &request.bucket,
            &request.region,
            request.endpoint.as_deref(),
            key,
        )
    }
}
