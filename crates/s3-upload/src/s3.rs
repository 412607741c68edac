use std::sync::Arc;

use async_trait::async_trait;
use http::header::{HeaderMap, HeaderName, HeaderValue};
use object_store::aws::{AmazonS3Builder, AmazonS3ConfigKey};
use object_store::{ClientOptions, ObjectStore};

use crate::connector::{ConnectRequest, StoreConnector};
use crate::error::{UploadError, UploadResult};

const ACL_HEADER: &str = "x-amz-acl";

/// Connector for AWS S3 and S3-compatible providers, backed by
/// `object_store::aws::AmazonS3`.
///
/// Credentials left unset fall through to `AmazonS3Builder::from_env`, which
/// covers the usual AWS variables and instance/role credentials. Explicit
/// credentials start from a clean builder so no ambient `AWS_SESSION_TOKEN`
/// is attached to them.
#[derive(Clone, Debug, Default)]
pub struct S3Connector;

impl S3Connector {
    pub fn new() -> Self {
        Self
    }

    fn builder(request: &ConnectRequest) -> AmazonS3Builder {
        let mut builder = match request.credentials {
            Some(ref credentials) => AmazonS3Builder::new()
                .with_access_key_id(credentials.access_key_id.clone())
                .with_secret_access_key(credentials.secret_access_key.clone()),
            None => AmazonS3Builder::from_env(),
        }
        .with_region(request.region.clone())
        .with_bucket_name(request.bucket.clone());

        if let Some(endpoint) = ambient_endpoint(&builder, request) {
            tracing::warn!(
                endpoint = %endpoint,
                bucket = %request.bucket,
                "AWS_ENDPOINT is set in the environment, requests go there instead of AWS S3"
            );
        }

        if let Some(ref endpoint) = request.endpoint {
            let allow_http = endpoint.starts_with("http://");
            builder = builder
                .with_endpoint(endpoint.clone())
                .with_allow_http(allow_http);
        }

        if let Some(ref upload) = request.upload {
            let mut headers = HeaderMap::new();
            headers.insert(
                HeaderName::from_static(ACL_HEADER),
                HeaderValue::from_static(upload.acl),
            );
            let options = ClientOptions::new()
                .with_default_content_type(upload.content_type.clone())
                .with_default_headers(headers);
            builder = builder.with_client_options(options);
        }

        builder
    }
}

/// Endpoint the builder picked up from the process environment when the
/// request itself names none.
fn ambient_endpoint(builder: &AmazonS3Builder, request: &ConnectRequest) -> Option<String> {
    if request.endpoint.is_some() {
        return None;
    }
    builder.get_config_value(&AmazonS3ConfigKey::Endpoint)
}

#[async_trait]
impl StoreConnector for S3Connector {
    async fn connect(&self, request: &ConnectRequest) -> UploadResult<Arc<dyn ObjectStore>> {
        let store = Self::builder(request).build().map_err(|e| {
            tracing::error!(
                error = %e,
                bucket = %request.bucket,
                region = %request.region,
                "Failed to build S3 client"
            );
            UploadError::Configuration(e.to_string())
        })?;

        Ok(Arc::new(store))
    }
}
