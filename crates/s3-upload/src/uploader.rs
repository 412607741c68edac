//! Upload and delete orchestration
//!
//! [`S3Uploader`] resolves configuration for each call, builds a client through
//! its [`StoreConnector`], and streams file content with `object_store`'s
//! multipart writer. Batch variants run their items concurrently and fail on
//! the first error.

use std::sync::Arc;
use std::time::Instant;

use futures::future::try_join_all;
use object_store::path::Path;
use object_store::{ObjectStore, ObjectStoreExt};

use crate::config::{ResolvedConfig, UploadConfig};
use crate::connector::{ConnectRequest, StoreConnector, UploadSettings};
use crate::error::{UploadError, UploadResult};
use crate::file::{FileUpload, UploadInput};
use crate::keys::{display_location, object_key, storage_key};
use crate::multipart::stream_upload;
use crate::s3::S3Connector;

/// Uploads files to and deletes files from a bucket.
///
/// The environment layer is captured when the uploader is built and reused
/// for every call. Cloning is cheap.
#[derive(Clone)]
pub struct S3Uploader {
    env: UploadConfig,
    connector: Arc<dyn StoreConnector>,
}

impl S3Uploader {
    pub fn new(env: UploadConfig, connector: Arc<dyn StoreConnector>) -> Self {
        Self { env, connector }
    }

    /// Uploader over real S3 with the `S3_UPLOAD_*` environment.
    pub fn from_env() -> Self {
        Self::new(UploadConfig::from_env(), Arc::new(S3Connector::new()))
    }

    pub fn env_config(&self) -> &UploadConfig {
        &self.env
    }

    /// Effective configuration for a call with the given call-site layer.
    pub fn resolve(&self, config: Option<&UploadConfig>) -> UploadResult<ResolvedConfig> {
        ResolvedConfig::resolve(&self.env, config)
    }

    /// Upload one file and return its public location.
    ///
    /// A resolved location is returned unchanged without touching storage.
    pub async fn upload_file(
        &self,
        file: impl Into<UploadInput>,
        folder: Option<&str>,
        config: Option<&UploadConfig>,
    ) -> UploadResult<String> {
        match file.into() {
            UploadInput::Resolved(location) => {
                tracing::debug!(location = %location, "Upload input already resolved, passing through");
                Ok(location)
            }
            UploadInput::File(file) => self.upload_stream(file, folder, config).await,
        }
    }

    /// Upload several files concurrently. Locations are returned in input order.
    pub async fn upload_files<I>(
        &self,
        files: I,
        folder: Option<&str>,
        config: Option<&UploadConfig>,
    ) -> UploadResult<Vec<String>>
    where
        I: IntoIterator,
        I::Item: Into<UploadInput>,
    {
        try_join_all(
            files
                .into_iter()
                .map(|file| self.upload_file(file, folder, config)),
        )
        .await
    }

    /// Delete the object behind a URL or bare key. `None` is a no-op.
    pub async fn delete_file(
        &self,
        file: Option<&str>,
        config: Option<&UploadConfig>,
    ) -> UploadResult<()> {
        let file = match file {
            Some(file) => file,
            None => {
                tracing::debug!("No file given, nothing to delete");
                return Ok(());
            }
        };

        let settings = self.resolve(config)?;
        let key = storage_key(file, &settings);
        let request = ConnectRequest::for_delete(&settings);
        let store = self.connector.connect(&request).await?;

        let start = Instant::now();
        let location = Path::from(key);

        store.delete(&location).await.map_err(|e| {
            tracing::error!(
                error = %e,
                bucket = %settings.bucket,
                key = %key,
                duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                "S3 delete failed"
            );
            UploadError::from(e)
        })?;

        tracing::info!(
            bucket = %settings.bucket,
            key = %key,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "S3 delete successful"
        );

        Ok(())
    }

    /// Delete several objects concurrently. A `None` list is a no-op and
    /// `None` entries are skipped.
    pub async fn delete_files<I, S>(
        &self,
        files: Option<I>,
        config: Option<&UploadConfig>,
    ) -> UploadResult<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<Option<String>>,
    {
        let files: Vec<String> = match files {
            Some(files) => files.into_iter().filter_map(Into::into).collect(),
            None => return Ok(()),
        };

        try_join_all(
            files
                .iter()
                .map(|file| self.delete_file(Some(file.as_str()), config)),
        )
        .await?;

        Ok(())
    }

    async fn upload_stream(
        &self,
        file: FileUpload,
        folder: Option<&str>,
        config: Option<&UploadConfig>,
    ) -> UploadResult<String> {
        let settings = self.resolve(config)?;
        let key = object_key(folder, file.filename(), settings.keep_original_filename);
        let request =
            ConnectRequest::for_upload(&settings, UploadSettings::public_read(file.mimetype()));
        let store = self.connector.connect(&request).await?;

        let start = Instant::now();
        let size = write_object(&store, &key, file).await.map_err(|e| {
            tracing::error!(
                error = %e,
                bucket = %settings.bucket,
                key = %key,
                duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                "S3 upload failed"
            );
            e
        })?;

        let location = self.connector.object_url(&request, &key);

        tracing::info!(
            bucket = %settings.bucket,
            key = %key,
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "S3 upload successful"
        );

        Ok(display_location(&location, &settings))
    }
}

/// Stream the file into a multipart upload at `key`, returning the byte count.
async fn write_object(
    store: &Arc<dyn ObjectStore>,
    key: &str,
    file: FileUpload,
) -> UploadResult<u64> {
    let reader = file.open()?;
    let upload = store.put_multipart(&Path::from(key)).await?;
    stream_upload(upload, reader, key).await
}
