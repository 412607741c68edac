//! Shared fixtures for uploader integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::io;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};

use async_trait::async_trait;
use futures::StreamExt;
use object_store::memory::InMemory;
use object_store::path::Path;
use object_store::{ObjectStore, ObjectStoreExt};
use s3_upload::{ConnectRequest, S3Uploader, StoreConnector, UploadConfig, UploadError, UploadResult};
use tokio::io::{AsyncRead, ReadBuf};

/// Connector that records every request and hands out one shared in-memory store.
pub struct RecordingConnector {
    store: Arc<InMemory>,
    requests: Mutex<Vec<ConnectRequest>>,
    failure: Option<&'static str>,
}

impl RecordingConnector {
    pub fn new() -> Self {
        Self {
            store: Arc::new(InMemory::new()),
            requests: Mutex::new(Vec::new()),
            failure: None,
        }
    }

    /// Connector whose client construction always fails with a storage error.
    pub fn failing(message: &'static str) -> Self {
        Self {
            failure: Some(message),
            ..Self::new()
        }
    }

    pub fn connect_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<ConnectRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Content stored under `key`, if any.
    pub async fn object(&self, key: &str) -> Option<Vec<u8>> {
        let result = self.store.get(&Path::from(key)).await.ok()?;
        let bytes = result.bytes().await.ok()?;
        Some(bytes.to_vec())
    }

    pub async fn exists(&self, key: &str) -> bool {
        self.store.head(&Path::from(key)).await.is_ok()
    }

    /// Number of completed objects in the store.
    pub async fn object_count(&self) -> usize {
        self.store.list(None).count().await
    }
}

/// Reader that fails on every read.
pub struct FailingReader;

impl AsyncRead for FailingReader {
    fn poll_read(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        _buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        Poll::Ready(Err(io::Error::new(
            io::ErrorKind::ConnectionReset,
            "source stream reset",
        )))
    }
}

#[async_trait]
impl StoreConnector for RecordingConnector {
    async fn connect(&self, request: &ConnectRequest) -> UploadResult<Arc<dyn ObjectStore>> {
        self.requests.lock().unwrap().push(request.clone());

        if let Some(message) = self.failure {
            return Err(UploadError::Transport(object_store::Error::Generic {
                store: "test",
                source: message.into(),
            }));
        }

        Ok(self.store.clone())
    }
}

/// Environment layer built from literal variable pairs.
pub fn env_config(pairs: &[(&str, &str)]) -> UploadConfig {
    let vars: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    UploadConfig::from_lookup(|name| vars.get(name).cloned())
}

/// Environment with `S3_UPLOAD_BUCKET=bkt` and `S3_UPLOAD_REGION=us-east-1`.
pub fn default_env() -> UploadConfig {
    env_config(&[("S3_UPLOAD_BUCKET", "bkt"), ("S3_UPLOAD_REGION", "us-east-1")])
}

pub fn uploader(env: UploadConfig) -> (S3Uploader, Arc<RecordingConnector>) {
    let connector = Arc::new(RecordingConnector::new());
    let uploader = S3Uploader::new(env, connector.clone());
    (uploader, connector)
}
