//! Streaming multipart writes
//!
//! Content is pushed through `object_store`'s [`WriteMultipart`]. The
//! underlying upload sits behind a shared handle so it can still be aborted
//! after `WriteMultipart::finish` has consumed the writer, e.g. when flushing
//! the final part fails.

use std::sync::Arc;

use async_trait::async_trait;
use futures::StreamExt;
use object_store::{MultipartUpload, PutPayload, PutResult, UploadPart, WriteMultipart};
use tokio::sync::Mutex;
use tokio_util::io::ReaderStream;

use crate::error::UploadResult;
use crate::file::BoxedReader;

/// Upper bound on multipart parts in flight for a single upload.
const MAX_CONCURRENT_PARTS: usize = 8;

#[derive(Debug)]
struct UploadState {
    upload: Box<dyn MultipartUpload>,
    aborted: bool,
}

/// Multipart upload shared between a [`WriteMultipart`] and its owner.
///
/// Abort runs at most once, however many paths request it.
#[derive(Debug, Clone)]
pub(crate) struct SharedUpload {
    state: Arc<Mutex<UploadState>>,
}

impl SharedUpload {
    pub(crate) fn new(upload: Box<dyn MultipartUpload>) -> Self {
        Self {
            state: Arc::new(Mutex::new(UploadState {
                upload,
                aborted: false,
            })),
        }
    }

    async fn abort_once(&self) -> object_store::Result<()> {
        let mut state = self.state.lock().await;
        if state.aborted {
            return Ok(());
        }
        state.aborted = true;
        state.upload.abort().await
    }

    /// Abort, logging instead of returning a failure to abort.
    pub(crate) async fn discard(&self, key: &str) {
        if let Err(e) = self.abort_once().await {
            tracing::warn!(error = %e, key = %key, "Failed to abort multipart upload");
        }
    }
}

#[async_trait]
impl MultipartUpload for SharedUpload {
    fn put_part(&mut self, data: PutPayload) -> UploadPart {
        // Parts are only issued from the synchronous writer calls, never
        // while complete or abort hold the lock.
        match self.state.try_lock() {
            Ok(mut state) => state.upload.put_part(data),
            Err(_) => Box::pin(futures::future::ready(Err(object_store::Error::Generic {
                store: "S3",
                source: "multipart upload is completing or aborting".into(),
            }))),
        }
    }

    async fn complete(&mut self) -> object_store::Result<PutResult> {
        self.state.lock().await.upload.complete().await
    }

    async fn abort(&mut self) -> object_store::Result<()> {
        self.abort_once().await
    }
}

/// Stream `reader` into `upload` and complete it, returning the byte count.
///
/// Any failure, including the final flush inside `finish`, aborts the upload
/// before the error is returned.
pub(crate) async fn stream_upload(
    upload: Box<dyn MultipartUpload>,
    reader: BoxedReader,
    key: &str,
) -> UploadResult<u64> {
    let shared = SharedUpload::new(upload);
    let mut writer = WriteMultipart::new(Box::new(shared.clone()));
    let mut chunks = ReaderStream::new(reader);
    let mut size = 0u64;

    while let Some(chunk) = chunks.next().await {
        let chunk = match chunk {
            Ok(chunk) => chunk,
            Err(e) => {
                drop(writer);
                shared.discard(key).await;
                return Err(e.into());
            }
        };

        if let Err(e) = writer.wait_for_capacity(MAX_CONCURRENT_PARTS).await {
            drop(writer);
            shared.discard(key).await;
            return Err(e.into());
        }

        size += chunk.len() as u64;
        writer.put(chunk);
    }

    if let Err(e) = writer.finish().await {
        shared.discard(key).await;
        return Err(e.into());
    }

    Ok(size)
}
