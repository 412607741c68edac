//! Upload inputs

use std::fmt;
use std::io;
use std::path::Path;
use std::pin::Pin;

use bytes::Bytes;
use tokio::io::AsyncRead;

/// Boxed byte source for one upload.
pub type BoxedReader = Pin<Box<dyn AsyncRead + Send>>;

type OpenFn = Box<dyn FnOnce() -> io::Result<BoxedReader> + Send>;

/// A file to upload: a one-shot reader factory plus its name and MIME type.
///
/// The factory runs at most once, when the upload starts streaming.
pub struct FileUpload {
    open: OpenFn,
    filename: String,
    mimetype: String,
}

impl FileUpload {
    pub fn new<F, R>(filename: impl Into<String>, mimetype: impl Into<String>, open: F) -> Self
    where
        F: FnOnce() -> io::Result<R> + Send + 'static,
        R: AsyncRead + Send + 'static,
    {
        Self {
            open: Box::new(move || open().map(|reader| Box::pin(reader) as BoxedReader)),
            filename: filename.into(),
            mimetype: mimetype.into(),
        }
    }

    /// Upload the file at `path`, named after its final path component.
    ///
    /// The file is opened lazily, when the upload starts.
    pub fn from_path(path: impl AsRef<Path>, mimetype: impl Into<String>) -> Self {
        let path = path.as_ref().to_path_buf();
        let filename = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();

        Self::new(filename, mimetype, move || {
            std::fs::File::open(&path).map(tokio::fs::File::from_std)
        })
    }

    /// Upload an in-memory buffer.
    pub fn from_bytes(
        filename: impl Into<String>,
        mimetype: impl Into<String>,
        data: impl Into<Bytes>,
    ) -> Self {
        let data = data.into();
        Self::new(filename, mimetype, move || Ok(io::Cursor::new(data)))
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn mimetype(&self) -> &str {
        &self.mimetype
    }

    /// Consume the descriptor and open its reader.
    pub(crate) fn open(self) -> io::Result<BoxedReader> {
        (self.open)()
    }
}

impl fmt::Debug for FileUpload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileUpload")
            .field("filename", &self.filename)
            .field("mimetype", &self.mimetype)
            .finish_non_exhaustive()
    }
}

/// Input to an upload: either a location that is already resolved, which is
/// returned as-is, or a file to stream.
#[derive(Debug)]
pub enum UploadInput {
    Resolved(String),
    File(FileUpload),
}

impl From<String> for UploadInput {
    fn from(location: String) -> Self {
        UploadInput::Resolved(location)
    }
}

impl From<&str> for UploadInput {
    fn from(location: &str) -> Self {
        UploadInput::Resolved(location.to_string())
    }
}

impl From<FileUpload> for UploadInput {
    fn from(file: FileUpload) -> Self {
        UploadInput::File(file)
    }
}
