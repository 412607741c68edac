//! S3 Upload Library
//!
//! Uploads files to an S3 bucket and deletes them again. Configuration is
//! resolved per call from the `S3_UPLOAD_*` environment (captured once when the
//! uploader is built) and an optional call-site [`UploadConfig`]; the
//! environment takes precedence.
//!
//! # Key format
//!
//! - **Generated name** (default): `{folder}/{uuid}{extension}`
//! - **Original name**: `{folder}/{filename}` when `keep_original_filename` is set
//!
//! The folder prefix is omitted when no folder is given. Returned locations use
//! the canonical `https://{bucket}.s3.{region}.amazonaws.com/{key}` form unless
//! a display URL is configured, in which case that host is swapped in.

pub mod config;
pub mod connector;
pub mod error;
pub mod file;
pub mod keys;
mod multipart;
pub mod s3;
pub mod uploader;

// Re-export commonly used types
pub use config::{Credentials, ResolvedConfig, UploadConfig};
pub use connector::{ConnectRequest, StoreConnector, UploadSettings, PUBLIC_READ_ACL};
pub use error::{UploadError, UploadResult};
pub use file::{BoxedReader, FileUpload, UploadInput};
pub use keys::{get_extension, get_file_key, storage_key};
pub use s3::S3Connector;
pub use uploader::S3Uploader;
