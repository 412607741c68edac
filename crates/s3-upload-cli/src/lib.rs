//! Shared helpers for the `s3-upload` command-line tool.

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Args, ValueEnum};
use s3_upload::UploadConfig;
use serde::Serialize;

const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// Call-site configuration flags. Environment variables still take precedence.
#[derive(Args, Debug, Default, Clone)]
pub struct ConfigArgs {
    /// JSON file with upload configuration (region, bucket, url, credentials, ...)
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Bucket name
    #[arg(long)]
    pub bucket: Option<String>,

    /// AWS region
    #[arg(long)]
    pub region: Option<String>,

    /// Display URL substituted for the S3 host in returned locations
    #[arg(long)]
    pub url: Option<String>,

    /// Custom endpoint for S3-compatible providers
    #[arg(long)]
    pub endpoint: Option<String>,

    /// Keep the original filename instead of generating one
    #[arg(long)]
    pub keep_original_filename: bool,

    /// Return the canonical S3 location even when a display URL is set
    #[arg(long)]
    pub keep_original_url: bool,
}

impl ConfigArgs {
    /// Build the call-site layer: config file first, then flags on top.
    pub fn to_upload_config(&self) -> anyhow::Result<UploadConfig> {
        let mut config = match self.config {
            Some(ref path) => load_config_file(path)?,
            None => UploadConfig::default(),
        };

        if let Some(ref bucket) = self.bucket {
            config.bucket = Some(bucket.clone());
        }
        if let Some(ref region) = self.region {
            config.region = Some(region.clone());
        }
        if let Some(ref url) = self.url {
            config.url = Some(url.clone());
        }
        if let Some(ref endpoint) = self.endpoint {
            config.endpoint = Some(endpoint.clone());
        }
        if self.keep_original_filename {
            config.keep_original_filename = Some(true);
        }
        if self.keep_original_url {
            config.keep_original_url = Some(true);
        }

        Ok(config)
    }
}

/// Read an [`UploadConfig`] from a JSON file.
pub fn load_config_file(path: &Path) -> anyhow::Result<UploadConfig> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file {}", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("Invalid config file {}", path.display()))
}

/// Output format for upload results
#[derive(ValueEnum, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// One uploaded file, as printed in JSON output.
#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct UploadReport {
    pub path: String,
    pub location: String,
}

/// Guess a MIME type from the file extension.
pub fn guess_content_type(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase());

    match extension.as_deref() {
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("avif") => "image/avif",
        Some("svg") => "image/svg+xml",
        Some("pdf") => "application/pdf",
        Some("json") => "application/json",
        Some("txt") => "text/plain",
        Some("csv") => "text/csv",
        Some("html") | Some("htm") => "text/html",
        Some("mp4") => "video/mp4",
        Some("webm") => "video/webm",
        Some("mp3") => "audio/mpeg",
        Some("wav") => "audio/wav",
        Some("zip") => "application/zip",
        _ => DEFAULT_CONTENT_TYPE,
    }
}

/// Filter used when `RUST_LOG` is unset: library events at debug when
/// verbose, otherwise only warnings so stdout stays clean for piping.
pub fn default_filter(verbose: bool) -> &'static str {
    if verbose {
        "s3_upload=debug,s3_upload_cli=debug,info"
    } else {
        "warn"
    }
}

/// Initialize stderr logging. `RUST_LOG` overrides the verbosity flag.
pub fn init_tracing(verbose: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter(verbose)));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(verbose)
        .with_writer(std::io::stderr)
        .init();
}
