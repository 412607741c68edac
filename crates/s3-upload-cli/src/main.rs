//! s3-upload: upload files to and delete files from an S3 bucket.
//!
//! Reads S3_UPLOAD_BUCKET, S3_UPLOAD_REGION and the other S3_UPLOAD_* variables
//! (a `.env` file is honored). Flags fill in whatever the environment leaves unset.

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use s3_upload::{FileUpload, S3Uploader, UploadInput};
use s3_upload_cli::{guess_content_type, init_tracing, ConfigArgs, OutputFormat, UploadReport};

#[derive(Parser)]
#[command(name = "s3-upload", about = "Upload and delete files in an S3 bucket")]
struct Cli {
    /// Log library activity at debug level to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Upload one or more files and print their public locations
    Upload {
        /// Files to upload
        #[arg(required = true)]
        files: Vec<PathBuf>,
        /// Folder (key prefix) to upload into
        #[arg(long)]
        folder: Option<String>,
        /// Content type for every file (guessed from the extension if omitted)
        #[arg(long)]
        content_type: Option<String>,
        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
        #[command(flatten)]
        config: ConfigArgs,
    },
    /// Delete objects by URL or key
    Delete {
        /// URLs or bare keys of the objects to delete
        #[arg(required = true)]
        files: Vec<String>,
        #[command(flatten)]
        config: ConfigArgs,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let uploader = S3Uploader::from_env();

    match cli.command {
        Commands::Upload {
            files,
            folder,
            content_type,
            format,
            config,
        } => {
            let config = config.to_upload_config()?;
            let inputs: Vec<UploadInput> = files
                .iter()
                .map(|path| {
                    let mimetype = content_type
                        .clone()
                        .unwrap_or_else(|| guess_content_type(path).to_string());
                    tracing::debug!(path = %path.display(), content_type = %mimetype, "Queued upload");
                    FileUpload::from_path(path, mimetype).into()
                })
                .collect();

            let locations = uploader
                .upload_files(inputs, folder.as_deref(), Some(&config))
                .await
                .context("Upload failed")?;

            match format {
                OutputFormat::Text => {
                    for location in &locations {
                        println!("{}", location);
                    }
                }
                OutputFormat::Json => {
                    let reports: Vec<UploadReport> = files
                        .iter()
                        .zip(locations)
                        .map(|(path, location)| UploadReport {
                            path: path.display().to_string(),
                            location,
                        })
                        .collect();
                    let out =
                        serde_json::to_string_pretty(&reports).context("Serialize response")?;
                    println!("{}", out);
                }
            }
        }
        Commands::Delete { files, config } => {
            let config = config.to_upload_config()?;
            let count = files.len();
            uploader
                .delete_files(Some(files), Some(&config))
                .await
                .context("Delete failed")?;
            tracing::info!(count, "Deleted objects");
        }
    }

    Ok(())
}
