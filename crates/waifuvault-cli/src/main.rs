//! WaifuVault command-line client

use anyhow::{bail, Context};
use clap::{Args as ClapArgs, Parser, Subcommand};
use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use waifuvault_client::{Config, FileQuery, FileRecord, ModifyRequest, UploadRequest, WaifuClient};

#[derive(Parser, Debug)]
#[command(name = "waifuvault")]
#[command(about = "Upload, inspect and download files on WaifuVault")]
#[command(version)]
struct Args {
    /// Service base URL
    #[arg(long, default_value = waifuvault_client::DEFAULT_BASE_URL, env = "WAIFUVAULT_BASE_URL")]
    base_url: String,

    /// Connect timeout in seconds
    #[arg(long, default_value = "60", env = "WAIFUVAULT_CONNECT_TIMEOUT_SECS")]
    connect_timeout: u64,

    /// Enable debug logging
    #[arg(short, long, env = "WAIFUVAULT_DEBUG")]
    debug: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Upload a local file or let the service fetch a URL
    Upload(UploadArgs),
    /// Show the metadata of an entry
    Info {
        token: String,
        /// Report the retention period as human-readable text
        #[arg(long)]
        formatted: bool,
    },
    /// Change the password, expiry or file name visibility of an entry
    Modify {
        token: String,
        /// New password
        #[arg(long)]
        password: Option<String>,
        /// Current password
        #[arg(long)]
        previous_password: Option<String>,
        /// New expiry, e.g. 1d
        #[arg(long)]
        expiry: Option<String>,
        /// Hide or show the file name
        #[arg(long)]
        hide_filename: Option<bool>,
    },
    /// Delete an entry
    Delete { token: String },
    /// Download the content of a file
    Get {
        /// Entry token
        #[arg(long, conflicts_with = "filename", required_unless_present = "filename")]
        token: Option<String>,
        /// Public file name
        #[arg(long)]
        filename: Option<String>,
        /// Download password
        #[arg(long)]
        password: Option<String>,
        /// Write to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(ClapArgs, Debug)]
struct UploadArgs {
    /// Local file to upload
    #[arg(conflicts_with = "url", required_unless_present = "url")]
    path: Option<PathBuf>,
    /// Remote URL to upload from
    #[arg(long)]
    url: Option<String>,
    /// Display name for the file
    #[arg(long)]
    name: Option<String>,
    /// Protect the download with a password
    #[arg(long)]
    password: Option<String>,
    /// Expiry, e.g. 1d or 10m
    #[arg(long)]
    expires: Option<String>,
    /// Hide the file name in the public URL
    #[arg(long)]
    hide_filename: bool,
    /// Delete the file after the first download
    #[arg(long)]
    one_time_download: bool,
}

impl UploadArgs {
    fn into_request(self) -> anyhow::Result<UploadRequest> {
        let mut request = match (self.path, self.url) {
            (Some(path), None) => UploadRequest::from_path(path),
            (None, Some(url)) => UploadRequest::from_url(url),
            _ => bail!("Provide either a path or --url"),
        };
        request.file_name = self.name;
        request.password = self.password;
        request.expires = self.expires;
        request.hide_filename = self.hide_filename.then_some(true);
        request.one_time_download = self.one_time_download.then_some(true);
        Ok(request)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let args = Args::parse();

    let log_level = if args.debug { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("waifuvault={0},waifuvault_client={0}", log_level).into()
            }),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = Config::new(args.base_url)
        .with_connect_timeout(Duration::from_secs(args.connect_timeout));
    tracing::debug!("Using WaifuVault at {}", config.base_url());

    let client = WaifuClient::new(config).context("Failed to create client")?;

    match args.command {
        Command::Upload(upload) => {
            let record = client
                .upload(upload.into_request()?)
                .await
                .context("Upload failed")?;
            tracing::info!("Uploaded {}", record.url);
            print_record(&record)?;
        }
        Command::Info { token, formatted } => {
            let record = client
                .file_info(&token, formatted)
                .await
                .with_context(|| format!("Failed to fetch info for {}", token))?;
            print_record(&record)?;
        }
        Command::Modify {
            token,
            password,
            previous_password,
            expiry,
            hide_filename,
        } => {
            let request = ModifyRequest {
                token,
                password,
                previous_password,
                custom_expiry: expiry,
                hide_filename,
            };
            let record = client
                .modify(&request)
                .await
                .with_context(|| format!("Failed to modify {}", request.token))?;
            print_record(&record)?;
        }
        Command::Delete { token } => {
            client
                .delete(&token)
                .await
                .with_context(|| format!("Failed to delete {}", token))?;
            tracing::info!("Deleted {}", token);
        }
        Command::Get {
            token,
            filename,
            password,
            output,
        } => {
            let query = FileQuery {
                token,
                filename,
                password,
            };
            let data = client
                .file_content(&query)
                .await
                .context("Download failed")?;

            match output {
                Some(path) => {
                    tokio::fs::write(&path, &data)
                        .await
                        .with_context(|| format!("Failed to write {}", path.display()))?;
                    tracing::info!("Wrote {} bytes to {}", data.len(), path.display());
                }
                None => std::io::stdout()
                    .write_all(&data)
                    .context("Failed to write to stdout")?,
            }
        }
    }

    Ok(())
}

fn print_record(record: &FileRecord) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(record)?);
    Ok(())
}
