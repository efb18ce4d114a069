//! # WaifuVault Client SDK
//!
//! A typed client for the WaifuVault file hosting service.
//!
//! ## Features
//!
//! - **Uploads**: from a local path, in-memory content or a remote URL
//! - **Entry management**: fetch metadata, change password/expiry/visibility, delete
//! - **Downloads**: by public file name or by token, with optional password
//! - **Pluggable transport**: the default `reqwest` transport can be replaced
//!   with any [`Transport`] implementation
//!
//! ## Example
//!
//! ```rust,ignore
//! use waifuvault_client::{WaifuClient, Config, UploadRequest, FileQuery};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let client = WaifuClient::new(Config::default())?;
//!
//!     // Upload a file that expires in a day
//!     let record = client
//!         .upload(UploadRequest::from_path("image.jpg").with_expiry("1d"))
//!         .await?;
//!     println!("Uploaded to {}", record.url);
//!
//!     // Download it again
//!     let data = client.file_content(&FileQuery::by_token(&record.token)).await?;
//!     println!("Fetched {} bytes", data.len());
//!
//!     client.delete(&record.token).await?;
//!     Ok(())
//! }
//! ```

mod client;
mod config;
mod error;
mod handler;
mod transport;
mod types;

pub use client::WaifuClient;
pub use config::{Config, DEFAULT_BASE_URL};
pub use error::{ClientError, Result};
pub use handler::{execute, ResponseHandle};
pub use transport::{
    FormField, HttpRequest, HttpResponse, Method, RequestBody, ReqwestTransport, Transport,
};
pub use types::{
    ErrorEnvelope, FileOptions, FileQuery, FileRecord, ModifyRequest, RetentionPeriod,
    UploadRequest,
};
