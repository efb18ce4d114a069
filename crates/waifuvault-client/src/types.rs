//! Request and response types for the client SDK

use crate::{ClientError, Result};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::path::{Path, PathBuf};

/// How long the service keeps a file.
///
/// The service reports this either as a number of seconds or as a
/// human-readable duration such as `"300 days 10 hours 5 minutes 1 second"`,
/// depending on the endpoint and the `formatted` flag.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RetentionPeriod {
    /// Seconds until expiry
    Seconds(u64),
    /// Human-readable duration
    Text(String),
}

impl Default for RetentionPeriod {
    fn default() -> Self {
        Self::Text(String::new())
    }
}

impl fmt::Display for RetentionPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Seconds(secs) => write!(f, "{}s", secs),
            Self::Text(text) => f.write_str(text),
        }
    }
}

/// Option flags attached to a stored file
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FileOptions {
    /// The public URL does not reveal the original file name
    pub hide_filename: bool,
    /// The file is deleted after its first download
    pub one_time_download: bool,
    /// The file requires a password to download
    pub protected: bool,
}

/// A stored file entry, as returned by upload, info and modify calls
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "RawFileRecord")]
pub struct FileRecord {
    /// Server-assigned token identifying the entry
    pub token: String,
    /// Public download URL
    pub url: String,
    /// Time left before the file expires
    pub retention_period: RetentionPeriod,
    /// Option flags
    pub options: FileOptions,
}

/// Wire shape of a file record. Older servers send a flat `protected`
/// field instead of the nested `options` object.
#[derive(Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct RawFileRecord {
    token: String,
    url: String,
    retention_period: RetentionPeriod,
    options: Option<FileOptions>,
    protected: Option<bool>,
}

impl From<RawFileRecord> for FileRecord {
    fn from(raw: RawFileRecord) -> Self {
        let options = match raw.options {
            Some(options) => options,
            None => FileOptions {
                protected: raw.protected.unwrap_or(false),
                ..Default::default()
            },
        };

        Self {
            token: raw.token,
            url: raw.url,
            retention_period: raw.retention_period,
            options,
        }
    }
}

/// Structured error body returned by the service
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ErrorEnvelope {
    /// Machine-readable error kind
    pub name: String,
    /// Human-readable description
    pub message: String,
    /// HTTP status code
    pub status: u16,
}

impl ErrorEnvelope {
    /// Build an envelope from a decoded error body.
    ///
    /// Fields of the wrong type are tolerated: `name` and `message` fall back
    /// to empty strings, and `status` accepts a number or a numeric string,
    /// falling back to the HTTP status of the response.
    pub fn from_json_object(object: &Map<String, Value>, http_status: u16) -> Self {
        let text = |key: &str| {
            object
                .get(key)
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string()
        };

        let status = match object.get("status") {
            Some(Value::Number(n)) => n.as_u64().and_then(|n| u16::try_from(n).ok()),
            Some(Value::String(s)) => s.trim().parse::<u16>().ok(),
            _ => None,
        }
        .filter(|status| *status != 0)
        .unwrap_or(http_status);

        Self {
            name: text("name"),
            message: text("message"),
            status,
        }
    }
}

/// Parameters for an upload.
///
/// Exactly one of `path`, `url` or `content` must be set; this is checked
/// when the request is sent.
#[derive(Clone, Debug, Default)]
pub struct UploadRequest {
    /// Local file to upload
    pub path: Option<PathBuf>,
    /// Remote URL for the service to fetch
    pub url: Option<String>,
    /// Raw file content
    pub content: Option<Bytes>,
    /// Display name; defaults to the basename of `path`, required with `content`
    pub file_name: Option<String>,
    /// Password protecting the download
    pub password: Option<String>,
    /// Expiry such as `"1d"` or `"10m"`
    pub expires: Option<String>,
    /// Hide the file name in the public URL
    pub hide_filename: Option<bool>,
    /// Delete the file after the first download
    pub one_time_download: Option<bool>,
}

impl UploadRequest {
    /// Upload a local file
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
            ..Default::default()
        }
    }

    /// Let the service fetch a remote URL
    pub fn from_url(url: impl Into<String>) -> Self {
        Self {
            url: Some(url.into()),
            ..Default::default()
        }
    }

    /// Upload in-memory content under the given display name
    pub fn from_content(content: impl Into<Bytes>, file_name: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            file_name: Some(file_name.into()),
            ..Default::default()
        }
    }

    /// Set the display name
    pub fn with_file_name(mut self, file_name: impl Into<String>) -> Self {
        self.file_name = Some(file_name.into());
        self
    }

    /// Protect the file with a password
    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    /// Set the expiry
    pub fn with_expiry(mut self, expires: impl Into<String>) -> Self {
        self.expires = Some(expires.into());
        self
    }

    /// Hide or show the file name in the public URL
    pub fn with_hide_filename(mut self, hide: bool) -> Self {
        self.hide_filename = Some(hide);
        self
    }

    /// Enable or disable one-time download
    pub fn with_one_time_download(mut self, one_time: bool) -> Self {
        self.one_time_download = Some(one_time);
        self
    }

    /// Resolve the single upload source
    pub(crate) fn source(&self) -> Result<UploadSource<'_>> {
        match (&self.path, &self.url, &self.content) {
            (Some(path), None, None) => {
                let file_name = match &self.file_name {
                    Some(name) => name.clone(),
                    None => path
                        .file_name()
                        .map(|name| name.to_string_lossy().into_owned())
                        .unwrap_or_default(),
                };
                if file_name.is_empty() {
                    return Err(ClientError::Validation(format!(
                        "Cannot derive a file name from {}",
                        path.display()
                    )));
                }
                Ok(UploadSource::Path { path, file_name })
            }
            (None, Some(url), None) => Ok(UploadSource::Url(url)),
            (None, None, Some(content)) => {
                let file_name = self.file_name.as_deref().unwrap_or_default();
                if file_name.is_empty() {
                    return Err(ClientError::Validation(
                        "A file name is required when uploading raw content".to_string(),
                    ));
                }
                Ok(UploadSource::Content {
                    content,
                    file_name: file_name.to_string(),
                })
            }
            (None, None, None) => Err(ClientError::Validation(
                "Please provide a path, url or content to upload".to_string(),
            )),
            _ => Err(ClientError::Validation(
                "Only one of path, url or content may be provided".to_string(),
            )),
        }
    }
}

/// A validated upload source
#[derive(Debug)]
pub(crate) enum UploadSource<'a> {
    Path { path: &'a Path, file_name: String },
    Url(&'a str),
    Content { content: &'a Bytes, file_name: String },
}

/// Changes to apply to an existing entry
#[derive(Clone, Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModifyRequest {
    /// Entry token
    pub token: String,
    /// New password
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    /// Current password, required when changing an existing one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous_password: Option<String>,
    /// New expiry such as `"1d"`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_expiry: Option<String>,
    /// Hide or show the file name in the public URL
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hide_filename: Option<bool>,
}

impl ModifyRequest {
    /// Create a modification for the given token
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            ..Default::default()
        }
    }

    /// Set a new password
    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    /// Supply the current password
    pub fn with_previous_password(mut self, password: impl Into<String>) -> Self {
        self.previous_password = Some(password.into());
        self
    }

    /// Set a new expiry
    pub fn with_custom_expiry(mut self, expiry: impl Into<String>) -> Self {
        self.custom_expiry = Some(expiry.into());
        self
    }

    /// Hide or show the file name
    pub fn with_hide_filename(mut self, hide: bool) -> Self {
        self.hide_filename = Some(hide);
        self
    }
}

/// Identifies a file whose content should be downloaded
#[derive(Clone, Debug, Default)]
pub struct FileQuery {
    /// Entry token; resolved to a URL through an info call
    pub token: Option<String>,
    /// Public file name, as found in the download URL
    pub filename: Option<String>,
    /// Password for protected files
    pub password: Option<String>,
}

impl FileQuery {
    /// Look the file up by token
    pub fn by_token(token: impl Into<String>) -> Self {
        Self {
            token: Some(token.into()),
            ..Default::default()
        }
    }

    /// Fetch the file directly by its public name
    pub fn by_filename(filename: impl Into<String>) -> Self {
        Self {
            filename: Some(filename.into()),
            ..Default::default()
        }
    }

    /// Supply the download password
    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    pub(crate) fn target(&self) -> Result<FileTarget<'_>> {
        match (self.token.as_deref(), self.filename.as_deref()) {
            (None, Some(filename)) if !filename.is_empty() => Ok(FileTarget::Filename(filename)),
            (Some(token), None) => Ok(FileTarget::Token(token)),
            (Some(_), Some(_)) => Err(ClientError::Validation(
                "Provide either a file name or a token, not both".to_string(),
            )),
            _ => Err(ClientError::Validation(
                "A file name or token is required".to_string(),
            )),
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
pub(crate) enum FileTarget<'a> {
    Token(&'a str),
    Filename(&'a str),
}
