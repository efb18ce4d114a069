//! HTTP transport abstraction and its reqwest-backed default

use crate::{Config, Result};
use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{multipart, Client};
use std::fmt;

/// HTTP method of a request
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Method {
    #[default]
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<Method> for reqwest::Method {
    fn from(method: Method) -> Self {
        match method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Patch => reqwest::Method::PATCH,
            Method::Delete => reqwest::Method::DELETE,
        }
    }
}

/// A single field of a multipart form
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FormField {
    /// Plain text field
    Text { name: String, value: String },
    /// File field with its display name
    File {
        name: String,
        file_name: String,
        data: Bytes,
    },
}

impl FormField {
    pub fn text(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self::Text {
            name: name.into(),
            value: value.into(),
        }
    }

    pub fn file(name: impl Into<String>, file_name: impl Into<String>, data: impl Into<Bytes>) -> Self {
        Self::File {
            name: name.into(),
            file_name: file_name.into(),
            data: data.into(),
        }
    }

    /// Field name
    pub fn name(&self) -> &str {
        match self {
            Self::Text { name, .. } | Self::File { name, .. } => name,
        }
    }
}

/// Request body
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RequestBody {
    /// Pre-encoded JSON text
    Json(String),
    /// Multipart form
    Form(Vec<FormField>),
}

/// A request ready to be sent by a [`Transport`]
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: Method,
    /// Full URL including any query string
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<RequestBody>,
}

impl HttpRequest {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            ..Default::default()
        }
    }

    /// Add a header
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Set the body
    pub fn body(mut self, body: RequestBody) -> Self {
        self.body = Some(body);
        self
    }

    /// Look up a header value, ignoring case
    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// Status code and body of a completed round trip
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Bytes,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }
}

/// Performs one HTTP round trip.
///
/// Implement this to route requests through a custom HTTP stack or to stub
/// the service in tests.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send the request and capture the status code and body
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse>;
}

/// Default transport backed by `reqwest`
#[derive(Clone, Debug)]
pub struct ReqwestTransport {
    http: Client,
}

impl ReqwestTransport {
    /// Build a transport applying the configured connect timeout and user agent
    pub fn new(config: &Config) -> Result<Self> {
        let http = Client::builder()
            .connect_timeout(config.connect_timeout)
            .user_agent(config.user_agent.as_str())
            .build()?;

        Ok(Self { http })
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
        let mut req = self.http.request(request.method.into(), &request.url);

        for (name, value) in &request.headers {
            req = req.header(name.as_str(), value.as_str());
        }

        match request.body {
            Some(RequestBody::Json(json)) => req = req.body(json),
            Some(RequestBody::Form(fields)) => req = req.multipart(build_form(fields)?),
            None => {}
        }

        let response = req.send().await?;
        let status = response.status().as_u16();
        let body = response.bytes().await?;

        Ok(HttpResponse { status, body })
    }
}

fn build_form(fields: Vec<FormField>) -> Result<multipart::Form> {
    let mut form = multipart::Form::new();
    for field in fields {
        form = match field {
            FormField::Text { name, value } => form.text(name, value),
            FormField::File {
                name,
                file_name,
                data,
            } => {
                let mime = mime_guess::from_path(&file_name).first_or_octet_stream();
                let part = multipart::Part::bytes(data.to_vec())
                    .file_name(file_name)
                    .mime_str(mime.essence_str())?;
                form.part(name, part)
            }
        };
    }
    Ok(form)
}
