//! Executes requests and interprets their responses

use crate::{
    transport::{HttpRequest, HttpResponse, Transport},
    types::{ErrorEnvelope, FileRecord},
    ClientError, Result,
};
use bytes::Bytes;
use serde_json::Value;
use tracing::debug;

/// Run one round trip and wrap the captured response
pub async fn execute<T: Transport + ?Sized>(
    transport: &T,
    request: HttpRequest,
) -> Result<ResponseHandle> {
    debug!("{} {}", request.method, request.url);
    let response = transport.send(request).await?;
    debug!(
        status = response.status,
        body_len = response.body.len(),
        "Received response"
    );
    Ok(ResponseHandle::from(response))
}

/// Captured response of a single request.
///
/// Each `into_*` view consumes the handle and runs the shared error check
/// first. A handle built with [`ResponseHandle::default`] has no response and
/// every view on it fails with [`ClientError::Protocol`].
#[derive(Clone, Debug, Default)]
pub struct ResponseHandle {
    response: Option<HttpResponse>,
}

impl From<HttpResponse> for ResponseHandle {
    fn from(response: HttpResponse) -> Self {
        Self {
            response: Some(response),
        }
    }
}

impl ResponseHandle {
    /// HTTP status of the captured response
    pub fn status(&self) -> Option<u16> {
        self.response.as_ref().map(|r| r.status)
    }

    /// Decode the body as a file record
    pub fn into_record(self) -> Result<FileRecord> {
        let response = self.error_check()?;
        match serde_json::from_slice::<Value>(&response.body) {
            Ok(value @ Value::Object(_)) => serde_json::from_value(value)
                .map_err(|e| ClientError::Protocol(format!("The response was invalid: {}", e))),
            Ok(_) => Err(ClientError::Protocol(
                "The response was not a JSON object".to_string(),
            )),
            Err(e) => Err(ClientError::Protocol(format!(
                "The response was not valid JSON: {}",
                e
            ))),
        }
    }

    /// Succeed with `true` when the service reported no error
    pub fn into_acknowledged(self) -> Result<bool> {
        self.error_check()?;
        Ok(true)
    }

    /// Return the body exactly as received.
    ///
    /// A 403 means the supplied password was rejected and is reported as
    /// [`ClientError::Auth`] whatever the body contains.
    pub fn into_raw_body(self) -> Result<Bytes> {
        if self.status() == Some(403) {
            return Err(ClientError::Auth("The password is incorrect".to_string()));
        }
        Ok(self.error_check()?.body)
    }

    /// Fail on any status of 300 or above, preferring the structured error
    /// body when the service sent one
    pub fn error_check(self) -> Result<HttpResponse> {
        let response = self
            .response
            .ok_or_else(|| ClientError::Protocol("Handler has no response yet".to_string()))?;

        if response.status < 300 {
            return Ok(response);
        }

        match serde_json::from_slice::<Value>(&response.body) {
            Ok(Value::Object(object)) => Err(ClientError::Remote(ErrorEnvelope::from_json_object(
                &object,
                response.status,
            ))),
            _ => Err(ClientError::Protocol(format!(
                "The response was invalid (status {})",
                response.status
            ))),
        }
    }
}
