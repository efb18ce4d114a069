//! Main client implementation

use crate::{
    handler::execute,
    transport::{FormField, HttpRequest, Method, ReqwestTransport, RequestBody, Transport},
    types::*,
    ClientError, Config, Result,
};
use bytes::Bytes;
use tracing::{debug, instrument};
use url::form_urlencoded;

/// WaifuVault client.
///
/// Every call builds a fresh request and sends it through the transport
/// exactly once; the client itself holds no per-call state.
pub struct WaifuClient<T: Transport = ReqwestTransport> {
    config: Config,
    transport: T,
}

impl WaifuClient<ReqwestTransport> {
    /// Create a new client backed by `reqwest`
    pub fn new(config: Config) -> Result<Self> {
        let transport = ReqwestTransport::new(&config)?;
        Ok(Self { config, transport })
    }

    /// Create a client for the public service
    pub fn default_public() -> Result<Self> {
        Self::new(Config::default())
    }

    /// Create a client for the given base URL
    pub fn with_base_url(base_url: &str) -> Result<Self> {
        Self::new(Config::new(base_url))
    }
}

impl<T: Transport> WaifuClient<T> {
    /// Create a client that sends requests through a custom transport
    pub fn with_transport(config: Config, transport: T) -> Self {
        Self { config, transport }
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Upload a file from a local path, a remote URL or raw content
    #[instrument(skip(self, request), fields(
        expires = request.expires.as_deref(),
        hide_filename = request.hide_filename,
        one_time_download = request.one_time_download,
    ))]
    pub async fn upload(&self, request: UploadRequest) -> Result<FileRecord> {
        let mut fields = match request.source()? {
            UploadSource::Url(url) => vec![FormField::text("url", url)],
            UploadSource::Path { path, file_name } => {
                let data = tokio::fs::read(path).await.map_err(|e| {
                    ClientError::Validation(format!(
                        "File {} is not readable: {}",
                        path.display(),
                        e
                    ))
                })?;
                vec![FormField::file("file", file_name, data)]
            }
            UploadSource::Content { content, file_name } => {
                vec![FormField::file("file", file_name, content.clone())]
            }
        };

        if let Some(password) = request.password.as_deref().filter(|p| !p.is_empty()) {
            fields.push(FormField::text("password", password));
        }

        let url = with_query(self.config.rest_url(), &upload_params(&request));
        let http_request = HttpRequest::new(Method::Put, url).body(RequestBody::Form(fields));

        execute(&self.transport, http_request).await?.into_record()
    }

    /// Get the metadata of an entry.
    ///
    /// With `formatted` set the retention period comes back as a
    /// human-readable string instead of a number.
    #[instrument(skip(self))]
    pub async fn file_info(&self, token: &str, formatted: bool) -> Result<FileRecord> {
        if token.is_empty() {
            return Err(ClientError::Validation("Token is empty".to_string()));
        }

        let mut url = self.entry_url(token);
        if formatted {
            url.push_str("?formatted=true");
        }

        execute(&self.transport, HttpRequest::new(Method::Get, url))
            .await?
            .into_record()
    }

    /// Change the password, expiry or file name visibility of an entry
    #[instrument(skip(self, request), fields(token = %request.token))]
    pub async fn modify(&self, request: &ModifyRequest) -> Result<FileRecord> {
        if request.token.is_empty() {
            return Err(ClientError::Validation("Token is empty".to_string()));
        }

        let json = serde_json::to_string(request)
            .map_err(|e| ClientError::Validation(format!("Cannot encode request: {}", e)))?;

        let http_request = HttpRequest::new(Method::Patch, self.entry_url(&request.token))
            .header("Content-Type", "application/json; charset=utf-8")
            .body(RequestBody::Json(json));

        execute(&self.transport, http_request).await?.into_record()
    }

    /// Delete an entry
    #[instrument(skip(self))]
    pub async fn delete(&self, token: &str) -> Result<bool> {
        if token.is_empty() {
            return Err(ClientError::Validation("Token is empty".to_string()));
        }

        execute(&self.transport, HttpRequest::new(Method::Delete, self.entry_url(token)))
            .await?
            .into_acknowledged()
    }

    /// Download the content of a file.
    ///
    /// Looking a file up by token costs an extra info call to resolve its
    /// public URL; by file name the download is fetched directly.
    #[instrument(skip(self, query), fields(token = query.token.as_deref(), filename = query.filename.as_deref()))]
    pub async fn file_content(&self, query: &FileQuery) -> Result<Bytes> {
        let url = match query.target()? {
            FileTarget::Filename(filename) => self.config.file_url(filename),
            FileTarget::Token(token) => self.file_info(token, false).await?.url,
        };
        debug!("Resolved download URL {}", url);

        let mut http_request = HttpRequest::new(Method::Get, url);
        if let Some(password) = &query.password {
            http_request = http_request.header("x-password", password.as_str());
        }

        execute(&self.transport, http_request).await?.into_raw_body()
    }

    fn entry_url(&self, token: &str) -> String {
        format!("{}/{}", self.config.rest_url(), token)
    }
}

/// Query parameters of an upload. Booleans are sent as `true`/`false`;
/// the service rejects `1`/`0`.
fn upload_params(request: &UploadRequest) -> Vec<(&'static str, String)> {
    let mut params = Vec::new();
    if let Some(expires) = &request.expires {
        params.push(("expires", expires.clone()));
    }
    if let Some(hide) = request.hide_filename {
        params.push(("hideFilename", hide.to_string()));
    }
    if let Some(one_time) = request.one_time_download {
        params.push(("oneTimeDownload", one_time.to_string()));
    }
    params
}

fn with_query(mut url: String, params: &[(&str, String)]) -> String {
    if params.is_empty() {
        return url;
    }
    let query = form_urlencoded::Serializer::new(String::new())
        .extend_pairs(params.iter().map(|(k, v)| (*k, v.as_str())))
        .finish();
    url.push('?');
    url.push_str(&query);
    url
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::HttpResponse;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    const TOKEN: &str = "13b2485a-1010-4e3e-8f75-20f2a0c50b56";
    const RECORD_JSON: &str = r#"{
        "token": "13b2485a-1010-4e3e-8f75-20f2a0c50b56",
        "url": "https://waifuvault.moe/f/1711098733870/image.jpg",
        "retentionPeriod": "300 days 10 hours 5 minutes 1 second",
        "options": {"hideFilename": true, "oneTimeDownload": false, "protected": false}
    }"#;

    /// Records every request and replays canned responses in order
    #[derive(Clone, Default)]
    struct RecordingTransport {
        requests: Arc<Mutex<Vec<HttpRequest>>>,
        responses: Arc<Mutex<VecDeque<HttpResponse>>>,
    }

    impl RecordingTransport {
        fn replying(responses: Vec<HttpResponse>) -> Self {
            Self {
                requests: Arc::default(),
                responses: Arc::new(Mutex::new(responses.into())),
            }
        }

        fn requests(&self) -> Vec<HttpRequest> {
            self.requests.lock().unwrap().clone()
        }

        fn calls(&self) -> usize {
            self.requests.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl Transport for RecordingTransport {
        async fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
            self.requests.lock().unwrap().push(request);
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .ok_or_else(|| ClientError::Transport("no canned response left".to_string()))
        }
    }

    fn client(responses: Vec<HttpResponse>) -> (WaifuClient<RecordingTransport>, RecordingTransport) {
        let transport = RecordingTransport::replying(responses);
        let client = WaifuClient::with_transport(Config::default(), transport.clone());
        (client, transport)
    }

    fn ok_record() -> HttpResponse {
        HttpResponse::new(200, RECORD_JSON)
    }

    fn expected_record() -> FileRecord {
        serde_json::from_str(RECORD_JSON).unwrap()
    }

    #[tokio::test]
    async fn test_upload_from_url() {
        let (client, transport) = client(vec![ok_record()]);

        let record = client
            .upload(UploadRequest::from_url("https://domain.com/image.png"))
            .await
            .unwrap();
        assert_eq!(record, expected_record());

        let requests = transport.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].method, Method::Put);
        assert_eq!(requests[0].url, "https://waifuvault.moe/rest");
        assert_eq!(
            requests[0].body,
            Some(RequestBody::Form(vec![FormField::text("url", "https://domain.com/image.png")]))
        );
    }

    #[tokio::test]
    async fn test_upload_from_path_uses_basename() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("image.jpg");
        std::fs::write(&path, b"jpeg bytes").unwrap();

        let (client, transport) = client(vec![ok_record(), ok_record()]);

        client.upload(UploadRequest::from_path(&path)).await.unwrap();
        client
            .upload(UploadRequest::from_path(&path).with_file_name("customfilename.jpg"))
            .await
            .unwrap();

        let requests = transport.requests();
        assert_eq!(
            requests[0].body,
            Some(RequestBody::Form(vec![FormField::file(
                "file",
                "image.jpg",
                Bytes::from_static(b"jpeg bytes")
            )]))
        );
        assert_eq!(
            requests[1].body,
            Some(RequestBody::Form(vec![FormField::file(
                "file",
                "customfilename.jpg",
                Bytes::from_static(b"jpeg bytes")
            )]))
        );
    }

    #[tokio::test]
    async fn test_upload_content_with_password_and_options() {
        let (client, transport) = client(vec![ok_record()]);

        client
            .upload(
                UploadRequest::from_content(&b"file contents"[..], "customfilename.jpg")
                    .with_password("secret")
                    .with_expiry("1d")
                    .with_hide_filename(true)
                    .with_one_time_download(false),
            )
            .await
            .unwrap();

        let request = &transport.requests()[0];
        assert_eq!(
            request.url,
            "https://waifuvault.moe/rest?expires=1d&hideFilename=true&oneTimeDownload=false"
        );
        assert_eq!(
            request.body,
            Some(RequestBody::Form(vec![
                FormField::file("file", "customfilename.jpg", Bytes::from_static(b"file contents")),
                FormField::text("password", "secret"),
            ]))
        );
    }

    #[tokio::test]
    async fn test_upload_skips_empty_password() {
        let (client, transport) = client(vec![ok_record()]);

        client
            .upload(UploadRequest::from_url("https://domain.com/a.png").with_password(""))
            .await
            .unwrap();

        match &transport.requests()[0].body {
            Some(RequestBody::Form(fields)) => {
                assert!(fields.iter().all(|f| f.name() != "password"))
            }
            other => panic!("Expected form body, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_upload_validation_never_reaches_transport() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nonexistent.jpg");

        let mut two_sources = UploadRequest::from_url("https://domain.com/a.png");
        two_sources.content = Some(Bytes::from_static(b"data"));

        let bad_requests = vec![
            UploadRequest::default(),
            two_sources,
            UploadRequest::from_path(&missing),
            UploadRequest::from_path(&missing).with_file_name("random"),
            UploadRequest::from_path(&missing).with_file_name(""),
            UploadRequest::from_content(&b"contents"[..], ""),
        ];

        let (client, transport) = client(vec![]);
        for request in bad_requests {
            let err = client.upload(request).await.unwrap_err();
            assert!(err.is_validation(), "unexpected error: {:?}", err);
        }
        assert_eq!(transport.calls(), 0);
    }

    #[tokio::test]
    async fn test_file_info() {
        let (client, transport) = client(vec![ok_record(), ok_record()]);

        assert_eq!(client.file_info(TOKEN, false).await.unwrap(), expected_record());
        assert_eq!(client.file_info(TOKEN, true).await.unwrap(), expected_record());

        let requests = transport.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].method, Method::Get);
        assert_eq!(requests[0].url, format!("https://waifuvault.moe/rest/{}", TOKEN));
        assert_eq!(
            requests[1].url,
            format!("https://waifuvault.moe/rest/{}?formatted=true", TOKEN)
        );
    }

    #[tokio::test]
    async fn test_empty_token_is_rejected_locally() {
        let (client, transport) = client(vec![]);

        assert!(client.file_info("", false).await.unwrap_err().is_validation());
        assert!(client.file_info("", true).await.unwrap_err().is_validation());
        assert!(client.modify(&ModifyRequest::new("")).await.unwrap_err().is_validation());
        assert!(client.delete("").await.unwrap_err().is_validation());
        assert!(client
            .file_content(&FileQuery::by_token(""))
            .await
            .unwrap_err()
            .is_validation());
        assert_eq!(transport.calls(), 0);
    }

    #[tokio::test]
    async fn test_modify_sends_json_patch() {
        let (client, transport) = client(vec![ok_record()]);

        let request = ModifyRequest::new(TOKEN)
            .with_hide_filename(true)
            .with_custom_expiry("1d");
        assert_eq!(client.modify(&request).await.unwrap(), expected_record());

        let sent = &transport.requests()[0];
        assert_eq!(sent.method, Method::Patch);
        assert_eq!(sent.url, format!("https://waifuvault.moe/rest/{}", TOKEN));
        assert_eq!(
            sent.header_value("content-type"),
            Some("application/json; charset=utf-8")
        );
        match &sent.body {
            Some(RequestBody::Json(json)) => {
                let value: serde_json::Value = serde_json::from_str(json).unwrap();
                assert_eq!(
                    value,
                    serde_json::json!({"token": TOKEN, "customExpiry": "1d", "hideFilename": true})
                );
            }
            other => panic!("Expected JSON body, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_delete_acknowledges() {
        let (client, transport) = client(vec![HttpResponse::new(200, "true")]);

        assert!(client.delete(TOKEN).await.unwrap());

        let requests = transport.requests();
        assert_eq!(requests[0].method, Method::Delete);
        assert_eq!(requests[0].url, format!("https://waifuvault.moe/rest/{}", TOKEN));
    }

    #[tokio::test]
    async fn test_file_content_by_filename_is_one_call() {
        let (client, transport) = client(vec![HttpResponse::new(200, "hi")]);

        let content = client
            .file_content(&FileQuery::by_filename("1711098733870/image.jpg"))
            .await
            .unwrap();
        assert_eq!(content, Bytes::from_static(b"hi"));

        let requests = transport.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].url, "https://waifuvault.moe/f/1711098733870/image.jpg");
        assert_eq!(requests[0].header_value("x-password"), None);
    }

    #[tokio::test]
    async fn test_file_content_by_token_is_two_calls() {
        let (client, transport) = client(vec![ok_record(), HttpResponse::new(200, "hi")]);

        let content = client
            .file_content(&FileQuery::by_token(TOKEN).with_password("secret"))
            .await
            .unwrap();
        assert_eq!(content, Bytes::from_static(b"hi"));

        let requests = transport.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].url, format!("https://waifuvault.moe/rest/{}", TOKEN));
        assert_eq!(requests[1].url, "https://waifuvault.moe/f/1711098733870/image.jpg");
        assert_eq!(requests[1].header_value("x-password"), Some("secret"));
    }

    #[tokio::test]
    async fn test_file_content_requires_identity() {
        let (client, transport) = client(vec![]);

        let err = client.file_content(&FileQuery::default()).await.unwrap_err();
        assert!(err.is_validation());
        assert_eq!(transport.calls(), 0);
    }

    #[tokio::test]
    async fn test_file_content_403_is_auth() {
        let (client, _) = client(vec![
            ok_record(),
            HttpResponse::new(403, r#"{"name":"E","message":"bad","status":403}"#),
        ]);

        let err = client
            .file_content(&FileQuery::by_token(TOKEN).with_password("wrong"))
            .await
            .unwrap_err();
        assert!(err.is_auth());
    }

    #[tokio::test]
    async fn test_remote_error_on_every_operation() {
        let envelope = ErrorEnvelope {
            name: "E".to_string(),
            message: "bad".to_string(),
            status: 300,
        };
        let error = || HttpResponse::new(300, r#"{"name":"E","message":"bad","status":300}"#);
        let (client, _) = client(vec![error(), error(), error(), error(), error()]);

        let results = vec![
            client.upload(UploadRequest::from_url("https://a/b.png")).await.map(|_| ()),
            client.file_info(TOKEN, false).await.map(|_| ()),
            client.modify(&ModifyRequest::new(TOKEN)).await.map(|_| ()),
            client.delete(TOKEN).await.map(|_| ()),
            client.file_content(&FileQuery::by_filename("a.png")).await.map(|_| ()),
        ];

        for result in results {
            assert_eq!(result.unwrap_err().envelope(), Some(&envelope));
        }
    }

    #[tokio::test]
    async fn test_unparseable_error_is_protocol() {
        let error = || HttpResponse::new(500, "Internal Server Error");
        let (client, _) = client(vec![error(), error(), error(), error(), error()]);

        assert!(matches!(
            client.upload(UploadRequest::from_url("https://a/b.png")).await,
            Err(ClientError::Protocol(_))
        ));
        assert!(matches!(
            client.modify(&ModifyRequest::new(TOKEN)).await,
            Err(ClientError::Protocol(_))
        ));
        assert!(matches!(
            client.file_info(TOKEN, false).await,
            Err(ClientError::Protocol(_))
        ));
        assert!(matches!(client.delete(TOKEN).await, Err(ClientError::Protocol(_))));
        assert!(matches!(
            client.file_content(&FileQuery::by_filename("a.png")).await,
            Err(ClientError::Protocol(_))
        ));
    }

    #[test]
    fn test_upload_params_serialize_booleans_as_words() {
        let request = UploadRequest::from_url("u")
            .with_hide_filename(false)
            .with_one_time_download(true);

        let url = with_query("https://waifuvault.moe/rest".to_string(), &upload_params(&request));
        assert_eq!(
            url,
            "https://waifuvault.moe/rest?hideFilename=false&oneTimeDownload=true"
        );
    }

    #[test]
    fn test_upload_without_params_has_no_query() {
        let request = UploadRequest::from_url("u");
        let url = with_query("https://waifuvault.moe/rest".to_string(), &upload_params(&request));
        assert_eq!(url, "https://waifuvault.moe/rest");
    }
}
