//! Authenticated calls against the photo server
//!
//! One [`UpstreamTransport`] is built per host request from the credentials
//! looked up for that request. It never retries; the variant resolver is the
//! only place that issues a second attempt.

use bridge_traits::http::{ByteStream, HttpClient, HttpMethod, HttpRequest};
use bridge_traits::Credentials;
use core_runtime::config::UpstreamSettings;
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::AsyncReadExt;
use tracing::{debug, error, instrument, warn};

use crate::error::{ImmichError, Result};

/// Header carrying the API key
const API_KEY_HEADER: &str = "x-api-key";

/// Content type assumed when the server does not send one
const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// Upper bound on how much of a failed binary response is read for the error message
const ERROR_BODY_LIMIT: u64 = 4096;

/// Join a base URL and an endpoint with exactly one slash
pub fn build_url(base_url: &str, endpoint: &str) -> String {
    format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        endpoint.trim_start_matches('/')
    )
}

/// A binary rendition streamed from the photo server
pub struct BinaryPayload {
    pub content_type: String,
    pub body: ByteStream,
}

impl BinaryPayload {
    /// Whether the payload is an image of any kind
    pub fn is_image(&self) -> bool {
        self.content_type
            .trim_start()
            .to_ascii_lowercase()
            .starts_with("image/")
    }
}

impl fmt::Debug for BinaryPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BinaryPayload")
            .field("content_type", &self.content_type)
            .field("body", &"ByteStream { ... }")
            .finish()
    }
}

/// HTTP access to one user's photo server
pub struct UpstreamTransport {
    http_client: Arc<dyn HttpClient>,
    credentials: Credentials,
    json_timeout: Duration,
    binary_timeout: Duration,
}

impl UpstreamTransport {
    /// Create a transport for the given credentials
    ///
    /// # Errors
    ///
    /// [`ImmichError::ConfigurationMissing`] when `credentials` is `None`.
    /// No request is attempted in that case.
    pub fn new(
        http_client: Arc<dyn HttpClient>,
        credentials: Option<Credentials>,
        settings: &UpstreamSettings,
    ) -> Result<Self> {
        let credentials = credentials.ok_or(ImmichError::ConfigurationMissing)?;
        Ok(Self {
            http_client,
            credentials,
            json_timeout: settings.json_timeout,
            binary_timeout: settings.binary_timeout,
        })
    }

    /// Base URL of the photo server
    pub fn base_url(&self) -> &str {
        self.credentials.base_url()
    }

    /// Absolute URL for `endpoint`
    pub fn url(&self, endpoint: &str) -> String {
        build_url(self.credentials.base_url(), endpoint)
    }

    fn json_request(&self, method: HttpMethod, endpoint: &str) -> HttpRequest {
        HttpRequest::new(method, self.url(endpoint))
            .header(API_KEY_HEADER, self.credentials.api_key())
            .header("Accept", "application/json")
            .timeout(self.json_timeout)
    }

    /// GET `endpoint` and decode the body as JSON
    ///
    /// A body that is empty or not JSON decodes to an empty object.
    #[instrument(skip(self))]
    pub async fn get_json(&self, endpoint: &str) -> Result<Value> {
        let request = self.json_request(HttpMethod::Get, endpoint);
        self.send_json(endpoint, request).await
    }

    /// POST `body` as JSON to `endpoint` and decode the answer
    #[instrument(skip(self, body))]
    pub async fn post_json<T: Serialize + Sync>(&self, endpoint: &str, body: &T) -> Result<Value> {
        let request = self.json_request(HttpMethod::Post, endpoint).json(body)?;
        self.send_json(endpoint, request).await
    }

    async fn send_json(&self, endpoint: &str, request: HttpRequest) -> Result<Value> {
        let response = self.http_client.execute(request).await.map_err(|e| {
            error!(endpoint = %endpoint, error = %e, "Photo server request failed");
            ImmichError::connection(None, e.to_string())
        })?;

        if !response.is_success() {
            let message = upstream_message(response.status, &response.text_lossy());
            error!(
                endpoint = %endpoint,
                status = response.status,
                "Photo server returned an error"
            );
            return Err(ImmichError::connection(Some(response.status), message));
        }

        match serde_json::from_slice::<Value>(&response.body) {
            Ok(value) => Ok(value),
            Err(e) => {
                if !response.body.is_empty() {
                    warn!(endpoint = %endpoint, error = %e, "Ignoring malformed JSON body");
                }
                Ok(Value::Object(Default::default()))
            }
        }
    }

    /// GET a binary rendition without buffering it
    ///
    /// Only the API key header is sent; the server picks the content type.
    #[instrument(skip(self))]
    pub async fn get_binary(&self, endpoint: &str) -> Result<BinaryPayload> {
        let request = HttpRequest::new(HttpMethod::Get, self.url(endpoint))
            .header(API_KEY_HEADER, self.credentials.api_key())
            .timeout(self.binary_timeout);

        let response = self.http_client.execute_stream(request).await.map_err(|e| {
            error!(endpoint = %endpoint, error = %e, "Photo server binary request failed");
            ImmichError::connection(None, e.to_string())
        })?;

        if !response.is_success() {
            let status = response.status;
            let mut text = String::new();
            // Best effort; the status alone is enough if the body is unreadable
            let _ = response
                .body
                .take(ERROR_BODY_LIMIT)
                .read_to_string(&mut text)
                .await;
            error!(endpoint = %endpoint, status, "Photo server returned an error");
            return Err(ImmichError::connection(
                Some(status),
                upstream_message(status, &text),
            ));
        }

        let content_type = response
            .header("Content-Type")
            .map(str::trim)
            .filter(|ct| !ct.is_empty())
            .unwrap_or(DEFAULT_CONTENT_TYPE)
            .to_string();

        debug!(endpoint = %endpoint, content_type = %content_type, "Streaming binary");

        Ok(BinaryPayload {
            content_type,
            body: response.body,
        })
    }
}

/// Error text for a non-2xx answer, preferring the server's own message
fn upstream_message(status: u16, body: &str) -> String {
    let from_json = serde_json::from_str::<Value>(body).ok().and_then(|v| {
        v.get("message").and_then(|m| match m {
            Value::String(s) => Some(s.clone()),
            Value::Array(items) => Some(
                items
                    .iter()
                    .filter_map(Value::as_str)
                    .collect::<Vec<_>>()
                    .join(", "),
            ),
            _ => None,
        })
    });

    match from_json {
        Some(message) if !message.is_empty() => format!("HTTP {}: {}", status, message),
        _ if !body.trim().is_empty() => format!("HTTP {}: {}", status, body.trim()),
        _ => format!("HTTP {}", status),
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use async_trait::async_trait;
    use bridge_traits::error::BridgeError;
    use bridge_traits::http::{HttpResponse, HttpStreamResponse};
    use bytes::Bytes;
    use mockall::mock;
    use std::collections::HashMap;
    use std::io::Cursor;

    mock! {
        pub HttpClient {}

        #[async_trait]
        impl HttpClient for HttpClient {
            async fn execute(&self, request: HttpRequest) -> bridge_traits::error::Result<HttpResponse>;
            async fn execute_stream(&self, request: HttpRequest) -> bridge_traits::error::Result<HttpStreamResponse>;
        }
    }

    pub fn json_response(status: u16, body: &str) -> HttpResponse {
        HttpResponse {
            status,
            headers: HashMap::new(),
            body: Bytes::from(body.to_string()),
        }
    }

    pub fn stream_response(status: u16, content_type: Option<&str>, body: &'static [u8]) -> HttpStreamResponse {
        let mut headers = HashMap::new();
        if let Some(ct) = content_type {
            headers.insert("content-type".to_string(), ct.to_string());
        }
        HttpStreamResponse {
            status,
            headers,
            body: Box::new(Cursor::new(body)),
        }
    }

    pub fn credentials() -> Credentials {
        Credentials::new("https://photos.example.com/api/", "test-key")
    }

    pub fn transport(client: MockHttpClient) -> UpstreamTransport {
        UpstreamTransport::new(
            Arc::new(client),
            Some(credentials()),
            &UpstreamSettings::default(),
        )
        .unwrap()
    }

    pub async fn read_body(payload: BinaryPayload) -> Vec<u8> {
        let mut body = payload.body;
        let mut bytes = Vec::new();
        body.read_to_end(&mut bytes).await.unwrap();
        bytes
    }

    #[test]
    fn test_build_url_single_slash() {
        let expected = "https://h/api/albums";
        for base in ["https://h/api", "https://h/api/", "https://h/api//"] {
            for endpoint in ["albums", "/albums", "//albums"] {
                assert_eq!(build_url(base, endpoint), expected);
            }
        }
    }

    #[test]
    fn test_missing_credentials_fail_before_any_request() {
        // No expectations: any call on the mock would panic
        let client = MockHttpClient::new();
        let result = UpstreamTransport::new(Arc::new(client), None, &UpstreamSettings::default());

        assert!(matches!(result, Err(ImmichError::ConfigurationMissing)));
    }

    #[tokio::test]
    async fn test_get_json_sends_key_and_accept() {
        let mut client = MockHttpClient::new();
        client
            .expect_execute()
            .withf(|req| {
                req.method == HttpMethod::Get
                    && req.url == "https://photos.example.com/api/albums"
                    && req.headers.get("x-api-key").map(String::as_str) == Some("test-key")
                    && req.headers.get("Accept").map(String::as_str) == Some("application/json")
                    && req.timeout == Some(Duration::from_secs(30))
            })
            .times(1)
            .returning(|_| Ok(json_response(200, r#"[{"id":"al1"}]"#)));

        let value = transport(client).get_json("/albums").await.unwrap();

        assert_eq!(value[0]["id"], "al1");
    }

    #[tokio::test]
    async fn test_get_json_tolerates_empty_and_malformed_bodies() {
        let mut client = MockHttpClient::new();
        let mut bodies = vec!["", "<html>oops</html>"].into_iter();
        client
            .expect_execute()
            .times(2)
            .returning(move |_| Ok(json_response(200, bodies.next().unwrap_or_default())));
        let transport = transport(client);

        for _ in 0..2 {
            let value = transport.get_json("albums").await.unwrap();
            assert_eq!(value, Value::Object(Default::default()));
        }
    }

    #[tokio::test]
    async fn test_non_success_status_carries_upstream_message() {
        let mut client = MockHttpClient::new();
        client
            .expect_execute()
            .returning(|_| Ok(json_response(401, r#"{"message":"Invalid API key"}"#)));

        let err = transport(client).get_json("albums").await.unwrap_err();

        assert_eq!(err.upstream_status(), Some(401));
        assert!(err.to_string().contains("Invalid API key"));
        assert!(!err.to_string().contains("test-key"));
    }

    #[tokio::test]
    async fn test_transport_failure_maps_to_connection_error() {
        let mut client = MockHttpClient::new();
        client
            .expect_execute()
            .returning(|_| Err(BridgeError::OperationFailed("Request timed out".to_string())));

        let err = transport(client).get_json("albums").await.unwrap_err();

        assert!(matches!(
            err,
            ImmichError::UpstreamConnection { status: None, .. }
        ));
    }

    #[tokio::test]
    async fn test_post_json_sends_body() {
        let mut client = MockHttpClient::new();
        client
            .expect_execute()
            .withf(|req| {
                req.method == HttpMethod::Post
                    && req.url == "https://photos.example.com/api/search/metadata"
                    && req.headers.get("Content-Type").map(String::as_str)
                        == Some("application/json")
                    && req.body.as_deref() == Some(br#"{"page":1,"size":50}"#.as_slice())
            })
            .returning(|_| Ok(json_response(200, r#"{"assets":{"items":[]}}"#)));

        let value = transport(client)
            .post_json("search/metadata", &serde_json::json!({"page": 1, "size": 50}))
            .await
            .unwrap();

        assert!(value["assets"]["items"].is_array());
    }

    #[tokio::test]
    async fn test_get_binary_streams_body_without_accept() {
        let mut client = MockHttpClient::new();
        client
            .expect_execute_stream()
            .withf(|req| {
                req.url == "https://photos.example.com/api/assets/a1/original"
                    && req.headers.get("x-api-key").map(String::as_str) == Some("test-key")
                    && !req.headers.contains_key("Accept")
                    && req.timeout == Some(Duration::from_secs(60))
            })
            .returning(|_| Ok(stream_response(200, Some("image/jpeg"), b"\xff\xd8\xff\x00\x01")));

        let payload = transport(client).get_binary("assets/a1/original").await.unwrap();

        assert_eq!(payload.content_type, "image/jpeg");
        assert!(payload.is_image());
        assert_eq!(read_body(payload).await, b"\xff\xd8\xff\x00\x01");
    }

    #[tokio::test]
    async fn test_get_binary_defaults_content_type() {
        let mut client = MockHttpClient::new();
        client
            .expect_execute_stream()
            .returning(|_| Ok(stream_response(200, None, b"raw")));

        let payload = transport(client).get_binary("assets/a1/original").await.unwrap();

        assert_eq!(payload.content_type, "application/octet-stream");
        assert!(!payload.is_image());
    }

    #[tokio::test]
    async fn test_get_binary_error_status() {
        let mut client = MockHttpClient::new();
        client
            .expect_execute_stream()
            .returning(|_| Ok(stream_response(404, Some("application/json"), br#"{"message":"Asset not found"}"#)));

        let err = transport(client).get_binary("assets/zz/original").await.unwrap_err();

        assert_eq!(err.upstream_status(), Some(404));
        assert!(err.to_string().contains("Asset not found"));
    }
}
