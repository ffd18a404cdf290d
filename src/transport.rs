//! The HTTP transport a [`Client`](crate::Client) wraps.
//!
//! The retry layer only needs one capability from the transport: send a
//! [`RequestRecord`] and report either a response or a failure. Implement
//! [`Transport`] to plug in something other than the default
//! [`ReqwestTransport`], such as a stub in tests.

use crate::{config::ClientConfig, request::RequestRecord, Error};
use async_trait::async_trait;
use http::{HeaderMap, HeaderName, HeaderValue, StatusCode};
use serde_json::Value;
use std::time::Duration;
use url::Url;

/// A response as received from the transport.
#[derive(Debug, Clone, PartialEq)]
pub struct TransportResponse {
    /// The HTTP status code.
    pub status: StatusCode,
    /// The response headers.
    pub headers: HeaderMap,
    /// The decoded body. `None` for an empty body.
    pub data: Option<Value>,
}

impl TransportResponse {
    /// Creates a response with no headers.
    pub fn new(status: StatusCode, data: Option<Value>) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            data,
        }
    }
}

/// Broad category of a transport failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportErrorKind {
    /// The connection could not be established.
    Connect,
    /// The attempt exceeded the transport timeout.
    Timeout,
    /// The server answered with a non-2xx status.
    Status,
    /// The request could not be built or sent.
    Request,
    /// The response body could not be read.
    Body,
}

/// A failure reported by the transport for a single attempt.
///
/// When the server did answer (e.g. a non-2xx status) the response is kept
/// so the retry predicate and the log sink can still see its status and body.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
#[error("Transport error ({kind:?}): {message}")]
pub struct TransportError {
    /// What went wrong.
    pub kind: TransportErrorKind,
    /// Human readable description.
    pub message: String,
    /// The response that came with the failure, if any.
    pub response: Option<TransportResponse>,
}

impl TransportError {
    /// Creates an error with no attached response.
    pub fn new(kind: TransportErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            response: None,
        }
    }

    /// Creates the error for a non-2xx response.
    pub fn from_status(response: TransportResponse) -> Self {
        Self {
            kind: TransportErrorKind::Status,
            message: format!("Request failed with status {}", response.status),
            response: Some(response),
        }
    }

    /// Returns the status of the attached response, if any.
    pub fn status(&self) -> Option<StatusCode> {
        self.response.as_ref().map(|r| r.status)
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        let kind = if err.is_timeout() {
            TransportErrorKind::Timeout
        } else if err.is_connect() {
            TransportErrorKind::Connect
        } else if err.is_body() || err.is_decode() {
            TransportErrorKind::Body
        } else {
            TransportErrorKind::Request
        };
        Self::new(kind, err.to_string())
    }
}

/// Sends one attempt of a request.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Sends the request exactly once.
    async fn send(&self, request: &RequestRecord) -> Result<TransportResponse, TransportError>;

    /// Headers the transport adds to every request.
    ///
    /// The client merges these into each request before its first attempt,
    /// so log entries show every header that goes on the wire.
    fn default_headers(&self) -> Option<&HeaderMap> {
        None
    }
}

/// Adds every default header whose name the request does not already set.
pub(crate) fn merge_default_headers(headers: &mut HeaderMap, defaults: &HeaderMap) {
    for name in defaults.keys() {
        if headers.contains_key(name) {
            continue;
        }
        for value in defaults.get_all(name) {
            headers.append(name.clone(), value.clone());
        }
    }
}

/// Appends a relative URL to a base URL, keeping the base's path.
fn combine_urls(base: &str, relative: &str) -> String {
    if relative.is_empty() {
        return base.to_string();
    }
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        relative.trim_start_matches('/')
    )
}

/// The default transport, backed by `reqwest`.
///
/// Relative URLs are resolved against the configured base URL. Non-2xx
/// responses are reported as [`TransportErrorKind::Status`] failures with the
/// response attached.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    http_client: reqwest::Client,
    base_url: Option<Url>,
    default_headers: HeaderMap,
    timeout: Option<Duration>,
}

impl ReqwestTransport {
    /// Builds a transport from a [`ClientConfig`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigurationError`] for invalid headers or a failed
    /// `reqwest` client build, and [`Error::InvalidUrl`] for a bad base URL.
    pub fn from_config(config: &ClientConfig) -> Result<Self, Error> {
        let base_url = config
            .base_url
            .as_deref()
            .map(Url::parse)
            .transpose()?;

        let mut default_headers = HeaderMap::new();
        for (name, value) in &config.headers {
            let name = HeaderName::try_from(name.as_str())
                .map_err(|e| Error::ConfigurationError(format!("Invalid header name: {}", e)))?;
            let value = HeaderValue::try_from(value.as_str())
                .map_err(|e| Error::ConfigurationError(format!("Invalid header value: {}", e)))?;
            default_headers.insert(name, value);
        }

        let http_client = reqwest::Client::builder().build().map_err(|e| {
            Error::ConfigurationError(format!("Failed to build HTTP client: {}", e))
        })?;

        Ok(Self {
            http_client,
            base_url,
            default_headers,
            timeout: config.timeout_ms.map(Duration::from_millis),
        })
    }

    fn resolve(&self, request: &RequestRecord) -> Result<Url, TransportError> {
        let mut url = match Url::parse(&request.url) {
            Ok(url) => url,
            Err(url::ParseError::RelativeUrlWithoutBase) => {
                let base = self.base_url.as_ref().ok_or_else(|| {
                    TransportError::new(
                        TransportErrorKind::Request,
                        format!("Relative URL '{}' with no base URL configured", request.url),
                    )
                })?;
                Url::parse(&combine_urls(base.as_str(), &request.url)).map_err(|e| {
                    TransportError::new(TransportErrorKind::Request, e.to_string())
                })?
            }
            Err(e) => return Err(TransportError::new(TransportErrorKind::Request, e.to_string())),
        };

        if !request.query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in &request.query {
                pairs.append_pair(key, value);
            }
        }

        Ok(url)
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    fn default_headers(&self) -> Option<&HeaderMap> {
        Some(&self.default_headers)
    }

    async fn send(&self, request: &RequestRecord) -> Result<TransportResponse, TransportError> {
        let url = self.resolve(request)?;

        tracing::debug!(method = %request.method, url = %url, "Sending HTTP request");

        let mut builder = self.http_client.request(request.method.clone(), url);

        let mut headers = request.headers.clone();
        merge_default_headers(&mut headers, &self.default_headers);
        builder = builder.headers(headers);
        if let Some(timeout) = self.timeout {
            builder = builder.timeout(timeout);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await?;
        let status = response.status();
        let headers = response.headers().clone();
        let raw_body = response.text().await?;

        let response = TransportResponse {
            status,
            headers,
            data: decode_body(raw_body),
        };

        if status.is_success() {
            Ok(response)
        } else {
            Err(TransportError::from_status(response))
        }
    }
}

/// JSON bodies are parsed, anything else is kept as a string.
fn decode_body(raw_body: String) -> Option<Value> {
    if raw_body.is_empty() {
        return None;
    }
    match serde_json::from_str(&raw_body) {
        Ok(value) => Some(value),
        Err(_) => Some(Value::String(raw_body)),
    }
}
