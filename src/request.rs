//! Outgoing request description.

use crate::Error;
use http::{HeaderMap, HeaderName, HeaderValue, Method};
use serde::Serialize;
use serde_json::Value;

/// A single logical request as handed to the transport.
///
/// The record is owned by one call for its whole lifetime. Retries replay the
/// headers and body captured before the first attempt, so anything an
/// interceptor changes on the live record only affects the current attempt.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestRecord {
    /// The HTTP method (GET, POST, etc.).
    pub method: Method,

    /// Absolute URL, or a path resolved by the transport against its base URL.
    pub url: String,

    /// Headers for this request.
    pub headers: HeaderMap,

    /// Query parameters, appended in order.
    pub query: Vec<(String, String)>,

    /// JSON request body.
    pub body: Option<Value>,
}

impl RequestRecord {
    /// Creates a new `RequestRecord` with the given method and URL.
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: HeaderMap::new(),
            query: Vec::new(),
            body: None,
        }
    }

    /// Adds a header to the request.
    ///
    /// # Errors
    ///
    /// Returns an error if the header name or value is invalid.
    pub fn with_header(
        mut self,
        name: impl AsRef<str>,
        value: impl AsRef<str>,
    ) -> Result<Self, Error> {
        let name = HeaderName::try_from(name.as_ref())
            .map_err(|e| Error::ConfigurationError(format!("Invalid header name: {}", e)))?;
        let value = HeaderValue::try_from(value.as_ref())
            .map_err(|e| Error::ConfigurationError(format!("Invalid header value: {}", e)))?;
        self.headers.insert(name, value);
        Ok(self)
    }

    /// Adds a query parameter to the request.
    pub fn with_query_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    /// Sets the request body from any serializable value.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SerializationFailed`] if the value cannot be turned into JSON.
    pub fn with_json<B: Serialize + ?Sized>(mut self, body: &B) -> Result<Self, Error> {
        let value =
            serde_json::to_value(body).map_err(|e| Error::SerializationFailed(e.to_string()))?;
        self.body = Some(value);
        Ok(self)
    }

    /// Sets the request body from a JSON value.
    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }
}

impl Default for RequestRecord {
    fn default() -> Self {
        Self::new(Method::GET, "")
    }
}
