//! The normalized outcome of a single attempt.
//!
//! Successful responses and transport failures are both turned into a
//! [`ResponseRecord`], so the log sink and the retry predicate see one shape
//! regardless of how the attempt ended.

use crate::{
    request::RequestRecord,
    transport::{TransportError, TransportResponse},
    Error, Result,
};
use http::{HeaderMap, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;

/// What one attempt produced, together with the request that was sent.
///
/// # Examples
///
/// ```no_run
/// use reattempt::Client;
/// use serde::Deserialize;
///
/// #[derive(Deserialize)]
/// struct User {
///     id: u64,
///     name: String,
/// }
///
/// # async fn example() -> Result<(), reattempt::Error> {
/// let client = Client::builder()
///     .base_url("https://api.example.com")?
///     .build()?;
///
/// let response = client.get("/users/123").await?;
/// let user: User = response.json()?;
///
/// println!("User: {}", user.name);
/// println!("Status: {:?}", response.status);
/// println!("Attempts: {}", response.attempts);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ResponseRecord {
    /// The HTTP status code. `None` when the attempt failed before a response arrived.
    pub status: Option<StatusCode>,

    /// The response headers, empty when there was no response.
    pub headers: HeaderMap,

    /// The decoded response body, if any.
    pub data: Option<Value>,

    /// The request exactly as it was sent for this attempt.
    pub request: RequestRecord,

    /// The attempt number that produced this record (1-indexed).
    pub attempts: u32,

    /// The transport failure, when the attempt did not succeed.
    pub error: Option<TransportError>,
}

impl ResponseRecord {
    /// Wraps a successful transport response.
    pub fn from_response(
        response: TransportResponse,
        request: RequestRecord,
        attempts: u32,
    ) -> Self {
        Self {
            status: Some(response.status),
            headers: response.headers,
            data: response.data,
            request,
            attempts,
            error: None,
        }
    }

    /// Normalizes a transport failure.
    ///
    /// Status, headers and body are lifted from the response attached to the
    /// error when there is one, and left empty otherwise.
    pub fn from_error(error: TransportError, request: RequestRecord, attempts: u32) -> Self {
        let (status, headers, data) = match &error.response {
            Some(response) => (
                Some(response.status),
                response.headers.clone(),
                response.data.clone(),
            ),
            None => (None, HeaderMap::new(), None),
        };
        Self {
            status,
            headers,
            data,
            request,
            attempts,
            error: Some(error),
        }
    }

    /// Returns `true` if the transport reported success for this attempt.
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }

    /// Returns `true` if the call took more than one attempt.
    pub fn was_retried(&self) -> bool {
        self.attempts > 1
    }

    /// Returns a header value by name.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name)?.to_str().ok()
    }

    /// Deserializes the response body into `T`.
    ///
    /// An absent body is treated as JSON `null`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DeserializationFailed`] with the raw body if it does
    /// not match `T`.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        let value = self.data.clone().unwrap_or(Value::Null);
        serde_json::from_value(value).map_err(|e| {
            let raw_response = self
                .data
                .as_ref()
                .map(|d| d.to_string())
                .unwrap_or_default();
            tracing::error!(
                error = %e,
                raw_response = %raw_response,
                "Failed to deserialize response"
            );
            Error::DeserializationFailed {
                raw_response,
                serde_error: e.to_string(),
                status: self.status,
            }
        })
    }

    /// Turns the record into the caller-facing result.
    ///
    /// A failed attempt is surfaced as the transport error it came from.
    pub(crate) fn into_result(mut self) -> Result<Self> {
        match self.error.take() {
            Some(error) => Err(Error::Transport(error)),
            None => Ok(self),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::TransportErrorKind;
    use http::Method;
    use serde::Deserialize;
    use serde_json::json;

    fn request() -> RequestRecord {
        RequestRecord::new(Method::GET, "/users/1")
    }

    #[test]
    fn test_from_error_lifts_attached_response() {
        let error = TransportError::from_status(TransportResponse::new(
            StatusCode::SERVICE_UNAVAILABLE,
            Some(json!({"error": "busy"})),
        ));
        let record = ResponseRecord::from_error(error, request(), 2);

        assert_eq!(record.status, Some(StatusCode::SERVICE_UNAVAILABLE));
        assert_eq!(record.data, Some(json!({"error": "busy"})));
        assert_eq!(record.attempts, 2);
        assert!(!record.is_success());
    }

    #[test]
    fn test_from_error_without_response() {
        let error = TransportError::new(TransportErrorKind::Connect, "connection refused");
        let record = ResponseRecord::from_error(error, request(), 1);

        assert_eq!(record.status, None);
        assert_eq!(record.data, None);
        assert!(record.headers.is_empty());
    }

    #[test]
    fn test_into_result() {
        let ok = ResponseRecord::from_response(
            TransportResponse::new(StatusCode::OK, None),
            request(),
            1,
        );
        assert!(ok.into_result().is_ok());

        let failed = ResponseRecord::from_error(
            TransportError::new(TransportErrorKind::Timeout, "timed out"),
            request(),
            1,
        );
        match failed.into_result() {
            Err(Error::Transport(err)) => assert_eq!(err.kind, TransportErrorKind::Timeout),
            other => panic!("Expected transport error, got {:?}", other),
        }
    }

    #[test]
    fn test_json_decoding() {
        #[derive(Debug, Deserialize, PartialEq)]
        struct User {
            id: u64,
        }

        let record = ResponseRecord::from_response(
            TransportResponse::new(StatusCode::OK, Some(json!({"id": 5}))),
            request(),
            1,
        );
        assert_eq!(record.json::<User>().unwrap(), User { id: 5 });

        let record = ResponseRecord::from_response(
            TransportResponse::new(StatusCode::OK, Some(json!("not a user"))),
            request(),
            3,
        );
        match record.json::<User>() {
            Err(Error::DeserializationFailed {
                raw_response,
                status,
                ..
            }) => {
                assert_eq!(raw_response, "\"not a user\"");
                assert_eq!(status, Some(StatusCode::OK));
            }
            other => panic!("Expected DeserializationFailed, got {:?}", other),
        }
        assert!(record.was_retried());
    }
}
