//! Error types for retrying HTTP calls.
//!
//! Configuration problems fail fast when the client is built. Per-attempt
//! transport failures are folded into the retry loop and only surface here
//! once the predicate declines to retry or the attempt bound is reached.

use crate::{response::ResponseRecord, transport::TransportError};
use http::StatusCode;

/// The main error type returned by [`Client`](crate::Client).
///
/// # Examples
///
/// ```no_run
/// use reattempt::{Client, Error};
///
/// # async fn example() -> Result<(), Error> {
/// let client = Client::builder()
///     .base_url("https://api.example.com")?
///     .build()?;
///
/// match client.get("/endpoint").await {
///     Ok(response) => println!("Success: {:?}", response.data),
///     Err(Error::RetryExhausted { attempts, last }) => {
///         eprintln!("Gave up after {} attempts, last status {:?}", attempts, last.status);
///     }
///     Err(Error::Transport(err)) => eprintln!("Transport failure: {}", err),
///     Err(e) => eprintln!("Other error: {}", e),
/// }
/// # Ok(())
/// # }
/// ```
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// Invalid configuration was provided.
    ///
    /// Raised by [`ClientBuilder::build`](crate::ClientBuilder::build) for an
    /// out-of-range retry delay, a zero attempt bound, invalid header names or
    /// values, or a base URL that does not parse. No client is returned.
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    /// The request was still retry-worthy when the attempt bound was reached.
    ///
    /// # Fields
    ///
    /// * `attempts` - The number of attempts made
    /// * `last` - The normalized record of the final attempt
    #[error("Retries exhausted after {attempts} attempts (last status: {})", display_status(.last))]
    RetryExhausted {
        /// The number of attempts made
        attempts: u32,
        /// The last response or normalized failure
        last: Box<ResponseRecord>,
    },

    /// The final attempt failed in the transport and was not retried.
    ///
    /// The error is passed through exactly as the transport reported it.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Failed to deserialize the response body into the expected type.
    #[error("Failed to deserialize response (status {status:?}): {serde_error}")]
    DeserializationFailed {
        /// The response body that failed to deserialize
        raw_response: String,
        /// The serde error message
        serde_error: String,
        /// The HTTP status code, if the exchange produced one
        status: Option<StatusCode>,
    },

    /// Failed to convert the request body to JSON.
    #[error("Failed to serialize request: {0}")]
    SerializationFailed(String),

    /// An invalid URL was provided.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

fn display_status(record: &ResponseRecord) -> String {
    match record.status {
        Some(status) => status.as_u16().to_string(),
        None => "none".to_string(),
    }
}

impl Error {
    /// Returns the HTTP status code associated with this error, if any.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Error::RetryExhausted { last, .. } => last.status,
            Error::Transport(err) => err.status(),
            Error::DeserializationFailed { status, .. } => *status,
            _ => None,
        }
    }

    /// Returns `true` if the call gave up because the attempt bound was reached.
    pub fn is_retry_exhausted(&self) -> bool {
        matches!(self, Error::RetryExhausted { .. })
    }

    /// Returns the record of the final attempt for exhausted retries.
    pub fn last_response(&self) -> Option<&ResponseRecord> {
        match self {
            Error::RetryExhausted { last, .. } => Some(last),
            _ => None,
        }
    }
}

/// A specialized `Result` type for retrying HTTP calls.
pub type Result<T> = std::result::Result<T, Error>;
