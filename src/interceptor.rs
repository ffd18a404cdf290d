//! Hooks around every attempt.

use crate::{request::RequestRecord, response::ResponseRecord};

/// Observes or adjusts each attempt of every call.
///
/// `on_request` runs after retry bookkeeping, right before the transport
/// sends. Changes it makes to headers or body only last for that attempt:
/// the next retry starts again from the caller's original payload.
/// `on_response` runs once per attempt, after the exchange has been logged
/// and before the retry decision.
///
/// # Examples
///
/// ```
/// use reattempt::{Interceptor, RequestRecord};
/// use http::HeaderValue;
///
/// struct Signer;
///
/// impl Interceptor for Signer {
///     fn on_request(&self, request: &mut RequestRecord) {
///         request
///             .headers
///             .insert("x-signature", HeaderValue::from_static("signed"));
///     }
/// }
/// ```
pub trait Interceptor: Send + Sync {
    /// Called before each attempt is sent.
    fn on_request(&self, _request: &mut RequestRecord) {}

    /// Called once each attempt has produced a response or failure.
    fn on_response(&self, _response: &ResponseRecord) {}
}
