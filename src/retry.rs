//! Retry decisions.
//!
//! A [`RetryPredicate`] says whether an attempt's outcome is worth another
//! try. [`RetryPolicy`] combines it with the fixed delay and attempt bound
//! from [`RetryOptions`] to pick what happens next.

use crate::{config::RetryOptions, response::ResponseRecord};
use http::StatusCode;
use std::sync::Arc;
use std::time::Duration;

/// Decides whether an attempt should be retried.
///
/// Successful responses and normalized transport failures are both passed in
/// as a [`ResponseRecord`]. Any `Fn(&ResponseRecord) -> bool` closure is a
/// predicate.
///
/// # Examples
///
/// ```
/// use reattempt::{ResponseRecord, RetryPredicate};
///
/// struct RetryOnRateLimit;
///
/// impl RetryPredicate for RetryOnRateLimit {
///     fn should_retry(&self, response: &ResponseRecord) -> bool {
///         response.status.map(|s| s.as_u16()) == Some(429)
///     }
/// }
///
/// // Or just a closure
/// let on_500 = |response: &ResponseRecord| response.status.map(|s| s.as_u16()) == Some(500);
/// ```
pub trait RetryPredicate: Send + Sync {
    /// Returns `true` if the request should be sent again.
    fn should_retry(&self, response: &ResponseRecord) -> bool;
}

impl<F> RetryPredicate for F
where
    F: Fn(&ResponseRecord) -> bool + Send + Sync,
{
    fn should_retry(&self, response: &ResponseRecord) -> bool {
        self(response)
    }
}

/// The default predicate: retry anything whose status is not exactly `200 OK`.
///
/// Failures without a response (connection errors, timeouts) have no status
/// and are therefore retried too.
#[derive(Debug, Clone, Copy, Default)]
pub struct RetryUnlessOk;

impl RetryPredicate for RetryUnlessOk {
    fn should_retry(&self, response: &ResponseRecord) -> bool {
        response.status != Some(StatusCode::OK)
    }
}

/// Retry only on 5xx server errors.
#[derive(Debug, Clone, Copy)]
pub struct RetryOn5xx;

impl RetryPredicate for RetryOn5xx {
    fn should_retry(&self, response: &ResponseRecord) -> bool {
        response.status.is_some_and(|s| s.is_server_error())
    }
}

/// Retry only when no response arrived at all.
#[derive(Debug, Clone, Copy)]
pub struct RetryOnTransportError;

impl RetryPredicate for RetryOnTransportError {
    fn should_retry(&self, response: &ResponseRecord) -> bool {
        response.error.is_some() && response.status.is_none()
    }
}

/// Combine multiple retry predicates with OR logic.
///
/// Retries if ANY of the predicates return `true`.
///
/// # Examples
///
/// ```
/// use reattempt::retry::{OrPredicate, RetryOn5xx, RetryOnTransportError};
///
/// let predicate = OrPredicate::new(vec![
///     Box::new(RetryOn5xx),
///     Box::new(RetryOnTransportError),
/// ]);
/// ```
pub struct OrPredicate {
    predicates: Vec<Box<dyn RetryPredicate>>,
}

impl OrPredicate {
    /// Creates a new `OrPredicate` from a list of predicates.
    pub fn new(predicates: Vec<Box<dyn RetryPredicate>>) -> Self {
        Self { predicates }
    }
}

impl RetryPredicate for OrPredicate {
    fn should_retry(&self, response: &ResponseRecord) -> bool {
        self.predicates.iter().any(|p| p.should_retry(response))
    }
}

/// Combine multiple retry predicates with AND logic.
///
/// Retries only if ALL of the predicates return `true`.
pub struct AndPredicate {
    predicates: Vec<Box<dyn RetryPredicate>>,
}

impl AndPredicate {
    /// Creates a new `AndPredicate` from a list of predicates.
    pub fn new(predicates: Vec<Box<dyn RetryPredicate>>) -> Self {
        Self { predicates }
    }
}

impl RetryPredicate for AndPredicate {
    fn should_retry(&self, response: &ResponseRecord) -> bool {
        self.predicates.iter().all(|p| p.should_retry(response))
    }
}

/// What to do after an attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Hand the outcome back to the caller as-is.
    Resolve,
    /// Wait, then send the original request again.
    RetryAfter(Duration),
    /// Still retry-worthy, but out of attempts.
    Reject,
}

/// Predicate plus delay and attempt bound.
#[derive(Clone)]
pub struct RetryPolicy {
    predicate: Arc<dyn RetryPredicate>,
    options: RetryOptions,
}

impl RetryPolicy {
    /// Creates a policy.
    pub fn new(predicate: Arc<dyn RetryPredicate>, options: RetryOptions) -> Self {
        Self { predicate, options }
    }

    /// The options this policy was built with.
    pub fn options(&self) -> &RetryOptions {
        &self.options
    }

    /// Decides the fate of the attempt that produced `response`.
    ///
    /// `response.attempts` is the number of the attempt just completed.
    pub fn decide(&self, response: &ResponseRecord) -> Decision {
        if !self.predicate.should_retry(response) {
            return Decision::Resolve;
        }
        if response.attempts >= self.options.max_attempts() {
            return Decision::Reject;
        }
        Decision::RetryAfter(self.options.delay())
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(Arc::new(RetryUnlessOk), RetryOptions::default())
    }
}
