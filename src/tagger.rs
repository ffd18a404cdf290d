//! Per-call retry bookkeeping.
//!
//! Every attempt passes through [`tag`] right before it is handed to the
//! transport. The first pass snapshots the caller's headers and body; every
//! later pass bumps the attempt counter and puts that snapshot back, so a
//! retry always replays what the caller originally asked for.

use crate::request::RequestRecord;
use http::HeaderMap;
use serde_json::Value;

/// The untouched headers and body of a request, taken before its first attempt.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    /// Headers as the caller built them.
    pub headers: HeaderMap,
    /// Body as the caller built it.
    pub body: Option<Value>,
}

/// A request together with the retry state of its logical call.
#[derive(Debug, Clone)]
pub struct Envelope {
    /// The live request for the current attempt.
    pub payload: RequestRecord,
    /// The current attempt number. `0` until the first [`tag`].
    pub attempt: u32,
    /// Captured exactly once, on the first attempt.
    pub original: Option<Snapshot>,
}

impl Envelope {
    /// Wraps a fresh request. No attempt has been made yet.
    pub fn new(payload: RequestRecord) -> Self {
        Self {
            payload,
            attempt: 0,
            original: None,
        }
    }
}

/// Stamps attempt bookkeeping onto the envelope ahead of a send.
///
/// Never fails.
pub fn tag(envelope: &mut Envelope) {
    match &envelope.original {
        Some(original) => {
            envelope.attempt += 1;
            envelope.payload.headers = original.headers.clone();
            envelope.payload.body = original.body.clone();
        }
        None => {
            envelope.original = Some(Snapshot {
                headers: envelope.payload.headers.clone(),
                body: envelope.payload.body.clone(),
            });
            envelope.attempt = 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::{HeaderValue, Method};
    use serde_json::json;

    fn sample() -> RequestRecord {
        RequestRecord::new(Method::POST, "/orders")
            .with_header("x-request-id", "abc")
            .unwrap()
            .with_body(json!({"sku": 7}))
    }

    #[test]
    fn test_first_tag_captures_snapshot() {
        let mut envelope = Envelope::new(sample());
        tag(&mut envelope);

        assert_eq!(envelope.attempt, 1);
        let original = envelope.original.as_ref().unwrap();
        assert_eq!(original.headers.get("x-request-id").unwrap(), "abc");
        assert_eq!(original.body, Some(json!({"sku": 7})));
    }

    #[test]
    fn test_retry_restores_original_payload() {
        let mut envelope = Envelope::new(sample());
        tag(&mut envelope);

        envelope
            .payload
            .headers
            .insert("x-request-id", HeaderValue::from_static("mutated"));
        envelope
            .payload
            .headers
            .insert("x-extra", HeaderValue::from_static("1"));
        envelope.payload.body = Some(json!({"sku": 8}));

        tag(&mut envelope);

        assert_eq!(envelope.attempt, 2);
        assert_eq!(envelope.payload.headers.get("x-request-id").unwrap(), "abc");
        assert!(envelope.payload.headers.get("x-extra").is_none());
        assert_eq!(envelope.payload.body, Some(json!({"sku": 7})));
    }

    #[test]
    fn test_snapshot_is_taken_once() {
        let mut envelope = Envelope::new(sample());
        tag(&mut envelope);
        envelope.payload.body = Some(json!("changed"));
        tag(&mut envelope);
        envelope.payload.body = Some(json!("changed again"));
        tag(&mut envelope);

        assert_eq!(envelope.attempt, 3);
        assert_eq!(
            envelope.original.as_ref().unwrap().body,
            Some(json!({"sku": 7}))
        );
        assert_eq!(envelope.payload.body, Some(json!({"sku": 7})));
    }

    #[test]
    fn test_request_without_body_stays_empty() {
        let mut envelope = Envelope::new(RequestRecord::new(Method::GET, "/ping"));
        tag(&mut envelope);
        envelope.payload.body = Some(json!(1));
        tag(&mut envelope);

        assert_eq!(envelope.payload.body, None);
        assert!(envelope.payload.headers.is_empty());
    }
}
