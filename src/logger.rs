//! Exchange logging.
//!
//! Each attempt is projected into a [`LogEntry`] and handed to a [`LogSink`].
//! Logging is best-effort: a sink that panics is reported through `tracing`
//! and the call carries on as if the entry had been written.
//!
//! Every entry is tagged [`Direction::Response`], including entries for
//! failed attempts. Sinks that persist entries already rely on that label,
//! so it is kept even though [`Direction::Request`] exists.

use crate::response::ResponseRecord;
use http::HeaderMap;
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

/// Which side of the exchange an entry describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// An outgoing request.
    Request,
    /// An incoming response or failure.
    Response,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Request => f.write_str("request"),
            Direction::Response => f.write_str("response"),
        }
    }
}

/// The request half of a [`LogEntry`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoggedRequest {
    /// The request body that was sent.
    pub data: Option<Value>,
    /// The request URL as given by the caller.
    pub url: String,
    /// The request headers that were sent.
    pub headers: BTreeMap<String, String>,
}

/// A transport-agnostic record of one attempt.
///
/// Serializes as `{ status, data, request: { data, url, headers }, type }`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LogEntry {
    /// The response status, absent when no response arrived.
    pub status: Option<u16>,
    /// The response body, `{}` when there was none.
    pub data: Value,
    /// What was sent.
    pub request: LoggedRequest,
    /// Always [`Direction::Response`].
    #[serde(rename = "type")]
    pub direction: Direction,
}

impl LogEntry {
    /// Projects a record into a log entry.
    pub fn from_record(record: &ResponseRecord, direction: Direction) -> Self {
        Self {
            status: record.status.map(|s| s.as_u16()),
            data: record
                .data
                .clone()
                .unwrap_or_else(|| Value::Object(Map::new())),
            request: LoggedRequest {
                data: record.request.body.clone(),
                url: record.request.url.clone(),
                headers: header_map_to_strings(&record.request.headers),
            },
            direction,
        }
    }
}

fn header_map_to_strings(headers: &HeaderMap) -> BTreeMap<String, String> {
    let mut out: BTreeMap<String, String> = BTreeMap::new();
    for (name, value) in headers {
        let value = String::from_utf8_lossy(value.as_bytes()).into_owned();
        match out.get_mut(name.as_str()) {
            Some(existing) => {
                existing.push_str(", ");
                existing.push_str(&value);
            }
            None => {
                out.insert(name.as_str().to_string(), value);
            }
        }
    }
    out
}

/// Receives one [`LogEntry`] per attempt.
///
/// Any `Fn(&LogEntry, Direction)` closure is a sink.
///
/// # Examples
///
/// ```
/// use reattempt::logger::{Direction, LogEntry, LogSink};
/// use std::sync::{Arc, Mutex};
///
/// let seen = Arc::new(Mutex::new(Vec::new()));
/// let sink = {
///     let seen = seen.clone();
///     move |entry: &LogEntry, _direction: Direction| {
///         seen.lock().unwrap().push(entry.status);
///     }
/// };
///
/// let sink: Arc<dyn LogSink> = Arc::new(sink);
/// ```
pub trait LogSink: Send + Sync {
    /// Records an entry. Called synchronously on the request path.
    fn log(&self, entry: &LogEntry, direction: Direction);
}

impl<F> LogSink for F
where
    F: Fn(&LogEntry, Direction) + Send + Sync,
{
    fn log(&self, entry: &LogEntry, direction: Direction) {
        self(entry, direction)
    }
}

/// The default sink: one `tracing` event per entry.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl LogSink for TracingSink {
    fn log(&self, entry: &LogEntry, direction: Direction) {
        let rendered = serde_json::to_string(entry).unwrap_or_default();
        tracing::info!(
            direction = %direction,
            status = entry.status,
            url = %entry.request.url,
            entry = %rendered,
            "HTTP exchange"
        );
    }
}

/// Builds entries and forwards them to the configured sink.
#[derive(Clone)]
pub(crate) struct Logger {
    sink: Arc<dyn LogSink>,
}

impl Logger {
    pub(crate) fn new(sink: Arc<dyn LogSink>) -> Self {
        Self { sink }
    }

    /// Logs one attempt. Never panics, even if the sink does.
    pub(crate) fn record(&self, record: &ResponseRecord) {
        let direction = Direction::Response;
        let entry = LogEntry::from_record(record, direction);
        let outcome = catch_unwind(AssertUnwindSafe(|| self.sink.log(&entry, direction)));
        if outcome.is_err() {
            tracing::warn!(
                url = %entry.request.url,
                attempt = record.attempts,
                "Log sink panicked; entry dropped"
            );
        }
    }
}

impl Default for Logger {
    fn default() -> Self {
        Self::new(Arc::new(TracingSink))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::RequestRecord;
    use crate::transport::{TransportError, TransportErrorKind, TransportResponse};
    use http::{Method, StatusCode};
    use serde_json::json;
    use std::sync::Mutex;

    fn sent_request() -> RequestRecord {
        RequestRecord::new(Method::POST, "/orders")
            .with_header("content-type", "application/json")
            .unwrap()
            .with_body(json!({"sku": 7}))
    }

    #[test]
    fn test_entry_from_response() {
        let record = ResponseRecord::from_response(
            TransportResponse::new(StatusCode::CREATED, Some(json!({"id": 1}))),
            sent_request(),
            1,
        );
        let entry = LogEntry::from_record(&record, Direction::Response);

        assert_eq!(entry.status, Some(201));
        assert_eq!(entry.data, json!({"id": 1}));
        assert_eq!(entry.request.url, "/orders");
        assert_eq!(entry.request.data, Some(json!({"sku": 7})));
        assert_eq!(
            entry.request.headers.get("content-type").map(String::as_str),
            Some("application/json")
        );
    }

    #[test]
    fn test_entry_for_failure_without_response() {
        let record = ResponseRecord::from_error(
            TransportError::new(TransportErrorKind::Connect, "refused"),
            sent_request(),
            2,
        );
        let entry = LogEntry::from_record(&record, Direction::Response);

        assert_eq!(entry.status, None);
        assert_eq!(entry.data, json!({}));
    }

    #[test]
    fn test_entry_serialized_shape() {
        let record = ResponseRecord::from_response(
            TransportResponse::new(StatusCode::OK, None),
            RequestRecord::new(Method::GET, "/ping"),
            1,
        );
        let value = serde_json::to_value(LogEntry::from_record(&record, Direction::Response))
            .unwrap();

        assert_eq!(
            value,
            json!({
                "status": 200,
                "data": {},
                "request": { "data": null, "url": "/ping", "headers": {} },
                "type": "response"
            })
        );
    }

    #[test]
    fn test_repeated_headers_are_joined() {
        let mut headers = HeaderMap::new();
        headers.append("accept", "text/plain".parse().unwrap());
        headers.append("accept", "application/json".parse().unwrap());
        let strings = header_map_to_strings(&headers);
        assert_eq!(strings["accept"], "text/plain, application/json");
    }

    #[test]
    fn test_logger_always_tags_response() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = {
            let seen = seen.clone();
            move |entry: &LogEntry, direction: Direction| {
                seen.lock().unwrap().push((entry.direction, direction));
            }
        };
        let logger = Logger::new(Arc::new(sink));
        let record = ResponseRecord::from_error(
            TransportError::new(TransportErrorKind::Timeout, "timed out"),
            sent_request(),
            1,
        );
        logger.record(&record);

        assert_eq!(
            *seen.lock().unwrap(),
            vec![(Direction::Response, Direction::Response)]
        );
    }

    #[test]
    fn test_panicking_sink_is_contained() {
        let logger = Logger::new(Arc::new(|_: &LogEntry, _: Direction| {
            panic!("sink exploded");
        }));
        let record = ResponseRecord::from_response(
            TransportResponse::new(StatusCode::OK, None),
            sent_request(),
            1,
        );
        logger.record(&record);
    }
}
