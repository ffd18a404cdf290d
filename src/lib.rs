//! # Reattempt - retrying, logging HTTP client wrapper
//!
//! Reattempt wraps an HTTP transport (by default `reqwest`) and adds two
//! things to every call: a fixed-delay retry loop and a log entry per
//! attempt. Retries always replay the headers and body the caller started
//! with, even if interceptors changed them along the way.
//!
//! ## Quick Start
//!
//! ```no_run
//! use reattempt::{Client, ResponseRecord};
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Serialize)]
//! struct CreateUser {
//!     name: String,
//! }
//!
//! #[derive(Deserialize)]
//! struct User {
//!     id: u64,
//!     name: String,
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), reattempt::Error> {
//!     let client = Client::builder()
//!         .base_url("https://api.example.com")?
//!         .retry_time_millis(200)
//!         .retry_predicate(|r: &ResponseRecord| {
//!             r.status.map_or(true, |s| s.is_server_error())
//!         })
//!         .build()?;
//!
//!     let user: User = client.get("/users/123").await?.json()?;
//!     println!("User: {}", user.name);
//!
//!     let created = client
//!         .post("/users", &CreateUser { name: "Alice".to_string() })
//!         .await?;
//!     println!("Created after {} attempt(s)", created.attempts);
//!
//!     Ok(())
//! }
//! ```
//!
//! ## How a call proceeds
//!
//! 1. The request is tagged: the first attempt snapshots headers and body,
//!    later attempts restore that snapshot and bump the attempt counter.
//! 2. Registered [`Interceptor`]s see the request and may adjust it.
//! 3. The [`Transport`] sends it. Failures are normalized into a
//!    [`ResponseRecord`] just like responses.
//! 4. The record is logged to the [`LogSink`](logger::LogSink).
//! 5. The [`RetryPredicate`] decides. Not retry-worthy: the result goes back
//!    to the caller. Retry-worthy: wait the configured delay and go to 1,
//!    unless the attempt bound (3 by default) is reached, in which case the
//!    call fails with [`Error::RetryExhausted`].
//!
//! ## Defaults
//!
//! - Delay between attempts: 1000 ms (allowed range `0..=60000`)
//! - Attempts per call: 3
//! - Predicate: retry unless the status is exactly `200 OK`
//! - Log sink: one `tracing` event per attempt

mod client;
pub mod config;
mod error;
pub mod interceptor;
pub mod logger;
mod request;
mod response;
pub mod retry;
pub mod tagger;
pub mod transport;

pub use client::{create, Client, ClientBuilder};
pub use config::{ClientConfig, RetryOptions};
pub use error::{Error, Result};
pub use interceptor::Interceptor;
pub use request::RequestRecord;
pub use response::ResponseRecord;
pub use retry::{RetryPolicy, RetryPredicate};
pub use transport::{Transport, TransportError, TransportResponse};
