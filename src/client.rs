//! HTTP client with replaying retries and exchange logging.
//!
//! The [`Client`] type is the main entry point for making HTTP requests.
//! Use [`ClientBuilder`] or [`create`] to configure and create clients.

use crate::{
    config::{ClientConfig, RetryOptions, DEFAULT_MAX_ATTEMPTS, DEFAULT_RETRY_DELAY_MS},
    interceptor::Interceptor,
    logger::{LogSink, Logger},
    request::RequestRecord,
    response::ResponseRecord,
    retry::{Decision, RetryPolicy, RetryPredicate, RetryUnlessOk},
    tagger::{self, Envelope},
    transport::{merge_default_headers, ReqwestTransport, Transport},
    Error, Result,
};
use http::{HeaderName, HeaderValue, Method};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// An HTTP client that retries with a fixed delay and logs every attempt.
///
/// The client is cheap to clone and safe to share. Each call keeps its own
/// attempt counter and original payload, so concurrent calls never affect
/// each other. Attempts of a single call are strictly sequential.
///
/// # Examples
///
/// ```no_run
/// use reattempt::Client;
/// use serde::Serialize;
///
/// #[derive(Serialize)]
/// struct CreateUser {
///     name: String,
/// }
///
/// # async fn example() -> Result<(), reattempt::Error> {
/// let client = Client::builder()
///     .base_url("https://api.example.com")?
///     .retry_time_millis(500)
///     .build()?;
///
/// let user = client.get("/users/123").await?;
/// println!("Status: {:?}", user.status);
///
/// let created = client
///     .post("/users", &CreateUser { name: "Alice".to_string() })
///     .await?;
/// println!("Created after {} attempt(s)", created.attempts);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Client {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    transport: Arc<dyn Transport>,
    policy: RetryPolicy,
    logger: Logger,
    interceptors: Vec<Arc<dyn Interceptor>>,
}

/// Creates a client in one call.
///
/// Missing arguments fall back to a 1000 ms delay, the `tracing` log sink
/// and "retry unless status is 200".
///
/// # Errors
///
/// Returns [`Error::ConfigurationError`] if `retry_time_ms` is outside
/// `0..=60000` or the transport configuration is invalid.
///
/// # Examples
///
/// ```
/// use reattempt::{create, ClientConfig, Error};
///
/// let result = create(ClientConfig::default(), Some(-50), None, None);
/// assert!(matches!(result, Err(Error::ConfigurationError(_))));
/// ```
pub fn create(
    config: ClientConfig,
    retry_time_ms: Option<i64>,
    log_sink: Option<Arc<dyn LogSink>>,
    retry_predicate: Option<Arc<dyn RetryPredicate>>,
) -> Result<Client> {
    let mut builder = ClientBuilder::new().config(config);
    if let Some(ms) = retry_time_ms {
        builder = builder.retry_time_millis(ms);
    }
    builder.log_sink = log_sink;
    builder.retry_predicate = retry_predicate;
    builder.build()
}

impl Client {
    /// Creates a new `ClientBuilder` for configuring a client.
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    /// The retry settings this client was built with.
    pub fn retry_options(&self) -> &RetryOptions {
        self.inner.policy.options()
    }

    /// Sends a request, retrying it as the policy dictates.
    ///
    /// Every attempt is tagged, passed through the interceptors, sent, logged
    /// and then judged by the retry predicate. Retries replay the headers and
    /// body the request had when this method was called, including any
    /// default headers the transport adds, so log entries show exactly what
    /// went on the wire.
    ///
    /// # Errors
    ///
    /// * [`Error::RetryExhausted`] if the final allowed attempt was still retry-worthy.
    /// * [`Error::Transport`] if the last attempt failed and was not retry-worthy.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use reattempt::{Client, RequestRecord};
    /// use http::Method;
    /// use serde_json::json;
    ///
    /// # async fn example() -> Result<(), reattempt::Error> {
    /// let client = Client::builder()
    ///     .base_url("https://api.example.com")?
    ///     .build()?;
    ///
    /// let request = RequestRecord::new(Method::POST, "/search")
    ///     .with_header("x-trace", "1")?
    ///     .with_body(json!({ "query": "rust" }));
    ///
    /// let response = client.request(request).await?;
    /// println!("{:?}", response.data);
    /// # Ok(())
    /// # }
    /// ```
    pub async fn request(&self, mut request: RequestRecord) -> Result<ResponseRecord> {
        if let Some(defaults) = self.inner.transport.default_headers() {
            merge_default_headers(&mut request.headers, defaults);
        }
        let mut envelope = Envelope::new(request);

        loop {
            tagger::tag(&mut envelope);
            for interceptor in &self.inner.interceptors {
                interceptor.on_request(&mut envelope.payload);
            }

            tracing::debug!(
                method = %envelope.payload.method,
                url = %envelope.payload.url,
                attempt = envelope.attempt,
                "Executing HTTP request"
            );

            let record = match self.inner.transport.send(&envelope.payload).await {
                Ok(response) => ResponseRecord::from_response(
                    response,
                    envelope.payload.clone(),
                    envelope.attempt,
                ),
                Err(error) => {
                    tracing::warn!(
                        error = %error,
                        attempt = envelope.attempt,
                        method = %envelope.payload.method,
                        url = %envelope.payload.url,
                        "Request failed"
                    );
                    ResponseRecord::from_error(error, envelope.payload.clone(), envelope.attempt)
                }
            };

            self.inner.logger.record(&record);
            for interceptor in &self.inner.interceptors {
                interceptor.on_response(&record);
            }

            match self.inner.policy.decide(&record) {
                Decision::Resolve => return record.into_result(),
                Decision::RetryAfter(delay) => {
                    tracing::info!(
                        delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                        attempt = envelope.attempt,
                        "Retrying request after delay"
                    );
                    tokio::time::sleep(delay).await;
                }
                Decision::Reject => {
                    tracing::warn!(
                        attempts = record.attempts,
                        status = record.status.map(|s| s.as_u16()),
                        url = %record.request.url,
                        "Giving up on request"
                    );
                    return Err(Error::RetryExhausted {
                        attempts: record.attempts,
                        last: Box::new(record),
                    });
                }
            }
        }
    }

    /// Makes a GET request.
    pub async fn get(&self, url: impl Into<String>) -> Result<ResponseRecord> {
        self.request(RequestRecord::new(Method::GET, url)).await
    }

    /// Makes a DELETE request.
    pub async fn delete(&self, url: impl Into<String>) -> Result<ResponseRecord> {
        self.request(RequestRecord::new(Method::DELETE, url)).await
    }

    /// Makes a HEAD request.
    pub async fn head(&self, url: impl Into<String>) -> Result<ResponseRecord> {
        self.request(RequestRecord::new(Method::HEAD, url)).await
    }

    /// Makes a POST request with a JSON body.
    pub async fn post<B>(&self, url: impl Into<String>, body: &B) -> Result<ResponseRecord>
    where
        B: Serialize + ?Sized,
    {
        let request = RequestRecord::new(Method::POST, url).with_json(body)?;
        self.request(request).await
    }

    /// Makes a PUT request with a JSON body.
    pub async fn put<B>(&self, url: impl Into<String>, body: &B) -> Result<ResponseRecord>
    where
        B: Serialize + ?Sized,
    {
        let request = RequestRecord::new(Method::PUT, url).with_json(body)?;
        self.request(request).await
    }

    /// Makes a PATCH request with a JSON body.
    pub async fn patch<B>(&self, url: impl Into<String>, body: &B) -> Result<ResponseRecord>
    where
        B: Serialize + ?Sized,
    {
        let request = RequestRecord::new(Method::PATCH, url).with_json(body)?;
        self.request(request).await
    }
}

/// Builder for configuring and creating a [`Client`].
///
/// All validation happens in [`build`](ClientBuilder::build); a builder with
/// an invalid setting never yields a client.
///
/// # Examples
///
/// ```no_run
/// use reattempt::{ClientBuilder, ResponseRecord};
/// use std::time::Duration;
///
/// # async fn example() -> Result<(), reattempt::Error> {
/// let client = ClientBuilder::new()
///     .base_url("https://api.example.com")?
///     .timeout(Duration::from_secs(30))
///     .retry_time_millis(250)
///     .retry_predicate(|r: &ResponseRecord| r.status.map(|s| s.as_u16()) == Some(503))
///     .default_header("User-Agent", "my-app/1.0")?
///     .build()?;
/// # Ok(())
/// # }
/// ```
pub struct ClientBuilder {
    config: ClientConfig,
    retry_time_ms: i64,
    max_attempts: u32,
    log_sink: Option<Arc<dyn LogSink>>,
    retry_predicate: Option<Arc<dyn RetryPredicate>>,
    interceptors: Vec<Arc<dyn Interceptor>>,
    transport: Option<Arc<dyn Transport>>,
}

impl ClientBuilder {
    /// Creates a new `ClientBuilder` with default settings.
    pub fn new() -> Self {
        Self {
            config: ClientConfig::default(),
            retry_time_ms: DEFAULT_RETRY_DELAY_MS,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            log_sink: None,
            retry_predicate: None,
            interceptors: Vec::new(),
            transport: None,
        }
    }

    /// Replaces the transport configuration wholesale.
    pub fn config(mut self, config: ClientConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the base URL relative request URLs are resolved against.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid.
    pub fn base_url(mut self, url: impl AsRef<str>) -> Result<Self> {
        let url = Url::parse(url.as_ref())?;
        self.config.base_url = Some(url.to_string());
        Ok(self)
    }

    /// Adds a default header that will be included in all requests.
    ///
    /// # Errors
    ///
    /// Returns an error if the header name or value is invalid.
    pub fn default_header(mut self, name: impl AsRef<str>, value: impl AsRef<str>) -> Result<Self> {
        let name = HeaderName::try_from(name.as_ref())
            .map_err(|e| Error::ConfigurationError(format!("Invalid header name: {}", e)))?;
        let value = HeaderValue::try_from(value.as_ref())
            .map_err(|e| Error::ConfigurationError(format!("Invalid header value: {}", e)))?;
        let value = value
            .to_str()
            .map_err(|e| Error::ConfigurationError(format!("Invalid header value: {}", e)))?
            .to_string();
        self.config.headers.insert(name.as_str().to_string(), value);
        Ok(self)
    }

    /// Sets the per-attempt timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout_ms = Some(u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX));
        self
    }

    /// Sets the delay between attempts in milliseconds.
    ///
    /// Must be within `0..=60000`; checked by [`build`](ClientBuilder::build).
    pub fn retry_time_millis(mut self, millis: i64) -> Self {
        self.retry_time_ms = millis;
        self
    }

    /// Sets the total number of attempts per call, including the first.
    ///
    /// Defaults to 3. Must be at least 1; checked by [`build`](ClientBuilder::build).
    pub fn max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// Sets where log entries go. Defaults to [`TracingSink`](crate::logger::TracingSink).
    pub fn log_sink<S>(mut self, sink: S) -> Self
    where
        S: LogSink + 'static,
    {
        self.log_sink = Some(Arc::new(sink));
        self
    }

    /// Sets the retry predicate. Defaults to [`RetryUnlessOk`].
    pub fn retry_predicate<P>(mut self, predicate: P) -> Self
    where
        P: RetryPredicate + 'static,
    {
        self.retry_predicate = Some(Arc::new(predicate));
        self
    }

    /// Registers an interceptor. Interceptors run in registration order.
    pub fn interceptor<I>(mut self, interceptor: I) -> Self
    where
        I: Interceptor + 'static,
    {
        self.interceptors.push(Arc::new(interceptor));
        self
    }

    /// Uses a custom transport instead of building a [`ReqwestTransport`].
    ///
    /// The [`ClientConfig`] is ignored when a transport is supplied.
    pub fn transport<T>(mut self, transport: T) -> Self
    where
        T: Transport + 'static,
    {
        self.transport = Some(Arc::new(transport));
        self
    }

    /// Builds the configured `Client`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigurationError`] for an out-of-range retry delay,
    /// a zero attempt bound, or an invalid transport configuration.
    pub fn build(self) -> Result<Client> {
        let options =
            RetryOptions::from_millis(self.retry_time_ms)?.with_max_attempts(self.max_attempts)?;

        let transport: Arc<dyn Transport> = match self.transport {
            Some(transport) => transport,
            None => Arc::new(ReqwestTransport::from_config(&self.config)?),
        };

        let predicate = self
            .retry_predicate
            .unwrap_or_else(|| Arc::new(RetryUnlessOk));
        let logger = self.log_sink.map(Logger::new).unwrap_or_default();

        Ok(Client {
            inner: Arc::new(ClientInner {
                transport,
                policy: RetryPolicy::new(predicate, options),
                logger,
                interceptors: self.interceptors,
            }),
        })
    }
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}
