use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use http::header::{ACCEPT, ACCEPT_ENCODING, CONTENT_TYPE, HeaderValue, USER_AGENT};
use http::{HeaderMap, Method, Response};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::backoff::BackoffPolicy;
use crate::body::{ReadBodyError, build_request, drain, read_all_body_limited};
use crate::classify::{classify, decode_json};
use crate::content_encoding::{DecodeContentEncodingError, decode_content_encoded_body_limited};
use crate::context::CallContext;
use crate::error::{CancelCause, Error};
use crate::retry::{DEFAULT_REQUEST_TIMEOUT, RetryLoop};
use crate::status::StatusClass;
use crate::timer::TimerFactory;
use crate::transport::{HyperTransport, ResponseBody, Transport};
use crate::util::{redact_uri_for_logs, resolve_uri};

pub const DEFAULT_BASE_URL: &str = "http://accountapi:8080";
pub const DEFAULT_MAX_ATTEMPTS: usize = 3;
pub const API_CONTENT_TYPE: &str = "application/vnd.api+json";
const DEFAULT_POOL_IDLE_TIMEOUT: Duration = Duration::from_secs(90);
const DEFAULT_POOL_MAX_IDLE_PER_HOST: usize = 8;
const DEFAULT_CLIENT_NAME: &str = "accountapi";
const DEFAULT_MAX_RESPONSE_BODY_BYTES: usize = 8 * 1024 * 1024;

pub struct ClientBuilder {
    base_url: String,
    max_attempts: usize,
    request_timeout: Duration,
    connect_timeout: Option<Duration>,
    max_response_body_bytes: usize,
    pool_idle_timeout: Duration,
    pool_max_idle_per_host: usize,
    client_name: String,
    backoff_policy: BackoffPolicy,
    timer_factory: Option<Arc<dyn TimerFactory>>,
    transport: Option<Arc<dyn Transport>>,
}

impl ClientBuilder {
    pub(crate) fn new() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_owned(),
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            connect_timeout: None,
            max_response_body_bytes: DEFAULT_MAX_RESPONSE_BODY_BYTES,
            pool_idle_timeout: DEFAULT_POOL_IDLE_TIMEOUT,
            pool_max_idle_per_host: DEFAULT_POOL_MAX_IDLE_PER_HOST,
            client_name: DEFAULT_CLIENT_NAME.to_owned(),
            backoff_policy: BackoffPolicy::standard(),
            timer_factory: None,
            transport: None,
        }
    }

    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Total number of sends allowed while the server keeps answering with
    /// transient statuses. Zero makes every call fail without sending.
    pub fn max_attempts(mut self, max_attempts: usize) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    pub fn request_timeout(mut self, request_timeout: Duration) -> Self {
        self.request_timeout = request_timeout.max(Duration::from_millis(1));
        self
    }

    pub fn connect_timeout(mut self, connect_timeout: Duration) -> Self {
        self.connect_timeout = Some(connect_timeout.max(Duration::from_millis(1)));
        self
    }

    pub fn max_response_body_bytes(mut self, max_response_body_bytes: usize) -> Self {
        self.max_response_body_bytes = max_response_body_bytes.max(1);
        self
    }

    pub fn pool_idle_timeout(mut self, pool_idle_timeout: Duration) -> Self {
        self.pool_idle_timeout = pool_idle_timeout.max(Duration::from_millis(1));
        self
    }

    pub fn pool_max_idle_per_host(mut self, pool_max_idle_per_host: usize) -> Self {
        self.pool_max_idle_per_host = pool_max_idle_per_host.max(1);
        self
    }

    pub fn client_name(mut self, client_name: impl Into<String>) -> Self {
        self.client_name = client_name.into();
        self
    }

    pub fn backoff_policy(mut self, backoff_policy: BackoffPolicy) -> Self {
        self.backoff_policy = backoff_policy;
        self
    }

    /// Replaces the timer behind backoff sleeps, whatever policy is set.
    pub fn timer_factory(mut self, timer_factory: Arc<dyn TimerFactory>) -> Self {
        self.timer_factory = Some(timer_factory);
        self
    }

    /// Sends through `transport` instead of the built-in hyper client.
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn try_build(self) -> Result<Client, Error> {
        let transport = match self.transport {
            Some(transport) => transport,
            None => Arc::new(HyperTransport::new(
                self.connect_timeout,
                self.pool_idle_timeout,
                self.pool_max_idle_per_host,
            )?),
        };
        let backoff_policy = match self.timer_factory {
            Some(timer_factory) => self.backoff_policy.timer_factory(timer_factory),
            None => self.backoff_policy,
        };
        let user_agent =
            HeaderValue::from_str(&self.client_name).map_err(|source| Error::RequestBuild {
                source: source.into(),
            })?;

        Ok(Client {
            base_url: self.base_url,
            headers: default_headers(user_agent),
            max_attempts: self.max_attempts,
            max_response_body_bytes: self.max_response_body_bytes,
            retry: RetryLoop::new(transport, backoff_policy).request_timeout(self.request_timeout),
        })
    }

    pub fn build(self) -> Client {
        self.try_build()
            .unwrap_or_else(|error| panic!("failed to build accountapi client: {error}"))
    }
}

fn default_headers(user_agent: HeaderValue) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static(API_CONTENT_TYPE));
    headers.insert(ACCEPT_ENCODING, HeaderValue::from_static("gzip"));
    headers.insert(CONTENT_TYPE, HeaderValue::from_static(API_CONTENT_TYPE));
    headers.insert(USER_AGENT, user_agent);
    headers
}

/// Executes single logical operations against the API.
///
/// Each call encodes the request body once, runs it through the retry loop,
/// drains the final response body exactly once and then either decodes it
/// or classifies the failure. Calls share nothing mutable, so one client can
/// serve any number of concurrent callers.
#[derive(Clone, Debug)]
pub struct Client {
    base_url: String,
    headers: HeaderMap,
    max_attempts: usize,
    max_response_body_bytes: usize,
    retry: RetryLoop,
}

impl Client {
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn max_attempts(&self) -> usize {
        self.max_attempts
    }

    /// Runs one operation and decodes the success payload into `T`.
    ///
    /// Returns `Ok(None)` for 204 No Content. A `None` request body is sent
    /// as JSON `null`.
    pub async fn execute_json<B, T>(
        &self,
        context: &CallContext,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<Option<T>, Error>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        match self.round_trip(context, method, path, body, true).await? {
            Some(payload) => decode_json(&payload).map(Some),
            None => Ok(None),
        }
    }

    /// Runs one operation whose success payload is not needed.
    pub async fn execute<B>(
        &self,
        context: &CallContext,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<(), Error>
    where
        B: Serialize + ?Sized,
    {
        self.round_trip(context, method, path, body, false)
            .await
            .map(|_| ())
    }

    /// The inter-attempt sleep used by the retry loop, for attempt `attempt`.
    pub async fn sleep(&self, context: &CallContext, attempt: usize) -> Result<(), CancelCause> {
        self.retry.backoff().sleep(context, attempt).await
    }

    async fn round_trip<B>(
        &self,
        context: &CallContext,
        method: Method,
        path: &str,
        body: Option<&B>,
        wants_payload: bool,
    ) -> Result<Option<Bytes>, Error>
    where
        B: Serialize + ?Sized,
    {
        let payload = serde_json::to_vec(&body).map_err(|source| Error::Serialize { source })?;
        let (uri_text, uri) = resolve_uri(&self.base_url, path)?;
        let redacted_uri = redact_uri_for_logs(&uri_text);
        let request = build_request(method.clone(), uri, &self.headers, Bytes::from(payload))?;

        let response = self
            .retry
            .execute(context, &request, self.max_attempts)
            .await?;
        let status = response.status();
        let class = StatusClass::from_status(status);
        debug!(
            method = %method,
            uri = %redacted_uri,
            status = status.as_u16(),
            "request finished"
        );
        if !class.is_success() {
            return Err(self
                .classify(context, &method, &redacted_uri, response)
                .await);
        }

        let (parts, body) = response.into_parts();
        if !(wants_payload && class.carries_payload()) {
            self.retry
                .read_body(context, &method, &redacted_uri, drain(body))
                .await?;
            return Ok(None);
        }
        self.read_payload(context, body, &parts.headers, &method, &redacted_uri)
            .await
            .map(Some)
    }

    /// Drains a non-success `response` and maps it to exactly one error.
    ///
    /// Reading the body honours `context` and the per-attempt timeout; a
    /// body that stalls yields the cancellation or timeout error instead.
    /// `method` and `uri` only label body-read failures.
    pub async fn classify(
        &self,
        context: &CallContext,
        method: &Method,
        uri: &str,
        response: Response<ResponseBody>,
    ) -> Error {
        let (parts, body) = response.into_parts();
        if !StatusClass::from_status(parts.status).has_error_body() {
            return match self.retry.read_body(context, method, uri, drain(body)).await {
                Ok(_) => classify(parts.status, &[]),
                Err(error) => error,
            };
        }
        match self
            .read_payload(context, body, &parts.headers, method, uri)
            .await
        {
            Ok(body) => classify(parts.status, &body),
            Err(error) => error,
        }
    }

    async fn read_payload(
        &self,
        context: &CallContext,
        body: ResponseBody,
        headers: &HeaderMap,
        method: &Method,
        uri: &str,
    ) -> Result<Bytes, Error> {
        let raw = self
            .retry
            .read_body(
                context,
                method,
                uri,
                read_all_body_limited(body, self.max_response_body_bytes),
            )
            .await?
            .map_err(|error| match error {
                ReadBodyError::Read(source) => Error::ReadBody { source },
                ReadBodyError::TooLarge { actual_bytes } => Error::ResponseBodyTooLarge {
                    limit_bytes: self.max_response_body_bytes,
                    actual_bytes,
                    method: method.clone(),
                    uri: uri.to_owned(),
                },
            })?;
        decode_content_encoded_body_limited(raw, headers, self.max_response_body_bytes).map_err(
            |error| match error {
                DecodeContentEncodingError::Decode { encoding, message } => {
                    Error::DecodeContentEncoding {
                        encoding,
                        method: method.clone(),
                        uri: uri.to_owned(),
                        message,
                    }
                }
                DecodeContentEncodingError::TooLarge { actual_bytes } => {
                    Error::ResponseBodyTooLarge {
                        limit_bytes: self.max_response_body_bytes,
                        actual_bytes,
                        method: method.clone(),
                        uri: uri.to_owned(),
                    }
                }
            },
        )
    }
}
