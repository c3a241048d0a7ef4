use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use http::{Method, Request, Response};
use tokio::time::timeout;
use tracing::{Instrument, debug, info_span, warn};

use crate::backoff::BackoffPolicy;
use crate::body::drain;
use crate::context::CallContext;
use crate::error::{CancelPhase, Error};
use crate::status::StatusClass;
use crate::transport::{ResponseBody, Transport};
use crate::util::redact_uri_for_logs;

pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Sends a request until the server answers with a non-transient status.
///
/// Transient responses (429, 500, 503, 504) are drained and followed by a
/// backoff sleep. Transport failures, per-attempt timeouts and cancellation
/// end the loop at once; they are never retried. The per-attempt timeout
/// bounds the send and, separately, each pass over a response body.
#[derive(Clone)]
pub struct RetryLoop {
    transport: Arc<dyn Transport>,
    backoff: BackoffPolicy,
    request_timeout: Duration,
}

impl std::fmt::Debug for RetryLoop {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("RetryLoop")
            .field("backoff", &self.backoff)
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

impl RetryLoop {
    pub fn new(transport: Arc<dyn Transport>, backoff: BackoffPolicy) -> Self {
        Self {
            transport,
            backoff,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    pub fn request_timeout(mut self, request_timeout: Duration) -> Self {
        self.request_timeout = request_timeout.max(Duration::from_millis(1));
        self
    }

    pub fn backoff(&self) -> &BackoffPolicy {
        &self.backoff
    }

    /// Runs at most `max_attempts` sends of `request`.
    ///
    /// The returned response is unconsumed; the caller owns draining it.
    /// `max_attempts == 0` fails with [`Error::TooManyRetries`] without
    /// sending anything.
    pub async fn execute(
        &self,
        context: &CallContext,
        request: &Request<Bytes>,
        max_attempts: usize,
    ) -> Result<Response<ResponseBody>, Error> {
        let method = request.method().clone();
        let uri = redact_uri_for_logs(&request.uri().to_string());

        for attempt in 0..max_attempts {
            let span = info_span!(
                "accountapi.request",
                method = %method,
                uri = %uri,
                attempt = attempt,
                max_attempts = max_attempts
            );
            let outcome = self
                .attempt(context, request, attempt, &method, &uri)
                .instrument(span)
                .await;

            if let Some(response) = outcome? {
                return Ok(response);
            }
        }

        Err(Error::TooManyRetries {
            attempts: max_attempts,
            method,
            uri,
        })
    }

    async fn attempt(
        &self,
        context: &CallContext,
        request: &Request<Bytes>,
        attempt: usize,
        method: &Method,
        uri: &str,
    ) -> Result<Option<Response<ResponseBody>>, Error> {
        let response = self.send_attempt(context, request, method, uri).await?;
        let class = StatusClass::from_status(response.status());
        if !class.is_transient() {
            debug!(status = class.status().as_u16(), "received response");
            return Ok(Some(response));
        }

        let drained_bytes = self
            .read_body(context, method, uri, drain(response.into_body()))
            .await?;
        warn!(
            status = class.status().as_u16(),
            drained_bytes, "retrying request after transient status"
        );
        self.backoff
            .sleep(context, attempt)
            .await
            .map_err(|cause| Error::Cancelled {
                cause,
                phase: CancelPhase::Backoff,
                method: method.clone(),
                uri: uri.to_owned(),
            })?;
        Ok(None)
    }

    /// Runs `read`, a pass over a response body, under the per-attempt
    /// timeout and raced against cancellation of `context`.
    ///
    /// A body that stalls after its headers arrived fails with
    /// [`Error::Timeout`] or [`Error::Cancelled`] with phase
    /// [`CancelPhase::ReadBody`]; the body is dropped unread.
    pub(crate) async fn read_body<F, T>(
        &self,
        context: &CallContext,
        method: &Method,
        uri: &str,
        read: F,
    ) -> Result<T, Error>
    where
        F: Future<Output = T>,
    {
        tokio::select! {
            biased;
            cause = context.done() => Err(Error::Cancelled {
                cause,
                phase: CancelPhase::ReadBody,
                method: method.clone(),
                uri: uri.to_owned(),
            }),
            result = timeout(self.request_timeout, read) => {
                result.map_err(|_| Error::Timeout {
                    timeout_ms: self.request_timeout.as_millis(),
                    method: method.clone(),
                    uri: uri.to_owned(),
                })
            }
        }
    }

    async fn send_attempt(
        &self,
        context: &CallContext,
        request: &Request<Bytes>,
        method: &Method,
        uri: &str,
    ) -> Result<Response<ResponseBody>, Error> {
        if let Some(cause) = context.cause() {
            return Err(Error::Cancelled {
                cause,
                phase: CancelPhase::Send,
                method: method.clone(),
                uri: uri.to_owned(),
            });
        }
        debug!("sending request");
        let send = timeout(self.request_timeout, self.transport.send(replay(request)));
        tokio::select! {
            biased;
            cause = context.done() => Err(Error::Cancelled {
                cause,
                phase: CancelPhase::Send,
                method: method.clone(),
                uri: uri.to_owned(),
            }),
            result = send => match result {
                Ok(Ok(response)) => Ok(response),
                Ok(Err(source)) => Err(Error::Transport {
                    kind: source.kind(),
                    method: method.clone(),
                    uri: uri.to_owned(),
                    source: source.into_source(),
                }),
                Err(_) => Err(Error::Timeout {
                    timeout_ms: self.request_timeout.as_millis(),
                    method: method.clone(),
                    uri: uri.to_owned(),
                }),
            },
        }
    }
}

fn replay(request: &Request<Bytes>) -> Request<Bytes> {
    let mut replayed = Request::new(request.body().clone());
    *replayed.method_mut() = request.method().clone();
    *replayed.uri_mut() = request.uri().clone();
    *replayed.version_mut() = request.version();
    *replayed.headers_mut() = request.headers().clone();
    replayed
}
