use http::{Method, StatusCode};
use thiserror::Error;

use crate::model::{ApiErrorBody, ForbiddenBody};

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TransportErrorKind {
    Dns,
    Connect,
    Tls,
    Read,
    Other,
}

impl std::fmt::Display for TransportErrorKind {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            Self::Dns => "dns",
            Self::Connect => "connect",
            Self::Tls => "tls",
            Self::Read => "read",
            Self::Other => "other",
        };
        formatter.write_str(text)
    }
}

/// Why a call stopped waiting.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CancelCause {
    Cancelled,
    DeadlineExceeded,
}

impl std::fmt::Display for CancelCause {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            Self::Cancelled => "context cancelled",
            Self::DeadlineExceeded => "context deadline exceeded",
        };
        formatter.write_str(text)
    }
}

impl std::error::Error for CancelCause {}

/// Suspension point at which cancellation was observed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CancelPhase {
    Send,
    ReadBody,
    Backoff,
}

impl std::fmt::Display for CancelPhase {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            Self::Send => "send",
            Self::ReadBody => "body read",
            Self::Backoff => "backoff",
        };
        formatter.write_str(text)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ErrorCode {
    InvalidUri,
    SerializeJson,
    RequestBuild,
    TlsInit,
    Transport,
    Timeout,
    Cancelled,
    TooManyRetries,
    ReadBody,
    ResponseBodyTooLarge,
    DecodeContentEncoding,
    BadRequest,
    Forbidden,
    NotFound,
    Conflict,
    HttpStatus,
    Deserialize,
}

impl ErrorCode {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::InvalidUri => "invalid_uri",
            Self::SerializeJson => "serialize_json",
            Self::RequestBuild => "request_build",
            Self::TlsInit => "tls_init",
            Self::Transport => "transport",
            Self::Timeout => "timeout",
            Self::Cancelled => "cancelled",
            Self::TooManyRetries => "too_many_retries",
            Self::ReadBody => "read_body",
            Self::ResponseBodyTooLarge => "response_body_too_large",
            Self::DecodeContentEncoding => "decode_content_encoding",
            Self::BadRequest => "bad_request",
            Self::Forbidden => "forbidden",
            Self::NotFound => "not_found",
            Self::Conflict => "conflict",
            Self::HttpStatus => "http_status",
            Self::Deserialize => "deserialize",
        }
    }
}

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    #[error("invalid request uri: {uri}")]
    InvalidUri { uri: String },
    #[error("failed to serialize request json: {source}")]
    Serialize {
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to build http request: {source}")]
    RequestBuild {
        #[source]
        source: http::Error,
    },
    #[error("failed to initialize tls: {message}")]
    TlsInit { message: String },
    #[error("http transport error ({kind}) for {method} {uri}: {source}")]
    Transport {
        kind: TransportErrorKind,
        method: Method,
        uri: String,
        #[source]
        source: BoxError,
    },
    #[error("http request timed out after {timeout_ms}ms for {method} {uri}")]
    Timeout {
        timeout_ms: u128,
        method: Method,
        uri: String,
    },
    #[error("{cause} during {phase} for {method} {uri}")]
    Cancelled {
        #[source]
        cause: CancelCause,
        phase: CancelPhase,
        method: Method,
        uri: String,
    },
    #[error("too many retries ({attempts} attempts) for {method} {uri}")]
    TooManyRetries {
        attempts: usize,
        method: Method,
        uri: String,
    },
    #[error("failed to read response body: {source}")]
    ReadBody {
        #[source]
        source: BoxError,
    },
    #[error(
        "response body too large ({actual_bytes} bytes > {limit_bytes} bytes) for {method} {uri}"
    )]
    ResponseBodyTooLarge {
        limit_bytes: usize,
        actual_bytes: usize,
        method: Method,
        uri: String,
    },
    #[error("failed to decode response content-encoding {encoding} for {method} {uri}: {message}")]
    DecodeContentEncoding {
        encoding: String,
        method: Method,
        uri: String,
        message: String,
    },
    #[error("{0}")]
    BadRequest(ApiErrorBody),
    #[error("{0}")]
    Forbidden(ForbiddenBody),
    #[error("not found")]
    NotFound,
    #[error("{0}")]
    Conflict(ApiErrorBody),
    #[error("{}", status_line(.status))]
    HttpStatus { status: u16 },
    #[error("failed to decode response json: {source}; body={body}")]
    Deserialize {
        #[source]
        source: serde_json::Error,
        body: String,
    },
}

fn status_line(status: &u16) -> String {
    let reason = StatusCode::from_u16(*status)
        .ok()
        .and_then(|status| status.canonical_reason())
        .unwrap_or("");
    format!("{status}: {reason}")
}

impl Error {
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::InvalidUri { .. } => ErrorCode::InvalidUri,
            Self::Serialize { .. } => ErrorCode::SerializeJson,
            Self::RequestBuild { .. } => ErrorCode::RequestBuild,
            Self::TlsInit { .. } => ErrorCode::TlsInit,
            Self::Transport { .. } => ErrorCode::Transport,
            Self::Timeout { .. } => ErrorCode::Timeout,
            Self::Cancelled { .. } => ErrorCode::Cancelled,
            Self::TooManyRetries { .. } => ErrorCode::TooManyRetries,
            Self::ReadBody { .. } => ErrorCode::ReadBody,
            Self::ResponseBodyTooLarge { .. } => ErrorCode::ResponseBodyTooLarge,
            Self::DecodeContentEncoding { .. } => ErrorCode::DecodeContentEncoding,
            Self::BadRequest(_) => ErrorCode::BadRequest,
            Self::Forbidden(_) => ErrorCode::Forbidden,
            Self::NotFound => ErrorCode::NotFound,
            Self::Conflict(_) => ErrorCode::Conflict,
            Self::HttpStatus { .. } => ErrorCode::HttpStatus,
            Self::Deserialize { .. } => ErrorCode::Deserialize,
        }
    }

    /// Reports whether `self` is the kind of error described by `pattern`.
    ///
    /// Kinds must agree. For the variants carrying a decoded error body,
    /// every non-empty field of the pattern must also equal the matching
    /// field of `self`; empty pattern fields are "don't care". `HttpStatus`
    /// additionally compares the status code.
    ///
    /// ```
    /// use accountapi::{ApiErrorBody, Error};
    ///
    /// let error = Error::BadRequest(ApiErrorBody::new("id is required", "abc-123"));
    /// assert!(error.matches(&Error::BadRequest(ApiErrorBody::default())));
    /// assert!(error.matches(&Error::BadRequest(ApiErrorBody::new("", "abc-123"))));
    /// assert!(!error.matches(&Error::BadRequest(ApiErrorBody::new("", "other"))));
    /// assert!(!error.matches(&Error::NotFound));
    /// ```
    pub fn matches(&self, pattern: &Error) -> bool {
        match (self, pattern) {
            (Self::BadRequest(body), Self::BadRequest(pattern))
            | (Self::Conflict(body), Self::Conflict(pattern)) => body.matches(pattern),
            (Self::Forbidden(body), Self::Forbidden(pattern)) => body.matches(pattern),
            (Self::HttpStatus { status }, Self::HttpStatus { status: expected }) => {
                status == expected
            }
            _ => self.code() == pattern.code(),
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }

    /// HTTP status that produced this error, for the terminal classifications.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::BadRequest(_) => Some(StatusCode::BAD_REQUEST),
            Self::Forbidden(_) => Some(StatusCode::FORBIDDEN),
            Self::NotFound => Some(StatusCode::NOT_FOUND),
            Self::Conflict(_) => Some(StatusCode::CONFLICT),
            Self::HttpStatus { status } => StatusCode::from_u16(*status).ok(),
            _ => None,
        }
    }
}
