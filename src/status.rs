use http::StatusCode;

/// Closed classification of the response statuses the engine reacts to.
///
/// Every status the retry loop or the classifier treats specially has its
/// own variant; anything else lands in `Unclassified` and becomes a generic
/// http status error.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StatusClass {
    Ok,
    Created,
    NoContent,
    TooManyRequests,
    InternalServerError,
    ServiceUnavailable,
    GatewayTimeout,
    BadRequest,
    Forbidden,
    NotFound,
    Conflict,
    Unclassified(StatusCode),
}

impl StatusClass {
    pub fn from_status(status: StatusCode) -> Self {
        match status {
            StatusCode::OK => Self::Ok,
            StatusCode::CREATED => Self::Created,
            StatusCode::NO_CONTENT => Self::NoContent,
            StatusCode::TOO_MANY_REQUESTS => Self::TooManyRequests,
            StatusCode::INTERNAL_SERVER_ERROR => Self::InternalServerError,
            StatusCode::SERVICE_UNAVAILABLE => Self::ServiceUnavailable,
            StatusCode::GATEWAY_TIMEOUT => Self::GatewayTimeout,
            StatusCode::BAD_REQUEST => Self::BadRequest,
            StatusCode::FORBIDDEN => Self::Forbidden,
            StatusCode::NOT_FOUND => Self::NotFound,
            StatusCode::CONFLICT => Self::Conflict,
            other => Self::Unclassified(other),
        }
    }

    pub const fn status(self) -> StatusCode {
        match self {
            Self::Ok => StatusCode::OK,
            Self::Created => StatusCode::CREATED,
            Self::NoContent => StatusCode::NO_CONTENT,
            Self::TooManyRequests => StatusCode::TOO_MANY_REQUESTS,
            Self::InternalServerError => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ServiceUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            Self::GatewayTimeout => StatusCode::GATEWAY_TIMEOUT,
            Self::BadRequest => StatusCode::BAD_REQUEST,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Conflict => StatusCode::CONFLICT,
            Self::Unclassified(status) => status,
        }
    }

    pub const fn is_success(self) -> bool {
        matches!(self, Self::Ok | Self::Created | Self::NoContent)
    }

    /// Statuses after which the server expects the client to try again.
    pub const fn is_transient(self) -> bool {
        matches!(
            self,
            Self::TooManyRequests
                | Self::InternalServerError
                | Self::ServiceUnavailable
                | Self::GatewayTimeout
        )
    }

    /// Terminal statuses whose body carries structured error detail.
    pub const fn has_error_body(self) -> bool {
        matches!(self, Self::BadRequest | Self::Forbidden | Self::Conflict)
    }

    /// Success statuses whose body may be decoded into a destination.
    pub const fn carries_payload(self) -> bool {
        matches!(self, Self::Ok | Self::Created)
    }
}

impl From<StatusCode> for StatusClass {
    fn from(status: StatusCode) -> Self {
        Self::from_status(status)
    }
}
