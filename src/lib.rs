//! `accountapi` is a typed client for the organisation accounts HTTP API.
//!
//! Every call runs through one request-execution engine: the request body is
//! encoded once, transient statuses (429, 500, 503, 504) are retried with
//! exponential backoff and jitter, every response body is drained before it
//! is dropped, and terminal failures are classified into a single [`Error`].
//! Each call takes a [`CallContext`] that can cancel it at any suspension
//! point, including mid-backoff.
//!
//! # Quick Start
//!
//! ```no_run
//! use std::time::Duration;
//! use accountapi::prelude::{AccountAttributes, AccountData, CallContext, Client};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = Client::builder()
//!         .base_url("http://localhost:8080")
//!         .max_attempts(5)
//!         .request_timeout(Duration::from_secs(3))
//!         .try_build()?;
//!     let context = CallContext::new().with_timeout(Duration::from_secs(20));
//!
//!     let created = client
//!         .create_account(
//!             &context,
//!             AccountData {
//!                 id: "ad27e265-9605-4b4b-a0e5-3003ea9cc4dc".to_owned(),
//!                 organisation_id: "eb0bd6f5-c3f5-44b2-b677-acd23cdde73c".to_owned(),
//!                 kind: "accounts".to_owned(),
//!                 attributes: Some(AccountAttributes {
//!                     country: Some("GB".to_owned()),
//!                     name: vec!["Samantha Holder".to_owned()],
//!                     ..AccountAttributes::default()
//!                 }),
//!                 ..AccountData::default()
//!             },
//!         )
//!         .await?;
//!
//!     client
//!         .delete_account(&context, &created.id, created.version.unwrap_or_default())
//!         .await?;
//!     Ok(())
//! }
//! ```
//!
//! # Testing
//!
//! Plug a custom [`Transport`] and [`ImmediateTimerFactory`] into the
//! builder to drive the engine without a network or real sleeps.

mod accounts;
mod backoff;
mod body;
mod classify;
mod client;
mod content_encoding;
mod context;
mod error;
mod model;
mod retry;
mod status;
mod timer;
mod transport;
mod util;

pub use crate::backoff::{
    BackoffPolicy, DEFAULT_BASE_DELAY, DEFAULT_GROWTH_FACTOR, DEFAULT_JITTER, DEFAULT_MIN_DELAY,
};
pub use crate::classify::classify;
pub use crate::client::{
    API_CONTENT_TYPE, Client, ClientBuilder, DEFAULT_BASE_URL, DEFAULT_MAX_ATTEMPTS,
};
pub use crate::context::CallContext;
pub use crate::error::{BoxError, CancelCause, CancelPhase, Error, ErrorCode, TransportErrorKind};
pub use crate::model::{AccountAttributes, AccountData, ApiErrorBody, Envelope, ForbiddenBody};
pub use crate::retry::{DEFAULT_REQUEST_TIMEOUT, RetryLoop};
pub use crate::status::StatusClass;
pub use crate::timer::{ImmediateTimerFactory, Timer, TimerFactory, TokioTimerFactory};
pub use crate::transport::{HyperTransport, ResponseBody, Transport, TransportError};
pub use tokio_util::sync::CancellationToken;

pub type Result<T> = std::result::Result<T, Error>;

pub mod prelude {
    pub use crate::{
        AccountAttributes, AccountData, ApiErrorBody, BackoffPolicy, CallContext, CancelCause,
        CancellationToken, Client, ClientBuilder, Error, ErrorCode, ForbiddenBody, Result,
    };
}
