use http::StatusCode;
use serde::de::DeserializeOwned;

use crate::error::Error;
use crate::model::{ApiErrorBody, ForbiddenBody};
use crate::status::StatusClass;
use crate::util::truncate_body;

/// Maps a terminal, non-success response to exactly one error.
///
/// `body` is the fully drained and content-decoded response body. Only 400,
/// 403 and 409 look at it; a body that fails to decode surfaces as
/// [`Error::Deserialize`].
pub fn classify(status: StatusCode, body: &[u8]) -> Error {
    match StatusClass::from_status(status) {
        StatusClass::BadRequest => match decode_json::<ApiErrorBody>(body) {
            Ok(detail) => Error::BadRequest(detail),
            Err(error) => error,
        },
        StatusClass::Conflict => match decode_json::<ApiErrorBody>(body) {
            Ok(detail) => Error::Conflict(detail),
            Err(error) => error,
        },
        StatusClass::Forbidden => match decode_json::<ForbiddenBody>(body) {
            Ok(detail) => Error::Forbidden(detail),
            Err(error) => error,
        },
        StatusClass::NotFound => Error::NotFound,
        other => Error::HttpStatus {
            status: other.status().as_u16(),
        },
    }
}

pub(crate) fn decode_json<T>(body: &[u8]) -> Result<T, Error>
where
    T: DeserializeOwned,
{
    serde_json::from_slice(body).map_err(|source| Error::Deserialize {
        source,
        body: truncate_body(body),
    })
}
