use bytes::{Bytes, BytesMut};
use http::{HeaderMap, Method, Request, Uri};
use http_body_util::BodyExt;

use crate::error::{BoxError, Error};
use crate::transport::ResponseBody;

pub(crate) fn build_request(
    method: Method,
    uri: Uri,
    headers: &HeaderMap,
    body: Bytes,
) -> Result<Request<Bytes>, Error> {
    let mut request_builder = Request::builder().method(method).uri(uri);
    for (name, value) in headers {
        request_builder = request_builder.header(name, value);
    }
    request_builder
        .body(body)
        .map_err(|source| Error::RequestBuild { source })
}

/// Reads `body` to the end, discarding data and read errors, then drops it.
pub(crate) async fn drain(mut body: ResponseBody) -> usize {
    let mut drained = 0_usize;
    while let Some(frame) = body.frame().await {
        match frame {
            Ok(frame) => {
                if let Some(data) = frame.data_ref() {
                    drained = drained.saturating_add(data.len());
                }
            }
            Err(_) => break,
        }
    }
    drained
}

pub(crate) enum ReadBodyError {
    Read(BoxError),
    TooLarge { actual_bytes: usize },
}

/// Collects `body` up to `max_bytes`.
///
/// An oversized body is still read to the end before `TooLarge` is
/// returned, so the connection stays reusable.
pub(crate) async fn read_all_body_limited(
    mut body: ResponseBody,
    max_bytes: usize,
) -> Result<Bytes, ReadBodyError> {
    let mut collected = BytesMut::new();
    let mut total_len = 0_usize;

    while let Some(frame) = body.frame().await {
        let frame = frame.map_err(ReadBodyError::Read)?;
        if let Some(data) = frame.data_ref() {
            total_len = total_len.saturating_add(data.len());
            if total_len <= max_bytes {
                collected.extend_from_slice(data);
            }
        }
    }

    if total_len > max_bytes {
        return Err(ReadBodyError::TooLarge {
            actual_bytes: total_len,
        });
    }
    Ok(collected.freeze())
}
