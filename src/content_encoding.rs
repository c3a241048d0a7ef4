use std::io::{self, Read};

use bytes::Bytes;
use flate2::read::{GzDecoder, ZlibDecoder};
use http::HeaderMap;
use http::header::CONTENT_ENCODING;

#[derive(Debug)]
pub(crate) enum DecodeContentEncodingError {
    Decode { encoding: String, message: String },
    TooLarge { actual_bytes: usize },
}

/// Inflates `reader` into memory, stopping one byte past `max_bytes`.
///
/// On overflow `actual_bytes` is a lower bound, not the full decoded size.
fn inflate_limited<R: Read>(
    reader: R,
    encoding: &str,
    max_bytes: usize,
) -> Result<Vec<u8>, DecodeContentEncodingError> {
    let cap = u64::try_from(max_bytes)
        .unwrap_or(u64::MAX)
        .saturating_add(1);
    let mut decoded = Vec::new();
    reader
        .take(cap)
        .read_to_end(&mut decoded)
        .map_err(|error: io::Error| DecodeContentEncodingError::Decode {
            encoding: encoding.to_owned(),
            message: error.to_string(),
        })?;
    if decoded.len() > max_bytes {
        return Err(DecodeContentEncodingError::TooLarge {
            actual_bytes: decoded.len(),
        });
    }
    Ok(decoded)
}

/// Undoes the `Content-Encoding` layers of a fully read body.
///
/// The client only advertises gzip, but servers that ignore the header may
/// still answer with deflate; both are handled, anything else is rejected.
pub(crate) fn decode_content_encoded_body_limited(
    mut body: Bytes,
    headers: &HeaderMap,
    max_bytes: usize,
) -> Result<Bytes, DecodeContentEncodingError> {
    if body.is_empty() {
        return Ok(body);
    }
    let max_bytes = max_bytes.max(1);
    let Some(content_encoding) = headers.get(CONTENT_ENCODING) else {
        return Ok(body);
    };
    let content_encoding =
        content_encoding
            .to_str()
            .map_err(|error| DecodeContentEncodingError::Decode {
                encoding: "content-encoding".to_owned(),
                message: error.to_string(),
            })?;
    let mut encodings = content_encoding
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .collect::<Vec<_>>();

    while let Some(encoding) = encodings.pop() {
        let decoded = match encoding.to_ascii_lowercase().as_str() {
            "identity" => continue,
            "gzip" | "x-gzip" => {
                inflate_limited(GzDecoder::new(body.as_ref()), encoding, max_bytes)?
            }
            "deflate" => inflate_limited(ZlibDecoder::new(body.as_ref()), encoding, max_bytes)?,
            other => {
                return Err(DecodeContentEncodingError::Decode {
                    encoding: other.to_owned(),
                    message: "unsupported content-encoding".to_owned(),
                });
            }
        };
        body = Bytes::from(decoded);
    }

    Ok(body)
}
