//! Wire-level helpers shared by the converters: media types, declared body
//! length and bounded body reads.
use std::io::Read;

use http::header::{CONTENT_LENGTH, CONTENT_TYPE};
use http::HeaderMap;

use crate::error::CodecError;

/// Media type of the structured JSON format.
pub const STRUCTURED_JSON: &str = "application/cloudevents+json";

/// Bare media type declared by `headers`, parameters stripped.
///
/// A missing header is a parse failure: there is nothing to dispatch on.
pub fn media_type(headers: &HeaderMap) -> Result<String, CodecError> {
    let raw = headers
        .get(CONTENT_TYPE)
        .ok_or_else(|| CodecError::ContentTypeParse("no media type".into()))?;
    let raw = raw
        .to_str()
        .map_err(|err| CodecError::ContentTypeParse(err.to_string()))?;
    essence(raw)
}

/// Lower-cased `type/subtype` of a content type string.
///
/// ```rust
/// use binding::essence;
///
/// assert_eq!(essence("Text/Plain; charset=utf-8").unwrap(), "text/plain");
/// assert!(essence("not a media type").is_err());
/// ```
pub fn essence(content_type: &str) -> Result<String, CodecError> {
    content_type
        .trim()
        .parse::<mime::Mime>()
        .map(|parsed| parsed.essence_str().to_ascii_lowercase())
        .map_err(|err| CodecError::ContentTypeParse(err.to_string()))
}

/// `Content-Length` declared by the request, if present and numeric.
pub(crate) fn declared_length(headers: &HeaderMap) -> Option<u64> {
    headers
        .get(CONTENT_LENGTH)?
        .to_str()
        .ok()?
        .trim()
        .parse()
        .ok()
}

/// Reads `body` to completion, failing once more than `limit` bytes arrive.
pub(crate) fn read_body(body: &mut dyn Read, limit: Option<usize>) -> Result<Vec<u8>, CodecError> {
    let mut buf = Vec::new();
    match limit {
        Some(limit) => {
            let cap = u64::try_from(limit).unwrap_or(u64::MAX).saturating_add(1);
            (&mut *body)
                .take(cap)
                .read_to_end(&mut buf)
                .map_err(|err| CodecError::MalformedBody(err.to_string()))?;
            if buf.len() > limit {
                return Err(CodecError::PayloadTooLarge { limit });
            }
        }
        None => {
            body.read_to_end(&mut buf)
                .map_err(|err| CodecError::MalformedBody(err.to_string()))?;
        }
    }
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use std::io;

    use http::HeaderValue;

    use super::*;

    #[test]
    fn media_type_strips_parameters() {
        let mut headers = HeaderMap::new();
        headers.insert(
            CONTENT_TYPE,
            HeaderValue::from_static("application/cloudevents+json; charset=utf-8"),
        );
        assert_eq!(media_type(&headers).unwrap(), STRUCTURED_JSON);
    }

    #[test]
    fn missing_or_bad_content_type() {
        let headers = HeaderMap::new();
        assert!(matches!(media_type(&headers), Err(CodecError::ContentTypeParse(_))));

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("/"));
        assert!(matches!(media_type(&headers), Err(CodecError::ContentTypeParse(_))));
    }

    #[test]
    fn declared_length_parses() {
        let mut headers = HeaderMap::new();
        assert_eq!(declared_length(&headers), None);
        headers.insert(CONTENT_LENGTH, HeaderValue::from_static("0"));
        assert_eq!(declared_length(&headers), Some(0));
        headers.insert(CONTENT_LENGTH, HeaderValue::from_static("abc"));
        assert_eq!(declared_length(&headers), None);
    }

    #[test]
    fn body_limit_enforced() {
        let mut body: &[u8] = b"0123456789";
        assert_eq!(
            read_body(&mut body, Some(4)),
            Err(CodecError::PayloadTooLarge { limit: 4 })
        );

        let mut body: &[u8] = b"0123";
        assert_eq!(read_body(&mut body, Some(4)).unwrap(), b"0123");
    }

    struct Broken;

    impl Read for Broken {
        fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
            Err(io::Error::other("connection reset"))
        }
    }

    #[test]
    fn read_failure_is_malformed_body() {
        let err = read_body(&mut Broken, None).unwrap_err();
        assert!(matches!(err, CodecError::MalformedBody(msg) if msg.contains("connection reset")));
    }
}
