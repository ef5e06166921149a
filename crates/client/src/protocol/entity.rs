use bytes::{Buf, Bytes};
use http::{HeaderMap, HeaderValue};

use crate::protocol::ParseError;

/// Represents the framing of a response entity.
///
/// This enum is resolved from the response headers and decides how the
/// entity will be decoded:
/// - Known length: read exactly that many bytes
/// - Chunked: read using chunked transfer encoding
/// - Empty: there is no entity to read
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum EntitySize {
    /// Entity with known length in bytes
    Length(u64),
    /// Entity using chunked transfer encoding
    Chunked,
    /// Empty entity (no body)
    Empty,
}

impl EntitySize {
    /// Returns true if the entity uses chunked transfer encoding
    #[inline]
    pub fn is_chunked(&self) -> bool {
        matches!(self, EntitySize::Chunked)
    }

    /// Returns true if there is no entity
    #[inline]
    pub fn is_empty(&self) -> bool {
        matches!(self, EntitySize::Empty)
    }

    /// Returns true if nothing remains to be read for this framing,
    /// either because it is empty or declares a zero length
    #[inline]
    pub fn is_vacant(&self) -> bool {
        matches!(self, EntitySize::Empty | EntitySize::Length(0))
    }

    /// Resolves the entity framing from response headers.
    ///
    /// Follows RFC 9112 section 6: a Transfer-Encoding ending in `chunked`
    /// selects chunked framing, otherwise Content-Length gives the exact
    /// size. Carrying both headers at once is refused, since smuggling
    /// attacks rely on parsers disagreeing about which one wins.
    pub fn from_headers(headers: &HeaderMap) -> Result<Self, ParseError> {
        let te_header = headers.get_all(http::header::TRANSFER_ENCODING).iter().last();
        let cl_header = headers.get(http::header::CONTENT_LENGTH);

        match (te_header, cl_header) {
            (None, None) => Ok(EntitySize::Empty),

            (te_value @ Some(_), None) => {
                if is_chunked(te_value) {
                    Ok(EntitySize::Chunked)
                } else {
                    Ok(EntitySize::Empty)
                }
            }

            (None, Some(cl_value)) => {
                let cl_str =
                    cl_value.to_str().map_err(|_| ParseError::invalid_content_length("value can't to_str"))?;

                let length = cl_str
                    .trim()
                    .parse::<u64>()
                    .map_err(|_| ParseError::invalid_content_length(format!("value {cl_str} is not u64")))?;

                Ok(EntitySize::Length(length))
            }

            (Some(_), Some(_)) => Err(ParseError::invalid_content_length(
                "transfer-encoding and content-length both present in headers",
            )),
        }
    }
}

/// Checks if the Transfer-Encoding header indicates chunked encoding.
///
/// According to RFC 9112, chunked must be the last encoding if present.
fn is_chunked(header_value: Option<&HeaderValue>) -> bool {
    const CHUNKED: &[u8] = b"chunked";
    if let Some(value) = header_value {
        if let Some(bytes) = value.as_bytes().rsplit(|b| *b == b',').next() {
            return bytes.trim_ascii() == CHUNKED;
        }
    }
    false
}

/// Represents an item in the decoded entity stream.
///
/// This enum is produced by the entity decoders, yielding either data
/// chunks or the end of the entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntityItem<Data: Buf = Bytes> {
    /// A piece of entity data
    Chunk(Data),
    /// Marks the end of the entity
    End,
}

impl<D: Buf> EntityItem<D> {
    /// Returns true if this item marks the end of the entity
    #[inline]
    pub fn is_end(&self) -> bool {
        matches!(self, EntityItem::End)
    }

    /// Returns true if this item contains chunk data
    #[inline]
    pub fn is_chunk(&self) -> bool {
        matches!(self, EntityItem::Chunk(_))
    }
}

impl EntityItem {
    /// Returns a reference to the contained bytes if this is a Chunk
    ///
    /// Returns None if this is the end marker
    pub fn as_bytes(&self) -> Option<&Bytes> {
        match self {
            EntityItem::Chunk(bytes) => Some(bytes),
            EntityItem::End => None,
        }
    }

    /// Consumes the EntityItem and returns the contained bytes if this is a Chunk
    ///
    /// Returns None if this is the end marker
    pub fn into_bytes(self) -> Option<Bytes> {
        match self {
            EntityItem::Chunk(bytes) => Some(bytes),
            EntityItem::End => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(pairs: &[(&str, &str)]) -> HeaderMap {
        let mut headers = HeaderMap::new();
        for (name, value) in pairs {
            headers.append(
                http::header::HeaderName::from_bytes(name.as_bytes()).unwrap(),
                value.parse().unwrap(),
            );
        }
        headers
    }

    #[test]
    fn no_framing_headers_mean_empty() {
        assert_eq!(EntitySize::from_headers(&HeaderMap::new()).unwrap(), EntitySize::Empty);
    }

    #[test]
    fn content_length_resolves_to_length() {
        let headers = headers(&[("content-length", "42")]);
        assert_eq!(EntitySize::from_headers(&headers).unwrap(), EntitySize::Length(42));

        let headers = self::headers(&[("content-length", " 7 ")]);
        assert_eq!(EntitySize::from_headers(&headers).unwrap(), EntitySize::Length(7));
    }

    #[test]
    fn invalid_content_length_is_refused() {
        let headers = headers(&[("content-length", "seven")]);
        assert!(EntitySize::from_headers(&headers).is_err());
    }

    #[test]
    fn chunked_must_be_the_final_encoding() {
        let headers = headers(&[("transfer-encoding", "gzip, chunked")]);
        assert_eq!(EntitySize::from_headers(&headers).unwrap(), EntitySize::Chunked);

        let headers = self::headers(&[("transfer-encoding", "chunked, gzip")]);
        assert_eq!(EntitySize::from_headers(&headers).unwrap(), EntitySize::Empty);
    }

    #[test]
    fn the_last_transfer_encoding_line_decides() {
        let headers = headers(&[("transfer-encoding", "gzip"), ("transfer-encoding", "chunked")]);
        assert_eq!(EntitySize::from_headers(&headers).unwrap(), EntitySize::Chunked);
    }

    #[test]
    fn both_framing_headers_are_refused() {
        let headers = headers(&[("transfer-encoding", "chunked"), ("content-length", "5")]);
        assert!(EntitySize::from_headers(&headers).is_err());
    }

    #[test]
    fn zero_length_is_vacant() {
        assert!(EntitySize::Length(0).is_vacant());
        assert!(EntitySize::Empty.is_vacant());
        assert!(!EntitySize::Length(1).is_vacant());
        assert!(!EntitySize::Chunked.is_vacant());
    }
}
