//! Decoder for bare CRLF-terminated header blocks.
//!
//! A header block is a sequence of `name: value` lines closed by an empty
//! line, with no request or status line in front. Responses carry one as the
//! trailer section of a chunked entity.
//!
//! Parsing runs in two stages: `httparse` finds the field lines, then the
//! byte ranges of each name and value are recorded so the block can be
//! frozen once and the fields can point into it without copying.
//!
//! # Limits
//!
//! - Maximum number of fields: 64
//! - Maximum block size: configured per decoder, 8KB by default

use bytes::BytesMut;
use http::HeaderName;
use httparse::{Error, Status};
use tokio_util::codec::Decoder;
use tracing::trace;

use crate::ensure;
use crate::protocol::{HeaderBlock, LazyString, ParseError};

/// Maximum number of fields allowed in a header block
const MAX_HEADER_NUM: usize = 64;

/// Default cap on the size of a whole block in bytes
pub const DEFAULT_MAX_BLOCK_BYTES: usize = 8 * 1024;

/// Decoder for a standalone header block, yielding a [`HeaderBlock`].
///
/// The decoder enforces a size cap on the whole block and, unless disabled,
/// re-checks field names against the token table and field values for
/// control bytes on top of what the parsing engine already rejects.
#[derive(Debug, Clone, Copy)]
pub struct HeaderBlockDecoder {
    max_bytes: usize,
    validate: bool,
}

impl HeaderBlockDecoder {
    /// Creates a validating decoder capping the block at `max_bytes`.
    pub fn new(max_bytes: usize) -> Self {
        Self { max_bytes, validate: true }
    }

    /// Creates a decoder that skips the extra name and value byte checks.
    pub fn without_validation(max_bytes: usize) -> Self {
        Self { max_bytes, validate: false }
    }
}

impl Decoder for HeaderBlockDecoder {
    type Item = HeaderBlock;
    type Error = ParseError;

    /// Attempts to decode one complete header block from the buffer.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(block))` once the closing empty line has been seen
    /// - `Ok(None)` if more data is needed
    /// - `Err(ParseError)` when a field is malformed or a limit is exceeded
    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        let mut headers = [httparse::EMPTY_HEADER; MAX_HEADER_NUM];

        let parsed = httparse::parse_headers(src, &mut headers).map_err(|e| match e {
            Error::TooManyHeaders => ParseError::too_many_headers(MAX_HEADER_NUM),
            e => ParseError::invalid_header(e.to_string()),
        });

        match parsed? {
            Status::Complete((block_size, parsed_headers)) => {
                trace!(block_size, field_count = parsed_headers.len(), "parsed header block");
                ensure!(block_size <= self.max_bytes, ParseError::too_large_header(block_size, self.max_bytes));

                let field_count = parsed_headers.len();

                // Record byte ranges first, the freeze below needs `src` back
                let mut indices: [HeaderIndex; MAX_HEADER_NUM] = EMPTY_HEADER_INDEX_ARRAY;
                HeaderIndex::record(src, parsed_headers, &mut indices);

                let block = src.split_to(block_size).freeze();

                let mut fields = Vec::with_capacity(field_count);
                for index in &indices[..field_count] {
                    let name_bytes = &block[index.name.0..index.name.1];
                    let value_bytes = block.slice(index.value.0..index.value.1);

                    if self.validate {
                        ensure!(
                            name_bytes.iter().all(|b| TOKEN_CHARS[*b as usize]),
                            ParseError::invalid_header(format!(
                                "field name {:?} is not a token",
                                String::from_utf8_lossy(name_bytes)
                            ))
                        );
                        ensure!(
                            value_bytes.iter().all(|b| !is_illegal_value_byte(*b)),
                            ParseError::invalid_header("field value contains control bytes")
                        );
                    }

                    let name = HeaderName::from_bytes(name_bytes).map_err(|e| ParseError::invalid_header(e.to_string()))?;

                    fields.push((name, LazyString::with_stripped_ows(value_bytes)));
                }

                Ok(Some(HeaderBlock::new(fields)))
            }
            Status::Partial => {
                ensure!(src.len() <= self.max_bytes, ParseError::too_large_header(src.len(), self.max_bytes));
                Ok(None)
            }
        }
    }
}

/// Byte range positions of one field's name and value within the block.
///
/// Recording positions instead of the text lets the decoder freeze the block
/// once and hand out windows into it.
#[derive(Clone, Copy)]
struct HeaderIndex {
    name: (usize, usize),
    value: (usize, usize),
}

const EMPTY_HEADER_INDEX: HeaderIndex = HeaderIndex { name: (0, 0), value: (0, 0) };

const EMPTY_HEADER_INDEX_ARRAY: [HeaderIndex; MAX_HEADER_NUM] = [EMPTY_HEADER_INDEX; MAX_HEADER_NUM];

impl HeaderIndex {
    /// Records where each parsed field's name and value sit inside `bytes`.
    fn record(bytes: &[u8], headers: &[httparse::Header<'_>], indices: &mut [HeaderIndex]) {
        let bytes_ptr = bytes.as_ptr() as usize;
        for (header, indices) in headers.iter().zip(indices.iter_mut()) {
            let name_start = header.name.as_ptr() as usize - bytes_ptr;
            let name_end = name_start + header.name.len();
            indices.name = (name_start, name_end);
            let value_start = header.value.as_ptr() as usize - bytes_ptr;
            let value_end = value_start + header.value.len();
            indices.value = (value_start, value_end);
        }
    }
}

/// Token characters permitted in field names per
/// [RFC 9110 Section 5.6.2](https://www.rfc-editor.org/rfc/rfc9110.html#name-tokens).
static TOKEN_CHARS: [bool; 256] = build_token_table();

const fn build_token_table() -> [bool; 256] {
    let mut table = [false; 256];
    let mut b = 0usize;
    while b < 256 {
        let c = b as u8;
        table[b] = c.is_ascii_alphanumeric()
            || matches!(c, b'!' | b'#' | b'$' | b'%' | b'&' | b'\'' | b'*' | b'+' | b'-' | b'.' | b'^' | b'_' | b'`' | b'|' | b'~');
        b += 1;
    }
    table
}

/// Control bytes are illegal in field values, except HTAB. Bytes above
/// 0x7f pass as obs-text.
fn is_illegal_value_byte(b: u8) -> bool {
    (b < 0x20 && b != b'\t') || b == 0x7f
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;

    #[test]
    fn decodes_a_trailer_block() {
        let text = indoc! {"
            X-Checksum: 1a2b3c
            Expires: never

        "}
        .replace('\n', "\r\n");

        let mut buffer = BytesMut::from(text.as_bytes());
        let block = HeaderBlockDecoder::new(DEFAULT_MAX_BLOCK_BYTES).decode(&mut buffer).unwrap().unwrap();

        assert_eq!(block.len(), 2);
        assert_eq!(block.get("x-checksum").unwrap().as_str(), "1a2b3c");
        assert_eq!(block.get("Expires").unwrap().as_str(), "never");
        assert!(buffer.is_empty());
    }

    #[test]
    fn a_bare_crlf_is_an_empty_block() {
        let mut buffer = BytesMut::from(&b"\r\n"[..]);
        let block = HeaderBlockDecoder::new(DEFAULT_MAX_BLOCK_BYTES).decode(&mut buffer).unwrap().unwrap();

        assert!(block.is_empty());
        assert!(buffer.is_empty());
    }

    #[test]
    fn partial_blocks_ask_for_more_data() {
        let mut buffer = BytesMut::from(&b"X-Checksum: 1a"[..]);
        let mut decoder = HeaderBlockDecoder::new(DEFAULT_MAX_BLOCK_BYTES);

        assert!(decoder.decode(&mut buffer).unwrap().is_none());

        buffer.extend_from_slice(b"2b3c\r\n\r\n");
        let block = decoder.decode(&mut buffer).unwrap().unwrap();
        assert_eq!(block.get("x-checksum").unwrap().as_str(), "1a2b3c");
    }

    #[test]
    fn oversized_blocks_are_rejected() {
        let mut buffer = BytesMut::from(&b"X-Padding: 0123456789012345678901234567890123456789\r\n\r\n"[..]);
        let result = HeaderBlockDecoder::new(16).decode(&mut buffer);

        assert!(matches!(result, Err(ParseError::TooLargeHeader { max_size: 16, .. })));
    }

    #[test]
    fn oversized_partial_blocks_are_rejected_early() {
        // no closing empty line yet, the buffer alone busts the cap
        let mut buffer = BytesMut::from(&b"X-Padding: 0123456789012345678901234567890123456789\r\n"[..]);
        let result = HeaderBlockDecoder::new(16).decode(&mut buffer);

        assert!(matches!(result, Err(ParseError::TooLargeHeader { max_size: 16, .. })));
    }

    #[test]
    fn too_many_fields_are_rejected() {
        let mut text = String::new();
        for n in 0..65 {
            text.push_str(&format!("X-Field-{n}: {n}\r\n"));
        }
        text.push_str("\r\n");

        let mut buffer = BytesMut::from(text.as_bytes());
        let result = HeaderBlockDecoder::new(DEFAULT_MAX_BLOCK_BYTES).decode(&mut buffer);

        assert!(matches!(result, Err(ParseError::TooManyHeaders { max_num: MAX_HEADER_NUM })));
    }

    #[test]
    fn malformed_fields_are_rejected() {
        let mut buffer = BytesMut::from(&b"not a field line\r\n\r\n"[..]);
        let result = HeaderBlockDecoder::new(DEFAULT_MAX_BLOCK_BYTES).decode(&mut buffer);

        assert!(result.is_err());
    }

    #[test]
    fn validation_can_be_skipped() {
        let mut buffer = BytesMut::from(&b"X-Checksum: 1a2b3c\r\n\r\n"[..]);
        let block = HeaderBlockDecoder::without_validation(DEFAULT_MAX_BLOCK_BYTES).decode(&mut buffer).unwrap().unwrap();

        assert_eq!(block.get("x-checksum").unwrap().as_str(), "1a2b3c");
    }

    #[test]
    fn token_table_matches_the_rfc_charset() {
        assert!(TOKEN_CHARS[b'a' as usize]);
        assert!(TOKEN_CHARS[b'Z' as usize]);
        assert!(TOKEN_CHARS[b'7' as usize]);
        assert!(TOKEN_CHARS[b'-' as usize]);
        assert!(TOKEN_CHARS[b'~' as usize]);

        assert!(!TOKEN_CHARS[b' ' as usize]);
        assert!(!TOKEN_CHARS[b':' as usize]);
        assert!(!TOKEN_CHARS[b'(' as usize]);
        assert!(!TOKEN_CHARS[0x7f]);
        assert!(!TOKEN_CHARS[0xff]);
    }
}
