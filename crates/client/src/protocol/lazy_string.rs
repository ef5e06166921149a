use std::fmt;

use bytes::Bytes;
use once_cell::sync::OnceCell;

/// A string backed by a byte window, materialized at most once.
///
/// Header values arrive as byte slices into the receive buffer and most of
/// them are never looked at as text. `LazyString` keeps the cheap [`Bytes`]
/// window around and only builds an owned `String` on the first
/// [`LazyString::as_str`] call, caching it for every later one. Decoding is
/// lossy, so a value holding invalid UTF-8 still yields a usable string.
#[derive(Debug, Clone)]
pub struct LazyString {
    bytes: Bytes,
    value: OnceCell<String>,
}

impl LazyString {
    pub fn new(bytes: Bytes) -> Self {
        Self { bytes, value: OnceCell::new() }
    }

    /// Creates a lazy string over `bytes` with optional whitespace (SP and
    /// HTAB) stripped from both ends of the window.
    pub fn with_stripped_ows(bytes: Bytes) -> Self {
        let mut start = 0;
        let mut end = bytes.len();
        while start < end && matches!(bytes[start], b' ' | b'\t') {
            start += 1;
        }
        while end > start && matches!(bytes[end - 1], b' ' | b'\t') {
            end -= 1;
        }
        Self::new(bytes.slice(start..end))
    }

    /// The raw bytes backing this string, available without materializing.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// The value as text, built on first access and cached.
    pub fn as_str(&self) -> &str {
        self.value.get_or_init(|| String::from_utf8_lossy(&self.bytes).into_owned())
    }

    /// Whether the owned string has been built yet.
    pub fn is_materialized(&self) -> bool {
        self.value.get().is_some()
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl From<&'static str> for LazyString {
    fn from(value: &'static str) -> Self {
        Self::new(Bytes::from_static(value.as_bytes()))
    }
}

impl fmt::Display for LazyString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn materializes_only_on_first_text_access() {
        let value = LazyString::new(Bytes::from_static(b"gzip"));
        assert!(!value.is_materialized());
        assert_eq!(value.as_bytes(), b"gzip");
        assert!(!value.is_materialized());

        assert_eq!(value.as_str(), "gzip");
        assert!(value.is_materialized());
        assert_eq!(value.as_str(), "gzip");
    }

    #[test]
    fn invalid_utf8_is_decoded_lossily() {
        let value = LazyString::new(Bytes::from_static(b"caf\xc3\x29"));
        assert_eq!(value.as_str(), "caf\u{fffd})");
    }

    #[test]
    fn empty_window_is_an_empty_string() {
        let value = LazyString::new(Bytes::new());
        assert!(value.is_empty());
        assert_eq!(value.len(), 0);
        assert_eq!(value.as_str(), "");
    }

    #[test]
    fn stripping_ows_trims_spaces_and_tabs_only() {
        let value = LazyString::with_stripped_ows(Bytes::from_static(b" \t gzip, br\t "));
        assert_eq!(value.as_bytes(), b"gzip, br");
        assert_eq!(value.as_str(), "gzip, br");

        let all_blank = LazyString::with_stripped_ows(Bytes::from_static(b" \t\t "));
        assert!(all_blank.is_empty());
    }
}
