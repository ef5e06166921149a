//! Request path with lazy percent-decoding.

use std::fmt;

use once_cell::sync::OnceCell;

/// A request path carrying both its raw form and a lazily decoded one.
///
/// The raw form is the path exactly as it appeared on the request line.
/// Percent-decoding is performed at most once, on first access, and the
/// result is cached. Decoding is total: a malformed escape (truncated or
/// with non-hex digits) is kept verbatim instead of failing, and `+` is left
/// alone since it has no special meaning in a path.
#[derive(Debug, Clone)]
pub struct UriPath {
    raw: String,
    decoded: OnceCell<String>,
}

impl UriPath {
    /// Wraps a raw, possibly percent-encoded request path.
    ///
    /// An empty path is normalized to `/`.
    pub fn new(raw: impl Into<String>) -> Self {
        let mut raw = raw.into();
        if raw.is_empty() {
            raw.push('/');
        }
        Self {
            raw,
            decoded: OnceCell::new(),
        }
    }

    /// Wraps a path that is already decoded, so both forms are the same.
    pub(crate) fn from_decoded(path: impl Into<String>) -> Self {
        let path = path.into();
        let this = Self::new(path);
        // the raw form is the decoded form here; seed the cache with it
        let _ = this.decoded.set(this.raw.clone());
        this
    }

    /// The path as received, without any decoding applied.
    pub fn raw_path(&self) -> &str {
        &self.raw
    }

    /// The percent-decoded path, computed on first access.
    pub fn path(&self) -> &str {
        self.decoded.get_or_init(|| percent_decode(&self.raw))
    }
}

impl fmt::Display for UriPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl From<&str> for UriPath {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

pub(crate) fn percent_decode(raw: &str) -> String {
    let bytes = raw.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' && i + 2 < bytes.len() {
            if let (Some(hi), Some(lo)) = (hex_value(bytes[i + 1]), hex_value(bytes[i + 2])) {
                out.push((hi << 4) | lo);
                i += 3;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    match String::from_utf8(out) {
        Ok(decoded) => decoded,
        // decoded bytes are not valid UTF-8, keep what is readable
        Err(e) => String::from_utf8_lossy(e.as_bytes()).into_owned(),
    }
}

fn hex_value(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'a'..=b'f' => Some(b - b'a' + 10),
        b'A'..=b'F' => Some(b - b'A' + 10),
        _ => None,
    }
}
