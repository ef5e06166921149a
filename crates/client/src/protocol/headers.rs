use http::{HeaderMap, HeaderName, HeaderValue};

use crate::protocol::{LazyString, ParseError};

/// An ordered block of header fields with lazily materialized values.
///
/// Produced by the trailer decoder, which hands each value over as a
/// [`LazyString`] window into the receive buffer. Values stay as raw bytes
/// until someone asks for text. Lookups are linear; trailer blocks are
/// small, usually a handful of fields.
#[derive(Debug, Clone)]
pub struct HeaderBlock {
    fields: Vec<(HeaderName, LazyString)>,
}

impl HeaderBlock {
    pub(crate) fn new(fields: Vec<(HeaderName, LazyString)>) -> Self {
        Self { fields }
    }

    /// A block with no fields.
    pub const fn empty() -> Self {
        Self { fields: Vec::new() }
    }

    /// The first value for `name`, compared case insensitively.
    pub fn get(&self, name: &str) -> Option<&LazyString> {
        self.fields
            .iter()
            .find(|(n, _)| n.as_str().eq_ignore_ascii_case(name))
            .map(|(_, value)| value)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Iterates over the fields in the order they arrived.
    pub fn iter(&self) -> impl Iterator<Item = (&HeaderName, &LazyString)> {
        self.fields.iter().map(|(name, value)| (name, value))
    }

    /// Copies the block into a [`HeaderMap`], validating each value.
    pub fn to_header_map(&self) -> Result<HeaderMap, ParseError> {
        let mut headers = HeaderMap::with_capacity(self.fields.len());
        for (name, value) in &self.fields {
            let value = HeaderValue::from_bytes(value.as_bytes())
                .map_err(|e| ParseError::invalid_header(e.to_string()))?;
            headers.append(name.clone(), value);
        }
        Ok(headers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    fn block(pairs: &[(&str, &'static str)]) -> HeaderBlock {
        HeaderBlock::new(
            pairs
                .iter()
                .map(|(name, value)| {
                    (
                        HeaderName::from_bytes(name.as_bytes()).unwrap(),
                        LazyString::new(Bytes::from_static(value.as_bytes())),
                    )
                })
                .collect(),
        )
    }

    #[test]
    fn lookup_is_case_insensitive() {
        let block = block(&[("X-Checksum", "abc123")]);
        assert_eq!(block.get("x-checksum").map(LazyString::as_str), Some("abc123"));
        assert_eq!(block.get("X-CHECKSUM").map(LazyString::as_str), Some("abc123"));
        assert!(block.get("x-other").is_none());
        assert!(block.contains("X-Checksum"));
    }

    #[test]
    fn first_value_wins_on_duplicates() {
        let block = block(&[("warning", "first"), ("warning", "second")]);
        assert_eq!(block.get("warning").map(LazyString::as_str), Some("first"));
        assert_eq!(block.len(), 2);
    }

    #[test]
    fn empty_block_has_no_fields() {
        let block = HeaderBlock::empty();
        assert!(block.is_empty());
        assert_eq!(block.iter().count(), 0);
        assert!(!block.contains("anything"));
    }

    #[test]
    fn converts_into_a_header_map() {
        let block = block(&[("x-a", "1"), ("x-a", "2"), ("x-b", "3")]);
        let map = block.to_header_map().unwrap();
        assert_eq!(map.len(), 3);
        assert_eq!(map.get_all("x-a").iter().count(), 2);
        assert_eq!(map.get("x-b").unwrap(), "3");
    }
}
