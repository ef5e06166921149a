//! Decoder implementation for entities with a Content-Length header.
//!
//! This module provides functionality to decode response entities whose size
//! is declared up front by the Content-Length header, as defined in
//! [RFC 9112 Section 6.2](https://www.rfc-editor.org/rfc/rfc9112.html#name-content-length).

use std::cmp;

use crate::protocol::{EntityItem, ParseError};
use bytes::BytesMut;
use tokio_util::codec::Decoder;

/// A decoder for entities with a known content length.
///
/// The decoder tracks the bytes still owed and yields whatever part of them
/// is buffered, so a large entity streams out in pieces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LengthDecoder {
    /// The number of bytes remaining to be read from the entity
    length: u64,
}

impl LengthDecoder {
    /// Creates a new LengthDecoder instance.
    ///
    /// # Arguments
    /// * `length` - The total entity length in bytes, from the Content-Length header
    pub fn new(length: u64) -> Self {
        Self { length }
    }

    /// Bytes of the entity not yet decoded.
    pub fn remaining(&self) -> u64 {
        self.length
    }
}

impl Decoder for LengthDecoder {
    type Item = EntityItem;
    type Error = ParseError;

    /// Decodes bytes from the input buffer according to the content length.
    ///
    /// # Returns
    /// * `Ok(Some(EntityItem::End))` when all bytes have been read
    /// * `Ok(Some(EntityItem::Chunk(bytes)))` when a chunk is successfully decoded
    /// * `Ok(None)` when more data is needed
    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if self.length == 0 {
            return Ok(Some(EntityItem::End));
        }

        if src.is_empty() {
            return Ok(None);
        }

        // Read the minimum of remaining length and available bytes
        let len = cmp::min(self.length, src.len() as u64);
        let bytes = src.split_to(len as usize).freeze();

        self.length -= bytes.len() as u64;
        Ok(Some(EntityItem::Chunk(bytes)))
    }
}
