//! Entity decoder dispatching between the framing strategies.
//!
//! A response entity is framed in one of three ways: a fixed number of bytes
//! announced by `content-length`, chunked transfer encoding, or no entity at
//! all. [`EntityDecoder`] wraps the matching decoder behind one `Decoder`
//! implementation so the response code can drive any of them uniformly.

use super::chunked_decoder::ChunkedDecoder;
use super::length_decoder::LengthDecoder;
use crate::protocol::{EntityItem, ParseError};
use bytes::BytesMut;
use tokio_util::codec::Decoder;

/// A decoder for response entities, covering every framing strategy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityDecoder {
    kind: Kind,
}

impl EntityDecoder {
    /// Creates a decoder for an entity of `size` bytes.
    pub fn fixed(size: u64) -> Self {
        Self { kind: Kind::Length(LengthDecoder::new(size)) }
    }

    /// Creates a decoder for a chunked entity without declared trailers.
    pub fn chunked() -> Self {
        Self { kind: Kind::Chunked(ChunkedDecoder::new()) }
    }

    /// Creates a decoder for a chunked entity whose trailer section is left
    /// in the buffer to be decoded separately.
    pub fn chunked_leaving_trailers() -> Self {
        Self { kind: Kind::Chunked(ChunkedDecoder::leaving_trailers()) }
    }

    /// Creates a decoder for a response without an entity.
    pub fn empty() -> Self {
        Self { kind: Kind::Empty }
    }

    /// Returns how many entity bytes are still outstanding, when the framing
    /// makes that knowable without reading. Chunked entities return `None`.
    pub fn remaining(&self) -> Option<u64> {
        match &self.kind {
            Kind::Length(decoder) => Some(decoder.remaining()),
            Kind::Chunked(_) => None,
            Kind::Empty => Some(0),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Kind {
    Length(LengthDecoder),
    Chunked(ChunkedDecoder),
    Empty,
}

impl Decoder for EntityDecoder {
    type Item = EntityItem;
    type Error = ParseError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        match &mut self.kind {
            Kind::Length(decoder) => decoder.decode(src),
            Kind::Chunked(decoder) => decoder.decode(src),
            Kind::Empty => Ok(Some(EntityItem::End)),
        }
    }
}
