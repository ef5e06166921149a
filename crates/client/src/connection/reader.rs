//! Buffered reading half of a client connection.
//!
//! [`ConnectionReader`] keeps a single [`BytesMut`] buffer in front of the
//! transport. All decoding runs over this one buffer, so bytes that were
//! read ahead of the current decoder stay visible to whoever reads next,
//! and the close path can inspect and drain them without touching the
//! transport at all.

use bytes::{Buf, Bytes, BytesMut};
use std::io;
use std::io::ErrorKind;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio_util::codec::Decoder;
use tracing::trace;

use crate::protocol::ParseError;

/// Number of spare bytes each refill makes room for.
const READ_BUFFER_SIZE: usize = 8 * 1024;

/// A buffered reader over the receiving half of a connection.
///
/// Decoders are driven by [`decode`](Self::decode); the buffered-only
/// accessors [`available`](Self::available) and
/// [`take_buffered`](Self::take_buffered) expose what has already arrived
/// without performing any IO.
#[derive(Debug)]
pub struct ConnectionReader<R> {
    io: R,
    buffer: BytesMut,
}

impl<R> ConnectionReader<R>
where
    R: AsyncRead + Unpin,
{
    /// Creates a reader with the default buffer capacity.
    pub fn new(io: R) -> Self {
        Self::with_capacity(io, READ_BUFFER_SIZE)
    }

    /// Creates a reader whose buffer starts out with `capacity` bytes.
    pub fn with_capacity(io: R, capacity: usize) -> Self {
        Self { io, buffer: BytesMut::with_capacity(capacity) }
    }

    /// Number of bytes sitting in the buffer. Never touches the transport.
    pub fn available(&self) -> usize {
        self.buffer.len()
    }

    /// Splits off the first `n` buffered bytes.
    ///
    /// This is the draining primitive: it only ever consumes bytes that
    /// have already arrived, so it cannot block.
    ///
    /// # Panics
    ///
    /// Panics when `n` exceeds [`available`](Self::available).
    pub fn take_buffered(&mut self, n: usize) -> Bytes {
        self.buffer.split_to(n).freeze()
    }

    /// Reads a single byte, refilling the buffer as needed.
    ///
    /// An end of file before a byte arrives is an error, a lone byte read
    /// has no in-band way to signal absence.
    pub async fn read_byte(&mut self) -> Result<u8, ParseError> {
        while self.buffer.is_empty() {
            if self.fill().await? == 0 {
                return Err(ParseError::io(io::Error::new(
                    ErrorKind::UnexpectedEof,
                    "connection closed while reading",
                )));
            }
        }

        Ok(self.buffer.get_u8())
    }

    /// Performs one read from the transport into the buffer.
    ///
    /// Returns the number of bytes read, zero meaning end of file.
    pub async fn fill(&mut self) -> Result<usize, io::Error> {
        self.buffer.reserve(READ_BUFFER_SIZE);
        let read = self.io.read_buf(&mut self.buffer).await?;
        trace!(read, "filled connection buffer");
        Ok(read)
    }

    /// Drives `decoder` over the buffer, refilling until it yields.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(item))` when the decoder produced an item
    /// - `Ok(None)` when the transport ended cleanly with an empty buffer
    /// - `Err(..)` on decode failures, or when the transport ends with
    ///   undecodable bytes left over
    pub async fn decode<D: Decoder>(&mut self, decoder: &mut D) -> Result<Option<D::Item>, D::Error> {
        loop {
            if let Some(item) = decoder.decode(&mut self.buffer)? {
                return Ok(Some(item));
            }

            if self.fill().await? == 0 {
                return decoder.decode_eof(&mut self.buffer);
            }
        }
    }
}
