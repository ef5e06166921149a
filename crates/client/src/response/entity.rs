//! Streaming view over a response entity.

use bytes::{Bytes, BytesMut};

use crate::connection::ClientConnection;
use crate::protocol::ClientError;
use crate::response::ClientResponse;

/// Bytes asked of the response per collection step.
const COLLECT_CHUNK_SIZE: usize = 8 * 1024;

/// A reader over a response entity, obtained from
/// [`ClientResponse::entity`].
///
/// The view borrows the response and holds no state of its own: dropping
/// it and obtaining a fresh one continues reading where the previous view
/// stopped.
#[derive(Debug)]
pub struct ResponseEntity<'a, C: ClientConnection> {
    response: &'a mut ClientResponse<C>,
}

impl<'a, C: ClientConnection> ResponseEntity<'a, C> {
    pub(super) fn new(response: &'a mut ClientResponse<C>) -> Self {
        Self { response }
    }

    /// Reads up to `suggested` bytes of the entity.
    ///
    /// Returns `None` once the entity ended. Reaching the end also parses
    /// any declared trailers and settles the connection, so a fully read
    /// response needs no explicit close.
    pub async fn read(&mut self, suggested: usize) -> Result<Option<Bytes>, ClientError> {
        self.response.read_entity_bytes(suggested).await
    }

    /// Reads the entity to its end, collecting everything into one buffer.
    pub async fn bytes(&mut self) -> Result<Bytes, ClientError> {
        let mut collected = BytesMut::new();

        while let Some(chunk) = self.read(COLLECT_CHUNK_SIZE).await? {
            collected.extend_from_slice(&chunk);
        }

        Ok(collected.freeze())
    }
}
