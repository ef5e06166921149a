//! Client response and its connection disposition state machine.

use std::sync::atomic::{AtomicBool, Ordering};

use bytes::Bytes;
use futures::channel::oneshot;
use http::{header, HeaderMap, StatusCode};
use once_cell::sync::OnceCell;
use tracing::{debug, trace};

use crate::codec::body::EntityDecoder;
use crate::codec::header::{HeaderBlockDecoder, DEFAULT_MAX_BLOCK_BYTES};
use crate::connection::ClientConnection;
use crate::ensure;
use crate::protocol::{ClientError, EntityItem, EntitySize, HeaderBlock, ParseError};
use crate::response::ResponseEntity;

/// A received response head plus the machinery to read its entity and
/// settle the fate of the connection underneath.
///
/// The response owns the connection for as long as it lives. Reading the
/// entity happens through [`entity`](Self::entity); once the entity ends,
/// declared trailers are parsed and the response closes itself, releasing
/// the connection for reuse. Calling [`close`](Self::close) early decides
/// the disposition right away: a connection whose remaining entity bytes
/// are already buffered is drained and released, anything else is torn
/// down. Nothing on the close path performs IO, so it cannot block.
///
/// Dropping a response without reading it to the end and without calling
/// `close` neither releases nor explicitly tears down: the owned
/// connection is simply dropped, and a pending completion signal is
/// cancelled. Pools should treat a cancelled signal as a lost connection.
#[derive(Debug)]
pub struct ClientResponse<C: ClientConnection> {
    status: StatusCode,
    headers: HeaderMap,
    entity_size: EntitySize,
    connection: Option<C>,
    decoder: Option<EntityDecoder>,
    /// Decoded entity bytes not yet handed to the caller.
    pending: Bytes,
    entity_requested: bool,
    entity_fully_read: bool,
    closed: AtomicBool,
    trailers: OnceCell<HeaderBlock>,
    max_trailer_bytes: usize,
    completion: Option<oneshot::Sender<()>>,
}

impl<C: ClientConnection> ClientResponse<C> {
    /// Starts building a response from its parsed head and the connection
    /// it arrived on.
    pub fn builder(status: StatusCode, headers: HeaderMap, connection: C) -> ResponseBuilder<C> {
        ResponseBuilder {
            status,
            headers,
            connection,
            max_trailer_bytes: DEFAULT_MAX_BLOCK_BYTES,
            completion: None,
        }
    }

    /// The response status code.
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// The response headers.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Returns a reader over the response entity.
    ///
    /// The first call locks in that the entity is being consumed and sets
    /// up the framing decoder announced by the headers. Obtaining the
    /// reader again later continues from wherever reading stopped.
    pub fn entity(&mut self) -> ResponseEntity<'_, C> {
        if !self.entity_requested {
            self.entity_requested = true;
            self.decoder = Some(self.framing_decoder());
            trace!(entity_size = ?self.entity_size, "entity requested");
        }

        ResponseEntity::new(self)
    }

    /// Returns the trailer block of this response, parsing it on first
    /// access.
    ///
    /// A response that declared no trailers resolves to an empty block
    /// without touching the connection, in any state. For declared
    /// trailers the entity must have been requested first; whatever part
    /// of the entity is still unread is then read off the wire and
    /// discarded to reach the trailer section.
    ///
    /// # Errors
    ///
    /// Returns an illegal state error when trailers were declared but the
    /// entity was never requested, and a parse error when the trailer
    /// block itself is malformed or oversized.
    pub async fn trailers(&mut self) -> Result<&HeaderBlock, ClientError> {
        if self.trailers.get().is_none() {
            if !self.trailers_declared() {
                let _ = self.trailers.set(HeaderBlock::empty());
            } else {
                ensure!(
                    self.entity_requested,
                    ClientError::illegal_state("trailers requested before reading entity")
                );

                loop {
                    match self.next_item().await? {
                        EntityItem::Chunk(chunk) => {
                            trace!(discarded = chunk.len(), "skipping entity bytes to reach trailers");
                        }
                        EntityItem::End => {
                            self.finish_entity().await?;
                            break;
                        }
                    }
                }
            }
        }

        self.trailers.get().ok_or_else(|| ClientError::illegal_state("trailer section unavailable"))
    }

    /// Settles the connection underneath this response. Idempotent, only
    /// the first call decides.
    ///
    /// The decision never performs IO:
    ///
    /// - the response carried `Connection: close`: tear down;
    /// - the entity was fully read, was empty to begin with, or every
    ///   remaining entity byte is already buffered (drained here): release
    ///   for reuse;
    /// - otherwise: tear down.
    ///
    /// The completion signal, when one was installed, fires exactly once.
    pub fn close(&mut self) {
        if self.closed.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire).is_err() {
            return;
        }

        if let Some(mut connection) = self.connection.take() {
            if wants_close(&self.headers) {
                debug!("response asked for connection close, tearing down");
                connection.close();
            } else if self.entity_fully_read
                || self.entity_size.is_vacant()
                || self.consume_unread_entity(&mut connection)
            {
                trace!("connection released for reuse");
                connection.release();
            } else {
                connection.close();
            }
        }

        if let Some(signal) = self.completion.take() {
            // the receiving side may be gone already
            let _ = signal.send(());
        }
    }

    /// Reads up to `suggested` entity bytes, ending the entity when the
    /// framing says so. Backs [`ResponseEntity::read`].
    pub(super) async fn read_entity_bytes(&mut self, suggested: usize) -> Result<Option<Bytes>, ClientError> {
        if self.entity_fully_read {
            return Ok(None);
        }

        ensure!(!self.closed.load(Ordering::Acquire), ClientError::illegal_state("response already closed"));

        if !self.pending.is_empty() {
            return Ok(Some(self.take_pending(suggested)));
        }

        match self.next_item().await? {
            EntityItem::Chunk(bytes) => {
                self.pending = bytes;
                Ok(Some(self.take_pending(suggested)))
            }
            EntityItem::End => {
                self.finish_entity().await?;
                Ok(None)
            }
        }
    }

    /// Builds the framing decoder the response headers call for.
    fn framing_decoder(&self) -> EntityDecoder {
        match self.entity_size {
            EntitySize::Empty => EntityDecoder::empty(),
            EntitySize::Length(length) => EntityDecoder::fixed(length),
            EntitySize::Chunked => {
                if self.trailers_declared() {
                    EntityDecoder::chunked_leaving_trailers()
                } else {
                    EntityDecoder::chunked()
                }
            }
        }
    }

    /// A trailer section is only real when it was declared and the framing
    /// can carry one.
    fn trailers_declared(&self) -> bool {
        self.headers.contains_key(header::TRAILER) && self.entity_size.is_chunked()
    }

    /// Hands out up to `suggested` bytes from the pending stash.
    fn take_pending(&mut self, suggested: usize) -> Bytes {
        let take = suggested.min(self.pending.len());
        self.pending.split_to(take)
    }

    /// Decodes the next entity item off the connection.
    async fn next_item(&mut self) -> Result<EntityItem, ClientError> {
        let decoder = self.decoder.as_mut().ok_or_else(|| ClientError::illegal_state("entity not requested"))?;
        let connection =
            self.connection.as_mut().ok_or_else(|| ClientError::illegal_state("connection already disposed"))?;

        match connection.reader().decode(decoder).await? {
            Some(item) => Ok(item),
            None => Err(ParseError::invalid_entity("connection closed before the entity ended").into()),
        }
    }

    /// Runs once the framing reports the end of the entity: parses declared
    /// trailers, flags the entity fully read and settles the connection.
    async fn finish_entity(&mut self) -> Result<(), ClientError> {
        if self.trailers.get().is_none() {
            let block = if self.trailers_declared() {
                self.decode_trailer_block().await?
            } else {
                HeaderBlock::empty()
            };
            let _ = self.trailers.set(block);
        }

        self.entity_fully_read = true;
        self.close();
        Ok(())
    }

    /// Parses the buffered trailer block left behind by the chunked
    /// decoder.
    async fn decode_trailer_block(&mut self) -> Result<HeaderBlock, ClientError> {
        let connection =
            self.connection.as_mut().ok_or_else(|| ClientError::illegal_state("connection already disposed"))?;
        let mut decoder = HeaderBlockDecoder::new(self.max_trailer_bytes);

        match connection.reader().decode(&mut decoder).await? {
            Some(block) => {
                trace!(field_count = block.len(), "parsed trailer block");
                Ok(block)
            }
            None => Err(ParseError::invalid_header("connection closed before the trailer section ended").into()),
        }
    }

    /// Attempts to drain a not fully read entity from bytes that are
    /// already buffered, without any IO. Returns whether the connection
    /// ended up clean for reuse.
    ///
    /// Only length framing qualifies: the remaining byte count must be
    /// knowable and every one of those bytes must already sit in the
    /// buffer. Chunked entities and partially buffered remainders fail the
    /// check and the connection is torn down instead.
    fn consume_unread_entity(&self, connection: &mut C) -> bool {
        let remaining = match &self.decoder {
            Some(decoder) => decoder.remaining(),
            None => match self.entity_size {
                EntitySize::Length(length) => Some(length),
                EntitySize::Empty => Some(0),
                EntitySize::Chunked => None,
            },
        };

        let Some(remaining) = remaining else {
            debug!("chunked entity cannot be drained without reading, closing");
            return false;
        };

        let reader = connection.reader();
        let available = reader.available() as u64;
        if available != remaining {
            debug!(available, remaining, "unread entity is not fully buffered, closing");
            return false;
        }

        // equal to a usize, the comparison above saw to that
        reader.take_buffered(remaining as usize);
        trace!(drained = remaining, "drained unread entity from the buffer");
        true
    }
}

/// Builder for [`ClientResponse`], created via [`ClientResponse::builder`].
#[derive(Debug)]
pub struct ResponseBuilder<C: ClientConnection> {
    status: StatusCode,
    headers: HeaderMap,
    connection: C,
    max_trailer_bytes: usize,
    completion: Option<oneshot::Sender<()>>,
}

impl<C: ClientConnection> ResponseBuilder<C> {
    /// Caps the size of the trailer block in bytes. Defaults to
    /// [`DEFAULT_MAX_BLOCK_BYTES`].
    pub fn max_trailer_bytes(mut self, max_trailer_bytes: usize) -> Self {
        self.max_trailer_bytes = max_trailer_bytes;
        self
    }

    /// Installs a signal fired exactly once when the response settles its
    /// connection. Dropping the response unsettled cancels the signal
    /// instead.
    pub fn completion(mut self, signal: oneshot::Sender<()>) -> Self {
        self.completion = Some(signal);
        self
    }

    /// Finishes the builder, deriving the entity framing from the headers.
    ///
    /// # Errors
    ///
    /// Fails when the framing headers are contradictory or malformed, for
    /// example both `Content-Length` and `Transfer-Encoding` present.
    pub fn build(self) -> Result<ClientResponse<C>, ParseError> {
        let entity_size = EntitySize::from_headers(&self.headers)?;

        Ok(ClientResponse {
            status: self.status,
            headers: self.headers,
            entity_size,
            connection: Some(self.connection),
            decoder: None,
            pending: Bytes::new(),
            entity_requested: false,
            entity_fully_read: false,
            closed: AtomicBool::new(false),
            trailers: OnceCell::new(),
            max_trailer_bytes: self.max_trailer_bytes,
            completion: self.completion,
        })
    }
}

/// Checks whether the `Connection` header asks for the connection to be
/// closed after this response.
///
/// Any `close` token in any `Connection` header line counts, matched
/// case-insensitively.
pub fn wants_close(headers: &HeaderMap) -> bool {
    const CLOSE: &[u8] = b"close";

    headers
        .get_all(header::CONNECTION)
        .iter()
        .any(|value| value.as_bytes().split(|b| *b == b',').any(|token| token.trim_ascii().eq_ignore_ascii_case(CLOSE)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::ConnectionReader;
    use std::io::Cursor;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Arc;

    struct TestConnection {
        reader: ConnectionReader<Cursor<Vec<u8>>>,
        released: Arc<AtomicUsize>,
        torn_down: Arc<AtomicUsize>,
    }

    impl TestConnection {
        fn new(wire: &[u8]) -> (Self, Arc<AtomicUsize>, Arc<AtomicUsize>) {
            let released = Arc::new(AtomicUsize::new(0));
            let torn_down = Arc::new(AtomicUsize::new(0));
            let connection = Self {
                reader: ConnectionReader::new(Cursor::new(wire.to_vec())),
                released: released.clone(),
                torn_down: torn_down.clone(),
            };
            (connection, released, torn_down)
        }
    }

    impl ClientConnection for TestConnection {
        type Io = Cursor<Vec<u8>>;

        fn reader(&mut self) -> &mut ConnectionReader<Self::Io> {
            &mut self.reader
        }

        fn release(self) {
            self.released.fetch_add(1, Ordering::SeqCst);
        }

        fn close(self) {
            self.torn_down.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn header_map(pairs: &[(&str, &str)]) -> HeaderMap {
        let mut headers = HeaderMap::new();
        for (name, value) in pairs {
            headers.append(http::HeaderName::from_bytes(name.as_bytes()).unwrap(), value.parse().unwrap());
        }
        headers
    }

    fn response(
        pairs: &[(&str, &str)],
        wire: &[u8],
    ) -> (ClientResponse<TestConnection>, Arc<AtomicUsize>, Arc<AtomicUsize>) {
        let (connection, released, torn_down) = TestConnection::new(wire);
        let response = ClientResponse::builder(StatusCode::OK, header_map(pairs), connection).build().unwrap();
        (response, released, torn_down)
    }

    #[tokio::test]
    async fn empty_entity_ends_immediately_and_releases() {
        let (mut response, released, torn_down) = response(&[], b"");

        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.entity().read(1024).await.unwrap().is_none());

        assert_eq!(released.load(Ordering::SeqCst), 1);
        assert_eq!(torn_down.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn fixed_entity_streams_and_releases_when_done() {
        let (mut response, released, _) = response(&[("content-length", "5")], b"hello");

        let mut entity = response.entity();
        assert_eq!(&entity.read(1024).await.unwrap().unwrap()[..], b"hello");
        assert!(entity.read(1024).await.unwrap().is_none());

        assert!(response.trailers().await.unwrap().is_empty());
        assert_eq!(released.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn read_returns_at_most_the_suggested_size() {
        let (mut response, _, _) = response(&[("content-length", "10")], b"0123456789");

        let mut entity = response.entity();
        assert_eq!(&entity.read(4).await.unwrap().unwrap()[..], b"0123");
        assert_eq!(&entity.read(4).await.unwrap().unwrap()[..], b"4567");
        assert_eq!(&entity.read(4).await.unwrap().unwrap()[..], b"89");
        assert!(entity.read(4).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn entity_reader_can_be_reobtained_midway() {
        let (mut response, _, _) = response(&[("content-length", "5")], b"hello");

        assert_eq!(&response.entity().read(2).await.unwrap().unwrap()[..], b"he");
        assert_eq!(&response.entity().read(2).await.unwrap().unwrap()[..], b"ll");
        assert_eq!(&response.entity().read(8).await.unwrap().unwrap()[..], b"o");
        assert!(response.entity().read(8).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn collecting_the_whole_entity() {
        let (mut response, _, _) =
            response(&[("transfer-encoding", "chunked")], b"5\r\nhello\r\n7\r\n, world\r\n0\r\n\r\n");

        let bytes = response.entity().bytes().await.unwrap();
        assert_eq!(&bytes[..], b"hello, world");
    }

    #[tokio::test]
    async fn chunked_entity_with_declared_trailers() {
        let (mut response, released, _) = response(
            &[("transfer-encoding", "chunked"), ("trailer", "x-checksum")],
            b"5\r\nhello\r\n0\r\nX-Checksum: abc\r\n\r\n",
        );

        let mut entity = response.entity();
        assert_eq!(&entity.read(1024).await.unwrap().unwrap()[..], b"hello");
        assert!(entity.read(1024).await.unwrap().is_none());

        let trailers = response.trailers().await.unwrap();
        assert_eq!(trailers.get("x-checksum").unwrap().as_str(), "abc");
        assert_eq!(released.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn trailers_before_reading_the_entity_is_an_illegal_state() {
        let (mut response, _, _) = response(
            &[("transfer-encoding", "chunked"), ("trailer", "x-checksum")],
            b"5\r\nhello\r\n0\r\nX-Checksum: abc\r\n\r\n",
        );

        let err = response.trailers().await.unwrap_err();
        assert!(matches!(err, ClientError::IllegalState { .. }));
        assert!(err.to_string().contains("trailers requested before reading entity"));
    }

    #[tokio::test]
    async fn trailers_mid_entity_discard_the_rest() {
        let (mut response, released, _) = response(
            &[("transfer-encoding", "chunked"), ("trailer", "x-checksum")],
            b"5\r\nhello\r\n0\r\nX-Checksum: abc\r\n\r\n",
        );

        assert_eq!(&response.entity().read(2).await.unwrap().unwrap()[..], b"he");

        let trailers = response.trailers().await.unwrap();
        assert_eq!(trailers.get("x-checksum").unwrap().as_str(), "abc");

        // the discarded remainder is gone, the entity counts as finished
        assert!(response.entity().read(1024).await.unwrap().is_none());
        assert_eq!(released.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn undeclared_trailers_resolve_empty_in_any_state() {
        let (mut response, released, torn_down) = response(&[("content-length", "5")], b"hello");

        // never requested the entity, still fine
        assert!(response.trailers().await.unwrap().is_empty());
        assert_eq!(released.load(Ordering::SeqCst) + torn_down.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn close_drains_a_fully_buffered_unread_entity() {
        let (mut connection, released, torn_down) = TestConnection::new(b"hello");
        // the head parse typically over-reads into the buffer
        connection.reader().fill().await.unwrap();

        let mut response =
            ClientResponse::builder(StatusCode::OK, header_map(&[("content-length", "5")]), connection)
                .build()
                .unwrap();

        response.close();
        assert_eq!(released.load(Ordering::SeqCst), 1);
        assert_eq!(torn_down.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn close_tears_down_when_the_entity_is_not_buffered() {
        let (mut response, released, torn_down) = response(&[("content-length", "5")], b"hello");

        // nothing was ever read off the wire, available is zero
        response.close();
        assert_eq!(released.load(Ordering::SeqCst), 0);
        assert_eq!(torn_down.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn close_tears_down_unread_chunked_entities() {
        let (mut connection, released, torn_down) = TestConnection::new(b"5\r\nhello\r\n0\r\n\r\n");
        connection.reader().fill().await.unwrap();

        let mut response =
            ClientResponse::builder(StatusCode::OK, header_map(&[("transfer-encoding", "chunked")]), connection)
                .build()
                .unwrap();

        // fully buffered, but chunked framing cannot be drained blind
        response.close();
        assert_eq!(released.load(Ordering::SeqCst), 0);
        assert_eq!(torn_down.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn close_after_partial_read_releases_when_the_wire_is_clean() {
        let (mut response, released, torn_down) = response(&[("content-length", "10")], b"0123456789");

        // one fill slurps the whole entity, the caller takes only part of it
        assert_eq!(&response.entity().read(4).await.unwrap().unwrap()[..], b"0123");

        response.close();
        assert_eq!(released.load(Ordering::SeqCst), 1);
        assert_eq!(torn_down.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn connection_close_header_forces_teardown() {
        let (mut response, released, torn_down) =
            response(&[("content-length", "0"), ("connection", "close")], b"");

        response.close();
        assert_eq!(released.load(Ordering::SeqCst), 0);
        assert_eq!(torn_down.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn close_is_idempotent() {
        let (mut response, released, torn_down) = response(&[], b"");

        response.close();
        response.close();
        response.close();

        assert_eq!(released.load(Ordering::SeqCst) + torn_down.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn reading_after_an_early_close_is_an_illegal_state() {
        let (mut response, _, _) = response(&[("content-length", "5")], b"hello");

        response.close();
        let err = response.entity().read(1024).await.unwrap_err();
        assert!(matches!(err, ClientError::IllegalState { .. }));
    }

    #[tokio::test]
    async fn completion_signal_fires_exactly_once() {
        let (connection, _, _) = TestConnection::new(b"");
        let (tx, mut rx) = oneshot::channel();

        let mut response = ClientResponse::builder(StatusCode::OK, header_map(&[]), connection)
            .completion(tx)
            .build()
            .unwrap();

        assert_eq!(rx.try_recv().unwrap(), None);

        response.close();
        response.close();
        assert_eq!(rx.try_recv().unwrap(), Some(()));
    }

    #[tokio::test]
    async fn abandoning_a_response_cancels_the_completion_signal() {
        let (connection, released, torn_down) = TestConnection::new(b"");
        let (tx, mut rx) = oneshot::channel::<()>();

        let response = ClientResponse::builder(StatusCode::OK, header_map(&[("content-length", "5")]), connection)
            .completion(tx)
            .build()
            .unwrap();
        drop(response);

        // the connection is dropped, neither pooled nor explicitly torn down
        assert!(rx.try_recv().is_err());
        assert_eq!(released.load(Ordering::SeqCst), 0);
        assert_eq!(torn_down.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn conflicting_framing_headers_fail_the_build() {
        let (connection, _, _) = TestConnection::new(b"");
        let headers = header_map(&[("content-length", "5"), ("transfer-encoding", "chunked")]);

        let result = ClientResponse::builder(StatusCode::OK, headers, connection).build();
        assert!(matches!(result, Err(ParseError::InvalidContentLength { .. })));
    }

    #[test]
    fn wants_close_scans_connection_tokens() {
        assert!(!wants_close(&header_map(&[])));
        assert!(!wants_close(&header_map(&[("connection", "keep-alive")])));

        assert!(wants_close(&header_map(&[("connection", "close")])));
        assert!(wants_close(&header_map(&[("connection", "Close")])));
        assert!(wants_close(&header_map(&[("connection", "TE, close")])));
        assert!(wants_close(&header_map(&[("connection", "keep-alive"), ("connection", "close")])));
    }
}
