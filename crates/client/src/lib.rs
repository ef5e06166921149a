//! HTTP/1.x client response and entity lifecycle handling
//!
//! This crate covers the receiving side of an HTTP/1.x client exchange: it
//! takes over after the status line and headers of a response have been
//! parsed, reads the entity according to the framing the headers announced,
//! parses trailers, and decides whether the connection underneath can be
//! reused or has to be torn down.
//!
//! # Features
//!
//! - Content-Length and chunked transfer decoding over one shared buffer
//! - Lazily parsed, memoized trailer blocks
//! - Lazily materialized header values backed by byte windows
//! - An idempotent close that never performs IO: an unread entity is
//!   drained only when all of it is already buffered
//! - Connection disposition through a pool-agnostic ownership trait
//! - Single-fire completion signal for pool bookkeeping
//!
//! # Example
//!
//! ```no_run
//! use http::{HeaderMap, StatusCode};
//! use joist_client::connection::{ClientConnection, ConnectionReader};
//! use joist_client::response::ClientResponse;
//! use tokio::net::tcp::OwnedReadHalf;
//! use tracing::{info, Level};
//! use tracing_subscriber::FmtSubscriber;
//!
//! struct PooledConnection {
//!     reader: ConnectionReader<OwnedReadHalf>,
//! }
//!
//! impl ClientConnection for PooledConnection {
//!     type Io = OwnedReadHalf;
//!
//!     fn reader(&mut self) -> &mut ConnectionReader<OwnedReadHalf> {
//!         &mut self.reader
//!     }
//!
//!     fn release(self) {
//!         info!("connection handed back to the pool");
//!     }
//!
//!     fn close(self) {
//!         info!("connection torn down");
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Initialize logging
//!     let subscriber = FmtSubscriber::builder()
//!         .with_max_level(Level::INFO)
//!         .finish();
//!     tracing::subscriber::set_global_default(subscriber)?;
//!
//!     let stream = tokio::net::TcpStream::connect("127.0.0.1:8080").await?;
//!     let (read_half, _write_half) = stream.into_split();
//!
//!     // ... send the request over the write half,
//!     //     parse the status line and headers off the read half ...
//!     let (status, headers) = (StatusCode::OK, HeaderMap::new());
//!
//!     let connection = PooledConnection { reader: ConnectionReader::new(read_half) };
//!     let mut response = ClientResponse::builder(status, headers, connection).build()?;
//!
//!     let mut entity = response.entity();
//!     while let Some(chunk) = entity.read(8 * 1024).await? {
//!         info!(bytes = chunk.len(), "read entity chunk");
//!     }
//!
//!     let trailers = response.trailers().await?;
//!     info!(trailer_fields = trailers.len(), "response finished");
//!     Ok(())
//! }
//! ```
//!
//! # Architecture
//!
//! The crate is organized into several key modules:
//!
//! - [`response`]: Response lifecycle, entity reading and connection
//!   disposition
//! - [`connection`]: Buffered connection reader and the ownership trait
//!   toward pools
//! - [`codec`]: Entity framing and header block decoders
//! - [`protocol`]: Protocol types and error handling
//!
//! # Core Components
//!
//! ## Connection Disposition
//!
//! One in-flight [`response::ClientResponse`] owns its connection. On close
//! it either releases the connection for reuse or tears it down, based on
//! the `Connection` header, whether the entity was fully read, and whether
//! what remains of the entity is already buffered. The decision itself
//! never blocks: draining only ever consumes buffered bytes.
//!
//! ## Entity Streaming
//!
//! Entities are read through [`response::ResponseEntity`], which yields
//! byte chunks as they are decoded. Reaching the end of the entity parses
//! declared trailers and settles the connection automatically.
//!
//! ## Trailers
//!
//! Trailer fields of chunked responses are decoded into a
//! [`protocol::HeaderBlock`] whose values stay byte windows until text is
//! requested. Trailers are only readable after the entity was requested,
//! asking earlier is reported as an illegal state.
//!
//! ## Error Handling
//!
//! The crate uses custom error types that implement `std::error::Error`:
//!
//! - [`protocol::ClientError`]: Top-level error type
//! - [`protocol::ParseError`]: Wire-level decoding errors
//!
//! # Limitations
//!
//! - HTTP/1.x responses only
//! - Request sending and response head parsing live outside this crate
//! - Maximum header block size: 8KB by default
//! - Maximum number of fields per block: 64

pub mod codec;
pub mod connection;
pub mod protocol;
pub mod response;

mod utils;
pub(crate) use utils::ensure;
