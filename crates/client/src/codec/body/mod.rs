//! Response entity decoding.
//!
//! This module decodes HTTP message entities using the framing the response
//! headers announced, either a fixed content length or chunked transfer
//! encoding.
//!
//! # Components
//!
//! - [`EntityDecoder`]: entry point dispatching between framing strategies
//! - `LengthDecoder`: counts down a declared `content-length`
//! - `ChunkedDecoder`: chunked transfer encoding state machine, optionally
//!   stopping before the trailer section
//!
//! # Features
//!
//! - Streaming decoding, chunks surface as soon as they are buffered
//! - Chunk extensions are skipped, oversized chunk sizes are rejected
//! - Trailer bytes can be consumed or preserved for a header decoder

mod chunked_decoder;
mod entity_decoder;
mod length_decoder;

pub use entity_decoder::EntityDecoder;
