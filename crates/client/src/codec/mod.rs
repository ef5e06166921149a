//! Wire format decoders for the client side of HTTP/1.x.
//!
//! This module provides streaming decoders for the parts of a response that
//! arrive after the status line and headers: the entity and, for chunked
//! responses, the trailer section.
//!
//! # Architecture
//!
//! Decoders implement [`tokio_util::codec::Decoder`] and are driven by the
//! connection reader over one shared buffer:
//!
//! - Entity decoding via the [`body`] module
//! - Trailer block decoding via the [`header`] module
//!
//! # Features
//!
//! - Streaming processing of entities of either framing
//! - Chunked transfer decoding with trailer hand-off
//! - Size limit enforcement on header blocks

pub mod body;
pub mod header;
