//! Core protocol abstractions for client response handling.
//!
//! This module provides the building blocks the rest of the crate works
//! with: entity framing and streaming items, lazily materialized header
//! values, trailer blocks and error types.
//!
//! # Architecture
//!
//! - **Entity framing** ([`entity`]): size negotiation and stream items
//!   - [`EntitySize`]: framing resolved from response headers
//!   - [`EntityItem`]: a decoded chunk or the end of the entity
//!
//! - **Header data** ([`headers`], [`lazy_string`]): cheap header access
//!   - [`HeaderBlock`]: an ordered block of fields, used for trailers
//!   - [`LazyString`]: a byte window that becomes a string at most once
//!
//! - **Error handling** ([`error`]): error types
//!   - [`ClientError`]: top-level error covering parse, state and io
//!   - [`ParseError`]: wire-level decoding errors
//!
//! The framing rules follow RFC 9112; where the response headers are
//! contradictory (both Content-Length and Transfer-Encoding) the message is
//! refused rather than guessed at.

mod entity;
pub use entity::EntityItem;
pub use entity::EntitySize;

mod error;
pub use error::ClientError;
pub use error::ParseError;

mod headers;
pub use headers::HeaderBlock;

mod lazy_string;
pub use lazy_string::LazyString;
