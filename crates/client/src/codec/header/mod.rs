//! Header block decoding.
//!
//! This module parses bare CRLF-terminated header blocks, the shape a
//! chunked response's trailer section arrives in.
//!
//! # Components
//!
//! - [`HeaderBlockDecoder`]: decodes a block into a
//!   [`HeaderBlock`](crate::protocol::HeaderBlock)
//!   - field values stay byte windows until text is requested
//!   - enforces block size and field count limits
//!   - optional strict name and value byte validation

mod block_decoder;

pub use block_decoder::HeaderBlockDecoder;
pub use block_decoder::DEFAULT_MAX_BLOCK_BYTES;
