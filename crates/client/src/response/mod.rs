//! Client response handling.
//!
//! This module owns the life of a response from the parsed head to the
//! moment the connection underneath is settled.
//!
//! # Components
//!
//! - [`ClientResponse`]: response head, entity state machine and the
//!   close/release decision
//!   - entity framing derived from the headers at build time
//!   - lazily parsed, memoized trailer block
//!   - idempotent close that never performs IO
//! - [`ResponseBuilder`]: assembles a response around a connection
//! - [`ResponseEntity`]: streaming read view over the entity
//! - [`wants_close`]: `Connection: close` token scan
//!
//! # Lifecycle
//!
//! A response starts with its entity unread. Requesting the entity locks
//! in consumption; reading it to the end parses declared trailers and
//! settles the connection automatically. Closing early settles it
//! immediately: released when the wire position provably sits at the end
//! of the message, torn down otherwise.

mod client_response;
mod entity;

pub use client_response::wants_close;
pub use client_response::ClientResponse;
pub use client_response::ResponseBuilder;
pub use entity::ResponseEntity;
