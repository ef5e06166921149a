//! Client connection handling.
//!
//! This module provides the reading side of an established connection and
//! the ownership contract that decides what happens to the connection once
//! its response is done.
//!
//! # Components
//!
//! - [`ConnectionReader`]: buffered reader driving decoders over one
//!   shared buffer
//!   - refills from the transport only when a decoder needs more
//!   - exposes buffered bytes for IO-free draining
//! - [`ClientConnection`]: ownership seam toward connection pools
//!   - consuming `release` and `close` dispositions
//!   - implemented by whatever hands out connections, not by this crate

mod client_connection;
mod reader;

pub use client_connection::ClientConnection;
pub use reader::ConnectionReader;
