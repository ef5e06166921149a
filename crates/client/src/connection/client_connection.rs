//! Connection ownership seam between responses and connection pools.

use tokio::io::AsyncRead;

use super::ConnectionReader;

/// An established client connection owned by one in-flight response.
///
/// A response reads from the connection through [`reader`](Self::reader)
/// and finally disposes of it through exactly one of the two consuming
/// methods. Which one is chosen decides reuse: [`release`](Self::release)
/// hands the connection back to whatever pool issued it,
/// [`close`](Self::close) tears it down.
///
/// Both dispositions consume `self`, so the type system rules out reading
/// from a connection that was already given away. Implementations should
/// not block in either method; a pool that needs async teardown can spawn
/// it.
pub trait ClientConnection {
    /// Transport type behind the reading half.
    type Io: AsyncRead + Unpin;

    /// The buffered reader over the receiving half of this connection.
    fn reader(&mut self) -> &mut ConnectionReader<Self::Io>;

    /// Consumes the connection and hands it back for reuse.
    ///
    /// Only call this when the whole response, trailers included, has
    /// been taken off the wire. Anything still in flight would be read by
    /// the next borrower as the start of its response.
    fn release(self);

    /// Consumes the connection and tears it down.
    fn close(self);
}
