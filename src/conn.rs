use std::fmt;
use std::io::{self, Write};
use std::net::{Shutdown, SocketAddr};

use mio::net::TcpStream;
use mio::Token;
use tracing::{debug, warn};

/// Unique identifier for an admitted connection. Doubles as its poll token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnId(pub(crate) usize);

impl ConnId {
    pub fn as_usize(&self) -> usize {
        self.0
    }

    pub(crate) fn token(&self) -> Token {
        Token(self.0)
    }
}

impl fmt::Display for ConnId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One admitted client connection.
///
/// Owns the transport handle and the peer address. A connection is either
/// open or closed-pending-removal; a closed one keeps its registry slot
/// until the cleanup phase of the iteration that observed the close, which
/// is the only point a connection is ever destroyed.
pub struct Connection {
    pub(crate) stream: TcpStream,
    id: ConnId,
    peer: SocketAddr,
    open: bool,
    /// Disconnect hook already fired for this connection.
    pub(crate) notified: bool,
}

impl Connection {
    pub(crate) fn new(stream: TcpStream, peer: SocketAddr, id: ConnId) -> Self {
        Self {
            stream,
            id,
            peer,
            open: true,
            notified: false,
        }
    }

    pub fn id(&self) -> ConnId {
        self.id
    }

    /// Peer address as reported at accept time.
    pub fn peer_addr(&self) -> SocketAddr {
        self.peer
    }

    /// False once the connection is closed-pending-removal.
    pub fn is_open(&self) -> bool {
        self.open
    }

    /// Best-effort raw-byte transmit.
    ///
    /// Payloads are opaque byte sequences: the core adds no framing and no
    /// terminator; any text convention belongs to the application hooks.
    /// Sending on a closed connection is a no-op with no delivery
    /// guarantee. A hard I/O error marks the connection
    /// closed-pending-removal.
    pub fn send(&mut self, data: &[u8]) {
        if !self.open {
            return;
        }
        match self.stream.write_all(data) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => {
                debug!(conn = %self.id, "socket buffer full, dropping rest of payload");
            }
            Err(e) => {
                warn!(conn = %self.id, error = %e, "send failed, closing connection");
                self.close();
            }
        }
    }

    /// Requests disconnection: shuts the transport down and marks the
    /// connection closed-pending-removal. The object itself is only
    /// removed from the registry during the cleanup phase, never here.
    /// Idempotent.
    pub fn close(&mut self) {
        if !self.open {
            return;
        }
        self.open = false;
        if let Err(e) = self.stream.shutdown(Shutdown::Both) {
            debug!(conn = %self.id, error = %e, "transport shutdown");
        }
    }
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("id", &self.id)
            .field("peer", &self.peer)
            .field("open", &self.open)
            .finish()
    }
}
