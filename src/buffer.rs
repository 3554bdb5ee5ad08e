use std::io::{self, Read};

use tracing::trace;

/// Bytes appended per receive call while draining.
const READ_CHUNK: usize = 4096;

/// Outcome of draining one ready handle.
#[derive(Debug, PartialEq, Eq)]
pub enum Drained {
    /// Nothing was pending after all (spurious readiness).
    Empty,
    /// `len` bytes were accumulated; `eof` is set when the peer's orderly
    /// shutdown was observed right behind the data.
    Data { len: usize, eof: bool },
    /// The peer performed an orderly shutdown with no data pending.
    Closed,
}

/// Growable receive buffer reused across drains.
///
/// One instance lives on the server and is logically reset before each
/// drain; the allocation is kept so steady traffic does not reallocate
/// every iteration. The loop is single-threaded, so sequential reuse
/// across connections needs no synchronization.
#[derive(Default)]
pub struct RecvBuffer {
    buf: Vec<u8>,
}

impl RecvBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// The bytes accumulated by the last [`drain`](Self::drain).
    pub fn bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Reads everything `src` currently has buffered into one contiguous
    /// delivery, growing as needed.
    ///
    /// Receive calls repeat until the transport reports `WouldBlock`, so a
    /// payload the OS split across several segments still arrives as a
    /// single delivery. A zero-byte read before any data is a peer
    /// disconnect; after data it is reported via [`Drained::Data::eof`].
    /// `Interrupted` reads are retried immediately; any other error is
    /// handed back to the caller.
    pub fn drain<R: Read>(&mut self, src: &mut R) -> io::Result<Drained> {
        self.buf.clear();
        loop {
            let used = self.buf.len();
            self.buf.resize(used + READ_CHUNK, 0);
            match src.read(&mut self.buf[used..]) {
                Ok(0) => {
                    self.buf.truncate(used);
                    return Ok(if used == 0 {
                        Drained::Closed
                    } else {
                        Drained::Data { len: used, eof: true }
                    });
                }
                Ok(n) => {
                    self.buf.truncate(used + n);
                    trace!(n, total = self.buf.len(), "drained chunk");
                }
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => {
                    self.buf.truncate(used);
                    return Ok(if used == 0 {
                        Drained::Empty
                    } else {
                        Drained::Data { len: used, eof: false }
                    });
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {
                    self.buf.truncate(used);
                }
                Err(e) => {
                    self.buf.truncate(used);
                    return Err(e);
                }
            }
        }
    }

    /// Empties the buffer, retaining capacity for the next drain.
    pub fn reset(&mut self) {
        self.buf.clear();
    }
}
