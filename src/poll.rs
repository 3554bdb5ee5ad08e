use std::collections::HashSet;
use std::io;
use std::time::Duration;

use mio::event::Source;
use mio::{Events, Interest, Poll, Token};

/// Zero-wait readiness poller.
///
/// Wraps [`mio::Poll`] behind the narrow query the server loop needs: which
/// registered handles currently have data pending. The query never blocks;
/// the loop polls cooperatively every iteration and paces itself with its
/// own yield step rather than sleeping inside the OS poll call.
///
/// Readiness is edge-driven underneath, so the loop must drain a ready
/// handle completely before the next edge can fire. Error and read-closed
/// conditions are folded into read-readiness: the subsequent receive on the
/// handle reports the exact condition.
pub struct Poller {
    poll: Poll,
    events: Events,
    ready: HashSet<Token>,
}

impl Poller {
    pub fn new(events_capacity: usize) -> io::Result<Self> {
        Ok(Self {
            poll: Poll::new()?,
            events: Events::with_capacity(events_capacity),
            ready: HashSet::new(),
        })
    }

    /// Registers a handle for readiness tracking under `token`.
    pub fn register<S>(&self, source: &mut S, token: Token, interests: Interest) -> io::Result<()>
    where
        S: Source + ?Sized,
    {
        source.register(self.poll.registry(), token, interests)
    }

    /// Removes a handle from readiness tracking.
    pub fn deregister<S>(&self, source: &mut S) -> io::Result<()>
    where
        S: Source + ?Sized,
    {
        source.deregister(self.poll.registry())
    }

    /// Collects newly satisfied readiness into the current set without
    /// blocking. `Interrupted` counts as "nothing ready this tick"; any
    /// other poll failure is returned and terminates the loop.
    pub fn poll_ready(&mut self) -> io::Result<()> {
        match self.poll.poll(&mut self.events, Some(Duration::ZERO)) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::Interrupted => return Ok(()),
            Err(e) => return Err(e),
        }
        for event in self.events.iter() {
            if event.is_readable() || event.is_read_closed() || event.is_error() {
                self.ready.insert(event.token());
            }
        }
        Ok(())
    }

    /// Whether `token` is read-ready as of the last `poll_ready`.
    pub fn is_ready(&self, token: Token) -> bool {
        self.ready.contains(&token)
    }

    /// Consumes the readiness of `token`, returning whether it was set.
    pub fn take_ready(&mut self, token: Token) -> bool {
        self.ready.remove(&token)
    }

    /// Discards any pending readiness for `token`. Used when a handle
    /// leaves the registry.
    pub fn forget(&mut self, token: Token) {
        self.ready.remove(&token);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::net::TcpListener as StdListener;
    use std::thread;

    fn nonblocking_pair() -> (mio::net::TcpStream, std::net::TcpStream) {
        let listener = StdListener::bind("127.0.0.1:0").unwrap();
        let peer = std::net::TcpStream::connect(listener.local_addr().unwrap()).unwrap();
        let (accepted, _) = listener.accept().unwrap();
        accepted.set_nonblocking(true).unwrap();
        (mio::net::TcpStream::from_std(accepted), peer)
    }

    #[test]
    fn quiet_handle_is_not_ready() {
        let mut poller = Poller::new(64).unwrap();
        let (mut stream, _peer) = nonblocking_pair();
        let token = Token(7);
        poller
            .register(&mut stream, token, Interest::READABLE)
            .unwrap();

        poller.poll_ready().unwrap();
        assert!(!poller.is_ready(token));
    }

    #[test]
    fn pending_bytes_make_handle_ready() {
        let mut poller = Poller::new(64).unwrap();
        let (mut stream, mut peer) = nonblocking_pair();
        let token = Token(3);
        poller
            .register(&mut stream, token, Interest::READABLE)
            .unwrap();

        peer.write_all(b"hello").unwrap();

        // zero-wait query, so give the kernel a moment to surface the edge
        for _ in 0..200 {
            poller.poll_ready().unwrap();
            if poller.is_ready(token) {
                break;
            }
            thread::sleep(Duration::from_millis(5));
        }
        assert!(poller.is_ready(token));

        assert!(poller.take_ready(token));
        assert!(!poller.is_ready(token));
    }

    #[test]
    fn forget_clears_pending_readiness() {
        let mut poller = Poller::new(64).unwrap();
        let (mut stream, mut peer) = nonblocking_pair();
        let token = Token(9);
        poller
            .register(&mut stream, token, Interest::READABLE)
            .unwrap();

        peer.write_all(b"x").unwrap();
        for _ in 0..200 {
            poller.poll_ready().unwrap();
            if poller.is_ready(token) {
                break;
            }
            thread::sleep(Duration::from_millis(5));
        }

        poller.forget(token);
        assert!(!poller.is_ready(token));
    }
}
