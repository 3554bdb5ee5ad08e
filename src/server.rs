use std::cell::{Cell, RefCell};
use std::io;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use mio::net::TcpListener;
use mio::Interest;
use socket2::{SockRef, TcpKeepalive};
use tracing::{debug, info, trace, warn};

use crate::buffer::{Drained, RecvBuffer};
use crate::config::ServerConfig;
use crate::conn::{ConnId, Connection};
use crate::error::{Result, ServerError};
use crate::hooks::ServerHooks;
use crate::poll::Poller;
use crate::registry::Registry;

/// Loop lifecycle. `Starting` until the startup hook has fired, `Running`
/// for the duration of the loop, `Stopped` after an exit request or a
/// fatal poll error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Starting,
    Running,
    Stopped,
}

/// Shared state and control operations exposed to hooks.
///
/// Lives on the loop thread. The exit flag is the only cross-thread piece,
/// shared with [`ShutdownHandle`].
pub struct ServerContext {
    exit: Arc<AtomicBool>,
    local_addr: SocketAddr,
    count: Cell<usize>,
    pending_close: RefCell<Vec<ConnId>>,
}

impl ServerContext {
    /// Requests loop termination. The loop observes the flag at the top of
    /// the next iteration; in-flight per-connection state is not rolled
    /// back, it simply stops being serviced.
    pub fn exit(&self) {
        self.exit.store(true, Ordering::SeqCst);
    }

    /// Queues a disconnect for `id`, applied during the cleanup phase of
    /// the current iteration. Closing from inside a hook for the
    /// connection currently being processed is safe: the connection is
    /// only marked, never destroyed mid-iteration.
    pub fn close(&self, id: ConnId) {
        self.pending_close.borrow_mut().push(id);
    }

    /// Number of admitted connections as of the current phase.
    pub fn connection_count(&self) -> usize {
        self.count.get()
    }

    /// The address the listener is actually bound to.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }
}

/// Thread-safe exit request, cloneable and usable from signal handlers or
/// other threads.
#[derive(Clone)]
pub struct ShutdownHandle {
    exit: Arc<AtomicBool>,
}

impl ShutdownHandle {
    /// Signals the loop to stop after the current iteration.
    pub fn shutdown(&self) {
        self.exit.store(true, Ordering::SeqCst);
    }
}

/// Single-threaded multi-client TCP server.
///
/// Owns the listening handle, the connection registry, one reusable
/// receive buffer, and the readiness poller. Each loop iteration performs,
/// in fixed order: accept one pending connection, service every ready
/// connection, remove connections marked closed, then yield briefly.
pub struct Server<H: ServerHooks> {
    listener: TcpListener,
    poller: Poller,
    registry: Registry,
    recv_buf: RecvBuffer,
    hooks: H,
    ctx: ServerContext,
    config: ServerConfig,
    state: LoopState,
}

impl<H: ServerHooks> Server<H> {
    /// Binds and listens without entering the loop. mio sockets are
    /// non-blocking from birth, so no mode switch is needed. Setup
    /// failures are surfaced, never swallowed.
    pub fn bind(config: ServerConfig, hooks: H) -> Result<Self> {
        let listener = TcpListener::bind(config.address).map_err(|source| ServerError::Bind {
            addr: config.address,
            source,
        })?;
        let local_addr = listener.local_addr().map_err(|source| ServerError::Bind {
            addr: config.address,
            source,
        })?;
        let poller = Poller::new(config.events_capacity).map_err(ServerError::PollInit)?;
        info!(%local_addr, "listening");

        Ok(Self {
            listener,
            poller,
            registry: Registry::new(),
            recv_buf: RecvBuffer::new(),
            hooks,
            ctx: ServerContext {
                exit: Arc::new(AtomicBool::new(false)),
                local_addr,
                count: Cell::new(0),
                pending_close: RefCell::new(Vec::new()),
            },
            config,
            state: LoopState::Starting,
        })
    }

    /// One-call form: binds every interface on `port` and runs until an
    /// exit request, mirroring a construct-and-serve style entry point.
    pub fn serve(port: u16, hooks: H) -> Result<()> {
        Self::bind(ServerConfig::for_port(port), hooks)?.run()
    }

    /// The address the listener is actually bound to (relevant with
    /// port 0).
    pub fn local_addr(&self) -> SocketAddr {
        self.ctx.local_addr
    }

    /// A cloneable handle for stopping the loop from another thread.
    pub fn shutdown_handle(&self) -> ShutdownHandle {
        ShutdownHandle {
            exit: Arc::clone(&self.ctx.exit),
        }
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    /// Runs the loop until an exit request or a fatal poll error. Either
    /// way every remaining connection is torn down through the cleanup
    /// path before this returns.
    pub fn run(&mut self) -> Result<()> {
        self.hooks.on_startup(&self.ctx);
        self.state = LoopState::Running;

        let result = loop {
            if self.ctx.exit.load(Ordering::SeqCst) {
                break Ok(());
            }
            self.accept_phase();
            if let Err(e) = self.data_phase() {
                warn!(error = %e, "fatal poll error, stopping");
                break Err(e);
            }
            self.cleanup_phase();
            thread::sleep(self.config.tick_interval);
        };

        self.state = LoopState::Stopped;
        self.teardown();
        result
    }

    /// At most one accept per iteration keeps per-tick work bounded; a
    /// backlog drains across subsequent ticks.
    fn accept_phase(&mut self) {
        match self.listener.accept() {
            Ok((stream, peer)) => {
                let id = self.registry.next_id();
                let mut conn = Connection::new(stream, peer, id);
                self.ctx.count.set(self.registry.len());

                if self.hooks.on_client_connect(&self.ctx, &mut conn) {
                    self.configure_transport(&conn);
                    if let Err(e) = self.poller.register(
                        &mut conn.stream,
                        id.token(),
                        Interest::READABLE,
                    ) {
                        warn!(conn = %id, error = %e, "poller registration failed, dropping connection");
                        return;
                    }
                    debug!(conn = %id, %peer, "client admitted");
                    self.registry.insert(conn);
                    self.ctx.count.set(self.registry.len());
                } else {
                    debug!(%peer, "client rejected by connect hook");
                    // anything the hook sent is already on the wire;
                    // dropping the stream closes the transport
                    conn.close();
                }
            }
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => {}
            Err(e) => warn!(error = %e, "accept failed"),
        }
    }

    /// One zero-wait poll, then one pass over a snapshot of the registry
    /// in insertion order. Each ready connection gets exactly one message
    /// delivery with everything its transport had buffered.
    fn data_phase(&mut self) -> Result<()> {
        self.poller.poll_ready().map_err(ServerError::Poll)?;
        self.ctx.count.set(self.registry.len());

        for id in self.registry.ids() {
            if !self.poller.take_ready(id.token()) {
                continue;
            }
            let Some(conn) = self.registry.get_mut(id) else {
                continue;
            };
            // closed by an earlier hook this tick: no further read events
            if !conn.is_open() {
                continue;
            }

            match self.recv_buf.drain(&mut conn.stream) {
                Ok(Drained::Data { len, eof }) => {
                    trace!(conn = %id, len, "message assembled");
                    self.hooks.on_message(&self.ctx, conn, self.recv_buf.bytes());
                    self.recv_buf.reset();
                    if eof {
                        self.disconnect(id);
                    }
                }
                Ok(Drained::Closed) => {
                    self.disconnect(id);
                }
                Ok(Drained::Empty) => {}
                Err(e) => {
                    warn!(conn = %id, error = %e, "receive failed, closing connection");
                    self.disconnect(id);
                }
            }
        }
        Ok(())
    }

    /// Applies deferred close requests, then removes every connection
    /// marked closed-pending-removal. This is the only point a connection
    /// is destroyed, so nothing earlier in the iteration can hold a
    /// reference to a freed connection.
    fn cleanup_phase(&mut self) {
        let pending: Vec<ConnId> = self.ctx.pending_close.borrow_mut().drain(..).collect();
        for id in pending {
            if let Some(conn) = self.registry.get_mut(id) {
                conn.close();
            }
        }

        let hooks = &mut self.hooks;
        let ctx = &self.ctx;
        let poller = &mut self.poller;
        self.registry.sweep_closed(|conn| {
            if !conn.notified {
                conn.notified = true;
                hooks.on_client_disconnect(ctx, conn);
            }
            poller.forget(conn.id().token());
            if let Err(e) = poller.deregister(&mut conn.stream) {
                trace!(conn = %conn.id(), error = %e, "deregister on removal");
            }
            debug!(conn = %conn.id(), "connection removed");
        });
        self.ctx.count.set(self.registry.len());
    }

    /// Observed disconnect (peer EOF or receive error) during the data
    /// phase: notify first, while the transport is still up, then shut it
    /// down. Removal itself waits for the cleanup phase.
    fn disconnect(&mut self, id: ConnId) {
        let Some(conn) = self.registry.get_mut(id) else {
            return;
        };
        if !conn.notified {
            conn.notified = true;
            self.hooks.on_client_disconnect(&self.ctx, conn);
        }
        let Some(conn) = self.registry.get_mut(id) else {
            return;
        };
        conn.close();
        debug!(conn = %id, "client disconnected");
    }

    /// Loop exit: every remaining connection leaves through the same
    /// cleanup path, disconnect notifications included.
    fn teardown(&mut self) {
        for id in self.registry.ids() {
            if let Some(conn) = self.registry.get_mut(id) {
                conn.close();
            }
        }
        self.cleanup_phase();
        info!("server stopped");
    }

    /// Keep-alive probing so half-dead peers are eventually detected, plus
    /// optional TCP_NODELAY. Failures here are transient and do not block
    /// admission.
    fn configure_transport(&self, conn: &Connection) {
        let sock = SockRef::from(&conn.stream);
        if let Some(probe) = &self.config.keepalive {
            let keepalive = TcpKeepalive::new()
                .with_time(probe.idle)
                .with_interval(probe.interval)
                .with_retries(probe.retries);
            if let Err(e) = sock.set_tcp_keepalive(&keepalive) {
                warn!(conn = %conn.id(), error = %e, "keepalive setup failed");
            }
        }
        if self.config.nodelay {
            if let Err(e) = sock.set_nodelay(true) {
                warn!(conn = %conn.id(), error = %e, "nodelay setup failed");
            }
        }
    }
}
