//! # Shoal
//! A minimal single-threaded multi-client TCP server core built on
//! non-blocking readiness polling, without threads, locks, or an async
//! runtime.
//!
//! Shoal services every connection from one thread: each loop iteration
//! accepts at most one pending connection, performs a zero-wait readiness
//! poll, drains every ready connection into one contiguous delivery for the
//! application, prunes dead connections, and yields briefly. Application
//! logic lives entirely in a set of injected hooks.
//!
//! ## Core Philosophy
//! Shoal is for servers that want:
//! - **One thread, no locks**: hooks run synchronously on the loop thread,
//!   so shared state needs no synchronization by construction
//! - **Raw byte transport**: payloads are opaque byte sequences; framing
//!   and encoding conventions belong to the application
//! - **Predictable lifecycles**: connections are destroyed at exactly one
//!   point in the loop, never mid-iteration
//!
//! ## Architecture Overview
//! ```text
//! ┌────────────┐   accept    ┌────────────┐   readiness   ┌──────────┐
//! │  Server    │────────────▶│  Registry  │◀──────────────│  Poller  │
//! │  (loop)    │             │ (ordered)  │               │ (mio)    │
//! └─────┬──────┘             └─────┬──────┘               └──────────┘
//!       │ drain                    │ service in insertion order
//!       ▼                          ▼
//! ┌────────────┐   bytes     ┌────────────┐
//! │ RecvBuffer │────────────▶│ServerHooks │
//! │ (reused)   │             │ (app code) │
//! └────────────┘             └────────────┘
//! ```
//!
//! Each iteration runs four phases in fixed order:
//! 1. **Accept**: one non-blocking accept; the connect hook admits or
//!    rejects the client
//! 2. **Data**: every ready connection is drained completely and delivered
//!    to the message hook as one concatenated payload
//! 3. **Cleanup**: connections marked closed are removed, the sole
//!    destruction point
//! 4. **Yield**: a short sleep keeps the polling loop off a pegged core
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use shoal::{Connection, Server, ServerContext, ServerHooks};
//!
//! struct Echo;
//!
//! impl ServerHooks for Echo {
//!     fn on_message(&mut self, _ctx: &ServerContext, conn: &mut Connection, data: &[u8]) {
//!         conn.send(data);
//!     }
//! }
//!
//! fn main() -> shoal::Result<()> {
//!     // binds every interface on port 2227 and runs until exit
//!     Server::serve(2227, Echo)
//! }
//! ```
//!
//! Stopping from another thread:
//!
//! ```rust,no_run
//! use shoal::{Server, ServerConfig, ServerHooks};
//!
//! struct Quiet;
//! impl ServerHooks for Quiet {}
//!
//! # fn main() -> shoal::Result<()> {
//! let config = ServerConfig::builder()
//!     .address("127.0.0.1:0".parse().unwrap())
//!     .build();
//! let mut server = Server::bind(config, Quiet)?;
//! let handle = server.shutdown_handle();
//! std::thread::spawn(move || handle.shutdown());
//! server.run()
//! # }
//! ```
//!
//! - [`Server`]: the event loop driver
//! - [`ServerHooks`]: the four application callbacks
//! - [`Connection`]: per-client transport handle with `send`/`close`
//! - [`ServerConfig`]: builder-style configuration
//! - [`poll::Poller`]: zero-wait readiness queries
//! - [`buffer::RecvBuffer`]: the reusable drain buffer

pub mod buffer;
pub mod config;
pub mod conn;
pub mod error;
pub mod hooks;
pub mod poll;
pub mod registry;
pub mod server;

pub use config::{KeepaliveProbe, ServerConfig, ServerConfigBuilder};
pub use conn::{ConnId, Connection};
pub use error::{Result, ServerError};
pub use hooks::ServerHooks;
pub use server::{LoopState, Server, ServerContext, ShutdownHandle};

/// Re-exports of the commonly used types.
///
/// ```rust
/// use shoal::prelude::*;
/// ```
pub mod prelude {
    pub use crate::config::{KeepaliveProbe, ServerConfig};
    pub use crate::conn::{ConnId, Connection};
    pub use crate::error::{Result, ServerError};
    pub use crate::hooks::ServerHooks;
    pub use crate::server::{Server, ServerContext, ShutdownHandle};
}
