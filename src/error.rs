use std::io;
use std::net::SocketAddr;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ServerError>;

/// Fatal server errors.
///
/// Only conditions that prevent the loop from starting or force it to stop
/// surface here. Per-connection failures (accept, receive, send) are
/// transient: they are logged, affect at most the one connection involved,
/// and are never retried.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Bind or listen failed; the loop never starts.
    #[error("failed to bind listener on {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: io::Error,
    },

    /// The readiness poller could not be created.
    #[error("failed to create readiness poller: {0}")]
    PollInit(#[source] io::Error),

    /// A readiness poll failed for a reason other than "nothing ready";
    /// treated as a loop-termination signal.
    #[error("readiness poll failed: {0}")]
    Poll(#[source] io::Error),
}
