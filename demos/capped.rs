//! Capacity-capped variant of the echo server: admits at most three
//! clients at a time; later arrivals get a rejection message and an
//! immediate close.
//!
//! Run with `cargo run --example capped [port]`.

use shoal::{Connection, Result, Server, ServerContext, ServerHooks};
use tracing::info;

const MAX_ONLINE: usize = 3;

struct CappedHooks;

impl ServerHooks for CappedHooks {
    fn on_startup(&mut self, ctx: &ServerContext) {
        info!(addr = %ctx.local_addr(), max = MAX_ONLINE, "server is running");
    }

    fn on_client_connect(&mut self, ctx: &ServerContext, conn: &mut Connection) -> bool {
        if ctx.connection_count() < MAX_ONLINE {
            info!(peer = %conn.peer_addr(), "client connected");
            conn.send(format!("[SERVER] Welcome, {}\n", conn.peer_addr()).as_bytes());
            true
        } else {
            info!(peer = %conn.peer_addr(), "rejected, server reached max online");
            conn.send(b"[SERVER] Reached maximum online.\n");
            false
        }
    }

    fn on_message(&mut self, _ctx: &ServerContext, conn: &mut Connection, data: &[u8]) {
        let text = String::from_utf8_lossy(data);
        info!(peer = %conn.peer_addr(), data = %text.trim_end(), "message");
        conn.send(format!("[SERVER] You've sent: {}", text).as_bytes());
    }

    fn on_client_disconnect(&mut self, _ctx: &ServerContext, conn: &mut Connection) {
        info!(peer = %conn.peer_addr(), "client disconnected");
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let port = std::env::args()
        .nth(1)
        .and_then(|p| p.parse().ok())
        .unwrap_or(2227);

    Server::serve(port, CappedHooks)
}
