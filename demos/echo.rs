//! Welcome-and-echo server: greets each client with its own address and
//! echoes back whatever it sends.
//!
//! Run with `cargo run --example echo [port]`; talk to it with netcat.

use shoal::{Connection, Result, Server, ServerContext, ServerHooks};
use tracing::info;

struct EchoHooks;

impl ServerHooks for EchoHooks {
    fn on_startup(&mut self, ctx: &ServerContext) {
        info!(addr = %ctx.local_addr(), "server is running");
    }

    fn on_client_connect(&mut self, _ctx: &ServerContext, conn: &mut Connection) -> bool {
        info!(peer = %conn.peer_addr(), "client connected");
        conn.send(format!("[SERVER] Welcome, {}\n", conn.peer_addr()).as_bytes());
        true
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

    Server::serve(port, EchoHooks)
}
