use crate::conn::Connection;
use crate::server::ServerContext;

/// Application callbacks invoked by the event loop.
///
/// All hooks run synchronously on the loop thread; a hook that blocks
/// stalls service for every connection. Default bodies admit every client
/// and ignore every other event, so implementors override only what they
/// need.
///
/// Hooks receive a [`ServerContext`] capability for shared state (current
/// connection count, bound address) and control operations (`exit`,
/// deferred `close`) instead of a reference back into the server itself.
pub trait ServerHooks {
    /// Fired once after bind/listen and non-blocking setup succeed, before
    /// the first loop iteration.
    fn on_startup(&mut self, ctx: &ServerContext) {
        let _ = ctx;
    }

    /// Fired per accepted transport before it is admitted. Return `false`
    /// to reject: the transport is closed immediately and the connection
    /// never enters the registry. Bytes sent to the peer from inside this
    /// hook are delivered before the close.
    fn on_client_connect(&mut self, ctx: &ServerContext, conn: &mut Connection) -> bool {
        let _ = (ctx, conn);
        true
    }

    /// Fired at most once per iteration per connection that had data
    /// pending, with everything the transport had buffered at that point,
    /// concatenated in arrival order. Payloads are opaque byte sequences;
    /// decoding and framing conventions belong here, not in the core.
    fn on_message(&mut self, ctx: &ServerContext, conn: &mut Connection, data: &[u8]) {
        let _ = (ctx, conn, data);
    }

    /// Fired exactly once when a connection stops being serviced: peer
    /// disconnect, receive error, or an application-requested close. Runs
    /// before the transport is torn down, so the peer address is still
    /// available.
    fn on_client_disconnect(&mut self, ctx: &ServerContext, conn: &mut Connection) {
        let _ = (ctx, conn);
    }
}
