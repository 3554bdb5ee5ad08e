use std::net::{Ipv4Addr, SocketAddr};
use std::time::Duration;

/// SO_KEEPALIVE probe parameters applied to each admitted transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeepaliveProbe {
    /// Idle time before the first probe.
    pub idle: Duration,
    /// Interval between probes.
    pub interval: Duration,
    /// Unanswered probes before the connection is considered dead.
    pub retries: u32,
}

impl Default for KeepaliveProbe {
    fn default() -> Self {
        Self {
            idle: Duration::from_secs(1),
            interval: Duration::from_secs(5),
            retries: 3,
        }
    }
}

/// Configuration for the server loop.
///
/// Controls the bind address, loop pacing, and per-connection socket
/// options. Use [`ServerConfig::builder`] for ergonomic construction.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind to.
    pub address: SocketAddr,
    /// Cooperative yield between loop iterations. The loop never sleeps in
    /// the OS poll call, so this is the only pacing knob.
    pub tick_interval: Duration,
    /// Keep-alive probing for admitted connections, `None` to leave the OS
    /// defaults in place.
    pub keepalive: Option<KeepaliveProbe>,
    /// Enable TCP_NODELAY on admitted connections.
    pub nodelay: bool,
    /// Maximum number of readiness events collected per poll.
    pub events_capacity: usize,
}

impl ServerConfig {
    /// Create a new builder for `ServerConfig`.
    pub fn builder() -> ServerConfigBuilder {
        ServerConfigBuilder::new()
    }

    /// Configuration for binding every interface on `port`.
    pub fn for_port(port: u16) -> Self {
        Self::builder()
            .address(SocketAddr::from((Ipv4Addr::UNSPECIFIED, port)))
            .build()
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            address: SocketAddr::from((Ipv4Addr::UNSPECIFIED, 0)),
            tick_interval: Duration::from_millis(1),
            keepalive: Some(KeepaliveProbe::default()),
            nodelay: false,
            events_capacity: 1024,
        }
    }
}

/// Builder for [`ServerConfig`].
///
/// All fields are optional and fall back to [`ServerConfig::default`] when
/// not explicitly set.
pub struct ServerConfigBuilder {
    address: Option<SocketAddr>,
    tick_interval: Option<Duration>,
    keepalive: Option<Option<KeepaliveProbe>>,
    nodelay: Option<bool>,
    events_capacity: Option<usize>,
}

impl ServerConfigBuilder {
    pub fn new() -> Self {
        Self {
            address: None,
            tick_interval: None,
            keepalive: None,
            nodelay: None,
            events_capacity: None,
        }
    }

    /// Set the address to bind to.
    pub fn address(mut self, address: SocketAddr) -> Self {
        self.address = Some(address);
        self
    }

    /// Set the cooperative yield between iterations.
    pub fn tick_interval(mut self, interval: Duration) -> Self {
        self.tick_interval = Some(interval);
        self
    }

    /// Set or disable keep-alive probing.
    pub fn keepalive(mut self, probe: Option<KeepaliveProbe>) -> Self {
        self.keepalive = Some(probe);
        self
    }

    /// Enable or disable TCP_NODELAY.
    pub fn nodelay(mut self, enabled: bool) -> Self {
        self.nodelay = Some(enabled);
        self
    }

    /// Set the readiness event capacity per poll.
    pub fn events_capacity(mut self, capacity: usize) -> Self {
        self.events_capacity = Some(capacity);
        self
    }

    /// Build the `ServerConfig`.
    pub fn build(self) -> ServerConfig {
        let default = ServerConfig::default();
        ServerConfig {
            address: self.address.unwrap_or(default.address),
            tick_interval: self.tick_interval.unwrap_or(default.tick_interval),
            keepalive: self.keepalive.unwrap_or(default.keepalive),
            nodelay: self.nodelay.unwrap_or(default.nodelay),
            events_capacity: self.events_capacity.unwrap_or(default.events_capacity),
        }
    }
}

impl Default for ServerConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_falls_back_to_defaults() {
        let config = ServerConfig::builder().build();
        assert_eq!(config.tick_interval, Duration::from_millis(1));
        assert_eq!(config.events_capacity, 1024);
        assert!(!config.nodelay);
        assert_eq!(config.keepalive, Some(KeepaliveProbe::default()));
    }

    #[test]
    fn builder_overrides_stick() {
        let config = ServerConfig::builder()
            .address("127.0.0.1:9000".parse().unwrap())
            .tick_interval(Duration::from_millis(5))
            .keepalive(None)
            .nodelay(true)
            .build();
        assert_eq!(config.address.port(), 9000);
        assert_eq!(config.tick_interval, Duration::from_millis(5));
        assert!(config.keepalive.is_none());
        assert!(config.nodelay);
    }

    #[test]
    fn for_port_binds_all_interfaces() {
        let config = ServerConfig::for_port(2227);
        assert_eq!(config.address.port(), 2227);
        assert!(config.address.ip().is_unspecified());
    }
}
