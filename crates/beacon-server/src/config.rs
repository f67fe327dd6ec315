//! Server configuration.

use std::time::Duration;

use beacon_settings::ServerSettings;
use serde::{Deserialize, Serialize};

/// Runtime configuration for [`BeaconServer`](crate::server::BeaconServer).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host to bind (default `"127.0.0.1"`).
    pub host: String,
    /// Port to bind (default `0` for auto-assign).
    pub port: u16,
    /// Upgrades are refused with 503 at this many registered sessions.
    pub max_connections: usize,
    /// Max inbound WebSocket message size in bytes.
    pub max_message_size: usize,
    /// Frames a session may have queued before it is treated as a slow peer.
    pub outbound_queue_capacity: usize,
    /// Grace period for draining tasks on shutdown, in seconds.
    pub shutdown_timeout_secs: u64,
}

impl ServerConfig {
    /// Shutdown grace period.
    pub const fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout_secs)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 0,
            max_connections: 1024,
            max_message_size: 64 * 1024,
            outbound_queue_capacity: 1024,
            shutdown_timeout_secs: 5,
        }
    }
}

impl From<&ServerSettings> for ServerConfig {
    fn from(settings: &ServerSettings) -> Self {
        Self {
            host: settings.host.clone(),
            port: settings.port,
            max_connections: settings.max_connections,
            max_message_size: settings.max_message_size,
            outbound_queue_capacity: settings.outbound_queue_capacity,
            shutdown_timeout_secs: settings.shutdown_timeout_secs,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_binds_loopback_ephemeral() {
        let cfg = ServerConfig::default();
        assert_eq!(cfg.host, "127.0.0.1");
        assert_eq!(cfg.port, 0);
    }

    #[test]
    fn default_limits() {
        let cfg = ServerConfig::default();
        assert_eq!(cfg.max_connections, 1024);
        assert_eq!(cfg.max_message_size, 65_536);
        assert_eq!(cfg.outbound_queue_capacity, 1024);
        assert_eq!(cfg.shutdown_timeout(), Duration::from_secs(5));
    }

    #[test]
    fn from_settings_copies_every_field() {
        let settings = ServerSettings {
            host: "0.0.0.0".into(),
            port: 1123,
            max_connections: 7,
            max_message_size: 512,
            outbound_queue_capacity: 16,
            shutdown_timeout_secs: 1,
        };
        let cfg = ServerConfig::from(&settings);
        assert_eq!(cfg.host, "0.0.0.0");
        assert_eq!(cfg.port, 1123);
        assert_eq!(cfg.max_connections, 7);
        assert_eq!(cfg.max_message_size, 512);
        assert_eq!(cfg.outbound_queue_capacity, 16);
        assert_eq!(cfg.shutdown_timeout_secs, 1);
    }

    #[test]
    fn serde_roundtrip() {
        let cfg = ServerConfig {
            port: 9090,
            ..ServerConfig::default()
        };
        let json = serde_json::to_string(&cfg).unwrap();
        let back: ServerConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, cfg);
    }
}
