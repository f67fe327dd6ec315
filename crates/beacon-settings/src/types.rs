//! Settings types.

use beacon_core::logging::LogFormat;
use serde::{Deserialize, Serialize};

/// Root settings object.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BeaconSettings {
    /// Listener and connection limits.
    pub server: ServerSettings,
    /// Log output.
    pub logging: LoggingSettings,
}

/// Listener and connection limits.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    /// Address to bind.
    pub host: String,
    /// Port to bind (`0` picks an ephemeral port).
    pub port: u16,
    /// Upgrades are refused with 503 once this many sessions are registered.
    pub max_connections: usize,
    /// Largest inbound WebSocket message accepted, in bytes.
    pub max_message_size: usize,
    /// Per-session outbound queue length. A peer that falls this far behind
    /// is disconnected.
    pub outbound_queue_capacity: usize,
    /// How long shutdown waits for the listener to drain.
    pub shutdown_timeout_secs: u64,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".into(),
            port: 1123,
            max_connections: 1024,
            max_message_size: 64 * 1024,
            outbound_queue_capacity: 1024,
            shutdown_timeout_secs: 5,
        }
    }
}

/// Log output.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// `EnvFilter` directive used when `RUST_LOG` is unset.
    pub level: String,
    /// Line format.
    pub format: LogFormat,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".into(),
            format: LogFormat::Compact,
        }
    }
}
