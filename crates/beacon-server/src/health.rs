//! `/health` endpoint.

use std::time::Instant;

use beacon_core::SessionId;
use serde::Serialize;

/// Health check response body.
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// `"ok"`, or `"full"` once the connection limit is reached.
    pub status: &'static str,
    /// Seconds since the server started.
    pub uptime_secs: u64,
    /// Registered sessions.
    pub sessions: usize,
    /// Upgrades are refused at this many sessions.
    pub max_connections: usize,
    /// Highest id handed out so far; `null` until the first peer joins.
    pub last_issued: Option<SessionId>,
}

impl HealthResponse {
    /// Whether `/ws` would currently accept an upgrade.
    pub fn accepting(&self) -> bool {
        self.sessions < self.max_connections
    }
}

/// Build a health response from the coordinator's published counters.
pub fn health_check(
    start_time: Instant,
    sessions: usize,
    max_connections: usize,
    last_issued: Option<SessionId>,
) -> HealthResponse {
    let status = if sessions < max_connections { "ok" } else { "full" };
    HealthResponse {
        status,
        uptime_secs: start_time.elapsed().as_secs(),
        sessions,
        max_connections,
        last_issued,
    }
}
