//! The seam between connection handling and the coordinator.

use beacon_core::{Position, SessionId};
use tracing::debug;

use crate::transport::PeerConnection;

/// What the HTTP layer and the session actors call into.
///
/// Every method is fire-and-forget: it enqueues work and returns without
/// waiting for the coordinator to act on it.
#[cfg_attr(test, mockall::automock)]
pub trait Broadcaster: Send + Sync {
    /// Register a freshly upgraded connection.
    fn accept(&self, connection: PeerConnection);

    /// Record a session's reported position and relay it to everyone else.
    fn submit_update(&self, id: SessionId, position: Position);

    /// Remove a session. Unknown or already removed ids are ignored.
    fn disconnect(&self, id: SessionId);

    /// Sessions currently registered, as last published by the coordinator.
    fn session_count(&self) -> usize;

    /// Highest id issued so far, `None` before the first accept.
    fn last_issued(&self) -> Option<SessionId>;
}

/// Accepts connections and immediately drops them. Used in tests.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopBroadcaster;

impl Broadcaster for NoopBroadcaster {
    fn accept(&self, connection: PeerConnection) {
        debug!(?connection, "noop broadcaster dropping connection");
    }

    fn submit_update(&self, _id: SessionId, _position: Position) {}

    fn disconnect(&self, _id: SessionId) {}

    fn session_count(&self) -> usize {
        0
    }

    fn last_issued(&self) -> Option<SessionId> {
        None
    }
}
