//! The coordinator: sole owner of the session registry.
//!
//! All registry mutation and every fan-out decision happens on one task,
//! processing [`CoordinatorEvent`]s in arrival order. Callers reach it
//! through the cloneable [`Coordinator`] handle, which implements
//! [`Broadcaster`].

mod event_loop;
mod registry;

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use beacon_core::{Position, Roster, SessionId};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::trace;

use crate::broadcaster::Broadcaster;
use crate::transport::PeerConnection;
use event_loop::CoordinatorLoop;

/// Work queued for the coordinator loop.
#[derive(Debug)]
pub(crate) enum CoordinatorEvent {
    Accept(PeerConnection),
    Update { id: SessionId, position: Position },
    Disconnect(SessionId),
    Snapshot(oneshot::Sender<RegistrySnapshot>),
}

/// Point-in-time view of the registry.
#[derive(Clone, Debug, PartialEq)]
pub struct RegistrySnapshot {
    /// Highest id issued so far, `None` before the first accept.
    pub last_issued: Option<SessionId>,
    /// Registered sessions and their latest positions.
    pub roster: Roster,
}

/// Counters the loop publishes for lock-free reads.
#[derive(Debug, Default)]
pub(crate) struct Published {
    pub(crate) sessions: AtomicUsize,
    /// Raw value of the last issued id; `0` before the first accept.
    pub(crate) last_issued: AtomicU64,
}

/// Handle to a running coordinator loop.
#[derive(Clone, Debug)]
pub struct Coordinator {
    events: mpsc::UnboundedSender<CoordinatorEvent>,
    published: Arc<Published>,
}

impl Coordinator {
    /// Start the loop. It runs until `shutdown` is cancelled, then closes
    /// every registered session.
    ///
    /// Each session's outbound queue holds at most `queue_capacity` frames; a
    /// session that overflows it is disconnected.
    pub fn spawn(shutdown: CancellationToken, queue_capacity: usize) -> (Self, JoinHandle<()>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let handle = Self {
            events: tx,
            published: Arc::new(Published::default()),
        };
        let event_loop = CoordinatorLoop::new(
            rx,
            Arc::new(handle.clone()),
            Arc::clone(&handle.published),
            shutdown,
            queue_capacity,
        );
        let task = tokio::spawn(event_loop.run());
        (handle, task)
    }

    /// Ask the loop for a snapshot. `None` once the loop has stopped.
    ///
    /// Answered in order with other events, so it observes every event
    /// enqueued before it.
    pub async fn snapshot(&self) -> Option<RegistrySnapshot> {
        let (tx, rx) = oneshot::channel();
        self.send(CoordinatorEvent::Snapshot(tx));
        rx.await.ok()
    }

    fn send(&self, event: CoordinatorEvent) {
        if let Err(mpsc::error::SendError(event)) = self.events.send(event) {
            trace!(?event, "coordinator stopped, event dropped");
        }
    }
}

impl Broadcaster for Coordinator {
    fn accept(&self, connection: PeerConnection) {
        self.send(CoordinatorEvent::Accept(connection));
    }

    fn submit_update(&self, id: SessionId, position: Position) {
        self.send(CoordinatorEvent::Update { id, position });
    }

    fn disconnect(&self, id: SessionId) {
        self.send(CoordinatorEvent::Disconnect(id));
    }

    fn session_count(&self) -> usize {
        self.published.sessions.load(Ordering::Acquire)
    }

    fn last_issued(&self) -> Option<SessionId> {
        match self.published.last_issued.load(Ordering::Acquire) {
            0 => None,
            raw => Some(SessionId::new(raw)),
        }
    }
}
