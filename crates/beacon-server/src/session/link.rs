//! The coordinator's handle on one session.

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::extract::ws::Utf8Bytes;
use beacon_core::SessionId;
use metrics::counter;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio_util::sync::CancellationToken;

use super::phase::{SessionPhase, SessionStatus};
use crate::metrics::OUTBOUND_DROPPED_TOTAL;

/// One entry on a session's outbound queue.
#[derive(Clone, Debug, PartialEq)]
pub enum OutboundFrame {
    /// An encoded envelope. Shared across recipients of the same fan-out.
    Text(Utf8Bytes),
    /// Local close signal; never reaches the wire as text.
    Close,
}

/// Outcome of [`SessionLink::deliver`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Delivery {
    /// Placed on the queue.
    Queued,
    /// Queue at capacity. The frame was dropped and the peer is lagging.
    Full,
    /// The session is closing or its outbound pump has stopped.
    Closed,
}

/// Sender half of a session's outbound queue plus its status.
#[derive(Debug)]
pub struct SessionLink {
    id: SessionId,
    tx: mpsc::Sender<OutboundFrame>,
    hangup: CancellationToken,
    status: Arc<SessionStatus>,
    connected_at: Instant,
}

impl SessionLink {
    /// Create a link holding at most `capacity` frames, and the queue the
    /// outbound pump drains.
    pub fn new(id: SessionId, capacity: usize) -> (Self, OutboundQueue) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let hangup = CancellationToken::new();
        let link = Self {
            id,
            tx,
            hangup: hangup.clone(),
            status: Arc::new(SessionStatus::new()),
            connected_at: Instant::now(),
        };
        (link, OutboundQueue { rx, hangup })
    }

    /// The session's id.
    pub const fn id(&self) -> SessionId {
        self.id
    }

    /// Shared phase cell.
    pub const fn status(&self) -> &Arc<SessionStatus> {
        &self.status
    }

    /// Time since the link was created.
    pub fn age(&self) -> Duration {
        self.connected_at.elapsed()
    }

    /// Enqueue without blocking.
    pub fn deliver(&self, text: Utf8Bytes) -> Delivery {
        if !self.status.is_live() {
            return Delivery::Closed;
        }
        match self.tx.try_send(OutboundFrame::Text(text)) {
            Ok(()) => Delivery::Queued,
            Err(TrySendError::Full(_)) => {
                counter!(OUTBOUND_DROPPED_TOTAL).increment(1);
                Delivery::Full
            }
            Err(TrySendError::Closed(_)) => Delivery::Closed,
        }
    }

    /// Issue the close signal and move to [`SessionPhase::Disconnecting`].
    ///
    /// The signal queues behind pending frames when there is room. On a full
    /// queue the pump is hung up instead and the backlog is discarded.
    /// Returns `false` if the session was already closing.
    pub fn close(&self) -> bool {
        if !self.status.advance(SessionPhase::Disconnecting) {
            return false;
        }
        if let Err(TrySendError::Full(_)) = self.tx.try_send(OutboundFrame::Close) {
            self.hangup.cancel();
        }
        true
    }
}

/// Receiving end of a session's outbound queue.
#[derive(Debug)]
pub struct OutboundQueue {
    rx: mpsc::Receiver<OutboundFrame>,
    hangup: CancellationToken,
}

impl OutboundQueue {
    /// Next frame in order. `None` once the link is dropped or hung up.
    pub async fn recv(&mut self) -> Option<OutboundFrame> {
        tokio::select! {
            biased;
            () = self.hangup.cancelled() => None,
            frame = self.rx.recv() => frame,
        }
    }

    /// Token cancelled when the link is hung up on a full queue.
    pub fn hangup(&self) -> CancellationToken {
        self.hangup.clone()
    }
}
