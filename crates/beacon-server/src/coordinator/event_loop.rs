//! The coordinator's single control flow.

use std::sync::Arc;
use std::sync::atomic::Ordering;

use axum::extract::ws::Utf8Bytes;
use beacon_core::{Envelope, Position, SessionId};
use metrics::{counter, gauge};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use super::registry::Registry;
use super::{CoordinatorEvent, Published, RegistrySnapshot};
use crate::broadcaster::Broadcaster;
use crate::metrics::{
    ENVELOPES_ENQUEUED_TOTAL, SESSIONS_ACCEPTED_TOTAL, SESSIONS_ACTIVE,
    SESSIONS_DISCONNECTED_TOTAL, SLOW_PEERS_EVICTED_TOTAL,
};
use crate::session::{Delivery, SessionActor, SessionLink, SessionPhase};
use crate::transport::PeerConnection;

pub(crate) struct CoordinatorLoop {
    registry: Registry,
    events: mpsc::UnboundedReceiver<CoordinatorEvent>,
    broadcaster: Arc<dyn Broadcaster>,
    published: Arc<Published>,
    shutdown: CancellationToken,
    queue_capacity: usize,
    /// Sessions that missed a frame during the current event.
    lagging: Vec<SessionId>,
}

impl CoordinatorLoop {
    pub(crate) fn new(
        events: mpsc::UnboundedReceiver<CoordinatorEvent>,
        broadcaster: Arc<dyn Broadcaster>,
        published: Arc<Published>,
        shutdown: CancellationToken,
        queue_capacity: usize,
    ) -> Self {
        Self {
            registry: Registry::new(),
            events,
            broadcaster,
            published,
            shutdown,
            queue_capacity,
            lagging: Vec::new(),
        }
    }

    /// Process events one at a time until shutdown.
    pub(crate) async fn run(mut self) {
        info!("coordinator started");
        loop {
            tokio::select! {
                biased;
                () = self.shutdown.cancelled() => break,
                event = self.events.recv() => {
                    let Some(event) = event else { break };
                    self.handle(event);
                }
            }
        }
        self.close_all();
        info!("coordinator stopped");
    }

    fn handle(&mut self, event: CoordinatorEvent) {
        match event {
            CoordinatorEvent::Accept(connection) => self.accept(connection),
            CoordinatorEvent::Update { id, position } => self.update(id, position),
            CoordinatorEvent::Disconnect(id) => self.disconnect(id),
            CoordinatorEvent::Snapshot(reply) => {
                let _ = reply.send(RegistrySnapshot {
                    last_issued: self.registry.last_issued(),
                    roster: self.registry.roster(),
                });
            }
        }
        self.evict_lagging();
    }

    /// Disconnect every session whose queue overflowed while handling the
    /// last event. Their departures may overflow further queues.
    fn evict_lagging(&mut self) {
        while let Some(id) = self.lagging.pop() {
            if self.registry.get(id).is_none() {
                continue;
            }
            counter!(SLOW_PEERS_EVICTED_TOTAL).increment(1);
            warn!(session_id = %id, "outbound queue full, disconnecting slow peer");
            self.disconnect(id);
        }
    }

    fn accept(&mut self, connection: PeerConnection) {
        let id = self.registry.issue_id();
        self.published.last_issued.store(id.into(), Ordering::Release);
        let (link, outbound) = SessionLink::new(id, self.queue_capacity);
        let status = Arc::clone(link.status());
        let _ = SessionActor::new(
            id,
            connection,
            outbound,
            Arc::clone(&status),
            Arc::clone(&self.broadcaster),
        )
        .spawn();
        self.registry.insert(link);
        self.publish_count();
        counter!(SESSIONS_ACCEPTED_TOTAL).increment(1);

        // Greeting first, then the roster; both precede any fan-out to this
        // session because the loop is the only producer.
        if let Some(text) = encode(&Envelope::YourId(id)) {
            self.send_to(id, text, "Your ID");
        }
        if let Some(text) = encode(&Envelope::Everyone(self.registry.roster())) {
            self.send_to(id, text, "Everyone");
        }
        self.fan_out(&Envelope::UserJoined(id), id);

        let _ = status.advance(SessionPhase::Active);
        info!(session_id = %id, sessions = self.registry.len(), "session joined");
    }

    fn update(&mut self, id: SessionId, position: Position) {
        let Some(peer) = self.registry.set_position(id, position) else {
            trace!(session_id = %id, "update for unregistered session ignored");
            return;
        };
        self.fan_out(&Envelope::UpdateCoordinates(peer), id);
    }

    fn disconnect(&mut self, id: SessionId) {
        let Some(link) = self.registry.get(id) else {
            trace!(session_id = %id, "disconnect for unregistered session ignored");
            return;
        };
        // Close signal goes out before the entry is removed.
        let _ = link.close();
        let connected = link.age();

        self.fan_out(&Envelope::UserDisconnected(id), id);
        let _ = self.registry.remove(id);
        self.publish_count();
        counter!(SESSIONS_DISCONNECTED_TOTAL).increment(1);
        info!(
            session_id = %id,
            sessions = self.registry.len(),
            connected_ms = connected.as_millis(),
            "session disconnected"
        );
    }

    fn close_all(&mut self) {
        let mut closed = 0_usize;
        for link in self.registry.drain() {
            let _ = link.close();
            closed += 1;
        }
        self.publish_count();
        debug!(closed, "closed all sessions");
    }

    fn send_to(&mut self, id: SessionId, text: Utf8Bytes, kind: &'static str) {
        match self.registry.send_to(id, text) {
            Delivery::Queued => {
                counter!(ENVELOPES_ENQUEUED_TOTAL, "kind" => kind).increment(1);
            }
            Delivery::Full => self.lagging.push(id),
            Delivery::Closed => {}
        }
    }

    fn fan_out(&mut self, envelope: &Envelope, except: SessionId) {
        let Some(text) = encode(envelope) else { return };
        let result = self.registry.fan_out(&text, except);
        counter!(ENVELOPES_ENQUEUED_TOTAL, "kind" => envelope.kind())
            .increment(result.delivered as u64);
        trace!(
            kind = envelope.kind(),
            recipients = result.delivered,
            lagging = result.lagging.len(),
            "fan-out"
        );
        self.lagging.extend(result.lagging);
    }

    #[allow(clippy::cast_precision_loss)]
    fn publish_count(&self) {
        let count = self.registry.len();
        self.published.sessions.store(count, Ordering::Release);
        gauge!(SESSIONS_ACTIVE).set(count as f64);
    }
}

/// Serialize once; recipients share the buffer.
fn encode(envelope: &Envelope) -> Option<Utf8Bytes> {
    match envelope.to_json() {
        Ok(json) => Some(json.into()),
        Err(error) => {
            warn!(kind = envelope.kind(), %error, "failed to encode envelope");
            None
        }
    }
}
