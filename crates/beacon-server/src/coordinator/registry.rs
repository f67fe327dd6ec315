//! Session registry. Owned exclusively by the coordinator loop.

use std::collections::BTreeMap;

use axum::extract::ws::Utf8Bytes;
use beacon_core::{PeerPosition, Position, Roster, SessionId};

use crate::session::{Delivery, SessionLink};

struct Entry {
    link: SessionLink,
    position: Position,
}

/// Result of one fan-out.
#[derive(Debug, Default, PartialEq)]
pub(crate) struct FanOut {
    /// Sessions the frame was queued on.
    pub(crate) delivered: usize,
    /// Sessions whose queue was full; they missed the frame.
    pub(crate) lagging: Vec<SessionId>,
}

/// Registered sessions keyed by id, plus the id counter.
#[derive(Default)]
pub(crate) struct Registry {
    sessions: BTreeMap<SessionId, Entry>,
    last_issued: u64,
}

impl Registry {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Issue the next id. Ids start at 1 and are never reused.
    pub(crate) fn issue_id(&mut self) -> SessionId {
        self.last_issued += 1;
        SessionId::new(self.last_issued)
    }

    pub(crate) fn last_issued(&self) -> Option<SessionId> {
        (self.last_issued > 0).then(|| SessionId::new(self.last_issued))
    }

    /// Register a link at the origin.
    pub(crate) fn insert(&mut self, link: SessionLink) {
        let entry = Entry {
            link,
            position: Position::ORIGIN,
        };
        let _ = self.sessions.insert(entry.link.id(), entry);
    }

    pub(crate) fn get(&self, id: SessionId) -> Option<&SessionLink> {
        self.sessions.get(&id).map(|entry| &entry.link)
    }

    pub(crate) fn remove(&mut self, id: SessionId) -> Option<SessionLink> {
        self.sessions.remove(&id).map(|entry| entry.link)
    }

    /// Overwrite a session's position. `None` if the id is not registered.
    pub(crate) fn set_position(&mut self, id: SessionId, position: Position) -> Option<PeerPosition> {
        let entry = self.sessions.get_mut(&id)?;
        entry.position = position;
        Some(PeerPosition::new(id, position))
    }

    /// Every registered session with its latest position.
    pub(crate) fn roster(&self) -> Roster {
        self.sessions
            .iter()
            .map(|(id, entry)| PeerPosition::new(*id, entry.position))
            .collect()
    }

    /// Enqueue on one session. Unknown ids count as closed.
    pub(crate) fn send_to(&self, id: SessionId, text: Utf8Bytes) -> Delivery {
        self.get(id).map_or(Delivery::Closed, |link| link.deliver(text))
    }

    /// Enqueue `text` on every session except `except`.
    pub(crate) fn fan_out(&self, text: &Utf8Bytes, except: SessionId) -> FanOut {
        let mut result = FanOut::default();
        for link in self.sessions.values().map(|entry| &entry.link) {
            if link.id() == except {
                continue;
            }
            match link.deliver(text.clone()) {
                Delivery::Queued => result.delivered += 1,
                Delivery::Full => result.lagging.push(link.id()),
                Delivery::Closed => {}
            }
        }
        result
    }

    /// Remove every session, in id order.
    pub(crate) fn drain(&mut self) -> impl Iterator<Item = SessionLink> + use<> {
        std::mem::take(&mut self.sessions)
            .into_values()
            .map(|entry| entry.link)
    }

    pub(crate) fn len(&self) -> usize {
        self.sessions.len()
    }
}
