//! Positions and the roster snapshot.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::coordinate;
use crate::ids::SessionId;

/// A latitude/longitude pair.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    /// Latitude.
    #[serde(serialize_with = "coordinate::serialize")]
    pub lat: f64,
    /// Longitude.
    #[serde(serialize_with = "coordinate::serialize")]
    pub lng: f64,
}

impl Position {
    /// Where every session starts until its first report.
    pub const ORIGIN: Self = Self { lat: 0.0, lng: 0.0 };

    /// Create a position.
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

/// A position attributed to a session (`{"id":"1","lat":…,"lng":…}`).
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PeerPosition {
    /// Owning session.
    pub id: SessionId,
    /// Latitude.
    #[serde(serialize_with = "coordinate::serialize")]
    pub lat: f64,
    /// Longitude.
    #[serde(serialize_with = "coordinate::serialize")]
    pub lng: f64,
}

impl PeerPosition {
    /// Attribute `position` to `id`.
    pub const fn new(id: SessionId, position: Position) -> Self {
        Self {
            id,
            lat: position.lat,
            lng: position.lng,
        }
    }

    /// The bare coordinates.
    pub const fn position(&self) -> Position {
        Position::new(self.lat, self.lng)
    }
}

/// Every registered session and its last known position.
///
/// Serialized as `{"users": {"<id>": PeerPosition, …}}`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Roster {
    /// Sessions keyed by id, in ascending id order.
    pub users: BTreeMap<SessionId, PeerPosition>,
}

impl Roster {
    /// Number of sessions in the snapshot.
    pub fn len(&self) -> usize {
        self.users.len()
    }

    /// Whether the snapshot is empty.
    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    /// Look up one session.
    pub fn get(&self, id: SessionId) -> Option<&PeerPosition> {
        self.users.get(&id)
    }
}

impl FromIterator<PeerPosition> for Roster {
    fn from_iter<I: IntoIterator<Item = PeerPosition>>(iter: I) -> Self {
        Self {
            users: iter.into_iter().map(|p| (p.id, p)).collect(),
        }
    }
}
