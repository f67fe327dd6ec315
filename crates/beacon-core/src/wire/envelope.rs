//! Outbound envelopes.

use serde::{Deserialize, Serialize};

use super::position::{PeerPosition, Roster};
use crate::ids::SessionId;

/// A message from the relay to one peer.
///
/// Adjacently tagged: `{"msgType": "<kind>", "data": <payload>}`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "msgType", content = "data")]
pub enum Envelope {
    /// The recipient's own id; always the first message after joining.
    #[serde(rename = "Your ID")]
    YourId(SessionId),
    /// Every registered session, including the recipient.
    #[serde(rename = "Everyone")]
    Everyone(Roster),
    /// Another peer joined.
    #[serde(rename = "User joined")]
    UserJoined(SessionId),
    /// Another peer left.
    #[serde(rename = "User disconnected")]
    UserDisconnected(SessionId),
    /// Another peer moved.
    #[serde(rename = "Update coordinates")]
    UpdateCoordinates(PeerPosition),
}

impl Envelope {
    /// The wire `msgType` string.
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::YourId(_) => "Your ID",
            Self::Everyone(_) => "Everyone",
            Self::UserJoined(_) => "User joined",
            Self::UserDisconnected(_) => "User disconnected",
            Self::UpdateCoordinates(_) => "Update coordinates",
        }
    }

    /// Encode as a JSON text frame.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
