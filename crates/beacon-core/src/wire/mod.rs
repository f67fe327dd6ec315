//! Wire format shared by the relay and its peers.
//!
//! Every frame is one JSON text message. Outbound frames are [`Envelope`]s
//! (`{"msgType": …, "data": …}`); inbound frames are [`CoordinateReport`]s.

mod coordinate;
pub mod envelope;
pub mod position;
pub mod report;

pub use envelope::Envelope;
pub use position::{PeerPosition, Position, Roster};
pub use report::CoordinateReport;
