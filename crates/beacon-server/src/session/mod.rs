//! Per-connection session actors.
//!
//! Each accepted peer gets one [`SessionActor`] running two pumps:
//!
//! - inbound: socket → coordinate reports → [`Broadcaster::submit_update`]
//! - outbound: [`OutboundFrame`] queue → socket
//!
//! The coordinator holds the [`SessionLink`] end of the queue and never
//! touches the socket itself.
//!
//! [`Broadcaster::submit_update`]: crate::broadcaster::Broadcaster::submit_update

pub mod actor;
pub mod error;
pub mod link;
pub mod phase;

pub use actor::SessionActor;
pub use error::SessionError;
pub use link::{Delivery, OutboundFrame, OutboundQueue, SessionLink};
pub use phase::{SessionPhase, SessionStatus};
