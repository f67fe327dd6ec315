//! # beacon-server
//!
//! Live position sharing over WebSockets.
//!
//! - [`coordinator`]: the single control flow that owns the session registry
//!   and decides every fan-out
//! - [`session`]: one actor per peer, bridging its socket to the coordinator
//!   through an inbound and an outbound pump
//! - [`broadcaster`]: the `accept` / `submit_update` / `disconnect` seam
//! - [`server`]: Axum router (`/ws`, `/health`, `/metrics`) and listener
//! - Graceful shutdown via `CancellationToken`

#![deny(unsafe_code)]

pub mod broadcaster;
pub mod config;
pub mod coordinator;
pub mod health;
pub mod metrics;
pub mod server;
pub mod session;
pub mod shutdown;
pub mod transport;

pub use broadcaster::{Broadcaster, NoopBroadcaster};
pub use config::ServerConfig;
pub use coordinator::{Coordinator, RegistrySnapshot};
pub use server::BeaconServer;
pub use transport::PeerConnection;
