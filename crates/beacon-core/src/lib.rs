//! # beacon-core
//!
//! Shared types for the Beacon position relay.
//!
//! - [`ids::SessionId`]: server-assigned peer identity
//! - [`wire`]: outbound envelopes and inbound coordinate reports
//! - [`errors`]: error types shared across crates
//! - [`logging`]: `tracing` subscriber setup

#![deny(unsafe_code)]

pub mod errors;
pub mod ids;
pub mod logging;
pub mod wire;

pub use ids::SessionId;
pub use wire::{Envelope, PeerPosition, Position, Roster};
