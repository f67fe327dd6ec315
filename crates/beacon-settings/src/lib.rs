//! # beacon-settings
//!
//! Configuration for the Beacon relay, merged from three layers:
//!
//! 1. Compiled defaults ([`BeaconSettings::default()`])
//! 2. A JSON settings file
//! 3. `BEACON_*` environment variables (highest priority)

#![deny(unsafe_code)]

pub mod errors;
pub mod loader;
pub mod types;

pub use errors::SettingsError;
pub use loader::{load_settings, load_settings_from};
pub use types::{BeaconSettings, LoggingSettings, ServerSettings};
