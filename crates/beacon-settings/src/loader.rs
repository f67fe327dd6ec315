//! Settings loading.
//!
//! Loading flow:
//! 1. Start with compiled [`BeaconSettings::default()`]
//! 2. Merge the JSON settings file, if present
//! 3. Merge `BEACON_*` environment variables; `__` separates nesting levels
//!    (`BEACON_SERVER__PORT=9000` sets `server.port`)
//! 4. Validate the result

use std::path::{Path, PathBuf};

use figment::Figment;
use figment::providers::{Env, Format, Json, Serialized};
use tracing::debug;

use crate::errors::{Result, SettingsError};
use crate::types::BeaconSettings;

/// Settings file looked up when none is named explicitly.
pub const DEFAULT_SETTINGS_FILE: &str = "beacon.json";

/// Prefix for environment overrides.
pub const ENV_PREFIX: &str = "BEACON_";

/// Load settings from the default file (optional) and the environment.
pub fn load_settings() -> Result<BeaconSettings> {
    load_settings_from(None)
}

/// Load settings, reading `path` if given.
///
/// A file named explicitly must exist. The default file is optional.
pub fn load_settings_from(path: Option<&Path>) -> Result<BeaconSettings> {
    let file = match path {
        Some(p) if !p.exists() => return Err(SettingsError::MissingFile(p.to_path_buf())),
        Some(p) => p.to_path_buf(),
        None => PathBuf::from(DEFAULT_SETTINGS_FILE),
    };
    debug!(path = %file.display(), "loading settings");

    let settings: BeaconSettings = figment(&file).extract()?;
    validate(&settings)?;
    Ok(settings)
}

/// The layered provider stack, exposed for callers that merge extra layers.
pub fn figment(file: &Path) -> Figment {
    Figment::from(Serialized::defaults(BeaconSettings::default()))
        .merge(Json::file(file))
        .merge(Env::prefixed(ENV_PREFIX).split("__"))
}

/// Reject values the relay cannot run with.
pub fn validate(settings: &BeaconSettings) -> Result<()> {
    if settings.server.host.trim().is_empty() {
        return Err(SettingsError::InvalidValue(
            "server.host must not be empty".into(),
        ));
    }
    if settings.server.max_message_size == 0 {
        return Err(SettingsError::InvalidValue(
            "server.max_message_size must be greater than zero".into(),
        ));
    }
    if settings.server.max_connections == 0 {
        return Err(SettingsError::InvalidValue(
            "server.max_connections must be greater than zero".into(),
        ));
    }
    // The greeting is two frames on a fresh queue.
    if settings.server.outbound_queue_capacity < 2 {
        return Err(SettingsError::InvalidValue(
            "server.outbound_queue_capacity must be at least 2".into(),
        ));
    }
    Ok(())
}
