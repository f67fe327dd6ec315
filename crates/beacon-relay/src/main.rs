//! # beacon
//!
//! Live position relay binary: loads settings, starts the coordinator and the
//! HTTP/WebSocket listener, and shuts down cleanly on ctrl-c.

#![deny(unsafe_code)]

use std::path::PathBuf;

use anyhow::{Context, Result};
use beacon_core::logging::{self, LogFormat};
use beacon_server::{BeaconServer, ServerConfig};
use beacon_settings::BeaconSettings;
use clap::Parser;

/// Live position relay.
#[derive(Parser, Debug)]
#[command(name = "beacon", about = "Live position relay over WebSockets")]
struct Cli {
    /// JSON settings file (defaults to `beacon.json` if present).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Host to bind (overrides settings).
    #[arg(long)]
    host: Option<String>,

    /// Port to bind, 0 for auto-assign (overrides settings).
    #[arg(long)]
    port: Option<u16>,

    /// Log filter directive, e.g. `debug` or `beacon_server=trace`.
    #[arg(long)]
    log_level: Option<String>,

    /// Emit logs as JSON lines.
    #[arg(long)]
    json_logs: bool,
}

impl Cli {
    /// Apply flags on top of loaded settings.
    fn apply(self, mut settings: BeaconSettings) -> BeaconSettings {
        if let Some(host) = self.host {
            settings.server.host = host;
        }
        if let Some(port) = self.port {
            settings.server.port = port;
        }
        if let Some(level) = self.log_level {
            settings.logging.level = level;
        }
        if self.json_logs {
            settings.logging.format = LogFormat::Json;
        }
        settings
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let settings = beacon_settings::load_settings_from(cli.config.as_deref())
        .context("Failed to load settings")?;
    let settings = cli.apply(settings);
    beacon_settings::loader::validate(&settings).context("Invalid settings")?;

    logging::init_subscriber(&settings.logging.level, settings.logging.format);

    let metrics = beacon_server::metrics::install_recorder()
        .context("Failed to install metrics recorder")?;

    let config = ServerConfig::from(&settings.server);
    let mut server = BeaconServer::new(config).with_metrics(metrics);
    let (addr, serve_task) = server
        .listen()
        .await
        .with_context(|| {
            format!(
                "Failed to bind {}:{}",
                settings.server.host, settings.server.port
            )
        })?;
    tracing::info!(%addr, "beacon relay ready");

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for ctrl-c")?;

    tracing::info!("Shutting down...");
    let mut tasks = vec![serve_task];
    tasks.extend(server.take_coordinator_task());
    server
        .shutdown()
        .drain(tasks, server.config().shutdown_timeout())
        .await;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use clap::CommandFactory;

    use super::*;

    #[test]
    fn cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn no_flags_keep_settings() {
        let cli = Cli::parse_from(["beacon"]);
        let settings = cli.apply(BeaconSettings::default());
        assert_eq!(settings, BeaconSettings::default());
    }

    #[test]
    fn flags_override_settings() {
        let cli = Cli::parse_from([
            "beacon",
            "--host",
            "127.0.0.1",
            "--port",
            "8080",
            "--log-level",
            "debug",
            "--json-logs",
        ]);
        let settings = cli.apply(BeaconSettings::default());
        assert_eq!(settings.server.host, "127.0.0.1");
        assert_eq!(settings.server.port, 8080);
        assert_eq!(settings.logging.level, "debug");
        assert_eq!(settings.logging.format, LogFormat::Json);
    }

    #[test]
    fn flags_override_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(br#"{"server":{"port":9001,"max_connections":2}}"#)
            .unwrap();
        let path = file.path().to_str().unwrap().to_owned();

        let cli = Cli::parse_from(["beacon", "--config", &path, "--port", "9002"]);
        let loaded = beacon_settings::load_settings_from(cli.config.as_deref()).unwrap();
        let settings = cli.apply(loaded);
        assert_eq!(settings.server.port, 9002);
        assert_eq!(settings.server.max_connections, 2);
    }

    #[test]
    fn config_maps_onto_server() {
        let config = ServerConfig::from(&BeaconSettings::default().server);
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 1123);
    }

    #[tokio::test]
    async fn server_graceful_shutdown() {
        let config = ServerConfig::default();
        let mut server = BeaconServer::new(config);
        let (_addr, serve_task) = server.listen().await.unwrap();

        let mut tasks = vec![serve_task];
        tasks.extend(server.take_coordinator_task());
        let probes: Vec<_> = tasks.iter().map(|t| t.abort_handle()).collect();
        server
            .shutdown()
            .drain(tasks, std::time::Duration::from_secs(2))
            .await;
        assert!(probes.iter().all(tokio::task::AbortHandle::is_finished));
    }
}
