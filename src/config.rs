//! Exporter configuration management.
//!
//! Configuration is loaded from an optional YAML file with environment
//! variable overrides. Sources are merged in the following order (later
//! sources override earlier ones):
//!
//! 1. **Built-in defaults** - see the `Default` implementation
//! 2. **YAML config file** - default path `config.yaml`, `-f` flag to override
//! 3. **Environment variables** - variables prefixed with `WEBUI_KPI_`
//! 4. **Legacy variables** - `WEBUI_DB_PATH`, `OTEL_EXPORTER_OTLP_ENDPOINT`
//!    and `EXPORT_INTERVAL`, kept compatible with existing deployments
//!
//! ## Example
//!
//! ```bash
//! # Point at a non-default database
//! WEBUI_KPI_DB_PATH=/srv/openwebui/webui.db
//!
//! # Or via the legacy variable
//! WEBUI_DB_PATH=/srv/openwebui/webui.db
//!
//! # Export every 30 seconds
//! EXPORT_INTERVAL=30
//! ```

use clap::Parser;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Yaml},
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::errors::Error;

/// Simple CLI args - just for specifying config file
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to configuration file
    #[arg(short = 'f', long, env = "WEBUI_KPI_CONFIG", default_value = "config.yaml")]
    pub config: String,

    /// Validate configuration and exit without starting the exporter.
    #[arg(long)]
    pub validate: bool,
}

/// Exporter configuration.
///
/// All fields have defaults matching a standard Open WebUI deployment with a
/// local OTLP collector.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Path to Open WebUI's SQLite database file
    pub db_path: PathBuf,
    /// OTLP gRPC endpoint metrics are pushed to
    pub otlp_endpoint: String,
    /// Metric export interval in seconds
    pub export_interval_secs: u64,
    /// Resource service name attached to exported metrics
    pub service_name: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from("/data/webui.db"),
            otlp_endpoint: "http://otel-backend:4317".to_string(),
            export_interval_secs: 15,
            service_name: "openwebui-exporter".to_string(),
        }
    }
}

impl Config {
    pub fn load(args: &Args) -> Result<Self, Error> {
        let mut config: Self = Self::figment(args)
            .extract()
            .map_err(|e| Error::Config { message: e.to_string() })?;

        // Legacy environment variables from the original deployment take
        // precedence over everything else.
        if let Ok(path) = std::env::var("WEBUI_DB_PATH") {
            config.db_path = PathBuf::from(path);
        }
        if let Ok(endpoint) = std::env::var("OTEL_EXPORTER_OTLP_ENDPOINT") {
            config.otlp_endpoint = endpoint;
        }
        if let Ok(interval) = std::env::var("EXPORT_INTERVAL") {
            config.export_interval_secs = interval.parse().map_err(|_| Error::Config {
                message: format!("EXPORT_INTERVAL must be an integer, got {interval:?}"),
            })?;
        }

        config.validate()?;
        Ok(config)
    }

    fn figment(args: &Args) -> Figment {
        Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(&args.config))
            // WEBUI_KPI_CONFIG belongs to Args, not to the config itself
            .merge(Env::prefixed("WEBUI_KPI_").ignore(&["config"]))
    }

    fn validate(&self) -> Result<(), Error> {
        if self.export_interval_secs == 0 {
            return Err(Error::Config {
                message: "export_interval_secs must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}
