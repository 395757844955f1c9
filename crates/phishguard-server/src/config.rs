//! Server configuration

use crate::cli::ServeArgs;
use phishguard_core::Error;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Configuration file read when `--config` is not given
pub const DEFAULT_CONFIG_PATH: &str = "phishguard.yaml";

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Model bundle path
    #[serde(default = "default_model_path")]
    pub model_path: PathBuf,

    /// Listen address
    #[serde(default = "default_listen")]
    pub listen: String,

    /// Listen port
    #[serde(default = "default_port")]
    pub port: u16,

    /// CORS configuration
    #[serde(default)]
    pub cors: CorsConfig,
}

impl ServerConfig {
    /// Load configuration from file and CLI overrides.
    ///
    /// A missing default file is silent; a missing file named with
    /// `--config` is logged before falling back to defaults.
    pub fn load(args: &ServeArgs) -> anyhow::Result<Self> {
        let config_path = args
            .config
            .as_deref()
            .unwrap_or_else(|| Path::new(DEFAULT_CONFIG_PATH));

        let mut config = if config_path.exists() {
            let content = std::fs::read_to_string(config_path)?;
            serde_yaml::from_str(&content).map_err(|e| {
                Error::config(format!("invalid config {}: {}", config_path.display(), e))
            })?
        } else {
            if args.config.is_some() {
                warn!(
                    "Config file {} not found, using defaults",
                    config_path.display()
                );
            }
            Self::default()
        };

        if let Some(model) = &args.model {
            config.model_path = model.clone();
        }

        if let Some(listen) = &args.listen {
            config.listen = listen.clone();
        }

        if let Some(port) = args.port {
            config.port = port;
        }

        Ok(config)
    }

    /// Socket address to bind
    pub fn socket_addr(&self) -> anyhow::Result<SocketAddr> {
        let addr = format!("{}:{}", self.listen, self.port)
            .parse()
            .map_err(|e| Error::config(format!("invalid listen address '{}': {}", self.listen, e)))?;
        Ok(addr)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            model_path: default_model_path(),
            listen: default_listen(),
            port: default_port(),
            cors: CorsConfig::default(),
        }
    }
}

/// Cross-origin access for browser clients
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorsConfig {
    /// Accept requests from any origin
    #[serde(default = "default_true")]
    pub allow_any_origin: bool,

    /// Origins accepted when `allow_any_origin` is off
    #[serde(default)]
    pub allowed_origins: Vec<String>,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allow_any_origin: true,
            allowed_origins: Vec::new(),
        }
    }
}

fn default_model_path() -> PathBuf {
    PathBuf::from("model/phishing_model.json")
}

fn default_listen() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_true() -> bool {
    true
}
