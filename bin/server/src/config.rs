//! Centralized server configuration.
//!
//! Configuration is loaded via the `config` crate from, in increasing
//! priority: built-in defaults, an optional TOML file named by
//! `COFFEEBOT_CONFIG`, and `COFFEEBOT_`-prefixed environment variables
//! (`__` separates nested keys, e.g. `COFFEEBOT_CONNECTOR__TIMEOUT_SECONDS`).
//!
//! See [`ConnectorConfig`] for the outbound connector settings.

use coffeebot_integration::ConnectorConfig;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Environment variable naming an optional configuration file.
pub const CONFIG_FILE_ENV: &str = "COFFEEBOT_CONFIG";

const ENV_PREFIX: &str = "COFFEEBOT";

/// Server configuration composed from library configs.
#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    /// Address the webhook listens on.
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,

    /// Outbound connector configuration.
    #[serde(default)]
    pub connector: ConnectorConfig,
}

fn default_listen_addr() -> String {
    "0.0.0.0:3978".to_string()
}

impl ServerConfig {
    /// Loads configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration file cannot be read or a value
    /// is invalid.
    pub fn from_env() -> Result<Self, config::ConfigError> {
        let file = std::env::var_os(CONFIG_FILE_ENV).map(PathBuf::from);
        Self::load(file.as_deref(), None)
    }

    /// Loads configuration from an optional file and environment variables.
    ///
    /// `env` replaces the process environment when given.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or a value is invalid.
    pub fn load(
        file: Option<&Path>,
        env: Option<config::Map<String, String>>,
    ) -> Result<Self, config::ConfigError> {
        let mut builder = config::Config::builder();
        if let Some(path) = file {
            builder = builder.add_source(config::File::from(path).required(true));
        }

        builder
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true)
                    .source(env),
            )
            .build()?
            .try_deserialize()
    }
}
