//! Configuration for brewgate
//!
//! Sources, in increasing precedence:
//! 1. Built-in defaults
//! 2. `brewgate.toml` in the working directory, or the file passed explicitly
//! 3. Environment variables `BREWGATE__<SECTION>__<KEY>`
//!    (e.g. `BREWGATE__AUTH__DOMAIN`, `BREWGATE__SERVER__PORT`)

pub mod auth;
pub mod server;

pub use auth::AuthConfig;
pub use server::{CorsConfig, ServerConfig, ServerConfigBuilder};

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default config file looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "brewgate.toml";

/// Root configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BrewConfig {
    /// HTTP server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Identity provider configuration
    #[serde(default)]
    pub auth: AuthConfig,
}

impl BrewConfig {
    /// Load configuration from defaults, an optional file, and the environment.
    ///
    /// An explicit `path` must exist; the default file is optional.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let file = match path {
            Some(p) => File::from(p).required(true),
            None => File::with_name(DEFAULT_CONFIG_FILE).required(false),
        };

        Config::builder()
            .add_source(Config::try_from(&BrewConfig::default())?)
            .add_source(file)
            .add_source(
                Environment::with_prefix("BREWGATE")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }
}
