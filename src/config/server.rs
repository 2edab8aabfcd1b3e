//! Server configuration with builder pattern
//!
//! Network settings, request timeout and CORS.

use serde::{Deserialize, Serialize};

/// CORS configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorsConfig {
    /// Enable CORS middleware
    #[serde(default = "default_cors_enabled")]
    pub enabled: bool,

    /// Allowed origins (use ["*"] for all origins)
    #[serde(default = "default_cors_origins")]
    pub allowed_origins: Vec<String>,

    /// Allow credentials in CORS requests
    #[serde(default = "default_cors_credentials")]
    pub allow_credentials: bool,

    /// Max age for preflight cache (in seconds)
    #[serde(default = "default_cors_max_age")]
    pub max_age: u64,
}

fn default_cors_enabled() -> bool {
    true
}
fn default_cors_origins() -> Vec<String> {
    // Ionic frontend dev server
    vec![
        "http://localhost:4200".to_string(),
        "http://127.0.0.1:4200".to_string(),
    ]
}
fn default_cors_credentials() -> bool {
    true
}
fn default_cors_max_age() -> u64 {
    3600
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            enabled: default_cors_enabled(),
            allowed_origins: default_cors_origins(),
            allow_credentials: default_cors_credentials(),
            max_age: default_cors_max_age(),
        }
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Seed the drink store with a sample drink on startup
    #[serde(default)]
    pub seed_drinks: bool,

    #[serde(default)]
    pub cors: CorsConfig,
}

// Default value functions for serde
fn default_host() -> String {
    "127.0.0.1".to_string()
}
fn default_port() -> u16 {
    5000
}
fn default_request_timeout_secs() -> u64 {
    30
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            request_timeout_secs: default_request_timeout_secs(),
            seed_drinks: false,
            cors: CorsConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Socket address string for binding
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn builder() -> ServerConfigBuilder {
        ServerConfigBuilder::new()
    }
}

/// Builder for ServerConfig with chainable methods
#[derive(Debug, Default)]
pub struct ServerConfigBuilder {
    config: ServerConfig,
}

impl ServerConfigBuilder {
    /// Create a new builder with default values
    pub fn new() -> Self {
        Self {
            config: ServerConfig::default(),
        }
    }

    /// Start from an existing config
    pub fn from_config(config: ServerConfig) -> Self {
        Self { config }
    }

    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.config.host = host.into();
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.config.port = port;
        self
    }

    pub fn request_timeout_secs(mut self, timeout: u64) -> Self {
        self.config.request_timeout_secs = timeout;
        self
    }

    pub fn seed_drinks(mut self, seed: bool) -> Self {
        self.config.seed_drinks = seed;
        self
    }

    // CORS settings
    pub fn cors(mut self, cors: CorsConfig) -> Self {
        self.config.cors = cors;
        self
    }

    pub fn cors_enabled(mut self, enabled: bool) -> Self {
        self.config.cors.enabled = enabled;
        self
    }

    pub fn cors_origins(mut self, origins: Vec<String>) -> Self {
        self.config.cors.allowed_origins = origins;
        self
    }

    pub fn build(self) -> ServerConfig {
        self.config
    }
}
