//! Identity provider settings for token verification.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Identity provider and claim validation settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Provider tenant domain, e.g. `tenant.eu.auth0.com`
    #[serde(default = "default_domain")]
    pub domain: String,

    /// Audience the tokens must be issued for
    #[serde(default = "default_audience")]
    pub audience: String,

    /// Overrides the issuer derived from `domain`
    #[serde(default)]
    pub issuer: Option<String>,

    /// Overrides the JWKS URL derived from `domain`
    #[serde(default)]
    pub jwks_url: Option<String>,

    /// Read keys from a local JWKS file instead of the provider
    #[serde(default)]
    pub jwks_file: Option<PathBuf>,

    #[serde(default = "default_jwks_timeout_secs")]
    pub jwks_timeout_secs: u64,

    /// Minimum interval between key set refetches triggered by unknown key ids
    #[serde(default = "default_key_refresh_cooldown_secs")]
    pub key_refresh_cooldown_secs: u64,

    /// Allowed clock skew for `exp`/`nbf`
    #[serde(default)]
    pub leeway_secs: i64,
}

fn default_domain() -> String {
    "drnio13.eu.auth0.com".to_string()
}
fn default_audience() -> String {
    "drink".to_string()
}
fn default_jwks_timeout_secs() -> u64 {
    10
}
fn default_key_refresh_cooldown_secs() -> u64 {
    30
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            domain: default_domain(),
            audience: default_audience(),
            issuer: None,
            jwks_url: None,
            jwks_file: None,
            jwks_timeout_secs: default_jwks_timeout_secs(),
            key_refresh_cooldown_secs: default_key_refresh_cooldown_secs(),
            leeway_secs: 0,
        }
    }
}

impl AuthConfig {
    /// Expected `iss` claim
    pub fn issuer(&self) -> String {
        self.issuer
            .clone()
            .unwrap_or_else(|| format!("https://{}/", self.domain))
    }

    /// Key provider endpoint
    pub fn jwks_url(&self) -> String {
        self.jwks_url
            .clone()
            .unwrap_or_else(|| format!("https://{}/.well-known/jwks.json", self.domain))
    }
}
