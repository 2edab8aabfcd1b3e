//! Server state management

use std::sync::Arc;

use crate::auth::TokenVerifier;
use crate::config::BrewConfig;
use crate::drinks::{DrinkStore, InMemoryDrinkStore};

pub use crate::config::{CorsConfig, ServerConfig};

/// Shared server state
#[derive(Clone)]
pub struct ServerState {
    /// Token decoder with its lazily populated key set
    pub verifier: Arc<TokenVerifier>,

    /// Drink records
    pub drinks: Arc<dyn DrinkStore>,

    /// Server configuration
    pub config: Arc<ServerConfig>,
}

impl ServerState {
    /// Build state from configuration with an in-memory drink store.
    ///
    /// Keys are not fetched here; the first authorized request does that.
    pub async fn new(config: &BrewConfig) -> Self {
        let drinks = if config.server.seed_drinks {
            InMemoryDrinkStore::seeded().await
        } else {
            InMemoryDrinkStore::new()
        };
        Self::with_parts(
            TokenVerifier::from_config(&config.auth),
            Arc::new(drinks),
            config.server.clone(),
        )
    }

    pub fn with_parts(
        verifier: TokenVerifier,
        drinks: Arc<dyn DrinkStore>,
        config: ServerConfig,
    ) -> Self {
        Self {
            verifier: Arc::new(verifier),
            drinks,
            config: Arc::new(config),
        }
    }
}
