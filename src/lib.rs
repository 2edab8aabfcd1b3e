//! brewgate: a coffee-shop drinks API guarded by permission-scoped bearer
//! tokens.
//!
//! The core is the [`auth`] module: a token decoder that verifies EdDSA or
//! RS256 signed JWTs against a lazily fetched JWKS key set, and a permission gate
//! that admits an operation only when the decoded claims carry its scope.
//! [`server`] exposes the guarded drink endpoints over HTTP.

pub mod auth;
pub mod cli;
pub mod config;
pub mod drinks;
pub mod error;
pub mod server;

pub use auth::{AuthError, Claims, TokenVerifier};
pub use config::BrewConfig;
pub use error::{Error, Result};
