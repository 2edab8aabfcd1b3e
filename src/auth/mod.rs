//! Bearer-token authorization.
//!
//! This module provides:
//! - `Authorization: Bearer` extraction
//! - JWT decoding (EdDSA or RS256) against a cached JWKS key set
//! - Typed claims with an explicit permission list
//! - A permission gate for guarding operations with static scopes
//!
//! Control flow for a guarded operation:
//!
//! ```text
//! header -> bearer token -> key id lookup -> expiry -> signature -> iss/aud
//!        -> permission check -> operation(claims)
//! ```

pub mod claims;
pub mod error;
pub mod gate;
pub mod header;
pub mod jwks;
pub mod jwt;
pub mod key_store;
pub mod verifier;

pub use claims::{Audience, Claims};
pub use error::AuthError;
pub use gate::{
    check_permissions, requires_auth, DeleteDrinks, GetDrinkDetails, PatchDrinks, Permission,
    PostDrinks,
};
pub use header::bearer_token;
pub use jwks::{Jwk, JwkSet, KeySet, VerificationKey};
pub use jwt::{encode, Header, RawToken, ALG_EDDSA, ALG_RS256};
pub use key_store::{FileKeySource, HttpKeySource, KeySource, KeyStore, StaticKeySource};
pub use verifier::{TokenVerifier, Validation};
