//! Token decoder: from `Authorization` header to validated [`Claims`].

use std::sync::Arc;
use std::time::Duration;

use super::header::bearer_token;
use super::jwt::RawToken;
use super::key_store::{FileKeySource, HttpKeySource, KeySource, KeyStore};
use super::{AuthError, Claims};
use crate::config::AuthConfig;

/// Claim rules applied after the signature has been checked
#[derive(Debug, Clone, Default)]
pub struct Validation {
    /// Required `iss`; `None` accepts any issuer
    pub issuer: Option<String>,
    /// Required member of `aud`; `None` accepts any audience
    pub audience: Option<String>,
    /// Allowed clock skew in seconds for `exp` and `nbf`
    pub leeway_secs: i64,
}

impl Validation {
    pub fn new(issuer: impl Into<String>, audience: impl Into<String>) -> Self {
        Self {
            issuer: Some(issuer.into()),
            audience: Some(audience.into()),
            leeway_secs: 0,
        }
    }

    pub fn with_leeway(mut self, leeway_secs: i64) -> Self {
        self.leeway_secs = leeway_secs;
        self
    }

    fn check_expiry(&self, claims: &Claims, now: i64) -> Result<(), AuthError> {
        if claims.exp.is_none() {
            return Err(AuthError::InvalidClaims("missing exp".to_owned()));
        }
        if claims.is_expired_at(now, self.leeway_secs) {
            return Err(AuthError::TokenExpired);
        }
        Ok(())
    }

    fn check_claims(&self, claims: &Claims, now: i64) -> Result<(), AuthError> {
        if let Some(nbf) = claims.nbf {
            if nbf > now.saturating_add(self.leeway_secs) {
                return Err(AuthError::InvalidClaims("token not yet valid".to_owned()));
            }
        }

        if let Some(expected) = self.issuer.as_deref() {
            if claims.iss.as_deref() != Some(expected) {
                return Err(AuthError::InvalidClaims(
                    "incorrect issuer, please check the issuer".to_owned(),
                ));
            }
        }

        if let Some(expected) = self.audience.as_deref() {
            if !claims.aud.as_ref().is_some_and(|aud| aud.contains(expected)) {
                return Err(AuthError::InvalidClaims(
                    "incorrect audience, please check the audience".to_owned(),
                ));
            }
        }

        Ok(())
    }
}

/// Decodes bearer credentials against a cached key set
pub struct TokenVerifier {
    keys: KeyStore,
    validation: Validation,
}

impl TokenVerifier {
    pub fn new(keys: KeyStore, validation: Validation) -> Self {
        Self { keys, validation }
    }

    /// Build a verifier from configuration.
    ///
    /// A configured `jwks_file` takes precedence over the provider URL.
    pub fn from_config(config: &AuthConfig) -> Self {
        let source: Arc<dyn KeySource> = match &config.jwks_file {
            Some(path) => Arc::new(FileKeySource::new(path.clone())),
            None => Arc::new(HttpKeySource::with_timeout(
                config.jwks_url(),
                Duration::from_secs(config.jwks_timeout_secs),
            )),
        };
        let keys = KeyStore::new(source, Duration::from_secs(config.key_refresh_cooldown_secs));
        let validation = Validation {
            issuer: Some(config.issuer()),
            audience: Some(config.audience.clone()),
            leeway_secs: config.leeway_secs,
        };
        Self::new(keys, validation)
    }

    pub fn key_store(&self) -> &KeyStore {
        &self.keys
    }

    pub fn validation(&self) -> &Validation {
        &self.validation
    }

    /// Extract the bearer token from a raw header value and verify it
    pub async fn verify_header(&self, header: Option<&str>) -> Result<Claims, AuthError> {
        let token = bearer_token(header)?;
        self.verify(token).await
    }

    /// Verify a compact token and return its claims
    pub async fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        self.verify_at(token, chrono::Utc::now().timestamp()).await
    }

    /// Verify a compact token as of the unix time `now`.
    ///
    /// Stages run in a fixed order: key lookup, expiry, signature, then the
    /// remaining claim rules. Expiry precedes the signature so an expired
    /// token reports as expired whatever its signature.
    pub async fn verify_at(&self, token: &str, now: i64) -> Result<Claims, AuthError> {
        let raw = RawToken::split(token)?;
        let header = raw.header()?;
        let kid = header.kid.as_deref().ok_or(AuthError::UnknownKeyId)?;
        let key = self.keys.key_for(kid).await?;

        let claims = raw.claims()?;
        self.validation.check_expiry(&claims, now)?;

        raw.verify_with(&header.alg, &key)?;

        self.validation.check_claims(&claims, now)?;
        Ok(claims)
    }
}
