//! JSON Web Key Set handling.
//!
//! Two key types are usable: RFC 8037 octet key pairs (`kty = "OKP"`,
//! `crv = "Ed25519"`) for EdDSA, and RSA keys (`kty = "RSA"`) for RS256 as
//! published by hosted identity providers. Other keys are skipped when the
//! set is resolved.

use std::collections::HashMap;
use std::fmt;

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use ed25519_dalek::VerifyingKey;
use jsonwebtoken::DecodingKey;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::jwt::{ALG_EDDSA, ALG_RS256};

/// A single published key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Jwk {
    pub kty: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crv: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kid: Option<String>,

    /// Base64url public key bytes (OKP)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<String>,

    /// Base64url modulus (RSA)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub n: Option<String>,

    /// Base64url public exponent (RSA)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub e: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alg: Option<String>,

    #[serde(rename = "use", default, skip_serializing_if = "Option::is_none")]
    pub key_use: Option<String>,
}

impl Jwk {
    /// Publish an Ed25519 verifying key under `kid`
    pub fn from_verifying_key(kid: impl Into<String>, key: &VerifyingKey) -> Self {
        Self {
            kty: "OKP".to_owned(),
            crv: Some("Ed25519".to_owned()),
            kid: Some(kid.into()),
            x: Some(URL_SAFE_NO_PAD.encode(key.as_bytes())),
            n: None,
            e: None,
            alg: Some(ALG_EDDSA.to_owned()),
            key_use: Some("sig".to_owned()),
        }
    }

    /// Convert to a verification key, or `None` if this is not a usable
    /// signing key.
    pub fn to_verification_key(&self) -> Option<VerificationKey> {
        if self.key_use.as_deref().is_some_and(|u| u != "sig") {
            return None;
        }
        match self.kty.as_str() {
            "OKP" => self.to_verifying_key().map(VerificationKey::Ed25519),
            "RSA" => {
                if self.alg.as_deref().is_some_and(|a| a != ALG_RS256) {
                    return None;
                }
                DecodingKey::from_rsa_components(self.n.as_deref()?, self.e.as_deref()?)
                    .ok()
                    .map(VerificationKey::Rsa)
            }
            _ => None,
        }
    }

    /// Convert to an Ed25519 verifying key, or `None` if this is not a
    /// usable Ed25519 signing key.
    pub fn to_verifying_key(&self) -> Option<VerifyingKey> {
        if self.kty != "OKP" || self.crv.as_deref() != Some("Ed25519") {
            return None;
        }
        if self.key_use.as_deref().is_some_and(|u| u != "sig") {
            return None;
        }
        if self.alg.as_deref().is_some_and(|a| a != ALG_EDDSA) {
            return None;
        }

        let bytes = URL_SAFE_NO_PAD.decode(self.x.as_deref()?).ok()?;
        let bytes: [u8; 32] = bytes.try_into().ok()?;
        VerifyingKey::from_bytes(&bytes).ok()
    }
}

/// Wire format returned by a key provider
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JwkSet {
    pub keys: Vec<Jwk>,
}

/// A resolved public key; each variant verifies exactly one `alg`
#[derive(Clone)]
pub enum VerificationKey {
    Ed25519(VerifyingKey),
    Rsa(DecodingKey),
}

impl VerificationKey {
    /// The JOSE `alg` this key verifies
    pub fn algorithm(&self) -> &'static str {
        match self {
            VerificationKey::Ed25519(_) => ALG_EDDSA,
            VerificationKey::Rsa(_) => ALG_RS256,
        }
    }

    pub fn as_ed25519(&self) -> Option<&VerifyingKey> {
        match self {
            VerificationKey::Ed25519(key) => Some(key),
            VerificationKey::Rsa(_) => None,
        }
    }
}

impl fmt::Debug for VerificationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VerificationKey::Ed25519(key) => f.debug_tuple("Ed25519").field(key).finish(),
            VerificationKey::Rsa(_) => f.write_str("Rsa(..)"),
        }
    }
}

impl From<VerifyingKey> for VerificationKey {
    fn from(key: VerifyingKey) -> Self {
        VerificationKey::Ed25519(key)
    }
}

/// Resolved verification keys indexed by key id
#[derive(Debug, Clone, Default)]
pub struct KeySet {
    keys: HashMap<String, VerificationKey>,
}

impl KeySet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, kid: impl Into<String>, key: impl Into<VerificationKey>) {
        self.keys.insert(kid.into(), key.into());
    }

    pub fn get(&self, kid: &str) -> Option<&VerificationKey> {
        self.keys.get(kid)
    }

    pub fn contains(&self, kid: &str) -> bool {
        self.keys.contains_key(kid)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn kids(&self) -> impl Iterator<Item = &str> {
        self.keys.keys().map(String::as_str)
    }
}

impl From<&JwkSet> for KeySet {
    fn from(set: &JwkSet) -> Self {
        let mut keys = KeySet::new();
        for jwk in &set.keys {
            let Some(kid) = jwk.kid.as_deref() else {
                debug!("Skipping published key without kid");
                continue;
            };
            match jwk.to_verification_key() {
                Some(key) => keys.insert(kid, key),
                None => debug!(
                    "Skipping unusable key '{}' (kty={}, crv={:?}, alg={:?})",
                    kid, jwk.kty, jwk.crv, jwk.alg
                ),
            }
        }
        keys
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ed25519_dalek::SigningKey;

    fn key(seed: u8) -> VerifyingKey {
        SigningKey::from_bytes(&[seed; 32]).verifying_key()
    }

    fn rsa_jwk() -> Jwk {
        Jwk {
            kty: "RSA".to_owned(),
            crv: None,
            kid: Some("rsa-1".to_owned()),
            x: None,
            n: Some(URL_SAFE_NO_PAD.encode([0xc5u8; 256])),
            e: Some("AQAB".to_owned()),
            alg: Some(ALG_RS256.to_owned()),
            key_use: Some("sig".to_owned()),
        }
    }

    #[test]
    fn test_jwk_verifying_key_roundtrip() {
        let jwk = Jwk::from_verifying_key("k1", &key(7));
        assert_eq!(jwk.to_verifying_key(), Some(key(7)));
        assert_eq!(
            jwk.to_verification_key().unwrap().as_ed25519(),
            Some(&key(7))
        );
    }

    #[test]
    fn test_key_set_resolves_ed25519_and_rsa() {
        let json = format!(
            r#"{{"keys":[
                {},
                {{"kty":"OKP","crv":"Ed25519","kid":"ed-1","x":"{}"}},
                {{"kty":"OKP","crv":"X25519","kid":"x-1","x":"{}"}},
                {{"kty":"EC","crv":"P-256","kid":"ec-1","x":"abc","y":"def"}},
                {{"kty":"OKP","crv":"Ed25519","x":"{}"}}
            ]}}"#,
            serde_json::to_string(&rsa_jwk()).unwrap(),
            URL_SAFE_NO_PAD.encode(key(1).as_bytes()),
            URL_SAFE_NO_PAD.encode(key(2).as_bytes()),
            URL_SAFE_NO_PAD.encode(key(3).as_bytes()),
        );
        let set: JwkSet = serde_json::from_str(&json).unwrap();
        let keys = KeySet::from(&set);

        assert_eq!(keys.len(), 2);
        assert_eq!(keys.get("ed-1").and_then(VerificationKey::as_ed25519), Some(&key(1)));
        assert_eq!(keys.get("rsa-1").map(VerificationKey::algorithm), Some(ALG_RS256));
        assert!(!keys.contains("x-1"));
        assert!(!keys.contains("ec-1"));
    }

    #[test]
    fn test_rsa_jwk_requirements() {
        assert!(rsa_jwk().to_verification_key().is_some());

        let mut no_alg = rsa_jwk();
        no_alg.alg = None;
        assert!(no_alg.to_verification_key().is_some());

        let mut other_alg = rsa_jwk();
        other_alg.alg = Some("RS512".to_owned());
        assert!(other_alg.to_verification_key().is_none());

        let mut no_modulus = rsa_jwk();
        no_modulus.n = None;
        assert!(no_modulus.to_verification_key().is_none());

        let mut encryption = rsa_jwk();
        encryption.key_use = Some("enc".to_owned());
        assert!(encryption.to_verification_key().is_none());
    }

    #[test]
    fn test_jwk_rejects_bad_key_material() {
        let mut jwk = Jwk::from_verifying_key("k1", &key(1));
        jwk.x = Some("not base64!".to_owned());
        assert!(jwk.to_verifying_key().is_none());

        jwk.x = Some(URL_SAFE_NO_PAD.encode([0u8; 16]));
        assert!(jwk.to_verifying_key().is_none());
    }

    #[test]
    fn test_jwk_rejects_encryption_use() {
        let mut jwk = Jwk::from_verifying_key("k1", &key(1));
        jwk.key_use = Some("enc".to_owned());
        assert!(jwk.to_verifying_key().is_none());
        assert!(jwk.to_verification_key().is_none());
    }

    #[test]
    fn test_key_set_insert() {
        let mut keys = KeySet::new();
        keys.insert("b", key(2));
        keys.insert("a", key(1));

        let mut kids: Vec<_> = keys.kids().collect();
        kids.sort_unstable();
        assert_eq!(kids, ["a", "b"]);
        assert_eq!(keys.get("b").map(VerificationKey::algorithm), Some(ALG_EDDSA));
    }
}
