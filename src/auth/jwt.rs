//! Compact JWS handling.
//!
//! # Token Format
//!
//! Standard RFC 7519 JWT:
//! - Header: `{"alg":"EdDSA","typ":"JWT","kid":"<key id>"}`
//! - Payload: [`Claims`]
//! - Signature: Ed25519 over `base64url(header).base64url(payload)`
//!
//! Tokens from hosted providers signed with RS256 are verified as well;
//! [`encode`] only produces EdDSA tokens.
//!
//! The functions here are the individual decoding stages; the order in
//! which they run is owned by [`TokenVerifier`](super::TokenVerifier).

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use jsonwebtoken::{Algorithm, DecodingKey};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::jwks::VerificationKey;
use super::{AuthError, Claims};

/// JOSE algorithm name for Ed25519 signatures
pub const ALG_EDDSA: &str = "EdDSA";

/// JOSE algorithm name for RSASSA-PKCS1-v1_5 with SHA-256
pub const ALG_RS256: &str = "RS256";

/// JOSE header
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Header {
    pub alg: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub typ: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kid: Option<String>,
}

/// A token split into its three segments, still encoded
#[derive(Debug, Clone, Copy)]
pub struct RawToken<'a> {
    pub header: &'a str,
    pub payload: &'a str,
    pub signature: &'a str,
}

impl<'a> RawToken<'a> {
    /// Split a compact token into header, payload and signature segments
    pub fn split(token: &'a str) -> Result<Self, AuthError> {
        let mut parts = token.split('.');
        match (parts.next(), parts.next(), parts.next(), parts.next()) {
            (Some(header), Some(payload), Some(signature), None)
                if !header.is_empty() && !payload.is_empty() && !signature.is_empty() =>
            {
                Ok(Self {
                    header,
                    payload,
                    signature,
                })
            }
            _ => Err(AuthError::MalformedToken(
                "expected three dot-separated segments".to_owned(),
            )),
        }
    }

    /// Decode the JOSE header.
    ///
    /// A header that cannot be read yields no key id, so it is reported as
    /// [`AuthError::UnknownKeyId`].
    pub fn header(&self) -> Result<Header, AuthError> {
        let bytes = URL_SAFE_NO_PAD
            .decode(self.header)
            .map_err(|_| AuthError::UnknownKeyId)?;
        serde_json::from_slice(&bytes).map_err(|_| AuthError::UnknownKeyId)
    }

    /// Decode the payload without checking the signature
    pub fn claims(&self) -> Result<Claims, AuthError> {
        let bytes = URL_SAFE_NO_PAD
            .decode(self.payload)
            .map_err(|_| AuthError::MalformedToken("payload is not base64url".to_owned()))?;
        serde_json::from_slice(&bytes)
            .map_err(|e| AuthError::MalformedToken(format!("payload is not valid claims: {e}")))
    }

    /// Verify the Ed25519 signature over `header.payload`
    pub fn verify_signature(&self, key: &VerifyingKey) -> Result<(), AuthError> {
        let signature_bytes = URL_SAFE_NO_PAD
            .decode(self.signature)
            .map_err(|_| AuthError::SignatureInvalid)?;
        let signature_bytes: [u8; 64] = signature_bytes
            .try_into()
            .map_err(|_| AuthError::SignatureInvalid)?;
        let signature = Signature::from_bytes(&signature_bytes);

        key.verify(self.signing_input().as_bytes(), &signature)
            .map_err(|_| AuthError::SignatureInvalid)
    }

    /// Verify an RS256 signature over `header.payload`
    pub fn verify_rsa_signature(&self, key: &DecodingKey) -> Result<(), AuthError> {
        match jsonwebtoken::crypto::verify(
            self.signature,
            self.signing_input().as_bytes(),
            key,
            Algorithm::RS256,
        ) {
            Ok(true) => Ok(()),
            _ => Err(AuthError::SignatureInvalid),
        }
    }

    /// Verify the signature with `key`, which must match the header's `alg`
    pub fn verify_with(&self, alg: &str, key: &VerificationKey) -> Result<(), AuthError> {
        match (alg, key) {
            (ALG_EDDSA, VerificationKey::Ed25519(key)) => self.verify_signature(key),
            (ALG_RS256, VerificationKey::Rsa(key)) => self.verify_rsa_signature(key),
            _ => {
                debug!(
                    "Token alg '{}' does not match key alg '{}'",
                    alg,
                    key.algorithm()
                );
                Err(AuthError::SignatureInvalid)
            }
        }
    }

    fn signing_input(&self) -> String {
        format!("{}.{}", self.header, self.payload)
    }
}

/// Encode and sign a JWT with key id `kid`
pub fn encode(claims: &Claims, kid: &str, signing_key: &SigningKey) -> String {
    let header = Header {
        alg: ALG_EDDSA.to_owned(),
        typ: Some("JWT".to_owned()),
        kid: Some(kid.to_owned()),
    };
    let header_json = serde_json::to_string(&header).unwrap_or_else(|e| {
        tracing::error!("JWT header serialization failed: {}", e);
        "{}".to_owned()
    });
    let payload_json = serde_json::to_string(claims).unwrap_or_else(|e| {
        tracing::error!("JWT claims serialization failed: {}", e);
        "{}".to_owned()
    });

    let signing_input = format!(
        "{}.{}",
        URL_SAFE_NO_PAD.encode(header_json),
        URL_SAFE_NO_PAD.encode(payload_json)
    );
    let signature = signing_key.sign(signing_input.as_bytes());
    let signature_b64 = URL_SAFE_NO_PAD.encode(signature.to_bytes());

    format!("{signing_input}.{signature_b64}")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signing_key() -> SigningKey {
        SigningKey::from_bytes(&[42u8; 32])
    }

    #[test]
    fn test_encode_then_split() {
        let claims = Claims::new("barista", 1000, 2000).with_permissions(["get:drink-details"]);
        let token = encode(&claims, "k1", &signing_key());

        let raw = RawToken::split(&token).unwrap();
        let header = raw.header().unwrap();
        assert_eq!(header.alg, ALG_EDDSA);
        assert_eq!(header.kid.as_deref(), Some("k1"));
        assert_eq!(raw.claims().unwrap(), claims);
        raw.verify_signature(&signing_key().verifying_key()).unwrap();
    }

    #[test]
    fn test_split_rejects_wrong_segment_count() {
        for token in ["", "abc", "a.b", "a.b.c.d", "a..c", ".b.c"] {
            assert!(
                matches!(RawToken::split(token), Err(AuthError::MalformedToken(_))),
                "token {token:?}"
            );
        }
    }

    #[test]
    fn test_unreadable_header_has_no_key_id() {
        let raw = RawToken::split("abc.def.ghi").unwrap();
        assert_eq!(raw.header(), Err(AuthError::UnknownKeyId));
    }

    #[test]
    fn test_signature_from_other_key_fails() {
        let claims = Claims::new("barista", 1000, 2000);
        let token = encode(&claims, "k1", &signing_key());
        let other = SigningKey::from_bytes(&[7u8; 32]).verifying_key();

        let raw = RawToken::split(&token).unwrap();
        assert_eq!(raw.verify_signature(&other), Err(AuthError::SignatureInvalid));
    }

    #[test]
    fn test_alg_must_match_key() {
        let claims = Claims::new("barista", 1000, 2000);
        let token = encode(&claims, "k1", &signing_key());
        let raw = RawToken::split(&token).unwrap();
        let key = VerificationKey::from(signing_key().verifying_key());

        assert_eq!(raw.verify_with(ALG_EDDSA, &key), Ok(()));
        assert_eq!(raw.verify_with(ALG_RS256, &key), Err(AuthError::SignatureInvalid));
        assert_eq!(raw.verify_with("none", &key), Err(AuthError::SignatureInvalid));
    }

    #[test]
    fn test_truncated_signature_fails() {
        let claims = Claims::new("barista", 1000, 2000);
        let token = encode(&claims, "k1", &signing_key());
        let truncated = &token[..token.len() - 4];

        let raw = RawToken::split(truncated).unwrap();
        assert_eq!(
            raw.verify_signature(&signing_key().verifying_key()),
            Err(AuthError::SignatureInvalid)
        );
    }
}
