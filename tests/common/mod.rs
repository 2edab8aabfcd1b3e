//! Common test utilities: fixed keys, token minting, and a test server
#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use brewgate_core::auth::{
    encode, Claims, Jwk, JwkSet, KeyStore, StaticKeySource, TokenVerifier, Validation,
};
use brewgate_core::config::ServerConfig;
use brewgate_core::drinks::InMemoryDrinkStore;
use brewgate_core::server::{create_app, state::ServerState};
use ed25519_dalek::SigningKey;
use tokio::net::TcpListener;

pub const ISSUER: &str = "https://brewgate.test/";
pub const AUDIENCE: &str = "drink";
pub const KID: &str = "test-key";

/// Key id of the RS256 provider key in `fixtures/rsa_test_jwks.json`
pub const RSA_KID: &str = "auth0-rsa";
const RSA_PRIVATE_PEM: &str = include_str!("../fixtures/rsa_test_key.pem");
const RSA_JWKS: &str = include_str!("../fixtures/rsa_test_jwks.json");

pub fn signing_key() -> SigningKey {
    SigningKey::from_bytes(&[11u8; 32])
}

/// A key the verifier has never seen
pub fn rogue_key() -> SigningKey {
    SigningKey::from_bytes(&[99u8; 32])
}

pub fn jwks() -> JwkSet {
    JwkSet {
        keys: vec![Jwk::from_verifying_key(KID, &signing_key().verifying_key())],
    }
}

/// The key set an RS256 identity provider publishes
pub fn rsa_jwks() -> JwkSet {
    serde_json::from_str(RSA_JWKS).unwrap()
}

/// Sign `claims` with RS256 the way a hosted identity provider does
pub fn rsa_token(claims: &Claims) -> String {
    let header = jsonwebtoken::Header {
        kid: Some(RSA_KID.to_owned()),
        ..jsonwebtoken::Header::new(jsonwebtoken::Algorithm::RS256)
    };
    let key = jsonwebtoken::EncodingKey::from_rsa_pem(RSA_PRIVATE_PEM.as_bytes()).unwrap();
    jsonwebtoken::encode(&header, claims, &key).unwrap()
}

/// Verifier trusting both the Ed25519 test key and the RSA provider key
pub fn mixed_verifier() -> TokenVerifier {
    let mut keys = jwks();
    keys.keys.extend(rsa_jwks().keys);
    TokenVerifier::new(
        KeyStore::new(Arc::new(StaticKeySource::new(keys)), Duration::ZERO),
        Validation::new(ISSUER, AUDIENCE),
    )
}

pub fn verifier() -> TokenVerifier {
    TokenVerifier::new(
        KeyStore::new(Arc::new(StaticKeySource::new(jwks())), Duration::ZERO),
        Validation::new(ISSUER, AUDIENCE),
    )
}

pub fn now() -> i64 {
    chrono::Utc::now().timestamp()
}

/// Claims valid for the next hour carrying `permissions`
pub fn claims(permissions: &[&str]) -> Claims {
    Claims::new("auth0|barista", now() - 5, now() + 3600)
        .with_issuer(ISSUER)
        .with_audience(AUDIENCE)
        .with_permissions(permissions.iter().copied())
}

pub fn token(claims: &Claims) -> String {
    encode(claims, KID, &signing_key())
}

pub fn bearer(claims: &Claims) -> String {
    format!("Bearer {}", token(claims))
}

pub struct TestServer {
    pub handle: tokio::task::JoinHandle<()>,
    pub addr: SocketAddr,
}

impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Start the drinks API on an ephemeral port with a seeded store
pub async fn start_test_server() -> TestServer {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let state = ServerState::with_parts(
        verifier(),
        Arc::new(InMemoryDrinkStore::seeded().await),
        ServerConfig::builder().cors_enabled(false).build(),
    );
    let app = create_app(state);

    let handle = tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    TestServer { handle, addr }
}
