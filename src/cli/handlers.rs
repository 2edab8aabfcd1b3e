//! Command handlers

use std::io::Write;
use std::net::SocketAddr;
use std::path::Path;

use anyhow::{Context, Result};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use ed25519_dalek::SigningKey;
use rand::rngs::OsRng;
use tracing::info;

use super::commands::{KeygenCommand, ServeCommand, TokenCommand, VerifyCommand};
use crate::auth::{self, check_permissions, Claims, Jwk, JwkSet, TokenVerifier};
use crate::config::BrewConfig;
use crate::error::Error;
use crate::server::{self, state::ServerState};

/// File name of the private signing key written by `keygen`
pub const SIGNING_KEY_FILE: &str = "signing.key";

/// File name of the public key set written by `keygen`
pub const JWKS_FILE: &str = "jwks.json";

/// Run the HTTP server
pub async fn handle_serve(mut config: BrewConfig, cmd: ServeCommand) -> Result<()> {
    if let Some(host) = cmd.host {
        config.server.host = host;
    }
    if let Some(port) = cmd.port {
        config.server.port = port;
    }
    config.server.seed_drinks |= cmd.seed;

    let addr = config
        .server
        .bind_addr()
        .parse::<SocketAddr>()
        .with_context(|| format!("Invalid listen address {}", config.server.bind_addr()))?;

    match &config.auth.jwks_file {
        Some(path) => info!("Verifying tokens with keys from {}", path.display()),
        None => info!("Verifying tokens with keys from {}", config.auth.jwks_url()),
    }
    info!(
        "Expecting issuer '{}' and audience '{}'",
        config.auth.issuer(),
        config.auth.audience
    );

    let state = ServerState::new(&config).await;
    server::start_server(addr, state).await
}

/// Generate a signing key and publish its verifying key as a JWKS
pub fn handle_keygen(cmd: KeygenCommand) -> Result<()> {
    std::fs::create_dir_all(&cmd.out_dir)
        .with_context(|| format!("Failed to create {}", cmd.out_dir.display()))?;

    let signing_key = SigningKey::generate(&mut OsRng);
    let key_path = cmd.out_dir.join(SIGNING_KEY_FILE);
    write_signing_key(&key_path, &signing_key)?;

    let jwks = JwkSet {
        keys: vec![Jwk::from_verifying_key(cmd.kid.clone(), &signing_key.verifying_key())],
    };
    let jwks_path = cmd.out_dir.join(JWKS_FILE);
    std::fs::write(&jwks_path, serde_json::to_string_pretty(&jwks)?)
        .with_context(|| format!("Failed to write {}", jwks_path.display()))?;

    println!("Signing key: {}", key_path.display());
    println!("Key set:     {} (kid '{}')", jwks_path.display(), cmd.kid);
    Ok(())
}

/// Mint a token signed with a local key
pub fn handle_token(config: &BrewConfig, cmd: TokenCommand) -> Result<()> {
    let signing_key = read_signing_key(&cmd.key)
        .with_context(|| format!("Failed to load signing key from {}", cmd.key.display()))?;

    let now = chrono::Utc::now().timestamp();
    let exp = now
        .checked_add(cmd.ttl_secs)
        .with_context(|| format!("Token lifetime of {}s is out of range", cmd.ttl_secs))?;
    let claims = Claims::new(cmd.sub, now, exp)
        .with_issuer(config.auth.issuer())
        .with_audience(config.auth.audience.clone())
        .with_permissions(cmd.permissions);

    println!("{}", auth::encode(&claims, &cmd.kid, &signing_key));
    Ok(())
}

/// Verify a token and print its claims
pub async fn handle_verify(config: &BrewConfig, cmd: VerifyCommand) -> Result<()> {
    let verifier = TokenVerifier::from_config(&config.auth);
    let claims = verifier.verify(&cmd.token).await?;
    if let Some(scope) = cmd.permission.as_deref() {
        check_permissions(scope, &claims)?;
    }

    println!("{}", serde_json::to_string_pretty(&claims)?);
    Ok(())
}

/// Write the 32-byte key seed as base64url, readable only by the owner
pub fn write_signing_key(path: &Path, key: &SigningKey) -> crate::error::Result<()> {
    let mut options = std::fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    let mut file = options.open(path)?;

    // `mode` only applies on creation; tighten a key file that already existed
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        file.set_permissions(std::fs::Permissions::from_mode(0o600))?;
    }

    file.write_all(URL_SAFE_NO_PAD.encode(key.to_bytes()).as_bytes())?;
    Ok(())
}

/// Read a key written by [`write_signing_key`]
pub fn read_signing_key(path: &Path) -> crate::error::Result<SigningKey> {
    let contents = std::fs::read_to_string(path)?;
    let bytes = URL_SAFE_NO_PAD
        .decode(contents.trim())
        .map_err(|e| Error::InvalidKey(e.to_string()))?;
    let seed: [u8; 32] = bytes
        .try_into()
        .map_err(|_| Error::InvalidKey("expected 32 bytes".to_owned()))?;
    Ok(SigningKey::from_bytes(&seed))
}
