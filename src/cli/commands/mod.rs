//! Command definitions

use clap::{Args, Subcommand};
use std::path::PathBuf;

#[derive(Subcommand)]
pub enum Commands {
    /// Start the drinks API server
    Serve(ServeCommand),
    /// Generate an Ed25519 signing key and its public JWKS
    Keygen(KeygenCommand),
    /// Mint a signed token for local development
    Token(TokenCommand),
    /// Verify a token with the configured key set and print its claims
    Verify(VerifyCommand),
}

#[derive(Args)]
pub struct ServeCommand {
    /// Bind host (overrides config)
    #[arg(long)]
    pub host: Option<String>,

    /// Bind port (overrides config)
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Seed the drink store with a sample drink
    #[arg(long)]
    pub seed: bool,
}

#[derive(Args)]
pub struct KeygenCommand {
    /// Key id published in the JWKS and stamped into minted tokens
    #[arg(long, default_value = "brewgate-dev")]
    pub kid: String,

    /// Directory receiving `signing.key` and `jwks.json`
    #[arg(long, default_value = ".")]
    pub out_dir: PathBuf,
}

#[derive(Args)]
pub struct TokenCommand {
    /// Signing key written by `keygen`
    #[arg(long, env = "BREWGATE_SIGNING_KEY")]
    pub key: PathBuf,

    #[arg(long, default_value = "brewgate-dev")]
    pub kid: String,

    /// Subject claim
    #[arg(long, default_value = "dev|barista")]
    pub sub: String,

    /// Permission to grant; repeatable
    #[arg(long = "permission", value_name = "SCOPE")]
    pub permissions: Vec<String>,

    /// Token lifetime in seconds
    #[arg(long, default_value_t = 3600)]
    pub ttl_secs: i64,
}

#[derive(Args)]
pub struct VerifyCommand {
    /// Compact token to verify
    #[arg(long)]
    pub token: String,

    /// Also require this permission
    #[arg(long, value_name = "SCOPE")]
    pub permission: Option<String>,
}
