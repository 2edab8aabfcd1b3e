//! Command-line interface module.
//!
//! This module provides the CLI functionality for:
//! - Running the drinks API server
//! - Generating development signing keys
//! - Minting and verifying tokens

pub mod commands;
pub mod handlers;

pub use commands::Commands;
pub use handlers::{handle_keygen, handle_serve, handle_token, handle_verify};
