//! brewgate binary - drinks API server and token tooling

use anyhow::{Context as _, Result};
use clap::Parser;
use tracing::info;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::EnvFilter;

use brewgate_core::cli::{handle_keygen, handle_serve, handle_token, handle_verify, Commands};
use brewgate_core::config::BrewConfig;

#[derive(Parser)]
#[command(
    name = "brewgate",
    version,
    about = "Coffee-shop drinks API guarded by permission-scoped bearer tokens",
    long_about = None
)]
struct Cli {
    /// Path to configuration file (overrides ./brewgate.toml)
    #[arg(long, global = true, env = "BREWGATE_CONFIG")]
    config: Option<std::path::PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

fn load_config(path: Option<&std::path::Path>) -> Result<BrewConfig> {
    match path {
        Some(p) => {
            info!("Loading config from: {}", p.display());
            BrewConfig::load(Some(p))
                .with_context(|| format!("Failed to load config from {}", p.display()))
        }
        None => BrewConfig::load(None).context("Failed to load configuration"),
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_log_level = match &cli.command {
        Commands::Serve(_) => "brewgate=info,brewgate_core=info,tower_http=info",
        _ => "brewgate=warn,brewgate_core=warn",
    };
    let filter = || {
        EnvFilter::builder().parse_lossy(
            std::env::var("RUST_LOG").unwrap_or_else(|_| default_log_level.to_owned()),
        )
    };

    // Keep the guard alive so buffered file logs are flushed on exit
    let _log_guard = if let Ok(log_dir) = std::env::var("BREWGATE_LOG_DIR") {
        let file_appender = RollingFileAppender::new(Rotation::DAILY, &log_dir, "brewgate.log");
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

        tracing_subscriber::fmt()
            .with_env_filter(filter())
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
            .with_writer(non_blocking)
            .init();

        info!("File logging enabled to {}/brewgate.log", log_dir);
        Some(guard)
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter())
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
            .with_writer(std::io::stderr)
            .init();
        None
    };

    let config = load_config(cli.config.as_deref())?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to start tokio runtime")?;

    runtime.block_on(async move {
        match cli.command {
            Commands::Serve(cmd) => handle_serve(config, cmd).await,
            Commands::Verify(cmd) => handle_verify(&config, cmd).await,
            Commands::Keygen(cmd) => handle_keygen(cmd),
            Commands::Token(cmd) => handle_token(&config, cmd),
        }
    })
}
