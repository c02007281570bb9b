//! wikiscribe API server binary.
//!
//! Usage:
//!   wikiscribe-api
//!   wikiscribe-api --port 9000 --config wikiscribe.toml
//!
//! # Environment Variables
//!
//! - `API_HOST` / `API_PORT` - Bind address (default 0.0.0.0:8000)
//! - `GROQ_API_KEY`, `GEMINI_API_KEY` - Provider credentials
//! - `DEFAULT_LLM` - Provider used when a request does not name one
//! - `RUST_LOG` - Log filter

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use wikiscribe_api::{AppState, serve};
use wikiscribe_llm::LlmConfig;

/// Wiki article generator HTTP API
#[derive(Parser)]
#[command(name = "wikiscribe-api", version, about)]
struct Args {
    /// Host to bind to
    #[arg(long, env = "API_HOST", default_value = "0.0.0.0")]
    host: String,

    /// Port to listen on
    #[arg(long, env = "API_PORT", default_value_t = 8000)]
    port: u16,

    /// LLM configuration file (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,wikiscribe_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    let config = match &args.config {
        Some(path) => LlmConfig::from_file(path)?,
        None => {
            tracing::info!("Using default LLM configuration");
            LlmConfig::from_env()?
        }
    };
    tracing::info!(provider = %config.default_provider, "Default LLM provider");

    let state = AppState::from_config(config)?;

    let addr: SocketAddr = format!("{}:{}", args.host, args.port).parse()?;
    serve(Arc::new(state), addr).await?;

    Ok(())
}
