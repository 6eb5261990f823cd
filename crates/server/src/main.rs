use anyhow::Result;
use bugzilla_mcp::McpServer;
use clap::Parser;
use std::sync::Arc;

mod api;
mod config;

use config::Args;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // RUST_LOG wins over --log-level
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| args.log_level.clone().into()),
        )
        .with_target(false)
        .with_thread_ids(true)
        .init();

    let config = args.into_server_config()?;

    tracing::info!("Starting mcp-bugzilla {}", env!("CARGO_PKG_VERSION"));
    tracing::info!("Bugzilla server: {}", config.bugzilla_server());
    tracing::info!(
        "Reading API keys from the `{}` header, sending them as {}",
        config.api_key_header,
        config.auth_scheme.as_str()
    );

    let addr = config.bind_addr();
    let server = Arc::new(McpServer::new(config)?);

    api::serve(&addr, server).await?;

    Ok(())
}
