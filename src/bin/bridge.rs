//! Local bridge entrypoint.

use anyhow::Result;
use chat_agent::bridge::{router, BridgeState};
use chat_agent::config::Environment;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let env = Environment::from_env();
    let state = Arc::new(BridgeState {
        sync_dir: env.sync_dir.clone(),
    });

    let listener = tokio::net::TcpListener::bind(env.bridge_addr).await?;
    info!(addr = %env.bridge_addr, dir = %env.sync_dir.display(), "bridge listening");
    axum::serve(listener, router(state)).await?;

    Ok(())
}
