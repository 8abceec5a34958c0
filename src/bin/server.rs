//! Chat gateway entrypoint.

use anyhow::Result;
use chat_agent::builtin::{default_executions, default_registry};
use chat_agent::config::Environment;
use chat_agent::providers::OpenAIProvider;
use chat_agent::schedule::InMemoryScheduler;
use chat_agent::server::{router, AppState};
use chat_agent::types::AgentConfig;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

const SYSTEM_PROMPT: &str = "You are a helpful assistant that can schedule tasks, \
     report the local time, and look up weather information (with user confirmation).";

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let env = Environment::from_env();

    let config = AgentConfig {
        system_prompt: SYSTEM_PROMPT.to_string(),
        ..AgentConfig::default()
    };
    let provider = OpenAIProvider::new(
        env.openai_api_key.clone().unwrap_or_default(),
        config.model.clone(),
    );

    let state = Arc::new(AppState {
        config,
        provider: Arc::new(provider),
        registry: default_registry(),
        executions: default_executions(),
        scheduler: Arc::new(InMemoryScheduler::new()),
        has_api_key: env.has_api_key(),
    });

    let listener = tokio::net::TcpListener::bind(env.gateway_addr).await?;
    info!(addr = %env.gateway_addr, "gateway listening");
    axum::serve(listener, router(state)).await?;

    Ok(())
}
