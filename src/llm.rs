pub mod types;

pub use types::*;

use anyhow::Result;
use async_trait::async_trait;

/// Provider-agnostic chat interface.
///
/// The per-turn handler talks to the model exclusively through this trait;
/// token streaming and transport details live behind the implementation.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    async fn chat(&self, request: ChatRequest) -> Result<ChatOutcome>;
    fn model(&self) -> &str;
    fn provider(&self) -> &'static str;
}
