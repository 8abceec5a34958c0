//! Chat gateway HTTP server.
//!
//! Two routes: `POST /agents/chat` forwards the conversation to the
//! per-turn handler, and `GET /check-open-ai-key` reports whether an API
//! key is configured. All agent components live in an explicitly
//! constructed [`AppState`] passed into the router; there are no
//! module-level globals.

use crate::agent::handle_chat_turn;
use crate::builtin::SchedulerHandle;
use crate::confirmation::ConfirmationDecision;
use crate::llm::LlmProvider;
use crate::messages::ChatMessage;
use crate::tools::{ExecutionMap, ToolContext, ToolRegistry};
use crate::types::AgentConfig;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json};
use axum::routing::{get, post};
use axum::Router;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::error;

/// Shared state for the gateway handlers.
pub struct AppState {
    pub config: AgentConfig,
    pub provider: Arc<dyn LlmProvider>,
    pub registry: ToolRegistry<SchedulerHandle>,
    pub executions: ExecutionMap<SchedulerHandle>,
    pub scheduler: SchedulerHandle,
    pub has_api_key: bool,
}

/// Payload of `POST /agents/chat`.
#[derive(Debug, Deserialize)]
pub struct ChatTurnRequest {
    pub messages: Vec<ChatMessage>,
    /// Confirmation decisions keyed by tool-call id.
    #[serde(default)]
    pub decisions: HashMap<String, ConfirmationDecision>,
}

/// Response of `POST /agents/chat`: the updated conversation.
#[derive(Debug, Serialize)]
pub struct ChatTurnResponse {
    pub messages: Vec<ChatMessage>,
}

/// Build the gateway router.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/agents/chat", post(chat))
        .route("/check-open-ai-key", get(check_open_ai_key))
        .with_state(state)
}

async fn chat(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ChatTurnRequest>,
) -> impl IntoResponse {
    let ctx = ToolContext::new(Arc::clone(&state.scheduler));

    match handle_chat_turn(
        &state.config,
        state.provider.as_ref(),
        &state.registry,
        &state.executions,
        &ctx,
        request.messages,
        &request.decisions,
    )
    .await
    {
        Ok(messages) => (StatusCode::OK, Json(json!(ChatTurnResponse { messages }))),
        Err(e) => {
            error!(error = %e, "chat turn failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": e.to_string() })),
            )
        }
    }
}

async fn check_open_ai_key(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(json!({ "success": state.has_api_key }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builtin::{default_executions, default_registry};
    use crate::llm::{ChatOutcome, ChatRequest, ChatResponse, ContentBlock, StopReason, Usage};
    use crate::schedule::InMemoryScheduler;
    use anyhow::Result;
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    struct EchoProvider;

    #[async_trait]
    impl LlmProvider for EchoProvider {
        async fn chat(&self, _request: ChatRequest) -> Result<ChatOutcome> {
            Ok(ChatOutcome::Success(ChatResponse {
                id: "resp_1".to_string(),
                content: vec![ContentBlock::Text {
                    text: "hello back".to_string(),
                }],
                model: "test".to_string(),
                stop_reason: Some(StopReason::EndTurn),
                usage: Usage {
                    input_tokens: 1,
                    output_tokens: 1,
                },
            }))
        }

        fn model(&self) -> &str {
            "test"
        }

        fn provider(&self) -> &'static str {
            "echo"
        }
    }

    fn state(has_api_key: bool) -> Arc<AppState> {
        Arc::new(AppState {
            config: AgentConfig::default(),
            provider: Arc::new(EchoProvider),
            registry: default_registry(),
            executions: default_executions(),
            scheduler: Arc::new(InMemoryScheduler::new()),
            has_api_key,
        })
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_check_open_ai_key() {
        for (configured, expected) in [(true, true), (false, false)] {
            let app = router(state(configured));
            let response = app
                .oneshot(
                    Request::builder()
                        .uri("/check-open-ai-key")
                        .body(Body::empty())
                        .unwrap(),
                )
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK);
            let json = body_json(response).await;
            assert_eq!(json["success"], serde_json::json!(expected));
        }
    }

    #[tokio::test]
    async fn test_chat_appends_assistant_reply() {
        let app = router(state(true));
        let payload = serde_json::json!({
            "messages": [{
                "role": "user",
                "parts": [{"type": "text", "text": "hi"}],
                "created_at": "2026-01-01T00:00:00Z"
            }]
        });

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/agents/chat")
                    .header("content-type", "application/json")
                    .body(Body::from(payload.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        let messages = json["messages"].as_array().unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[1]["role"], "assistant");
        assert_eq!(messages[1]["parts"][0]["text"], "hello back");
    }
}
