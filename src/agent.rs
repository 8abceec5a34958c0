//! Per-turn request handler.
//!
//! One inbound chat request maps to one [`handle_chat_turn`] call:
//! clean the history of dangling tool calls, resolve any human-decided
//! pending calls, convert to the model-native format, call the provider
//! with the merged tool set, and record the assistant reply. Auto tools
//! the model calls are executed immediately, sequentially, in array
//! order; confirmation-required calls are left pending for the next
//! turn's resolver.

use crate::confirmation::{resolve_pending_tool_calls, ConfirmationDecision};
use crate::llm::{ChatOutcome, ChatRequest, ContentBlock, LlmProvider};
use crate::messages::{
    clean_incomplete_tool_calls, system_text, to_model_messages, ChatMessage, MessagePart, Role,
    ToolCallPart,
};
use crate::tools::{ExecutionMap, ToolContext, ToolRegistry};
use crate::types::AgentConfig;
use anyhow::Result;
use serde_json::Value;
use std::collections::HashMap;
use tracing::{debug, error, warn};

/// Run one chat turn and return the updated history.
///
/// The returned history is the input history (cleaned and with pending
/// calls resolved) plus one assistant message. Provider-level failures
/// (rate limit, bad request, server error) degrade to an assistant text
/// message; only transport errors propagate.
///
/// # Errors
/// Returns an error if the provider call fails at the transport level.
pub async fn handle_chat_turn<Ctx: Send + Sync>(
    config: &AgentConfig,
    provider: &dyn LlmProvider,
    registry: &ToolRegistry<Ctx>,
    executions: &ExecutionMap<Ctx>,
    ctx: &ToolContext<Ctx>,
    history: Vec<ChatMessage>,
    decisions: &HashMap<String, ConfirmationDecision>,
) -> Result<Vec<ChatMessage>> {
    let mut history = clean_incomplete_tool_calls(&history, executions);

    let resolved = resolve_pending_tool_calls(&mut history, decisions, executions, ctx).await;
    if resolved > 0 {
        debug!(resolved, "resolved pending tool calls");
    }

    let mut system = config.system_prompt.clone();
    if let Some(extra) = system_text(&history) {
        if system.is_empty() {
            system = extra;
        } else {
            system = format!("{system}\n{extra}");
        }
    }

    let tools = if registry.is_empty() {
        None
    } else {
        Some(registry.to_llm_tools())
    };

    let request = ChatRequest {
        system,
        messages: to_model_messages(&history),
        tools,
        max_tokens: config.max_tokens,
    };

    debug!(model = %config.model, messages = request.messages.len(), "calling model");

    let reply = match provider.chat(request).await? {
        ChatOutcome::Success(response) => {
            let mut parts = Vec::new();
            for block in &response.content {
                match block {
                    ContentBlock::Text { text } => {
                        parts.push(MessagePart::Text { text: text.clone() });
                    }
                    ContentBlock::ToolUse { id, name, input } => {
                        let call = run_or_defer(registry, ctx, id, name, input.clone()).await;
                        parts.push(MessagePart::ToolCall(call));
                    }
                    ContentBlock::ToolResult { .. } => {}
                }
            }
            ChatMessage::new(Role::Assistant, parts)
        }
        ChatOutcome::RateLimited => {
            warn!("model provider rate limited");
            ChatMessage::assistant("Error: rate limited by the model provider, please retry later")
        }
        ChatOutcome::InvalidRequest(msg) => {
            warn!(%msg, "model rejected request");
            ChatMessage::assistant(format!("Error: the model rejected the request: {msg}"))
        }
        ChatOutcome::ServerError(msg) => {
            error!(%msg, "model provider server error");
            ChatMessage::assistant(format!("Error: model provider failure: {msg}"))
        }
    };

    history.push(reply);
    Ok(history)
}

/// Execute an auto tool call immediately, or record a pending call for a
/// confirmation-required (or unknown) tool.
async fn run_or_defer<Ctx: Send + Sync>(
    registry: &ToolRegistry<Ctx>,
    ctx: &ToolContext<Ctx>,
    id: &str,
    name: &str,
    input: Value,
) -> ToolCallPart {
    let mut call = ToolCallPart::pending(id, name, input.clone());

    if let Some(tool) = registry.get_auto(name) {
        let output = match tool.execute(ctx, input).await {
            Ok(result) => Value::String(result.output),
            Err(e) => {
                warn!(tool = %name, error = %e, "auto tool failed");
                Value::String(format!("Error: {e}"))
            }
        };
        call.complete(output);
    }

    call
}
