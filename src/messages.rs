//! Chat message model and history cleanup.
//!
//! Messages at this layer are the conversation the caller sees: ordered
//! parts of text and tool calls, with tool calls carrying their own
//! lifecycle state. [`to_model_messages`] converts them into the
//! model-native format before a provider call, and
//! [`clean_incomplete_tool_calls`] strips dangling tool calls the model
//! API would reject.

use crate::llm;
use crate::tools::ExecutionMap;
use crate::types::ToolCallState;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use time::OffsetDateTime;

/// Role of a chat message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    System,
}

/// A tool-call part of a message.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ToolCallPart {
    /// Unique call id assigned by the model
    pub id: String,
    /// Name of the tool being called
    pub tool_name: String,
    /// Input arguments
    pub input: Value,
    /// Recorded result, if any. Never overwritten once set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<Value>,
    /// Lifecycle state
    pub state: ToolCallState,
}

impl ToolCallPart {
    #[must_use]
    pub fn pending(id: impl Into<String>, tool_name: impl Into<String>, input: Value) -> Self {
        Self {
            id: id.into(),
            tool_name: tool_name.into(),
            input,
            output: None,
            state: ToolCallState::Pending,
        }
    }

    /// Record a result and mark the call completed.
    ///
    /// No-op unless the call is still pending; an existing output is
    /// never overwritten.
    pub fn complete(&mut self, output: Value) {
        if self.state == ToolCallState::Pending && self.output.is_none() {
            self.output = Some(output);
            self.state = ToolCallState::Completed;
        }
    }

    /// Record a cancellation and mark the call cancelled.
    ///
    /// Same overwrite rules as [`complete`](Self::complete).
    pub fn cancel(&mut self, output: Value) {
        if self.state == ToolCallState::Pending && self.output.is_none() {
            self.output = Some(output);
            self.state = ToolCallState::Cancelled;
        }
    }

    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.state == ToolCallState::Pending
    }
}

/// One part of a message: plain text or a tool call.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MessagePart {
    Text { text: String },
    ToolCall(ToolCallPart),
}

/// A message in the conversation history.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub parts: Vec<MessagePart>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl ChatMessage {
    #[must_use]
    pub fn new(role: Role, parts: Vec<MessagePart>) -> Self {
        Self {
            role,
            parts,
            created_at: OffsetDateTime::now_utc(),
        }
    }

    #[must_use]
    pub fn user(text: impl Into<String>) -> Self {
        Self::new(Role::User, vec![MessagePart::Text { text: text.into() }])
    }

    #[must_use]
    pub fn assistant(text: impl Into<String>) -> Self {
        Self::new(
            Role::Assistant,
            vec![MessagePart::Text { text: text.into() }],
        )
    }

    #[must_use]
    pub fn system(text: impl Into<String>) -> Self {
        Self::new(Role::System, vec![MessagePart::Text { text: text.into() }])
    }

    /// Iterate over the tool-call parts of this message.
    pub fn tool_calls(&self) -> impl Iterator<Item = &ToolCallPart> {
        self.parts.iter().filter_map(|p| match p {
            MessagePart::ToolCall(call) => Some(call),
            MessagePart::Text { .. } => None,
        })
    }
}

/// Strip tool-call parts the model API would reject.
///
/// A tool call is incomplete when it has no recorded output and its tool
/// name has no execution-map entry (so nothing will ever fill it in).
/// Everything else passes through unchanged; running the cleanup twice
/// yields the same result.
#[must_use]
pub fn clean_incomplete_tool_calls<Ctx>(
    messages: &[ChatMessage],
    executions: &ExecutionMap<Ctx>,
) -> Vec<ChatMessage> {
    messages
        .iter()
        .map(|msg| {
            let parts = msg
                .parts
                .iter()
                .filter(|part| match part {
                    MessagePart::Text { .. } => true,
                    MessagePart::ToolCall(call) => {
                        call.output.is_some() || executions.contains(&call.tool_name)
                    }
                })
                .cloned()
                .collect();
            ChatMessage {
                role: msg.role,
                parts,
                created_at: msg.created_at,
            }
        })
        .collect()
}

/// Convert conversation history into model-native messages.
///
/// Text parts become text blocks. A completed or cancelled tool call
/// becomes a `tool_use` block on the assistant message plus a follow-up
/// `tool_result` message; a still-pending call contributes only the
/// `tool_use` block. System messages are folded into the request's
/// system prompt by the handler and skipped here.
#[must_use]
pub fn to_model_messages(messages: &[ChatMessage]) -> Vec<llm::Message> {
    let mut out = Vec::new();

    for msg in messages {
        let role = match msg.role {
            Role::User => llm::Role::User,
            Role::Assistant => llm::Role::Assistant,
            Role::System => continue,
        };

        let mut blocks = Vec::new();
        let mut results = Vec::new();

        for part in &msg.parts {
            match part {
                MessagePart::Text { text } => {
                    blocks.push(llm::ContentBlock::Text { text: text.clone() });
                }
                MessagePart::ToolCall(call) => {
                    blocks.push(llm::ContentBlock::ToolUse {
                        id: call.id.clone(),
                        name: call.tool_name.clone(),
                        input: call.input.clone(),
                    });
                    if let Some(output) = &call.output {
                        results.push(llm::Message::tool_result(
                            &call.id,
                            value_to_text(output),
                            call.state == ToolCallState::Cancelled,
                        ));
                    }
                }
            }
        }

        if !blocks.is_empty() {
            out.push(llm::Message {
                role,
                content: llm::Content::Blocks(blocks),
            });
        }
        out.extend(results);
    }

    out
}

/// Collect the text of system messages for the request's system prompt.
#[must_use]
pub fn system_text(messages: &[ChatMessage]) -> Option<String> {
    let texts: Vec<&str> = messages
        .iter()
        .filter(|m| m.role == Role::System)
        .flat_map(|m| &m.parts)
        .filter_map(|p| match p {
            MessagePart::Text { text } => Some(text.as_str()),
            MessagePart::ToolCall(_) => None,
        })
        .collect();

    if texts.is_empty() {
        None
    } else {
        Some(texts.join("\n"))
    }
}

fn value_to_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
