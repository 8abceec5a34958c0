//! Core types shared across the crate.
//!
//! - [`ThreadId`]: Unique identifier for conversation threads
//! - [`AgentConfig`]: Configuration passed into the per-turn handler
//! - [`ToolResult`]: Result returned from tool execution
//! - [`ToolCallState`]: Three-state lifecycle of a tool-call part

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a conversation thread
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ThreadId(pub String);

impl ThreadId {
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    #[must_use]
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }
}

impl Default for ThreadId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ThreadId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Configuration for a chat turn.
///
/// Constructed explicitly by the caller and passed into
/// [`handle_chat_turn`](crate::agent::handle_chat_turn); there is no
/// process-wide default model or tool set.
#[derive(Clone, Debug)]
pub struct AgentConfig {
    /// Model identifier
    pub model: String,
    /// System prompt for the agent
    pub system_prompt: String,
    /// Maximum tokens per response
    pub max_tokens: u32,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            model: String::from("gpt-4o-mini"),
            system_prompt: String::new(),
            max_tokens: 4096,
        }
    }
}

/// Lifecycle state of a tool-call part.
///
/// A call starts `Pending` when the model emits it. The confirmation
/// resolver (or immediate auto execution) moves it to `Completed`, or to
/// `Cancelled` when the user denies it. There are no other transitions,
/// and a recorded output is never overwritten.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolCallState {
    Pending,
    Completed,
    Cancelled,
}

/// Result of a tool execution
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ToolResult {
    /// Whether the tool execution succeeded
    pub success: bool,
    /// Output content (displayed to user and fed back to the model)
    pub output: String,
}

impl ToolResult {
    #[must_use]
    pub fn success(output: impl Into<String>) -> Self {
        Self {
            success: true,
            output: output.into(),
        }
    }

    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            output: message.into(),
        }
    }
}
