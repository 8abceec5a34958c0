//! Chat agent gateway with tool confirmation and task scheduling.
//!
//! This crate wires a hosted chat-completion model, a small set of
//! callable tools, and a scheduling helper into a request/response
//! runtime:
//!
//! - [`tools`] - registry of auto-executing and confirmation-required
//!   tool definitions, plus the separately-supplied execution map
//! - [`messages`] - conversation model and dangling tool-call cleanup
//! - [`confirmation`] - resolution of human-approved/denied tool calls
//! - [`schedule`] - schedule descriptor normalization and the scheduler
//! - [`agent`] - the per-turn handler tying the above together
//! - [`server`] / [`bridge`] - the two HTTP surfaces
//!
//! # Example
//!
//! ```ignore
//! use chat_agent::{
//!     agent::handle_chat_turn,
//!     builtin::{default_executions, default_registry},
//!     messages::ChatMessage,
//!     providers::OpenAIProvider,
//!     schedule::InMemoryScheduler,
//!     tools::ToolContext,
//!     types::AgentConfig,
//! };
//! use std::{collections::HashMap, sync::Arc};
//!
//! let provider = OpenAIProvider::gpt4o_mini(api_key);
//! let scheduler = Arc::new(InMemoryScheduler::new());
//! let history = vec![ChatMessage::user("what time is it in Tokyo?")];
//!
//! let updated = handle_chat_turn(
//!     &AgentConfig::default(),
//!     &provider,
//!     &default_registry(),
//!     &default_executions(),
//!     &ToolContext::new(scheduler),
//!     history,
//!     &HashMap::new(),
//! )
//! .await?;
//! ```

#![forbid(unsafe_code)]

pub mod agent;
pub mod bridge;
pub mod builtin;
pub mod config;
pub mod confirmation;
pub mod llm;
pub mod messages;
pub mod providers;
pub mod schedule;
pub mod server;
pub mod tools;
pub mod types;

pub use agent::handle_chat_turn;
pub use confirmation::{resolve_pending_tool_calls, ConfirmationDecision, DENIAL_MESSAGE};
pub use llm::LlmProvider;
pub use messages::{clean_incomplete_tool_calls, ChatMessage, MessagePart, ToolCallPart};
pub use schedule::{run_cron_trigger, schedule_task, InMemoryScheduler, ScheduleWhen, Scheduler};
pub use tools::{AutoTool, ExecutionMap, ToolContext, ToolExecutor, ToolRegistry};
pub use types::{AgentConfig, ThreadId, ToolCallState, ToolResult};
