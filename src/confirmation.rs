//! Tool-call confirmation resolution.
//!
//! When the model calls a confirmation-required tool, the call is recorded
//! as a pending part and surfaced to the user. On the next turn the runtime
//! hands back a decision per call id; [`resolve_pending_tool_calls`] runs
//! the approved ones and fills in denial results for the rest, so the
//! history fed to the model never contains unresolved calls it has
//! decisions for.

use crate::messages::{ChatMessage, MessagePart};
use crate::tools::{ExecutionMap, ToolContext};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use tracing::{debug, warn};

/// Fixed output recorded on a denied tool call.
pub const DENIAL_MESSAGE: &str = "Error: User denied tool execution";

/// The user's decision for one pending tool call.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfirmationDecision {
    Approved,
    Denied,
}

/// Resolve pending tool calls in the last message of the history.
///
/// Only the most recent turn's calls are eligible. For each tool-call part
/// that is still pending, whose tool name has an execution-map entry, and
/// whose id has a decision:
///
/// - approved: the executor runs with the call's input; its result (or a
///   stringified error, caught per-call) is recorded and the call is
///   marked completed
/// - denied: the call is marked cancelled with [`DENIAL_MESSAGE`]
///
/// Calls without a decision stay pending. Messages before the last are
/// never touched, and an already-recorded output is never overwritten.
/// Processing is sequential in part order. Returns the number of calls
/// resolved.
pub async fn resolve_pending_tool_calls<Ctx: Send + Sync>(
    messages: &mut [ChatMessage],
    decisions: &HashMap<String, ConfirmationDecision>,
    executions: &ExecutionMap<Ctx>,
    ctx: &ToolContext<Ctx>,
) -> usize {
    let Some(last) = messages.last_mut() else {
        return 0;
    };

    let mut resolved = 0;

    for part in &mut last.parts {
        let MessagePart::ToolCall(call) = part else {
            continue;
        };
        if !call.is_pending() {
            continue;
        }
        let Some(executor) = executions.get(&call.tool_name) else {
            continue;
        };
        let Some(decision) = decisions.get(&call.id) else {
            continue;
        };

        match decision {
            ConfirmationDecision::Approved => {
                debug!(id = %call.id, tool = %call.tool_name, "executing approved tool call");
                let output = match executor.execute(ctx, call.input.clone()).await {
                    Ok(result) => Value::String(result.output),
                    Err(e) => {
                        warn!(id = %call.id, tool = %call.tool_name, error = %e, "tool executor failed");
                        Value::String(format!("Error: {e}"))
                    }
                };
                call.complete(output);
            }
            ConfirmationDecision::Denied => {
                debug!(id = %call.id, tool = %call.tool_name, "tool call denied");
                call.cancel(Value::String(DENIAL_MESSAGE.to_string()));
            }
        }
        resolved += 1;
    }

    resolved
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messages::{Role, ToolCallPart};
    use crate::tools::ToolExecutor;
    use crate::types::{ToolCallState, ToolResult};
    use anyhow::{bail, Result};
    use async_trait::async_trait;
    use serde_json::json;

    struct WeatherExecutor;

    #[async_trait]
    impl ToolExecutor<()> for WeatherExecutor {
        async fn execute(&self, _ctx: &ToolContext<()>, input: Value) -> Result<ToolResult> {
            let city = input.get("city").and_then(Value::as_str).unwrap_or("?");
            Ok(ToolResult::success(format!("Sunny in {city}")))
        }
    }

    struct FailingExecutor;

    #[async_trait]
    impl ToolExecutor<()> for FailingExecutor {
        async fn execute(&self, _ctx: &ToolContext<()>, _input: Value) -> Result<ToolResult> {
            bail!("upstream unavailable")
        }
    }

    fn executions() -> ExecutionMap<()> {
        let mut map = ExecutionMap::new();
        map.register("get_weather", WeatherExecutor);
        map.register("flaky_tool", FailingExecutor);
        map
    }

    fn last_message(calls: Vec<ToolCallPart>) -> ChatMessage {
        ChatMessage::new(
            Role::Assistant,
            calls.into_iter().map(MessagePart::ToolCall).collect(),
        )
    }

    fn call(id: &str, tool: &str) -> ToolCallPart {
        ToolCallPart::pending(id, tool, json!({"city": "Lisbon"}))
    }

    #[tokio::test]
    async fn test_approved_call_executes_and_completes() {
        let mut messages = vec![
            ChatMessage::user("weather?"),
            last_message(vec![call("c1", "get_weather")]),
        ];
        let decisions =
            HashMap::from([("c1".to_string(), ConfirmationDecision::Approved)]);

        let n = resolve_pending_tool_calls(
            &mut messages,
            &decisions,
            &executions(),
            &ToolContext::new(()),
        )
        .await;

        assert_eq!(n, 1);
        let resolved: Vec<_> = messages[1].tool_calls().collect();
        assert_eq!(resolved[0].state, ToolCallState::Completed);
        assert_eq!(resolved[0].output, Some(json!("Sunny in Lisbon")));
    }

    #[tokio::test]
    async fn test_denied_call_is_cancelled_with_fixed_message() {
        let mut messages = vec![last_message(vec![call("c1", "get_weather")])];
        let decisions = HashMap::from([("c1".to_string(), ConfirmationDecision::Denied)]);

        resolve_pending_tool_calls(
            &mut messages,
            &decisions,
            &executions(),
            &ToolContext::new(()),
        )
        .await;

        let resolved: Vec<_> = messages[0].tool_calls().collect();
        assert_eq!(resolved[0].state, ToolCallState::Cancelled);
        assert_eq!(resolved[0].output, Some(json!(DENIAL_MESSAGE)));
    }

    #[tokio::test]
    async fn test_executor_error_is_caught_per_call() {
        let mut messages = vec![last_message(vec![
            call("c1", "flaky_tool"),
            call("c2", "get_weather"),
        ])];
        let decisions = HashMap::from([
            ("c1".to_string(), ConfirmationDecision::Approved),
            ("c2".to_string(), ConfirmationDecision::Approved),
        ]);

        let n = resolve_pending_tool_calls(
            &mut messages,
            &decisions,
            &executions(),
            &ToolContext::new(()),
        )
        .await;

        assert_eq!(n, 2);
        let resolved: Vec<_> = messages[0].tool_calls().collect();
        // Failure becomes a completed call with an error string
        assert_eq!(resolved[0].state, ToolCallState::Completed);
        assert_eq!(
            resolved[0].output,
            Some(json!("Error: upstream unavailable"))
        );
        // Sibling call unaffected
        assert_eq!(resolved[1].state, ToolCallState::Completed);
        assert_eq!(resolved[1].output, Some(json!("Sunny in Lisbon")));
    }

    #[tokio::test]
    async fn test_only_last_message_is_touched() {
        let mut messages = vec![
            last_message(vec![call("old", "get_weather")]),
            ChatMessage::user("and tomorrow?"),
            last_message(vec![call("new", "get_weather")]),
        ];
        let decisions = HashMap::from([
            ("old".to_string(), ConfirmationDecision::Approved),
            ("new".to_string(), ConfirmationDecision::Approved),
        ]);

        resolve_pending_tool_calls(
            &mut messages,
            &decisions,
            &executions(),
            &ToolContext::new(()),
        )
        .await;

        let old: Vec<_> = messages[0].tool_calls().collect();
        assert_eq!(old[0].state, ToolCallState::Pending);
        let new: Vec<_> = messages[2].tool_calls().collect();
        assert_eq!(new[0].state, ToolCallState::Completed);
    }

    #[tokio::test]
    async fn test_undecided_and_unmapped_calls_stay_pending() {
        let mut messages = vec![last_message(vec![
            call("undecided", "get_weather"),
            call("unmapped", "not_registered"),
        ])];
        let decisions =
            HashMap::from([("unmapped".to_string(), ConfirmationDecision::Approved)]);

        let n = resolve_pending_tool_calls(
            &mut messages,
            &decisions,
            &executions(),
            &ToolContext::new(()),
        )
        .await;

        assert_eq!(n, 0);
        for resolved in messages[0].tool_calls() {
            assert_eq!(resolved.state, ToolCallState::Pending);
        }
    }

    #[tokio::test]
    async fn test_existing_output_is_never_overwritten() {
        let mut done = call("c1", "get_weather");
        done.complete(json!("already recorded"));
        let mut messages = vec![last_message(vec![done])];
        let decisions = HashMap::from([("c1".to_string(), ConfirmationDecision::Denied)]);

        resolve_pending_tool_calls(
            &mut messages,
            &decisions,
            &executions(),
            &ToolContext::new(()),
        )
        .await;

        let resolved: Vec<_> = messages[0].tool_calls().collect();
        assert_eq!(resolved[0].output, Some(json!("already recorded")));
        assert_eq!(resolved[0].state, ToolCallState::Completed);
    }
}
