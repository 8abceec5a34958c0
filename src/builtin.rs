//! Built-in tools.
//!
//! Auto-executing: `get_local_time`, `schedule_task`, `get_scheduled_tasks`,
//! `cancel_scheduled_task`. Confirmation-required: `get_weather_information`,
//! whose schema-only spec goes in the registry while its executor goes in
//! the execution map.
//!
//! All of these run with `Ctx = SchedulerHandle`; tools that do not touch
//! the scheduler simply ignore the context.

use crate::schedule::{schedule_task, ScheduleWhen, Scheduler};
use crate::tools::{
    AutoTool, ConfirmToolSpec, ExecutionMap, ToolContext, ToolExecutor, ToolRegistry,
};
use crate::types::ToolResult;
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use time::format_description::well_known::Rfc2822;
use time::OffsetDateTime;

/// Application context shared by the built-in tools.
pub type SchedulerHandle = Arc<dyn Scheduler>;

/// Registry with every built-in tool registered.
#[must_use]
pub fn default_registry() -> ToolRegistry<SchedulerHandle> {
    let mut registry = ToolRegistry::new();
    registry
        .register_auto(GetLocalTimeTool)
        .register_auto(ScheduleTaskTool)
        .register_auto(GetScheduledTasksTool)
        .register_auto(CancelScheduledTaskTool)
        .register_confirm(weather_tool_spec());
    registry
}

/// Execution map with every confirmation-required built-in wired up.
#[must_use]
pub fn default_executions() -> ExecutionMap<SchedulerHandle> {
    let mut map = ExecutionMap::new();
    map.register("get_weather_information", WeatherExecutor);
    map
}

// ============================================================================
// get_local_time
// ============================================================================

pub struct GetLocalTimeTool;

#[derive(Deserialize)]
struct LocalTimeInput {
    location: String,
}

#[async_trait]
impl AutoTool<SchedulerHandle> for GetLocalTimeTool {
    fn name(&self) -> &'static str {
        "get_local_time"
    }

    fn description(&self) -> &'static str {
        "Get the current local time for a specified location"
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "required": ["location"],
            "properties": {
                "location": {
                    "type": "string",
                    "description": "The location to get the time for"
                }
            }
        })
    }

    async fn execute(
        &self,
        _ctx: &ToolContext<SchedulerHandle>,
        input: Value,
    ) -> Result<ToolResult> {
        let input: LocalTimeInput =
            serde_json::from_value(input).context("invalid input for get_local_time")?;
        let now = OffsetDateTime::now_utc();
        let formatted = now
            .format(&Rfc2822)
            .unwrap_or_else(|_| now.unix_timestamp().to_string());
        Ok(ToolResult::success(format!(
            "The current time in {} is {formatted} (UTC)",
            input.location
        )))
    }
}

// ============================================================================
// schedule_task
// ============================================================================

pub struct ScheduleTaskTool;

#[derive(Deserialize)]
struct ScheduleTaskInput {
    #[serde(flatten)]
    when: ScheduleWhen,
    description: String,
}

#[async_trait]
impl AutoTool<SchedulerHandle> for ScheduleTaskTool {
    fn name(&self) -> &'static str {
        "schedule_task"
    }

    fn description(&self) -> &'static str {
        "Schedule a task to be executed later: once at a date, after a delay in seconds, or on a cron expression"
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "required": ["type", "description"],
            "properties": {
                "type": {
                    "type": "string",
                    "enum": ["no-schedule", "scheduled", "delayed", "cron"]
                },
                "date": {
                    "type": "string",
                    "format": "date-time",
                    "description": "RFC3339 date, for type=scheduled"
                },
                "delay_in_seconds": {
                    "type": "integer",
                    "description": "Delay in seconds, for type=delayed"
                },
                "cron": {
                    "type": "string",
                    "description": "Cron expression, for type=cron"
                },
                "description": {
                    "type": "string",
                    "description": "What the task should do"
                }
            }
        })
    }

    async fn execute(
        &self,
        ctx: &ToolContext<SchedulerHandle>,
        input: Value,
    ) -> Result<ToolResult> {
        let input: ScheduleTaskInput =
            serde_json::from_value(input).context("invalid input for schedule_task")?;
        let message = schedule_task(ctx.app.as_ref(), &input.when, &input.description).await;
        Ok(ToolResult::success(message))
    }
}

// ============================================================================
// get_scheduled_tasks
// ============================================================================

pub struct GetScheduledTasksTool;

#[async_trait]
impl AutoTool<SchedulerHandle> for GetScheduledTasksTool {
    fn name(&self) -> &'static str {
        "get_scheduled_tasks"
    }

    fn description(&self) -> &'static str {
        "List all tasks that are currently scheduled"
    }

    fn input_schema(&self) -> Value {
        json!({ "type": "object", "properties": {} })
    }

    async fn execute(
        &self,
        ctx: &ToolContext<SchedulerHandle>,
        _input: Value,
    ) -> Result<ToolResult> {
        match ctx.app.list().await {
            Ok(tasks) if tasks.is_empty() => {
                Ok(ToolResult::success("No scheduled tasks found."))
            }
            Ok(tasks) => {
                let lines: Vec<String> = tasks
                    .iter()
                    .map(|t| format!("- {} ({}): {}", t.id, t.when, t.description))
                    .collect();
                Ok(ToolResult::success(format!(
                    "Scheduled tasks:\n{}",
                    lines.join("\n")
                )))
            }
            Err(e) => Ok(ToolResult::error(format!("Error listing tasks: {e}"))),
        }
    }
}

// ============================================================================
// cancel_scheduled_task
// ============================================================================

pub struct CancelScheduledTaskTool;

#[derive(Deserialize)]
struct CancelTaskInput {
    task_id: String,
}

#[async_trait]
impl AutoTool<SchedulerHandle> for CancelScheduledTaskTool {
    fn name(&self) -> &'static str {
        "cancel_scheduled_task"
    }

    fn description(&self) -> &'static str {
        "Cancel a scheduled task by its id"
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "required": ["task_id"],
            "properties": {
                "task_id": {
                    "type": "string",
                    "description": "Id of the task to cancel"
                }
            }
        })
    }

    async fn execute(
        &self,
        ctx: &ToolContext<SchedulerHandle>,
        input: Value,
    ) -> Result<ToolResult> {
        let input: CancelTaskInput =
            serde_json::from_value(input).context("invalid input for cancel_scheduled_task")?;
        match ctx.app.cancel(&input.task_id).await {
            Ok(true) => Ok(ToolResult::success(format!(
                "Task {} cancelled.",
                input.task_id
            ))),
            Ok(false) => Ok(ToolResult::success(format!(
                "No task found with id {}.",
                input.task_id
            ))),
            Err(e) => Ok(ToolResult::error(format!("Error cancelling task: {e}"))),
        }
    }
}

// ============================================================================
// get_weather_information (confirmation-required)
// ============================================================================

#[must_use]
pub fn weather_tool_spec() -> ConfirmToolSpec {
    ConfirmToolSpec {
        name: "get_weather_information",
        description: "Get current weather information for a city. Requires user confirmation.",
        input_schema: json!({
            "type": "object",
            "required": ["city"],
            "properties": {
                "city": {
                    "type": "string",
                    "description": "The city to get weather for"
                }
            }
        }),
    }
}

pub struct WeatherExecutor;

#[derive(Deserialize)]
struct WeatherInput {
    city: String,
}

#[async_trait]
impl ToolExecutor<SchedulerHandle> for WeatherExecutor {
    async fn execute(
        &self,
        _ctx: &ToolContext<SchedulerHandle>,
        input: Value,
    ) -> Result<ToolResult> {
        let input: WeatherInput =
            serde_json::from_value(input).context("invalid input for get_weather_information")?;
        Ok(ToolResult::success(format!(
            "The weather in {} is sunny",
            input.city
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedule::InMemoryScheduler;

    fn ctx() -> ToolContext<SchedulerHandle> {
        ToolContext::new(Arc::new(InMemoryScheduler::new()) as SchedulerHandle)
    }

    #[tokio::test]
    async fn test_get_local_time_mentions_location() {
        let result = GetLocalTimeTool
            .execute(&ctx(), json!({"location": "London"}))
            .await
            .unwrap();
        assert!(result.success);
        assert!(result.output.contains("London"));
    }

    #[tokio::test]
    async fn test_schedule_task_tool_flattened_descriptor() {
        let ctx = ctx();
        let result = ScheduleTaskTool
            .execute(
                &ctx,
                json!({"type": "cron", "cron": "0 9 * * 1", "description": "weekly report"}),
            )
            .await
            .unwrap();
        assert!(result.success);
        assert!(result.output.contains("0 9 * * 1"));
        assert!(result.output.contains("scheduled"));
        assert_eq!(ctx.app.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_schedule_task_tool_no_schedule() {
        let ctx = ctx();
        let result = ScheduleTaskTool
            .execute(&ctx, json!({"type": "no-schedule", "description": "x"}))
            .await
            .unwrap();
        assert_eq!(result.output, "Not a valid schedule input");
        assert!(ctx.app.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_list_and_cancel_round_trip() {
        let ctx = ctx();
        ScheduleTaskTool
            .execute(
                &ctx,
                json!({"type": "delayed", "delay_in_seconds": 60, "description": "ping"}),
            )
            .await
            .unwrap();

        let listed = GetScheduledTasksTool
            .execute(&ctx, json!({}))
            .await
            .unwrap();
        assert!(listed.output.contains("ping"));

        let id = ctx.app.list().await.unwrap()[0].id.clone();
        let cancelled = CancelScheduledTaskTool
            .execute(&ctx, json!({"task_id": id}))
            .await
            .unwrap();
        assert!(cancelled.output.contains("cancelled"));

        let empty = GetScheduledTasksTool
            .execute(&ctx, json!({}))
            .await
            .unwrap();
        assert_eq!(empty.output, "No scheduled tasks found.");
    }

    #[tokio::test]
    async fn test_cancel_unknown_task() {
        let result = CancelScheduledTaskTool
            .execute(&ctx(), json!({"task_id": "nope"}))
            .await
            .unwrap();
        assert!(result.success);
        assert!(result.output.contains("No task found"));
    }

    #[tokio::test]
    async fn test_weather_executor() {
        let result = WeatherExecutor
            .execute(&ctx(), json!({"city": "Berlin"}))
            .await
            .unwrap();
        assert!(result.success);
        assert!(result.output.contains("Berlin"));
    }

    #[test]
    fn test_default_registry_shape() {
        let registry = default_registry();
        assert_eq!(registry.len(), 5);
        assert!(registry.is_auto("get_local_time"));
        assert!(registry.is_auto("schedule_task"));
        assert!(!registry.is_auto("get_weather_information"));

        let executions = default_executions();
        assert!(executions.contains("get_weather_information"));
    }
}
