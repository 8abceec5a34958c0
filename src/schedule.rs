//! Task scheduling: descriptor normalization and the scheduler seam.
//!
//! A [`ScheduleWhen`] descriptor arrives from the model as a tagged value
//! with four variants. [`schedule_task`] normalizes it into the single
//! effective [`ScheduleInput`] and hands that to the opaque [`Scheduler`]
//! primitive; every failure degrades to a human-readable string rather
//! than an error the caller must handle.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::RwLock;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;
use tracing::info;
use uuid::Uuid;

/// Callback name recorded on tasks created through [`schedule_task`].
pub const TASK_CALLBACK: &str = "execute_task";

/// When a deferred task should run, as described by the model.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ScheduleWhen {
    /// No schedule requested; nothing to do.
    NoSchedule,
    /// Run once at a specific date.
    Scheduled {
        #[serde(with = "time::serde::rfc3339")]
        date: OffsetDateTime,
    },
    /// Run once after a delay in seconds.
    Delayed { delay_in_seconds: u64 },
    /// Run repeatedly on a cron expression.
    Cron { cron: String },
}

/// The one effective input passed to the scheduling primitive.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScheduleInput {
    At {
        #[serde(with = "time::serde::rfc3339")]
        date: OffsetDateTime,
    },
    DelaySeconds {
        seconds: u64,
    },
    Cron {
        expression: String,
    },
}

impl std::fmt::Display for ScheduleInput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::At { date } => {
                let formatted = date
                    .format(&Rfc3339)
                    .unwrap_or_else(|_| date.unix_timestamp().to_string());
                write!(f, "at {formatted}")
            }
            Self::DelaySeconds { seconds } => write!(f, "in {seconds} seconds"),
            Self::Cron { expression } => write!(f, "cron {expression}"),
        }
    }
}

/// A task known to the scheduler.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ScheduledTask {
    pub id: String,
    pub callback: String,
    pub description: String,
    pub when: ScheduleInput,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// The platform's scheduling primitive.
#[async_trait]
pub trait Scheduler: Send + Sync {
    /// Schedule a task. Returns the stored record.
    ///
    /// # Errors
    /// Returns an error if the input is rejected or storage fails.
    async fn schedule(
        &self,
        when: ScheduleInput,
        callback: &str,
        description: &str,
    ) -> Result<ScheduledTask>;

    /// List all known tasks.
    ///
    /// # Errors
    /// Returns an error if the store cannot be read.
    async fn list(&self) -> Result<Vec<ScheduledTask>>;

    /// Cancel a task by id. Returns whether a task was removed.
    ///
    /// # Errors
    /// Returns an error if the store cannot be updated.
    async fn cancel(&self, id: &str) -> Result<bool>;
}

/// Normalize a schedule descriptor and invoke the scheduler.
///
/// `NoSchedule` short-circuits with `"Not a valid schedule input"` and
/// performs no scheduling call. Any scheduler failure is returned as an
/// error-describing string, never raised.
pub async fn schedule_task(
    scheduler: &dyn Scheduler,
    when: &ScheduleWhen,
    description: &str,
) -> String {
    let input = match when {
        ScheduleWhen::NoSchedule => return "Not a valid schedule input".to_string(),
        ScheduleWhen::Scheduled { date } => ScheduleInput::At { date: *date },
        ScheduleWhen::Delayed { delay_in_seconds } => ScheduleInput::DelaySeconds {
            seconds: *delay_in_seconds,
        },
        ScheduleWhen::Cron { cron } => ScheduleInput::Cron {
            expression: cron.clone(),
        },
    };

    match scheduler.schedule(input, TASK_CALLBACK, description).await {
        Ok(task) => format!("Task scheduled ({}): {}", task.when, task.description),
        Err(e) => format!("Error scheduling task: {e}"),
    }
}

/// Entry point invoked by the platform when a cron-scheduled task fires.
///
/// Logs the trigger; the task payload itself carries no work yet.
pub fn run_cron_trigger(cron: &str) {
    let now = OffsetDateTime::now_utc();
    info!(%cron, triggered_at = %now, "cron trigger fired");
}

/// In-memory scheduler, suitable for tests and single-process runs.
#[derive(Default)]
pub struct InMemoryScheduler {
    tasks: RwLock<HashMap<String, ScheduledTask>>,
}

impl InMemoryScheduler {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Scheduler for InMemoryScheduler {
    async fn schedule(
        &self,
        when: ScheduleInput,
        callback: &str,
        description: &str,
    ) -> Result<ScheduledTask> {
        if let ScheduleInput::Cron { expression } = &when {
            validate_cron(expression)?;
        }

        let task = ScheduledTask {
            id: Uuid::new_v4().to_string(),
            callback: callback.to_string(),
            description: description.to_string(),
            when,
            created_at: OffsetDateTime::now_utc(),
        };

        self.tasks
            .write()
            .ok()
            .context("lock poisoned")?
            .insert(task.id.clone(), task.clone());

        Ok(task)
    }

    async fn list(&self) -> Result<Vec<ScheduledTask>> {
        let tasks = self.tasks.read().ok().context("lock poisoned")?;
        let mut all: Vec<_> = tasks.values().cloned().collect();
        all.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(all)
    }

    async fn cancel(&self, id: &str) -> Result<bool> {
        Ok(self
            .tasks
            .write()
            .ok()
            .context("lock poisoned")?
            .remove(id)
            .is_some())
    }
}

/// The scheduler treats cron expressions as opaque, but rejects inputs
/// that cannot possibly be a 5-field expression.
fn validate_cron(expression: &str) -> Result<()> {
    let fields = expression.split_whitespace().count();
    if fields != 5 {
        bail!("invalid cron expression {expression:?}: expected 5 fields, got {fields}");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[tokio::test]
    async fn test_no_schedule_returns_literal_without_scheduling() {
        let scheduler = InMemoryScheduler::new();
        let out = schedule_task(&scheduler, &ScheduleWhen::NoSchedule, "x").await;
        assert_eq!(out, "Not a valid schedule input");
        assert!(scheduler.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_cron_confirmation_contains_expression_and_scheduled() {
        let scheduler = InMemoryScheduler::new();
        let when = ScheduleWhen::Cron {
            cron: "* * * * *".to_string(),
        };
        let out = schedule_task(&scheduler, &when, "x").await;
        assert!(out.contains("* * * * *"), "missing cron expr: {out}");
        assert!(out.contains("scheduled"), "missing 'scheduled': {out}");
        assert_eq!(scheduler.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_scheduled_date_variant() {
        let scheduler = InMemoryScheduler::new();
        let when = ScheduleWhen::Scheduled {
            date: datetime!(2026-01-15 09:30:00 UTC),
        };
        let out = schedule_task(&scheduler, &when, "standup reminder").await;
        assert!(out.contains("scheduled"));
        assert!(out.contains("2026-01-15"));
        assert!(out.contains("standup reminder"));
    }

    #[tokio::test]
    async fn test_delayed_variant() {
        let scheduler = InMemoryScheduler::new();
        let when = ScheduleWhen::Delayed {
            delay_in_seconds: 90,
        };
        let out = schedule_task(&scheduler, &when, "ping").await;
        assert!(out.contains("in 90 seconds"));

        let tasks = scheduler.list().await.unwrap();
        assert_eq!(tasks[0].callback, TASK_CALLBACK);
        assert_eq!(
            tasks[0].when,
            ScheduleInput::DelaySeconds { seconds: 90 }
        );
    }

    #[tokio::test]
    async fn test_invalid_cron_degrades_to_error_string() {
        let scheduler = InMemoryScheduler::new();
        let when = ScheduleWhen::Cron {
            cron: "not a cron".to_string(),
        };
        let out = schedule_task(&scheduler, &when, "x").await;
        assert!(out.starts_with("Error scheduling task:"), "got: {out}");
        assert!(scheduler.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_cancel_reports_removal() {
        let scheduler = InMemoryScheduler::new();
        let task = scheduler
            .schedule(
                ScheduleInput::DelaySeconds { seconds: 10 },
                TASK_CALLBACK,
                "x",
            )
            .await
            .unwrap();

        assert!(scheduler.cancel(&task.id).await.unwrap());
        assert!(!scheduler.cancel(&task.id).await.unwrap());
        assert!(scheduler.list().await.unwrap().is_empty());
    }

    #[test]
    fn test_descriptor_wire_format() {
        let none: ScheduleWhen = serde_json::from_str(r#"{"type":"no-schedule"}"#).unwrap();
        assert_eq!(none, ScheduleWhen::NoSchedule);

        let cron: ScheduleWhen =
            serde_json::from_str(r#"{"type":"cron","cron":"0 * * * *"}"#).unwrap();
        assert_eq!(
            cron,
            ScheduleWhen::Cron {
                cron: "0 * * * *".to_string()
            }
        );

        let delayed: ScheduleWhen =
            serde_json::from_str(r#"{"type":"delayed","delay_in_seconds":30}"#).unwrap();
        assert_eq!(
            delayed,
            ScheduleWhen::Delayed {
                delay_in_seconds: 30
            }
        );
    }
}
