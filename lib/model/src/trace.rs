//! Execution trace types.
//!
//! A trace is an execution summary plus a flat list of [`TaskResult`]s.
//! Reference names repeat across retries and loop iterations; the unique
//! coordinate of one executed instance is its execution id.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ulid::Ulid;

/// Status of one executed task instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    /// Queued, not yet picked up.
    Scheduled,
    /// Currently executing.
    InProgress,
    /// Finished successfully.
    Completed,
    /// Finished with tolerated errors.
    CompletedWithErrors,
    /// Finished unsuccessfully; retries may follow.
    Failed,
    /// Finished unsuccessfully with no retries possible.
    FailedWithTerminalError,
    /// Exceeded its time budget.
    TimedOut,
    /// Canceled by the workflow or a user.
    Canceled,
    /// Skipped by a control-flow decision.
    Skipped,
}

impl TaskStatus {
    /// Returns true for statuses that count as success.
    #[must_use]
    pub fn is_successful(&self) -> bool {
        matches!(
            self,
            Self::Completed | Self::CompletedWithErrors | Self::Skipped
        )
    }

    /// Returns true while the task has not reached a terminal status.
    #[must_use]
    pub fn is_in_flight(&self) -> bool {
        matches!(self, Self::Scheduled | Self::InProgress)
    }

    /// Returns true once the task can no longer change status.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        !self.is_in_flight()
    }

    /// Returns true for cancellation.
    #[must_use]
    pub fn is_canceled(&self) -> bool {
        matches!(self, Self::Canceled)
    }
}

/// Overall status of a workflow execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WorkflowStatus {
    Running,
    Completed,
    Failed,
    TimedOut,
    Terminated,
    Paused,
}

/// One recorded execution instance of a task.
///
/// Multiple results may share a reference name (retries, loop iterations);
/// `task_id` is the unique execution id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskResult {
    /// Unique execution id of this instance.
    pub task_id: String,
    /// Reference name of the task this instance executed.
    pub reference_task_name: String,
    /// Trace-side type label (e.g. `FORK` for both fork flavors).
    pub task_type: String,
    /// Status of this instance.
    pub status: TaskStatus,
    /// Reference name of the owning parent, set only for children spawned at
    /// runtime by dynamic forks, switches, and loops.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_task_reference_name: Option<String>,
    /// Loop iteration number, set on loop headers and their children.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iteration: Option<u32>,
    /// When this instance was queued, epoch millis on the wire.
    #[serde(
        default,
        with = "chrono::serde::ts_milliseconds_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub scheduled_time: Option<DateTime<Utc>>,
    /// When this instance started executing.
    #[serde(
        default,
        with = "chrono::serde::ts_milliseconds_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub start_time: Option<DateTime<Utc>>,
    /// When this instance reached a terminal status.
    #[serde(
        default,
        with = "chrono::serde::ts_milliseconds_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub end_time: Option<DateTime<Utc>>,
}

impl TaskResult {
    /// Creates a result with a fresh execution id.
    #[must_use]
    pub fn new(
        reference_task_name: impl Into<String>,
        task_type: impl Into<String>,
        status: TaskStatus,
    ) -> Self {
        Self {
            task_id: Ulid::new().to_string(),
            reference_task_name: reference_task_name.into(),
            task_type: task_type.into(),
            status,
            parent_task_reference_name: None,
            iteration: None,
            scheduled_time: None,
            start_time: None,
            end_time: None,
        }
    }

    /// Sets the parent reference name, builder style.
    #[must_use]
    pub fn with_parent(mut self, parent: impl Into<String>) -> Self {
        self.parent_task_reference_name = Some(parent.into());
        self
    }

    /// Sets the iteration number, builder style.
    #[must_use]
    pub fn with_iteration(mut self, iteration: u32) -> Self {
        self.iteration = Some(iteration);
        self
    }
}

/// An execution summary plus its flat result list.
///
/// Traces are immutable: loading a different run wholesale-replaces the
/// trace, it is never patched in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionTrace {
    /// Execution id of the workflow run.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workflow_id: Option<String>,
    /// Overall status of the run.
    pub status: WorkflowStatus,
    /// Flat, trace-ordered task results.
    #[serde(default)]
    pub tasks: Vec<TaskResult>,
}

impl ExecutionTrace {
    /// Creates a trace from a status and result list.
    #[must_use]
    pub fn new(status: WorkflowStatus, tasks: Vec<TaskResult>) -> Self {
        Self {
            workflow_id: None,
            status,
            tasks,
        }
    }
}
