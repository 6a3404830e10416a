//! Execution overlay resolution.
//!
//! The overlay is a pure preprocessing of the flat execution trace into the
//! indexes the builder needs: results grouped by reference name (retries and
//! iterations in trace order), results by execution id, and the
//! runtime-only structure recovered from parent back-references — which
//! children a fork spawned, which case a switch took, which execution ids a
//! loop produced.
//!
//! Resolution never mutates its inputs and is idempotent: resolving the
//! same trace twice yields the same overlay.

use crate::error::TraceError;
use flowsight_model::{
    ExecutionTrace, FINAL_REF, START_REF, TaskResult, TaskStatus, WorkflowDefinition,
    WorkflowStatus, visit_tasks,
};
use indexmap::IndexMap;
use std::collections::{BTreeSet, HashMap};

/// Trace-side type labels of fork parents. Dynamic fork results are
/// reported as `FORK`; the definition-side labels are accepted as well.
const FORK_PARENT_TYPES: [&str; 3] = ["FORK", "FORK_JOIN", "FORK_JOIN_DYNAMIC"];

/// Resolved runtime overlay for one execution trace.
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionOverlay {
    status: WorkflowStatus,
    /// Results grouped by reference name; later entries are retries or loop
    /// iterations.
    by_ref: IndexMap<String, Vec<TaskResult>>,
    /// Results by unique execution id.
    by_id: HashMap<String, TaskResult>,
    /// De-duplicated children per fork parent. A set, not a list: retries
    /// must not double count.
    fork_children: HashMap<String, BTreeSet<String>>,
    /// First-executed child per switch parent; never overwritten.
    executed_case: HashMap<String, String>,
    /// Execution ids per loop parent, in trace order.
    loop_task_ids: HashMap<String, Vec<String>>,
}

impl ExecutionOverlay {
    /// Resolves a trace against its definition.
    ///
    /// A parent's type is taken from its latest result when it has one, and
    /// from the definition tree otherwise — a switch that routed directly on
    /// workflow input may never produce a result of its own.
    ///
    /// Synthetic results are injected here: a completed start result always,
    /// and a completed final result only when the run completed without any
    /// terminate task firing.
    ///
    /// # Errors
    ///
    /// Returns [`TraceError::UnresolvedParent`] when a result names a parent
    /// known to neither the trace nor the definition — a definition/trace
    /// mismatch the resolver refuses to guess around.
    pub fn resolve(
        definition: &WorkflowDefinition,
        trace: &ExecutionTrace,
    ) -> Result<Self, TraceError> {
        let mut overlay = Self {
            status: trace.status,
            by_ref: IndexMap::new(),
            by_id: HashMap::new(),
            fork_children: HashMap::new(),
            executed_case: HashMap::new(),
            loop_task_ids: HashMap::new(),
        };

        for result in &trace.tasks {
            overlay.index(result.clone());
        }

        overlay.index(TaskResult::new(START_REF, "START", TaskStatus::Completed));
        let terminated = trace.tasks.iter().any(|t| t.task_type == "TERMINATE");
        if trace.status == WorkflowStatus::Completed && !terminated {
            overlay.index(TaskResult::new(FINAL_REF, "FINAL", TaskStatus::Completed));
        }

        let mut definition_types = HashMap::new();
        visit_tasks(&definition.tasks, &mut |task| {
            definition_types.insert(task.reference().to_string(), task.kind.type_name());
        });

        for result in &trace.tasks {
            overlay.retrofit(result, &definition_types)?;
        }

        Ok(overlay)
    }

    fn index(&mut self, result: TaskResult) {
        self.by_id.insert(result.task_id.clone(), result.clone());
        self.by_ref
            .entry(result.reference_task_name.clone())
            .or_default()
            .push(result);
    }

    /// Retrofits parent-side structure from one child result, dispatching on
    /// the parent's type.
    fn retrofit(
        &mut self,
        result: &TaskResult,
        definition_types: &HashMap<String, &'static str>,
    ) -> Result<(), TraceError> {
        let Some(parent_ref) = &result.parent_task_reference_name else {
            return Ok(());
        };

        let parent_type = self
            .by_ref
            .get(parent_ref)
            .and_then(|results| results.last())
            .map(|parent| parent.task_type.as_str())
            .or_else(|| definition_types.get(parent_ref).copied())
            .ok_or_else(|| TraceError::UnresolvedParent {
                child_ref: result.reference_task_name.clone(),
                parent_ref: parent_ref.clone(),
            })?;

        if FORK_PARENT_TYPES.contains(&parent_type) {
            self.fork_children
                .entry(parent_ref.clone())
                .or_default()
                .insert(result.reference_task_name.clone());
        } else if parent_type == "SWITCH" || parent_type == "DECISION" {
            // first executed child wins; later children belong to the
            // already-chosen branch
            self.executed_case
                .entry(parent_ref.clone())
                .or_insert_with(|| result.reference_task_name.clone());
        } else if parent_type == "DO_WHILE" {
            self.loop_task_ids
                .entry(parent_ref.clone())
                .or_default()
                .push(result.task_id.clone());
        }

        Ok(())
    }

    /// Overall status of the run.
    #[must_use]
    pub fn overall_status(&self) -> WorkflowStatus {
        self.status
    }

    /// All results for a reference name, in trace order.
    #[must_use]
    pub fn results_for(&self, reference: &str) -> &[TaskResult] {
        self.by_ref.get(reference).map_or(&[], Vec::as_slice)
    }

    /// The latest result for a reference name.
    #[must_use]
    pub fn latest_result(&self, reference: &str) -> Option<&TaskResult> {
        self.by_ref.get(reference)?.last()
    }

    /// The latest status for a reference name; `None` means "never
    /// executed", which is not an error.
    #[must_use]
    pub fn latest_status(&self, reference: &str) -> Option<TaskStatus> {
        Some(self.latest_result(reference)?.status)
    }

    /// A result by its unique execution id.
    #[must_use]
    pub fn result_by_id(&self, task_id: &str) -> Option<&TaskResult> {
        self.by_id.get(task_id)
    }

    /// The de-duplicated children a fork spawned, in name order.
    #[must_use]
    pub fn forked_children(&self, fork_ref: &str) -> Vec<&str> {
        self.fork_children
            .get(fork_ref)
            .map(|children| children.iter().map(String::as_str).collect())
            .unwrap_or_default()
    }

    /// The reference name of the first child a switch executed.
    #[must_use]
    pub fn executed_case(&self, switch_ref: &str) -> Option<&str> {
        self.executed_case.get(switch_ref).map(String::as_str)
    }

    /// Execution ids of a loop's children, in trace order.
    #[must_use]
    pub fn loop_task_ids(&self, loop_ref: &str) -> &[String] {
        self.loop_task_ids
            .get(loop_ref)
            .map_or(&[], Vec::as_slice)
    }

    /// Whether a switch branch was taken at runtime.
    ///
    /// A branch is taken if its first task is the recorded executed case, or
    /// if it is the default branch and no case was ever recorded (no case
    /// matched, the default fires implicitly).
    #[must_use]
    pub fn branch_taken(&self, switch_ref: &str, branch_first_ref: &str, is_default: bool) -> bool {
        match self.executed_case(switch_ref) {
            Some(executed) => executed == branch_first_ref,
            None => is_default,
        }
    }
}
