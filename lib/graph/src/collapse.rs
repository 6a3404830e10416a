//! Collapse policy for variable-cardinality children.
//!
//! Dynamic-fork branches and loop bodies have no statically known shape.
//! This module decides whether such a group renders as individual vertices
//! or as one summary placeholder, and computes the placeholder's tally.
//! Tallies are pure functions of the resolved overlay and are recomputed on
//! every build.

use crate::graph::Tally;
use crate::overlay::ExecutionOverlay;
use flowsight_model::{TaskConfig, TaskStatus, collect_refs};

/// Distinct-child count at which a dynamic fork collapses into a single
/// placeholder vertex.
pub const DYNAMIC_FORK_COLLAPSE_THRESHOLD: usize = 3;

/// How a dynamic fork's children should render.
#[derive(Debug, Clone, PartialEq)]
pub enum DynamicForkPlan {
    /// One summary placeholder vertex.
    Collapse {
        /// Aggregate status; `None` when nothing has executed yet.
        status: Option<TaskStatus>,
        /// Child counts; present only when a trace is loaded.
        tally: Option<Tally>,
        /// The summarized child reference names.
        children: Vec<String>,
    },
    /// One vertex per discovered child.
    Expand(Vec<String>),
}

/// Decides the rendering of a dynamic fork's children.
///
/// Collapses when no child has executed yet, or when the distinct child
/// count reaches [`DYNAMIC_FORK_COLLAPSE_THRESHOLD`]; otherwise each child
/// renders individually.
#[must_use]
pub fn plan_dynamic_fork(fork_ref: &str, overlay: Option<&ExecutionOverlay>) -> DynamicForkPlan {
    let Some(overlay) = overlay else {
        return DynamicForkPlan::Collapse {
            status: None,
            tally: None,
            children: Vec::new(),
        };
    };

    let children: Vec<String> = overlay
        .forked_children(fork_ref)
        .into_iter()
        .map(str::to_string)
        .collect();

    if !children.is_empty() && children.len() < DYNAMIC_FORK_COLLAPSE_THRESHOLD {
        return DynamicForkPlan::Expand(children);
    }

    let mut tally = Tally::default();
    for child in &children {
        if let Some(status) = overlay.latest_status(child) {
            tally.record(status);
        }
    }

    DynamicForkPlan::Collapse {
        status: aggregate_status(&tally),
        tally: Some(tally),
        children,
    }
}

/// Tallies a loop body: every result of every reference in the `loop_over`
/// subtree (not just the latest per reference), plus the loop's current
/// iteration number from its own latest result.
#[must_use]
pub fn loop_tally(loop_ref: &str, loop_over: &[TaskConfig], overlay: &ExecutionOverlay) -> Tally {
    let mut tally = Tally::default();
    for reference in collect_refs(loop_over) {
        for result in overlay.results_for(&reference) {
            tally.record(result.status);
        }
    }
    tally.iteration = overlay.latest_result(loop_ref).and_then(|r| r.iteration);
    tally
}

/// Derives a placeholder's status from its tally: completed iff every child
/// succeeded, in-progress if any child is still in flight, failed otherwise.
/// An empty tally has no status.
#[must_use]
pub fn aggregate_status(tally: &Tally) -> Option<TaskStatus> {
    if tally.total == 0 {
        None
    } else if tally.success == tally.total {
        Some(TaskStatus::Completed)
    } else if tally.in_progress > 0 {
        Some(TaskStatus::InProgress)
    } else {
        Some(TaskStatus::Failed)
    }
}
