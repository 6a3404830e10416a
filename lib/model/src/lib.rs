//! Data model for the flowsight workflow graph engine.
//!
//! This crate provides:
//!
//! - **Definition tree**: [`TaskConfig`]/[`TaskKind`], the nested task
//!   configuration model with its structural constructs (switch, fork,
//!   dynamic fork, loop, join)
//! - **Execution trace**: [`TaskResult`]/[`ExecutionTrace`], the flat record
//!   of one workflow run
//! - **Template catalog**: per-type default task population for the builder
//!
//! The graph transformation itself lives in `flowsight-graph`.

pub mod definition;
pub mod task;
pub mod template;
pub mod trace;

pub use definition::WorkflowDefinition;
pub use task::{
    FINAL_REF, START_REF, TaskConfig, TaskKind, collect_refs, df_placeholder_ref, do_while_end_ref,
    join_ref, loop_placeholder_ref, visit_tasks,
};
pub use template::{new_workflow_template, template_task};
pub use trace::{ExecutionTrace, TaskResult, TaskStatus, WorkflowStatus};
