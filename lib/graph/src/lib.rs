//! Workflow graph engine: definition tree to directed graph.
//!
//! This crate transforms a workflow definition (and optionally one
//! execution's trace) into a directed graph for rendering and editing:
//!
//! - **Graph Model**: directed graphs using petgraph with typed vertices
//!   and edges, indexed by reference name and execution id
//! - **Builder**: the pure tree-to-graph fold, including synthetic start,
//!   final, and join vertices
//! - **Execution Overlay**: trace preprocessing that annotates vertices
//!   with statuses and edges with traversal
//! - **Collapse Policy**: summary placeholders for dynamic forks and loops
//! - **Mutation Engine**: atomic structural edits through [`WorkflowBuilder`]
//!
//! The data model (definitions, traces, templates) lives in
//! `flowsight-model`.

pub mod builder;
pub mod collapse;
pub mod error;
pub mod graph;
pub mod mutation;
pub mod overlay;
pub mod path;

pub use builder::{DEFAULT_CASE_VALUE, build_graph};
pub use collapse::{DYNAMIC_FORK_COLLAPSE_THRESHOLD, DynamicForkPlan, plan_dynamic_fork};
pub use error::{BuilderError, StructuralError, TraceError};
pub use graph::{Tally, TaskEdge, TaskGraph, TaskVertex};
pub use mutation::WorkflowBuilder;
pub use overlay::ExecutionOverlay;
pub use path::{ListSelector, PathHop, TaskPath};
