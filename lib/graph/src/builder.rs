//! Workflow graph construction.
//!
//! The builder flattens the task configuration tree into a [`TaskGraph`] by
//! walking each task list with an explicit **antecedent set**: the vertices
//! whose outgoing edges must connect to whatever is processed next. The walk
//! is a pure recursive fold returning tail-vertex lists; nothing is threaded
//! through shared mutable state.
//!
//! When an [`ExecutionOverlay`] is supplied, vertices pick up their resolved
//! statuses, edges their `executed` flags, and the variable-cardinality
//! constructs (dynamic forks, loop bodies) are shaped by the collapse
//! policy.

use crate::collapse::{self, DynamicForkPlan};
use crate::error::StructuralError;
use crate::graph::{TaskEdge, TaskGraph, TaskVertex};
use crate::overlay::ExecutionOverlay;
use crate::path::{ListSelector, PathHop, TaskPath};
use flowsight_model::{
    FINAL_REF, START_REF, TaskConfig, TaskKind, WorkflowDefinition, collect_refs,
    df_placeholder_ref, do_while_end_ref, loop_placeholder_ref,
};
use indexmap::IndexMap;
use tracing::debug;

/// Case value carried by a switch's default edge, including the synthetic
/// "no case matched, no default configured" edge.
pub const DEFAULT_CASE_VALUE: &str = "default";

/// Builds the graph for a definition, optionally annotated by an execution
/// overlay.
///
/// A synthetic start vertex is prepended and a synthetic final vertex
/// appended; the final vertex is dropped again when every path ends in an
/// explicit terminate task.
///
/// # Errors
///
/// Returns [`StructuralError::DuplicateRef`] when the tree reuses a
/// reference name.
pub fn build_graph(
    definition: &WorkflowDefinition,
    overlay: Option<&ExecutionOverlay>,
) -> Result<TaskGraph, StructuralError> {
    let mut builder = Builder {
        graph: TaskGraph::new(),
        overlay,
    };

    builder.add_synthetic_vertex(START_REF, TaskKind::Start)?;
    let tails = builder.process_list(&definition.tasks, vec![START_REF.to_string()], &[])?;

    builder.add_synthetic_vertex(FINAL_REF, TaskKind::Final)?;
    for tail in &tails {
        builder.connect(tail, FINAL_REF)?;
    }
    if builder.graph.incoming_count(FINAL_REF) == 0 {
        builder.graph.remove_vertex(FINAL_REF);
    }

    builder.index_execution_ids();

    debug!(
        workflow = %definition.name,
        vertices = builder.graph.vertex_count(),
        edges = builder.graph.edge_count(),
        with_overlay = overlay.is_some(),
        "built workflow graph"
    );
    Ok(builder.graph)
}

struct Builder<'a> {
    graph: TaskGraph,
    overlay: Option<&'a ExecutionOverlay>,
}

impl Builder<'_> {
    /// Walks one task list, threading the antecedent set, and returns the
    /// list's tails.
    fn process_list(
        &mut self,
        tasks: &[TaskConfig],
        mut antecedents: Vec<String>,
        hops: &[PathHop],
    ) -> Result<Vec<String>, StructuralError> {
        for (index, task) in tasks.iter().enumerate() {
            antecedents = self.process_task(task, antecedents, hops, index)?;
        }
        Ok(antecedents)
    }

    /// Dispatches one task by its structural type and returns the new
    /// antecedent set.
    fn process_task(
        &mut self,
        task: &TaskConfig,
        antecedents: Vec<String>,
        hops: &[PathHop],
        index: usize,
    ) -> Result<Vec<String>, StructuralError> {
        let reference = task.reference().to_string();
        self.add_tree_vertex(task, hops, index)?;
        self.connect_all(&antecedents, &reference)?;

        match &task.kind {
            TaskKind::Switch {
                decision_cases,
                default_case,
                ..
            } => self.process_switch(&reference, decision_cases, default_case, hops, index),
            TaskKind::ForkJoin { fork_tasks } => {
                self.process_fork(&reference, fork_tasks, hops, index)
            }
            TaskKind::ForkJoinDynamic { .. } => self.process_dynamic_fork(&reference),
            TaskKind::DoWhile { loop_over, .. } => {
                self.process_do_while(&reference, loop_over, hops, index)
            }
            // a terminate ends the workflow: no successor antecedents
            TaskKind::Terminate => Ok(Vec::new()),
            // every other kind, joins included, is a plain sequential vertex
            _ => Ok(vec![reference]),
        }
    }

    /// A switch fans out into its default case and every decision case; the
    /// union of the branch tails carries on. An empty default leaves the
    /// switch itself as a tail so an unconditional follower still connects —
    /// the "no case matched, no default" runtime path.
    fn process_switch(
        &mut self,
        reference: &str,
        decision_cases: &IndexMap<String, Vec<TaskConfig>>,
        default_case: &[TaskConfig],
        hops: &[PathHop],
        index: usize,
    ) -> Result<Vec<String>, StructuralError> {
        let mut tails = Vec::new();

        if default_case.is_empty() {
            tails.push(reference.to_string());
        } else {
            let child_hops = push_hop(hops, index, ListSelector::DefaultCase);
            tails.extend(self.process_list(
                default_case,
                vec![reference.to_string()],
                &child_hops,
            )?);
        }

        for (key, branch) in decision_cases {
            let child_hops = push_hop(hops, index, ListSelector::Case(key.clone()));
            tails.extend(self.process_list(branch, vec![reference.to_string()], &child_hops)?);
        }

        Ok(dedupe(tails))
    }

    /// A static fork processes each branch independently; the union of
    /// branch tails becomes the antecedent set, so the following join
    /// converges structurally without special casing.
    fn process_fork(
        &mut self,
        reference: &str,
        fork_tasks: &[Vec<TaskConfig>],
        hops: &[PathHop],
        index: usize,
    ) -> Result<Vec<String>, StructuralError> {
        let mut tails = Vec::new();
        for (branch_index, branch) in fork_tasks.iter().enumerate() {
            let child_hops = push_hop(hops, index, ListSelector::ForkBranch(branch_index));
            tails.extend(self.process_list(branch, vec![reference.to_string()], &child_hops)?);
        }
        if tails.is_empty() {
            tails.push(reference.to_string());
        }
        Ok(dedupe(tails))
    }

    /// A dynamic fork's children exist only in the trace; the collapse
    /// policy decides between one placeholder and individual child vertices.
    fn process_dynamic_fork(&mut self, reference: &str) -> Result<Vec<String>, StructuralError> {
        match collapse::plan_dynamic_fork(reference, self.overlay) {
            DynamicForkPlan::Collapse {
                status,
                tally,
                children,
            } => {
                let placeholder_ref = df_placeholder_ref(reference);
                let mut vertex = TaskVertex::new(
                    TaskConfig::synthetic(&placeholder_ref, TaskKind::DfChildrenPlaceholder),
                    None,
                );
                vertex.status = status;
                vertex.tally = tally;
                vertex.contained = Some(children);
                self.graph.add_vertex(vertex)?;
                self.connect(reference, &placeholder_ref)?;
                Ok(vec![placeholder_ref])
            }
            DynamicForkPlan::Expand(children) => {
                for child in &children {
                    let kind = self
                        .overlay
                        .and_then(|overlay| overlay.latest_result(child))
                        .map_or(TaskKind::Simple, |result| {
                            TaskKind::from_type_name(&result.task_type)
                        });
                    let mut vertex =
                        TaskVertex::new(TaskConfig::synthetic(child.clone(), kind), None);
                    vertex.status = self
                        .overlay
                        .and_then(|overlay| overlay.latest_status(child));
                    self.graph.add_vertex(vertex)?;
                    self.connect(reference, child)?;
                }
                Ok(children)
            }
        }
    }

    /// Definition view: the loop body expands in place, with a decorative
    /// reverse edge from each structural tail back to the header.
    ///
    /// Execution view: the body always collapses (iteration count is
    /// unbounded) into a placeholder carrying the loop tally, followed by a
    /// synthetic end vertex aliasing the header, plus the reverse edge.
    fn process_do_while(
        &mut self,
        reference: &str,
        loop_over: &[TaskConfig],
        hops: &[PathHop],
        index: usize,
    ) -> Result<Vec<String>, StructuralError> {
        let Some(overlay) = self.overlay else {
            let child_hops = push_hop(hops, index, ListSelector::LoopBody);
            let tails =
                self.process_list(loop_over, vec![reference.to_string()], &child_hops)?;
            for tail in &tails {
                if tail != reference {
                    self.graph.add_edge(tail, reference, TaskEdge::reverse_edge())?;
                }
            }
            return Ok(tails);
        };

        let tally = collapse::loop_tally(reference, loop_over, overlay);

        let placeholder_ref = loop_placeholder_ref(reference);
        let mut placeholder = TaskVertex::new(
            TaskConfig::synthetic(&placeholder_ref, TaskKind::LoopChildrenPlaceholder),
            None,
        );
        placeholder.status = collapse::aggregate_status(&tally);
        placeholder.contained = Some(collect_refs(loop_over));
        placeholder.tally = Some(tally);
        self.graph.add_vertex(placeholder)?;
        self.connect(reference, &placeholder_ref)?;

        let end_ref = do_while_end_ref(reference);
        let mut end =
            TaskVertex::new(TaskConfig::synthetic(&end_ref, TaskKind::DoWhileEnd), None);
        end.status = overlay.latest_status(reference);
        end.alias_of = Some(reference.to_string());
        self.graph.add_vertex(end)?;
        self.connect(&placeholder_ref, &end_ref)?;
        self.graph.add_edge(&end_ref, reference, TaskEdge::reverse_edge())?;

        Ok(vec![end_ref])
    }

    fn add_tree_vertex(
        &mut self,
        task: &TaskConfig,
        hops: &[PathHop],
        index: usize,
    ) -> Result<(), StructuralError> {
        let mut vertex = TaskVertex::new(task.clone(), Some(TaskPath::new(hops.to_vec(), index)));
        vertex.status = self
            .overlay
            .and_then(|overlay| overlay.latest_status(task.reference()));
        self.graph.add_vertex(vertex)
    }

    fn add_synthetic_vertex(
        &mut self,
        reference: &str,
        kind: TaskKind,
    ) -> Result<(), StructuralError> {
        let mut vertex = TaskVertex::new(TaskConfig::synthetic(reference, kind), None);
        vertex.status = self
            .overlay
            .and_then(|overlay| overlay.latest_status(reference));
        self.graph.add_vertex(vertex)
    }

    fn connect_all(&mut self, sources: &[String], target: &str) -> Result<(), StructuralError> {
        for source in sources {
            self.connect(source, target)?;
        }
        Ok(())
    }

    fn connect(&mut self, source: &str, target: &str) -> Result<(), StructuralError> {
        let edge = self.edge_payload(source, target);
        self.graph.add_edge(source, target, edge)
    }

    /// Computes the edge payload for `source → target`.
    ///
    /// Edges leaving a switch carry a case value and follow the branch-taken
    /// rule; all other edges are executed when both endpoints have a
    /// recorded status.
    fn edge_payload(&self, source: &str, target: &str) -> TaskEdge {
        if let Some(source_vertex) = self.graph.vertex(source)
            && let TaskKind::Switch {
                decision_cases,
                default_case,
                ..
            } = &source_vertex.config.kind
        {
            let case_value = case_for_target(default_case, decision_cases, target);
            let is_default = case_value == DEFAULT_CASE_VALUE;
            let executed = self
                .overlay
                .is_some_and(|overlay| overlay.branch_taken(source, target, is_default));
            return TaskEdge::with_case(executed, case_value);
        }

        let executed = self
            .graph
            .vertex(source)
            .is_some_and(TaskVertex::has_executed)
            && self
                .graph
                .vertex(target)
                .is_some_and(TaskVertex::has_executed);
        TaskEdge::new(executed)
    }

    /// Records execution-id coordinates for every vertex the trace touched.
    fn index_execution_ids(&mut self) {
        let Some(overlay) = self.overlay else {
            return;
        };
        let references: Vec<String> = self
            .graph
            .vertices()
            .map(|vertex| vertex.reference().to_string())
            .collect();
        for reference in references {
            for result in overlay.results_for(&reference) {
                self.graph
                    .record_execution_id(result.task_id.clone(), reference.clone());
            }
        }
    }
}

/// The case value an edge leaving a switch represents: matched against the
/// first task of the default case and of each decision case; anything else
/// (including the continuation when no default is configured) renders as
/// the default — the intentional convention keeping unexecuted and
/// unconfigured defaults consistent.
fn case_for_target(
    default_case: &[TaskConfig],
    decision_cases: &IndexMap<String, Vec<TaskConfig>>,
    target: &str,
) -> String {
    if default_case
        .first()
        .is_some_and(|task| task.reference() == target)
    {
        return DEFAULT_CASE_VALUE.to_string();
    }
    for (key, branch) in decision_cases {
        if branch.first().is_some_and(|task| task.reference() == target) {
            return key.clone();
        }
    }
    DEFAULT_CASE_VALUE.to_string()
}

fn push_hop(hops: &[PathHop], index: usize, selector: ListSelector) -> Vec<PathHop> {
    let mut child_hops = hops.to_vec();
    child_hops.push(PathHop { index, selector });
    child_hops
}

fn dedupe(refs: Vec<String>) -> Vec<String> {
    let mut seen = Vec::with_capacity(refs.len());
    for reference in refs {
        if !seen.contains(&reference) {
            seen.push(reference);
        }
    }
    seen
}

#[cfg(test)]
mod tests {
    use super::*;
    use flowsight_model::{ExecutionTrace, TaskResult, TaskStatus, WorkflowStatus};

    fn simple(reference: &str) -> TaskConfig {
        TaskConfig::new(reference, reference, TaskKind::Simple)
    }

    fn join(reference: &str) -> TaskConfig {
        TaskConfig::new(reference, reference, TaskKind::Join { join_on: Vec::new() })
    }

    fn definition(tasks: Vec<TaskConfig>) -> WorkflowDefinition {
        WorkflowDefinition {
            name: "test".to_string(),
            version: 1,
            description: None,
            tasks,
        }
    }

    fn switch(
        reference: &str,
        cases: Vec<(&str, Vec<TaskConfig>)>,
        default_case: Vec<TaskConfig>,
    ) -> TaskConfig {
        let mut decision_cases = IndexMap::new();
        for (key, branch) in cases {
            decision_cases.insert(key.to_string(), branch);
        }
        TaskConfig::new(
            reference,
            reference,
            TaskKind::Switch {
                evaluator_type: None,
                expression: None,
                decision_cases,
                default_case,
            },
        )
    }

    fn result(reference: &str, task_type: &str, status: TaskStatus) -> TaskResult {
        TaskResult::new(reference, task_type, status)
    }

    fn overlay(
        definition: &WorkflowDefinition,
        status: WorkflowStatus,
        tasks: Vec<TaskResult>,
    ) -> ExecutionOverlay {
        ExecutionOverlay::resolve(definition, &ExecutionTrace::new(status, tasks))
            .expect("resolve")
    }

    fn sorted_refs(graph: &TaskGraph) -> Vec<String> {
        let mut refs: Vec<String> = graph
            .vertices()
            .map(|v| v.reference().to_string())
            .collect();
        refs.sort();
        refs
    }

    fn sorted_edges(graph: &TaskGraph) -> Vec<(String, String, TaskEdge)> {
        let mut edges: Vec<_> = graph
            .edges()
            .map(|(s, t, e)| (s.to_string(), t.to_string(), e.clone()))
            .collect();
        edges.sort_by(|a, b| (&a.0, &a.1).cmp(&(&b.0, &b.1)));
        edges
    }

    #[test]
    fn linear_definition_builds_a_chain() {
        let graph =
            build_graph(&definition(vec![simple("t1"), simple("t2")]), None).expect("build");

        assert_eq!(sorted_refs(&graph), vec!["__final", "__start", "t1", "t2"]);
        assert!(graph.edge(START_REF, "t1").is_some());
        assert!(graph.edge("t1", "t2").is_some());
        assert!(graph.edge("t2", FINAL_REF).is_some());
        assert!(!graph.edge("t1", "t2").expect("edge").executed);
    }

    #[test]
    fn terminate_removes_the_final_vertex() {
        let terminate = TaskConfig::new("stop", "stop", TaskKind::Terminate);
        let graph = build_graph(&definition(vec![simple("t1"), terminate]), None).expect("build");

        assert!(!graph.contains(FINAL_REF));
        assert_eq!(graph.successors("stop").len(), 0, "terminate is a dead end");
    }

    #[test]
    fn switch_without_default_keeps_the_switch_as_a_tail() {
        let graph = build_graph(
            &definition(vec![
                switch("sw", vec![("a", vec![simple("a1")])], Vec::new()),
                simple("next"),
            ]),
            None,
        )
        .expect("build");

        let case_edge = graph.edge("sw", "a1").expect("case edge");
        assert_eq!(case_edge.case_value.as_deref(), Some("a"));

        // the "no case matched, no default" continuation
        let default_edge = graph.edge("sw", "next").expect("continuation edge");
        assert_eq!(default_edge.case_value.as_deref(), Some("default"));

        assert!(graph.edge("a1", "next").is_some());
    }

    #[test]
    fn switch_default_case_tails_fold_forward() {
        let graph = build_graph(
            &definition(vec![
                switch(
                    "sw",
                    vec![("a", vec![simple("a1")])],
                    vec![simple("d1"), simple("d2")],
                ),
                simple("next"),
            ]),
            None,
        )
        .expect("build");

        assert_eq!(
            graph
                .edge("sw", "d1")
                .expect("default edge")
                .case_value
                .as_deref(),
            Some("default")
        );
        assert!(graph.edge("d2", "next").is_some());
        assert!(graph.edge("a1", "next").is_some());
        assert!(graph.edge("sw", "next").is_none(), "switch is not a tail");
    }

    #[test]
    fn fork_branches_converge_on_the_join() {
        let fork = TaskConfig::new(
            "fork",
            "fork",
            TaskKind::ForkJoin {
                fork_tasks: vec![vec![simple("b1")], vec![simple("b2")]],
            },
        );
        let graph = build_graph(
            &definition(vec![fork, join("fork_join"), simple("after")]),
            None,
        )
        .expect("build");

        assert!(graph.edge("fork", "b1").is_some());
        assert!(graph.edge("fork", "b2").is_some());
        assert!(graph.edge("b1", "fork_join").is_some());
        assert!(graph.edge("b2", "fork_join").is_some());
        assert!(graph.edge("fork_join", "after").is_some());
        assert_eq!(graph.predecessors("fork_join").len(), 2);
    }

    #[test]
    fn rebuilding_an_unmutated_tree_is_idempotent() {
        let def = definition(vec![
            switch("sw", vec![("a", vec![simple("a1")])], vec![simple("d1")]),
            simple("tail"),
        ]);

        let first = build_graph(&def, None).expect("build");
        let second = build_graph(&def, None).expect("build");

        assert_eq!(sorted_refs(&first), sorted_refs(&second));
        assert_eq!(sorted_edges(&first), sorted_edges(&second));
    }

    #[test]
    fn dynamic_fork_without_a_trace_collapses_without_status() {
        let df = TaskConfig::new(
            "df",
            "df",
            TaskKind::ForkJoinDynamic {
                dynamic_fork_tasks_param: None,
            },
        );
        let graph = build_graph(&definition(vec![df, join("df_join")]), None).expect("build");

        let placeholder = graph
            .vertex("df_DF_CHILDREN_PLACEHOLDER")
            .expect("placeholder");
        assert!(placeholder.status.is_none());
        assert!(graph.edge("df_DF_CHILDREN_PLACEHOLDER", "df_join").is_some());
    }

    #[test]
    fn dynamic_fork_expands_below_the_threshold() {
        let df = TaskConfig::new(
            "df",
            "df",
            TaskKind::ForkJoinDynamic {
                dynamic_fork_tasks_param: None,
            },
        );
        let def = definition(vec![df, join("df_join")]);
        let ov = overlay(
            &def,
            WorkflowStatus::Running,
            vec![
                result("df", "FORK", TaskStatus::Completed),
                result("c1", "HTTP", TaskStatus::Completed).with_parent("df"),
                result("c2", "HTTP", TaskStatus::InProgress).with_parent("df"),
                result("df_join", "JOIN", TaskStatus::InProgress),
            ],
        );
        let graph = build_graph(&def, Some(&ov)).expect("build");

        assert!(!graph.contains("df_DF_CHILDREN_PLACEHOLDER"));
        assert_eq!(graph.vertex("c1").expect("c1").status, Some(TaskStatus::Completed));
        assert_eq!(graph.vertex("c1").expect("c1").config.kind, TaskKind::Http);
        assert!(graph.edge("df", "c1").expect("edge").executed);
        assert!(graph.edge("c1", "df_join").is_some());
        assert!(graph.edge("c2", "df_join").is_some());
    }

    #[test]
    fn dynamic_fork_collapses_at_the_threshold() {
        let df = TaskConfig::new(
            "df",
            "df",
            TaskKind::ForkJoinDynamic {
                dynamic_fork_tasks_param: None,
            },
        );
        let def = definition(vec![df, join("df_join")]);
        let ov = overlay(
            &def,
            WorkflowStatus::Running,
            vec![
                result("df", "FORK", TaskStatus::Completed),
                result("c1", "SIMPLE", TaskStatus::Completed).with_parent("df"),
                result("c2", "SIMPLE", TaskStatus::Completed).with_parent("df"),
                result("c3", "SIMPLE", TaskStatus::Completed).with_parent("df"),
            ],
        );
        let graph = build_graph(&def, Some(&ov)).expect("build");

        assert!(!graph.contains("c1"));
        let placeholder = graph
            .vertex("df_DF_CHILDREN_PLACEHOLDER")
            .expect("placeholder");
        assert_eq!(placeholder.tally.expect("tally").total, 3);
        assert_eq!(placeholder.status, Some(TaskStatus::Completed));
        assert_eq!(
            placeholder.contained.as_deref(),
            Some(["c1".to_string(), "c2".to_string(), "c3".to_string()].as_slice())
        );
    }

    #[test]
    fn do_while_definition_view_expands_in_place() {
        let lp = TaskConfig::new(
            "lp",
            "lp",
            TaskKind::DoWhile {
                loop_condition: None,
                loop_over: vec![simple("body_a"), simple("body_b")],
            },
        );
        let graph = build_graph(&definition(vec![lp, simple("after")]), None).expect("build");

        assert!(graph.edge("lp", "body_a").is_some());
        assert!(graph.edge("body_a", "body_b").is_some());
        let back = graph.edge("body_b", "lp").expect("loop-back edge");
        assert!(back.reverse, "loop-back edge is decorative");
        assert!(graph.edge("body_b", "after").is_some());
    }

    #[test]
    fn do_while_execution_view_collapses_into_placeholder_and_end() {
        let lp = TaskConfig::new(
            "lp",
            "lp",
            TaskKind::DoWhile {
                loop_condition: None,
                loop_over: vec![simple("task_a")],
            },
        );
        let def = definition(vec![lp]);
        let ov = overlay(
            &def,
            WorkflowStatus::Running,
            vec![
                result("lp", "DO_WHILE", TaskStatus::InProgress).with_iteration(2),
                result("task_a", "SIMPLE", TaskStatus::Completed).with_parent("lp"),
                result("task_a", "SIMPLE", TaskStatus::Completed).with_parent("lp"),
                result("task_a", "SIMPLE", TaskStatus::InProgress).with_parent("lp"),
            ],
        );
        let graph = build_graph(&def, Some(&ov)).expect("build");

        assert!(!graph.contains("task_a"), "loop bodies always collapse");
        let placeholder = graph
            .vertex("lp_LOOP_CHILDREN_PLACEHOLDER")
            .expect("placeholder");
        let tally = placeholder.tally.expect("tally");
        assert_eq!(tally.success, 2);
        assert_eq!(tally.in_progress, 1);
        assert_eq!(tally.total, 3);
        assert_eq!(tally.iteration, Some(2));

        let end = graph.vertex("lp-END").expect("end vertex");
        assert_eq!(end.alias_of.as_deref(), Some("lp"));
        assert!(graph.edge("lp-END", "lp").expect("reverse edge").reverse);
    }

    #[test]
    fn unmatched_switch_executes_the_synthetic_default_edge() {
        let def = definition(vec![
            switch(
                "sw",
                vec![("a", vec![simple("a1")]), ("b", vec![simple("b1")])],
                Vec::new(),
            ),
            simple("next"),
        ]);
        let ov = overlay(
            &def,
            WorkflowStatus::Running,
            vec![result("sw", "SWITCH", TaskStatus::Completed)],
        );
        let graph = build_graph(&def, Some(&ov)).expect("build");

        assert!(graph.edge("sw", "next").expect("default edge").executed);
        assert!(!graph.edge("sw", "a1").expect("case a").executed);
        assert!(!graph.edge("sw", "b1").expect("case b").executed);
    }

    #[test]
    fn duplicate_reference_names_fail_the_build() {
        let result = build_graph(&definition(vec![simple("t"), simple("t")]), None);
        assert_eq!(
            result.err(),
            Some(StructuralError::DuplicateRef {
                ref_name: "t".to_string()
            })
        );
    }

    #[test]
    fn execution_ids_resolve_to_vertices() {
        let def = definition(vec![simple("t1")]);
        let r = result("t1", "SIMPLE", TaskStatus::Completed);
        let task_id = r.task_id.clone();
        let ov = overlay(&def, WorkflowStatus::Running, vec![r]);
        let graph = build_graph(&def, Some(&ov)).expect("build");

        assert_eq!(
            graph
                .vertex_by_execution_id(&task_id)
                .expect("vertex")
                .reference(),
            "t1"
        );
    }

    #[test]
    fn executed_switch_case_end_to_end() {
        // one switch with case "x" -> HTTP h1, no default; the switch
        // itself produced no result, its type resolves from the definition
        let http = TaskConfig::new("h1", "h1", TaskKind::Http);
        let def = definition(vec![switch("sw", vec![("x", vec![http])], Vec::new())]);
        let ov = overlay(
            &def,
            WorkflowStatus::Completed,
            vec![result("h1", "HTTP", TaskStatus::Completed).with_parent("sw")],
        );

        let graph = build_graph(&def, Some(&ov)).expect("build");

        assert_eq!(
            sorted_refs(&graph),
            vec!["__final", "__start", "h1", "sw"]
        );
        let case_edge = graph.edge("sw", "h1").expect("case edge");
        assert!(case_edge.executed);
        assert_eq!(case_edge.case_value.as_deref(), Some("x"));
        assert!(graph.edge("h1", FINAL_REF).expect("final edge").executed);
    }
}
