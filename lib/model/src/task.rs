//! Task configuration tree.
//!
//! A workflow definition is an ordered list of [`TaskConfig`] nodes. Leaf
//! tasks describe a single step; structural tasks (switch, fork, loop) own
//! nested task lists of their own. Reference names are unique across the
//! whole tree, including the synthetic names generated by the graph engine.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Reference name of the synthetic start vertex.
pub const START_REF: &str = "__start";

/// Reference name of the synthetic final vertex.
pub const FINAL_REF: &str = "__final";

/// Generated reference name of the join paired with a fork.
#[must_use]
pub fn join_ref(fork_ref: &str) -> String {
    format!("{fork_ref}_join")
}

/// Generated reference name of a collapsed dynamic-fork placeholder.
#[must_use]
pub fn df_placeholder_ref(fork_ref: &str) -> String {
    format!("{fork_ref}_DF_CHILDREN_PLACEHOLDER")
}

/// Generated reference name of a collapsed loop-body placeholder.
#[must_use]
pub fn loop_placeholder_ref(loop_ref: &str) -> String {
    format!("{loop_ref}_LOOP_CHILDREN_PLACEHOLDER")
}

/// Generated reference name of the synthetic end vertex closing a loop.
#[must_use]
pub fn do_while_end_ref(loop_ref: &str) -> String {
    format!("{loop_ref}-END")
}

/// One node of the workflow definition tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskConfig {
    /// The task's display/catalog name.
    pub name: String,
    /// Unique identifier of this task within the workflow definition.
    pub task_reference_name: String,
    /// Opaque per-type parameters; not interpreted by the graph engine.
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub input_parameters: Map<String, Value>,
    /// Whether a failure of this task is tolerated at runtime.
    #[serde(default)]
    pub optional: bool,
    /// The structural variant, tagged by `"type"` on the wire.
    #[serde(flatten)]
    pub kind: TaskKind,
}

impl TaskConfig {
    /// Creates a task with the given name, reference name, and kind.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        task_reference_name: impl Into<String>,
        kind: TaskKind,
    ) -> Self {
        Self {
            name: name.into(),
            task_reference_name: task_reference_name.into(),
            input_parameters: Map::new(),
            optional: false,
            kind,
        }
    }

    /// Creates a synthetic task whose name equals its reference name.
    ///
    /// Used for engine-generated vertices (start, final, placeholders) that
    /// never appear in a registry definition.
    #[must_use]
    pub fn synthetic(reference: impl Into<String>, kind: TaskKind) -> Self {
        let reference = reference.into();
        Self::new(reference.clone(), reference, kind)
    }

    /// Returns this task's reference name.
    #[must_use]
    pub fn reference(&self) -> &str {
        &self.task_reference_name
    }

    /// Sets an input parameter, builder style.
    #[must_use]
    pub fn with_input(mut self, key: impl Into<String>, value: Value) -> Self {
        self.input_parameters.insert(key.into(), value);
        self
    }
}

/// The structural variant of a task.
///
/// Leaf variants contribute a single vertex to the graph; structural variants
/// own nested task lists and dictate their own fan-out/fan-in shape. The
/// synthetic variants are produced only by the graph engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskKind {
    /// Worker-executed task.
    Simple,
    /// Remote HTTP call.
    Http,
    /// Inline script evaluation.
    Inline,
    /// Wait for an external signal or duration.
    Wait,
    /// Publish/await an event.
    Event,
    /// Manual human step.
    Human,
    /// Workflow variable assignment.
    SetVariable,
    /// Invocation of another workflow.
    #[serde(rename_all = "camelCase")]
    SubWorkflow {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        sub_workflow_param: Option<Value>,
    },
    /// Ends the workflow from inside the tree; a graph dead end.
    Terminate,
    /// Conditional branching over named cases plus an optional default.
    ///
    /// `DECISION` is the legacy wire tag for the same construct.
    #[serde(alias = "DECISION", rename_all = "camelCase")]
    Switch {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        evaluator_type: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        expression: Option<String>,
        #[serde(default)]
        decision_cases: IndexMap<String, Vec<TaskConfig>>,
        #[serde(default)]
        default_case: Vec<TaskConfig>,
    },
    /// Static parallel fork. Must be immediately followed in its containing
    /// list by a matching [`TaskKind::Join`].
    #[serde(rename_all = "camelCase")]
    ForkJoin {
        #[serde(default)]
        fork_tasks: Vec<Vec<TaskConfig>>,
    },
    /// Dynamic parallel fork; children are only known from an execution
    /// trace. Same join invariant as [`TaskKind::ForkJoin`].
    #[serde(rename_all = "camelCase")]
    ForkJoinDynamic {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        dynamic_fork_tasks_param: Option<String>,
    },
    /// Loop over a nested task list while a condition holds.
    #[serde(rename_all = "camelCase")]
    DoWhile {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        loop_condition: Option<String>,
        #[serde(default)]
        loop_over: Vec<TaskConfig>,
    },
    /// Convergence point for the preceding fork's branches.
    #[serde(rename_all = "camelCase")]
    Join {
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        join_on: Vec<String>,
    },
    /// Synthetic workflow entry vertex.
    Start,
    /// Synthetic workflow exit vertex.
    Final,
    /// Synthetic vertex closing a collapsed loop, aliasing its header.
    DoWhileEnd,
    /// Summary vertex for collapsed dynamic-fork children.
    DfChildrenPlaceholder,
    /// Summary vertex for a collapsed loop body.
    LoopChildrenPlaceholder,
    /// Forward-compat catch-all for task types this engine does not model
    /// structurally; treated as a leaf.
    #[serde(other)]
    Unknown,
}

impl TaskKind {
    /// The wire/trace name of this kind.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Simple => "SIMPLE",
            Self::Http => "HTTP",
            Self::Inline => "INLINE",
            Self::Wait => "WAIT",
            Self::Event => "EVENT",
            Self::Human => "HUMAN",
            Self::SetVariable => "SET_VARIABLE",
            Self::SubWorkflow { .. } => "SUB_WORKFLOW",
            Self::Terminate => "TERMINATE",
            Self::Switch { .. } => "SWITCH",
            Self::ForkJoin { .. } => "FORK_JOIN",
            Self::ForkJoinDynamic { .. } => "FORK_JOIN_DYNAMIC",
            Self::DoWhile { .. } => "DO_WHILE",
            Self::Join { .. } => "JOIN",
            Self::Start => "START",
            Self::Final => "FINAL",
            Self::DoWhileEnd => "DO_WHILE_END",
            Self::DfChildrenPlaceholder => "DF_CHILDREN_PLACEHOLDER",
            Self::LoopChildrenPlaceholder => "LOOP_CHILDREN_PLACEHOLDER",
            Self::Unknown => "UNKNOWN",
        }
    }

    /// Maps a trace-side type label to a kind, for vertices synthesized from
    /// execution results (dynamic-fork children). Trace labels use `FORK`
    /// for both fork flavors.
    #[must_use]
    pub fn from_type_name(name: &str) -> Self {
        match name {
            "SIMPLE" => Self::Simple,
            "HTTP" => Self::Http,
            "INLINE" | "LAMBDA" => Self::Inline,
            "WAIT" => Self::Wait,
            "EVENT" => Self::Event,
            "HUMAN" => Self::Human,
            "SET_VARIABLE" => Self::SetVariable,
            "SUB_WORKFLOW" => Self::SubWorkflow {
                sub_workflow_param: None,
            },
            "TERMINATE" => Self::Terminate,
            "JOIN" => Self::Join { join_on: Vec::new() },
            _ => Self::Unknown,
        }
    }

    /// Returns true for both fork flavors.
    #[must_use]
    pub fn is_fork(&self) -> bool {
        matches!(self, Self::ForkJoin { .. } | Self::ForkJoinDynamic { .. })
    }

    /// Returns true for the switch/decision construct.
    #[must_use]
    pub fn is_switch(&self) -> bool {
        matches!(self, Self::Switch { .. })
    }

    /// Returns true for the loop construct.
    #[must_use]
    pub fn is_loop(&self) -> bool {
        matches!(self, Self::DoWhile { .. })
    }

    /// Returns true for join tasks.
    #[must_use]
    pub fn is_join(&self) -> bool {
        matches!(self, Self::Join { .. })
    }

    /// Returns true for terminate tasks.
    #[must_use]
    pub fn is_terminate(&self) -> bool {
        matches!(self, Self::Terminate)
    }

    /// Returns true for engine-generated summary vertices.
    #[must_use]
    pub fn is_placeholder(&self) -> bool {
        matches!(
            self,
            Self::DfChildrenPlaceholder | Self::LoopChildrenPlaceholder
        )
    }

    /// Returns true for vertices that never correspond to a tree node.
    #[must_use]
    pub fn is_synthetic(&self) -> bool {
        matches!(self, Self::Start | Self::Final | Self::DoWhileEnd) || self.is_placeholder()
    }
}

/// Visits every task in a forest depth-first, descending into switch cases,
/// fork branches, and loop bodies.
pub fn visit_tasks<'a>(tasks: &'a [TaskConfig], f: &mut impl FnMut(&'a TaskConfig)) {
    for task in tasks {
        f(task);
        match &task.kind {
            TaskKind::Switch {
                decision_cases,
                default_case,
                ..
            } => {
                visit_tasks(default_case, f);
                for branch in decision_cases.values() {
                    visit_tasks(branch, f);
                }
            }
            TaskKind::ForkJoin { fork_tasks } => {
                for branch in fork_tasks {
                    visit_tasks(branch, f);
                }
            }
            TaskKind::DoWhile { loop_over, .. } => visit_tasks(loop_over, f),
            _ => {}
        }
    }
}

/// Collects every reference name in a forest, in visit order.
#[must_use]
pub fn collect_refs(tasks: &[TaskConfig]) -> Vec<String> {
    let mut refs = Vec::new();
    visit_tasks(tasks, &mut |task| refs.push(task.task_reference_name.clone()));
    refs
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn simple(reference: &str) -> TaskConfig {
        TaskConfig::new(reference, reference, TaskKind::Simple)
    }

    #[test]
    fn config_serde_roundtrip() {
        let task = TaskConfig::new("fetch", "fetch_ref", TaskKind::Http)
            .with_input("uri", json!("https://example.test"));
        let json = serde_json::to_value(&task).expect("serialize");
        assert_eq!(json["type"], "HTTP");
        assert_eq!(json["taskReferenceName"], "fetch_ref");
        assert_eq!(json["inputParameters"]["uri"], "https://example.test");

        let parsed: TaskConfig = serde_json::from_value(json).expect("deserialize");
        assert_eq!(parsed, task);
    }

    #[test]
    fn switch_parses_nested_cases() {
        let task: TaskConfig = serde_json::from_value(json!({
            "name": "route",
            "taskReferenceName": "route_ref",
            "type": "SWITCH",
            "evaluatorType": "value-param",
            "decisionCases": {
                "a": [{"name": "t", "taskReferenceName": "t_a", "type": "SIMPLE"}],
                "b": [{"name": "t", "taskReferenceName": "t_b", "type": "SIMPLE"}]
            },
            "defaultCase": []
        }))
        .expect("deserialize");

        let TaskKind::Switch {
            decision_cases,
            default_case,
            ..
        } = &task.kind
        else {
            panic!("expected switch");
        };
        assert_eq!(
            decision_cases.keys().collect::<Vec<_>>(),
            vec!["a", "b"],
            "case order must survive parsing"
        );
        assert!(default_case.is_empty());
    }

    #[test]
    fn decision_is_an_alias_for_switch() {
        let task: TaskConfig = serde_json::from_value(json!({
            "name": "legacy",
            "taskReferenceName": "legacy_ref",
            "type": "DECISION",
            "decisionCases": {}
        }))
        .expect("deserialize");
        assert!(task.kind.is_switch());
    }

    #[test]
    fn unknown_type_is_a_leaf() {
        let task: TaskConfig = serde_json::from_value(json!({
            "name": "exotic",
            "taskReferenceName": "exotic_ref",
            "type": "KAFKA_PUBLISH"
        }))
        .expect("deserialize");
        assert_eq!(task.kind, TaskKind::Unknown);
        assert!(!task.kind.is_fork());
    }

    #[test]
    fn generated_reference_names() {
        assert_eq!(join_ref("fork_0"), "fork_0_join");
        assert_eq!(df_placeholder_ref("df"), "df_DF_CHILDREN_PLACEHOLDER");
        assert_eq!(loop_placeholder_ref("lp"), "lp_LOOP_CHILDREN_PLACEHOLDER");
        assert_eq!(do_while_end_ref("lp"), "lp-END");
    }

    #[test]
    fn collect_refs_descends_into_structural_children() {
        let fork = TaskConfig::new(
            "fork",
            "fork_ref",
            TaskKind::ForkJoin {
                fork_tasks: vec![vec![simple("branch_a")], vec![simple("branch_b")]],
            },
        );
        let the_loop = TaskConfig::new(
            "loop",
            "loop_ref",
            TaskKind::DoWhile {
                loop_condition: None,
                loop_over: vec![simple("body")],
            },
        );

        let refs = collect_refs(&[fork, the_loop]);
        assert_eq!(
            refs,
            vec!["fork_ref", "branch_a", "branch_b", "loop_ref", "body"]
        );
    }
}
