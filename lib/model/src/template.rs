//! Per-type task templates.
//!
//! The mutation engine inserts freshly templated tasks; the per-type default
//! population lives here as one pure function per type so the catalog can
//! evolve without touching the engine.

use crate::definition::WorkflowDefinition;
use crate::task::{TaskConfig, TaskKind};
use serde_json::json;

/// Builds a default-populated task of the given wire type.
///
/// Returns `None` for type names the catalog does not know how to template.
#[must_use]
pub fn template_task(task_type: &str, reference: &str) -> Option<TaskConfig> {
    let task = match task_type {
        "SIMPLE" => simple_template(reference),
        "HTTP" => http_template(reference),
        "INLINE" => inline_template(reference),
        "WAIT" => wait_template(reference),
        "EVENT" => event_template(reference),
        "HUMAN" => human_template(reference),
        "SET_VARIABLE" => set_variable_template(reference),
        "SUB_WORKFLOW" => sub_workflow_template(reference),
        "TERMINATE" => terminate_template(reference),
        "SWITCH" => switch_template(reference),
        "FORK_JOIN" => fork_join_template(reference),
        "FORK_JOIN_DYNAMIC" => fork_join_dynamic_template(reference),
        "DO_WHILE" => do_while_template(reference),
        "JOIN" => join_template(reference),
        _ => return None,
    };
    Some(task)
}

/// The starter definition used when creating a workflow from scratch.
#[must_use]
pub fn new_workflow_template() -> WorkflowDefinition {
    WorkflowDefinition::new("untitled_workflow").with_task(simple_template("simple_0"))
}

fn simple_template(reference: &str) -> TaskConfig {
    TaskConfig::new(reference, reference, TaskKind::Simple)
}

fn http_template(reference: &str) -> TaskConfig {
    TaskConfig::new(reference, reference, TaskKind::Http).with_input(
        "http_request",
        json!({
            "method": "GET",
            "uri": "https://example.com",
        }),
    )
}

fn inline_template(reference: &str) -> TaskConfig {
    TaskConfig::new(reference, reference, TaskKind::Inline)
        .with_input("evaluatorType", json!("javascript"))
        .with_input("expression", json!("true"))
}

fn wait_template(reference: &str) -> TaskConfig {
    TaskConfig::new(reference, reference, TaskKind::Wait).with_input("duration", json!("60 seconds"))
}

fn event_template(reference: &str) -> TaskConfig {
    TaskConfig::new(reference, reference, TaskKind::Event).with_input("sink", json!(""))
}

fn human_template(reference: &str) -> TaskConfig {
    TaskConfig::new(reference, reference, TaskKind::Human)
}

fn set_variable_template(reference: &str) -> TaskConfig {
    TaskConfig::new(reference, reference, TaskKind::SetVariable)
}

fn sub_workflow_template(reference: &str) -> TaskConfig {
    TaskConfig::new(
        reference,
        reference,
        TaskKind::SubWorkflow {
            sub_workflow_param: Some(json!({"name": "", "version": 1})),
        },
    )
}

fn terminate_template(reference: &str) -> TaskConfig {
    TaskConfig::new(reference, reference, TaskKind::Terminate)
        .with_input("terminationStatus", json!("COMPLETED"))
}

fn switch_template(reference: &str) -> TaskConfig {
    TaskConfig::new(
        reference,
        reference,
        TaskKind::Switch {
            evaluator_type: Some("value-param".to_string()),
            expression: Some("switchCaseValue".to_string()),
            decision_cases: indexmap::IndexMap::new(),
            default_case: Vec::new(),
        },
    )
    .with_input("switchCaseValue", json!("${workflow.input.case}"))
}

fn fork_join_template(reference: &str) -> TaskConfig {
    TaskConfig::new(
        reference,
        reference,
        TaskKind::ForkJoin {
            fork_tasks: Vec::new(),
        },
    )
}

fn fork_join_dynamic_template(reference: &str) -> TaskConfig {
    TaskConfig::new(
        reference,
        reference,
        TaskKind::ForkJoinDynamic {
            dynamic_fork_tasks_param: Some("dynamicTasks".to_string()),
        },
    )
    .with_input("dynamicTasks", json!([]))
    .with_input("dynamicTasksInput", json!({}))
}

fn do_while_template(reference: &str) -> TaskConfig {
    TaskConfig::new(
        reference,
        reference,
        TaskKind::DoWhile {
            loop_condition: Some(format!(
                "if ($.{reference}['iteration'] < 1) {{ true; }} else {{ false; }}"
            )),
            loop_over: Vec::new(),
        },
    )
}

fn join_template(reference: &str) -> TaskConfig {
    TaskConfig::new(reference, reference, TaskKind::Join { join_on: Vec::new() })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn templates_carry_the_requested_reference() {
        for task_type in [
            "SIMPLE",
            "HTTP",
            "INLINE",
            "WAIT",
            "EVENT",
            "HUMAN",
            "SET_VARIABLE",
            "SUB_WORKFLOW",
            "TERMINATE",
            "SWITCH",
            "FORK_JOIN",
            "FORK_JOIN_DYNAMIC",
            "DO_WHILE",
            "JOIN",
        ] {
            let task = template_task(task_type, "my_ref").expect(task_type);
            assert_eq!(task.reference(), "my_ref");
            assert_eq!(task.kind.type_name(), task_type);
        }
    }

    #[test]
    fn unknown_type_has_no_template() {
        assert!(template_task("KAFKA_PUBLISH", "r").is_none());
    }

    #[test]
    fn new_workflow_starts_with_one_task() {
        let definition = new_workflow_template();
        assert_eq!(definition.tasks.len(), 1);
        assert_eq!(definition.tasks[0].reference(), "simple_0");
    }

    #[test]
    fn terminate_template_defaults_to_completed() {
        let task = template_task("TERMINATE", "end").expect("template");
        assert_eq!(
            task.input_parameters["terminationStatus"],
            serde_json::json!("COMPLETED")
        );
    }
}
