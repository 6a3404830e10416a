//! Workflow definition as fetched from the definition registry.

use crate::task::TaskConfig;
use serde::{Deserialize, Serialize};

/// A named, versioned workflow definition: metadata plus the ordered task
/// configuration tree.
///
/// The definition is the mutable source of truth for the builder UI; the
/// graph derived from it is rebuilt from scratch after every edit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowDefinition {
    /// Workflow name in the registry.
    pub name: String,
    /// Registry version of this definition.
    #[serde(default = "default_version")]
    pub version: u32,
    /// Description of what this workflow does.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// The ordered root task list.
    #[serde(default)]
    pub tasks: Vec<TaskConfig>,
}

fn default_version() -> u32 {
    1
}

impl WorkflowDefinition {
    /// Creates an empty definition with the given name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: 1,
            description: None,
            tasks: Vec::new(),
        }
    }

    /// Appends a root-level task, builder style.
    #[must_use]
    pub fn with_task(mut self, task: TaskConfig) -> Self {
        self.tasks.push(task);
        self
    }
}
