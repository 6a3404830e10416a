//! Tree coordinates for graph vertices.
//!
//! The mutation engine needs to find, for any vertex, the task list that
//! contains its configuration. Instead of holding a live reference into the
//! tree, each vertex stores an explicit [`TaskPath`]: the chain of hops from
//! the root list down to the containing list, plus the index within it.
//! Paths are recomputed on every build, so a path is valid exactly as long
//! as the graph snapshot that carries it.

use flowsight_model::{TaskConfig, TaskKind};
use serde::{Deserialize, Serialize};

/// Which child list of a structural task a hop descends into.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ListSelector {
    /// `fork_tasks[branch]` of a static fork.
    ForkBranch(usize),
    /// `decision_cases[key]` of a switch.
    Case(String),
    /// `default_case` of a switch.
    DefaultCase,
    /// `loop_over` of a loop.
    LoopBody,
}

/// One hop: the index of a structural task in the current list, and which
/// of its child lists to descend into.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathHop {
    pub index: usize,
    pub selector: ListSelector,
}

/// The tree coordinates of one task: its containing list plus its index.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TaskPath {
    /// Hops from the root list to the containing list.
    pub hops: Vec<PathHop>,
    /// Index of the task within the containing list.
    pub index: usize,
}

impl TaskPath {
    /// A path addressing `index` in the list reached by `hops`.
    #[must_use]
    pub fn new(hops: Vec<PathHop>, index: usize) -> Self {
        Self { hops, index }
    }
}

/// Resolves the list addressed by `hops`, starting from the root list.
///
/// Returns `None` if the path no longer matches the tree (wrong index, wrong
/// construct, or a removed case key).
#[must_use]
pub fn resolve_list<'a>(root: &'a [TaskConfig], hops: &[PathHop]) -> Option<&'a [TaskConfig]> {
    let mut list = root;
    for hop in hops {
        let task = list.get(hop.index)?;
        list = match (&task.kind, &hop.selector) {
            (TaskKind::ForkJoin { fork_tasks }, ListSelector::ForkBranch(branch)) => {
                fork_tasks.get(*branch)?
            }
            (TaskKind::Switch { decision_cases, .. }, ListSelector::Case(key)) => {
                decision_cases.get(key)?
            }
            (TaskKind::Switch { default_case, .. }, ListSelector::DefaultCase) => default_case,
            (TaskKind::DoWhile { loop_over, .. }, ListSelector::LoopBody) => loop_over,
            _ => return None,
        };
    }
    Some(list)
}

/// Mutable counterpart of [`resolve_list`].
#[must_use]
pub fn resolve_list_mut<'a>(
    root: &'a mut Vec<TaskConfig>,
    hops: &[PathHop],
) -> Option<&'a mut Vec<TaskConfig>> {
    let mut list = root;
    for hop in hops {
        let task = list.get_mut(hop.index)?;
        list = match (&mut task.kind, &hop.selector) {
            (TaskKind::ForkJoin { fork_tasks }, ListSelector::ForkBranch(branch)) => {
                fork_tasks.get_mut(*branch)?
            }
            (TaskKind::Switch { decision_cases, .. }, ListSelector::Case(key)) => {
                decision_cases.get_mut(key)?
            }
            (TaskKind::Switch { default_case, .. }, ListSelector::DefaultCase) => default_case,
            (TaskKind::DoWhile { loop_over, .. }, ListSelector::LoopBody) => loop_over,
            _ => return None,
        };
    }
    Some(list)
}
