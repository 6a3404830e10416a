//! Structural tree edits.
//!
//! [`WorkflowBuilder`] owns a definition tree, an optional execution trace
//! with its resolved overlay, and the current graph. Every edit locates its
//! target through the vertex's stored tree path, validates its
//! preconditions, applies the edit to a working copy of the tree, and
//! rebuilds the graph from that copy; tree and graph are committed together
//! only when the rebuild succeeds. A failed operation leaves the live state
//! untouched.
//!
//! The graph is never patched incrementally: each successful mutation is a
//! fresh snapshot, and any previously captured vertex or edge reference
//! must be re-resolved by coordinate (reference name or execution id).

use crate::builder::build_graph;
use crate::error::{BuilderError, StructuralError};
use crate::graph::TaskGraph;
use crate::overlay::ExecutionOverlay;
use crate::path::{ListSelector, PathHop, TaskPath, resolve_list_mut};
use flowsight_model::{
    ExecutionTrace, START_REF, TaskConfig, TaskKind, WorkflowDefinition, collect_refs, join_ref,
    new_workflow_template, template_task,
};
use tracing::debug;

/// The owning instance for one edited workflow: tree, trace, and graph.
///
/// Single-threaded by design; concurrent editors must serialize through one
/// instance, and methods must not be re-entered from callbacks.
#[derive(Debug, Clone)]
pub struct WorkflowBuilder {
    definition: WorkflowDefinition,
    trace: Option<ExecutionTrace>,
    overlay: Option<ExecutionOverlay>,
    graph: TaskGraph,
}

impl WorkflowBuilder {
    /// Creates a builder over an existing definition (definition view).
    ///
    /// # Errors
    ///
    /// Returns an error if the definition violates a tree invariant.
    pub fn from_definition(definition: WorkflowDefinition) -> Result<Self, StructuralError> {
        let graph = build_graph(&definition, None)?;
        Ok(Self {
            definition,
            trace: None,
            overlay: None,
            graph,
        })
    }

    /// Creates a builder over a definition plus one execution's trace
    /// (execution view).
    ///
    /// # Errors
    ///
    /// Returns an error if the definition violates a tree invariant or the
    /// trace cannot be reconciled with it.
    pub fn from_execution(
        definition: WorkflowDefinition,
        trace: ExecutionTrace,
    ) -> Result<Self, BuilderError> {
        let overlay = ExecutionOverlay::resolve(&definition, &trace)?;
        let graph = build_graph(&definition, Some(&overlay))?;
        Ok(Self {
            definition,
            trace: Some(trace),
            overlay: Some(overlay),
            graph,
        })
    }

    /// Creates a builder over the starter template for a brand-new workflow.
    ///
    /// # Errors
    ///
    /// Returns an error if the starter template fails to build, which would
    /// be a template catalog defect.
    pub fn new_workflow() -> Result<Self, StructuralError> {
        Self::from_definition(new_workflow_template())
    }

    /// The current definition tree.
    #[must_use]
    pub fn definition(&self) -> &WorkflowDefinition {
        &self.definition
    }

    /// The current graph snapshot.
    #[must_use]
    pub fn graph(&self) -> &TaskGraph {
        &self.graph
    }

    /// The loaded execution trace, if any.
    #[must_use]
    pub fn execution(&self) -> Option<&ExecutionTrace> {
        self.trace.as_ref()
    }

    /// Wholesale-replaces the execution trace and rebuilds the graph.
    ///
    /// # Errors
    ///
    /// Returns an error if the new trace cannot be reconciled with the
    /// definition; the previous trace and graph stay live.
    pub fn set_execution(&mut self, trace: ExecutionTrace) -> Result<(), BuilderError> {
        let overlay = ExecutionOverlay::resolve(&self.definition, &trace)?;
        let graph = build_graph(&self.definition, Some(&overlay))?;
        self.trace = Some(trace);
        self.overlay = Some(overlay);
        self.graph = graph;
        Ok(())
    }

    /// Drops the execution trace and returns to the definition view.
    ///
    /// # Errors
    ///
    /// Returns an error if the definition no longer builds, which cannot
    /// happen for a tree that built before.
    pub fn clear_execution(&mut self) -> Result<(), StructuralError> {
        let graph = build_graph(&self.definition, None)?;
        self.trace = None;
        self.overlay = None;
        self.graph = graph;
        Ok(())
    }

    /// Inserts a freshly templated task immediately after `after_ref`.
    ///
    /// Inserting after the start vertex prepends to the root list.
    /// Inserting after a fork redirects past its matching join. Fork-type
    /// insertions add the task and its matching join as a pair.
    ///
    /// Returns the new task's generated reference name.
    ///
    /// # Errors
    ///
    /// Returns an error if `after_ref` does not resolve to a tree position,
    /// if a fork target has no immediate join, or if the type has no
    /// template.
    pub fn insert_after(
        &mut self,
        after_ref: &str,
        task_type: &str,
    ) -> Result<String, StructuralError> {
        let new_ref = self.next_ref(task_type);
        let task = self.fresh_task(task_type, &new_ref)?;
        let companion_join = task.kind.is_fork().then(|| {
            let reference = join_ref(&new_ref);
            TaskConfig::synthetic(reference, TaskKind::Join { join_on: Vec::new() })
        });

        let mut tasks = self.definition.tasks.clone();
        if after_ref == START_REF {
            if let Some(join) = companion_join {
                tasks.insert(0, join);
            }
            tasks.insert(0, task);
        } else {
            let path = self.path_of(after_ref)?;
            let list = Self::locate_list(&mut tasks, &path, after_ref)?;

            let mut at = path.index + 1;
            if list[path.index].kind.is_fork() {
                // the insertion point moves past the matching join
                match list.get(path.index + 1) {
                    Some(next) if next.kind.is_join() => at = path.index + 2,
                    _ => {
                        return Err(StructuralError::ForkWithoutJoin {
                            fork_ref: after_ref.to_string(),
                        });
                    }
                }
            }

            if let Some(join) = companion_join {
                list.insert(at, join);
            }
            list.insert(at, task);
        }

        self.commit(tasks)?;
        debug!(after = after_ref, new_ref = %new_ref, task_type, "inserted task");
        Ok(new_ref)
    }

    /// Appends a fresh single-task branch to a static fork.
    ///
    /// Returns the new task's generated reference name.
    ///
    /// # Errors
    ///
    /// Returns an error if `parent_ref` is not a static fork or the type has
    /// no template.
    pub fn add_fork_branch(
        &mut self,
        parent_ref: &str,
        task_type: &str,
    ) -> Result<String, StructuralError> {
        let new_ref = self.next_ref(task_type);
        let task = self.fresh_task(task_type, &new_ref)?;

        let path = self.path_of(parent_ref)?;
        let mut tasks = self.definition.tasks.clone();
        let list = Self::locate_list(&mut tasks, &path, parent_ref)?;
        let TaskKind::ForkJoin { fork_tasks } = &mut list[path.index].kind else {
            return Err(StructuralError::UnexpectedKind {
                ref_name: parent_ref.to_string(),
                expected: "FORK_JOIN",
            });
        };
        fork_tasks.push(vec![task]);

        self.commit(tasks)?;
        debug!(parent = parent_ref, new_ref = %new_ref, "added fork branch");
        Ok(new_ref)
    }

    /// Adds a case to a switch: fills an empty default when requested,
    /// otherwise appends an auto-named `case_{n}` entry.
    ///
    /// Returns the new task's generated reference name.
    ///
    /// # Errors
    ///
    /// Returns an error if `parent_ref` is not a switch or the type has no
    /// template.
    pub fn add_switch_case(
        &mut self,
        parent_ref: &str,
        task_type: &str,
        is_default: bool,
    ) -> Result<String, StructuralError> {
        let new_ref = self.next_ref(task_type);
        let task = self.fresh_task(task_type, &new_ref)?;

        let path = self.path_of(parent_ref)?;
        let mut tasks = self.definition.tasks.clone();
        let list = Self::locate_list(&mut tasks, &path, parent_ref)?;
        let TaskKind::Switch {
            decision_cases,
            default_case,
            ..
        } = &mut list[path.index].kind
        else {
            return Err(StructuralError::UnexpectedKind {
                ref_name: parent_ref.to_string(),
                expected: "SWITCH",
            });
        };

        if is_default && default_case.is_empty() {
            *default_case = vec![task];
        } else {
            let mut n = 0;
            while decision_cases.contains_key(&format!("case_{n}")) {
                n += 1;
            }
            decision_cases.insert(format!("case_{n}"), vec![task]);
        }

        self.commit(tasks)?;
        debug!(parent = parent_ref, new_ref = %new_ref, is_default, "added switch case");
        Ok(new_ref)
    }

    /// Prepends a fresh task to the front of a loop's body.
    ///
    /// Returns the new task's generated reference name.
    ///
    /// # Errors
    ///
    /// Returns an error if `parent_ref` is not a loop or the type has no
    /// template.
    pub fn add_loop_task(
        &mut self,
        parent_ref: &str,
        task_type: &str,
    ) -> Result<String, StructuralError> {
        let new_ref = self.next_ref(task_type);
        let task = self.fresh_task(task_type, &new_ref)?;

        let path = self.path_of(parent_ref)?;
        let mut tasks = self.definition.tasks.clone();
        let list = Self::locate_list(&mut tasks, &path, parent_ref)?;
        let TaskKind::DoWhile { loop_over, .. } = &mut list[path.index].kind else {
            return Err(StructuralError::UnexpectedKind {
                ref_name: parent_ref.to_string(),
                expected: "DO_WHILE",
            });
        };
        loop_over.insert(0, task);

        self.commit(tasks)?;
        debug!(parent = parent_ref, new_ref = %new_ref, "added loop task");
        Ok(new_ref)
    }

    /// Deletes a task from its containing list.
    ///
    /// A fork's matching join is removed atomically with it. If the
    /// containing list becomes empty, it is detached from the fork branch
    /// collection or switch case map that owned it, so no dangling
    /// empty-branch artifacts persist.
    ///
    /// # Errors
    ///
    /// Returns an error if `ref_name` does not resolve to a tree position,
    /// or if it is a fork whose immediate successor is not its join.
    pub fn delete_task(&mut self, ref_name: &str) -> Result<(), StructuralError> {
        let path = self.path_of(ref_name)?;
        let mut tasks = self.definition.tasks.clone();
        let list = Self::locate_list(&mut tasks, &path, ref_name)?;

        if list[path.index].kind.is_fork() {
            match list.get(path.index + 1) {
                Some(next) if next.kind.is_join() => {
                    list.remove(path.index + 1);
                }
                _ => {
                    return Err(StructuralError::ForkWithoutJoin {
                        fork_ref: ref_name.to_string(),
                    });
                }
            }
        }
        list.remove(path.index);

        if list.is_empty() {
            detach_empty_list(&mut tasks, &path.hops);
        }

        self.commit(tasks)?;
        debug!(ref_name, "deleted task");
        Ok(())
    }

    /// Replaces every attribute of a task with those of `new_config`,
    /// preserving node identity, list position, and fork/join pairing.
    ///
    /// # Errors
    ///
    /// Returns an error if `ref_name` does not resolve to a tree position,
    /// or if a renamed reference collides with any reference name already in
    /// the tree. The tree is checked, not the graph: collapsed loop bodies
    /// and dynamic-fork children hold tree tasks that are not vertices.
    pub fn update_task(
        &mut self,
        ref_name: &str,
        new_config: TaskConfig,
    ) -> Result<(), StructuralError> {
        if new_config.reference() != ref_name
            && collect_refs(&self.definition.tasks)
                .iter()
                .any(|existing| existing == new_config.reference())
        {
            return Err(StructuralError::DuplicateRef {
                ref_name: new_config.reference().to_string(),
            });
        }

        let path = self.path_of(ref_name)?;
        let mut tasks = self.definition.tasks.clone();
        let list = Self::locate_list(&mut tasks, &path, ref_name)?;
        list[path.index] = new_config;

        self.commit(tasks)?;
        debug!(ref_name, "updated task");
        Ok(())
    }

    /// Generated reference names are `{lowercase(type)}_{n}` for the
    /// smallest `n` not already a vertex of the current graph.
    fn next_ref(&self, task_type: &str) -> String {
        let base = task_type.to_lowercase();
        let mut n = 0;
        loop {
            let candidate = format!("{base}_{n}");
            if !self.graph.contains(&candidate) {
                return candidate;
            }
            n += 1;
        }
    }

    fn fresh_task(&self, task_type: &str, reference: &str) -> Result<TaskConfig, StructuralError> {
        template_task(task_type, reference).ok_or_else(|| StructuralError::UnsupportedType {
            type_name: task_type.to_string(),
        })
    }

    /// The tree path stored on the vertex for `ref_name`.
    fn path_of(&self, ref_name: &str) -> Result<TaskPath, StructuralError> {
        let vertex = self
            .graph
            .vertex(ref_name)
            .ok_or_else(|| StructuralError::TaskNotFound {
                ref_name: ref_name.to_string(),
            })?;
        vertex
            .path
            .clone()
            .ok_or_else(|| StructuralError::NoTreePosition {
                ref_name: ref_name.to_string(),
            })
    }

    /// Resolves the containing list of a path and checks it still addresses
    /// the expected task.
    fn locate_list<'a>(
        tasks: &'a mut Vec<TaskConfig>,
        path: &TaskPath,
        expected_ref: &str,
    ) -> Result<&'a mut Vec<TaskConfig>, StructuralError> {
        let found = resolve_list_mut(tasks, &path.hops)
            .filter(|list| {
                list.get(path.index)
                    .is_some_and(|task| task.reference() == expected_ref)
            })
            .is_some();
        if !found {
            return Err(StructuralError::TaskNotFound {
                ref_name: expected_ref.to_string(),
            });
        }
        // resolve again to sidestep the borrow held by the check above
        resolve_list_mut(tasks, &path.hops).ok_or_else(|| StructuralError::TaskNotFound {
            ref_name: expected_ref.to_string(),
        })
    }

    /// Rebuilds the graph from an edited tree and commits tree and graph
    /// together; on failure the live state is untouched.
    fn commit(&mut self, tasks: Vec<TaskConfig>) -> Result<(), StructuralError> {
        let mut candidate = self.definition.clone();
        candidate.tasks = tasks;
        let graph = build_graph(&candidate, self.overlay.as_ref())?;
        self.definition = candidate;
        self.graph = graph;
        Ok(())
    }
}

/// Detaches an emptied list from its owner: a fork drops the branch, a
/// switch drops the case key. An empty default case or loop body is
/// meaningful ("no default", "no body yet") and stays.
fn detach_empty_list(tasks: &mut Vec<TaskConfig>, hops: &[PathHop]) {
    let Some((last, parent_hops)) = hops.split_last() else {
        return; // root list; nothing owns it
    };
    let Some(parent_list) = resolve_list_mut(tasks, parent_hops) else {
        return;
    };
    let Some(owner) = parent_list.get_mut(last.index) else {
        return;
    };
    match (&mut owner.kind, &last.selector) {
        (TaskKind::ForkJoin { fork_tasks }, ListSelector::ForkBranch(branch)) => {
            if *branch < fork_tasks.len() {
                fork_tasks.remove(*branch);
            }
        }
        (TaskKind::Switch { decision_cases, .. }, ListSelector::Case(key)) => {
            decision_cases.shift_remove(key);
        }
        _ => {}
    }
}
