//! Task graph implementation using petgraph.
//!
//! The graph is keyed by reference name. Vertices carry the originating
//! task configuration, its tree coordinates, and the resolved runtime
//! annotations; edges carry the `executed` flag, the switch case value, and
//! the decorative `reverse` marker on loop-closing edges.

use crate::error::StructuralError;
use crate::path::TaskPath;
use flowsight_model::{TaskConfig, TaskStatus};
use petgraph::Direction;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Aggregate status counts over a variable-cardinality group of children.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tally {
    pub success: u32,
    pub in_progress: u32,
    pub canceled: u32,
    pub failed: u32,
    pub total: u32,
    /// Current iteration number, loops only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iteration: Option<u32>,
}

impl Tally {
    /// Counts one status into the tally.
    pub fn record(&mut self, status: TaskStatus) {
        if status.is_successful() {
            self.success += 1;
        } else if status.is_in_flight() {
            self.in_progress += 1;
        } else if status.is_canceled() {
            self.canceled += 1;
        } else {
            self.failed += 1;
        }
        self.total += 1;
    }
}

/// Payload of one graph vertex.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskVertex {
    /// The originating task configuration (a clone; the tree stays owned by
    /// the definition).
    pub config: TaskConfig,
    /// Tree coordinates of the configuration; `None` for synthetic vertices
    /// and dynamically-discovered children.
    pub path: Option<TaskPath>,
    /// Status from the latest matching result, or derived from the tally for
    /// placeholders. Absent means "never executed", which is not an error.
    pub status: Option<TaskStatus>,
    /// Aggregate counts, placeholders only.
    pub tally: Option<Tally>,
    /// Reference names summarized by a placeholder vertex.
    pub contained: Option<Vec<String>>,
    /// Reference name this vertex aliases for highlighting (the loop-end
    /// vertex aliases its loop header).
    pub alias_of: Option<String>,
}

impl TaskVertex {
    /// Creates a vertex for a tree-resident task.
    #[must_use]
    pub fn new(config: TaskConfig, path: Option<TaskPath>) -> Self {
        Self {
            config,
            path,
            status: None,
            tally: None,
            contained: None,
            alias_of: None,
        }
    }

    /// Returns the vertex's reference name.
    #[must_use]
    pub fn reference(&self) -> &str {
        self.config.reference()
    }

    /// Returns true once any result has been recorded for this vertex.
    #[must_use]
    pub fn has_executed(&self) -> bool {
        self.status.is_some()
    }
}

/// Payload of one graph edge.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskEdge {
    /// Whether the runtime path ran along this edge.
    pub executed: bool,
    /// The case value this edge represents, edges leaving a switch only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub case_value: Option<String>,
    /// Marks the purely decorative loop-closing edge; rendering-only, never
    /// a traversal dependency.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub reverse: bool,
}

impl TaskEdge {
    /// Creates a plain edge.
    #[must_use]
    pub fn new(executed: bool) -> Self {
        Self {
            executed,
            case_value: None,
            reverse: false,
        }
    }

    /// Creates a switch edge carrying a case value.
    #[must_use]
    pub fn with_case(executed: bool, case_value: impl Into<String>) -> Self {
        Self {
            executed,
            case_value: Some(case_value.into()),
            reverse: false,
        }
    }

    /// Creates the decorative loop-closing edge.
    #[must_use]
    pub fn reverse_edge() -> Self {
        Self {
            executed: false,
            case_value: None,
            reverse: true,
        }
    }
}

/// A workflow task graph using petgraph's directed graph.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskGraph {
    /// The underlying directed graph.
    #[serde(with = "graph_serde")]
    graph: DiGraph<TaskVertex, TaskEdge>,
    /// Map from reference name to petgraph's NodeIndex for O(1) lookup.
    #[serde(skip)]
    ref_index: HashMap<String, NodeIndex>,
    /// Map from execution id to reference name.
    pub(crate) exec_index: HashMap<String, String>,
}

impl TaskGraph {
    /// Creates a new empty task graph.
    #[must_use]
    pub fn new() -> Self {
        Self {
            graph: DiGraph::new(),
            ref_index: HashMap::new(),
            exec_index: HashMap::new(),
        }
    }

    /// Adds a vertex to the graph.
    ///
    /// # Errors
    ///
    /// Returns [`StructuralError::DuplicateRef`] if the reference name is
    /// already taken — reference names are unique across the whole tree.
    pub fn add_vertex(&mut self, vertex: TaskVertex) -> Result<(), StructuralError> {
        let reference = vertex.reference().to_string();
        if self.ref_index.contains_key(&reference) {
            return Err(StructuralError::DuplicateRef { ref_name: reference });
        }
        let index = self.graph.add_node(vertex);
        self.ref_index.insert(reference, index);
        Ok(())
    }

    /// Removes a vertex and all its edges.
    pub fn remove_vertex(&mut self, reference: &str) -> Option<TaskVertex> {
        let index = self.ref_index.remove(reference)?;
        let vertex = self.graph.remove_node(index);
        // petgraph swaps the last node into the removed slot
        self.rebuild_ref_index();
        vertex
    }

    /// Returns a vertex by reference name.
    #[must_use]
    pub fn vertex(&self, reference: &str) -> Option<&TaskVertex> {
        let index = self.ref_index.get(reference)?;
        self.graph.node_weight(*index)
    }

    /// Returns a mutable vertex by reference name.
    pub fn vertex_mut(&mut self, reference: &str) -> Option<&mut TaskVertex> {
        let index = self.ref_index.get(reference)?;
        self.graph.node_weight_mut(*index)
    }

    /// Returns true if a vertex with this reference name exists.
    #[must_use]
    pub fn contains(&self, reference: &str) -> bool {
        self.ref_index.contains_key(reference)
    }

    /// Returns a vertex by the execution id of one of its results.
    #[must_use]
    pub fn vertex_by_execution_id(&self, task_id: &str) -> Option<&TaskVertex> {
        let reference = self.exec_index.get(task_id)?;
        self.vertex(reference)
    }

    /// Records an execution id → reference name mapping.
    pub(crate) fn record_execution_id(&mut self, task_id: impl Into<String>, reference: impl Into<String>) {
        self.exec_index.insert(task_id.into(), reference.into());
    }

    /// Adds an edge between two vertices, replacing any existing edge
    /// between the same pair.
    ///
    /// # Errors
    ///
    /// Returns [`StructuralError::TaskNotFound`] if either endpoint is
    /// missing.
    pub fn add_edge(
        &mut self,
        source: &str,
        target: &str,
        edge: TaskEdge,
    ) -> Result<(), StructuralError> {
        let source_index = *self
            .ref_index
            .get(source)
            .ok_or_else(|| StructuralError::TaskNotFound {
                ref_name: source.to_string(),
            })?;
        let target_index = *self
            .ref_index
            .get(target)
            .ok_or_else(|| StructuralError::TaskNotFound {
                ref_name: target.to_string(),
            })?;

        self.graph.update_edge(source_index, target_index, edge);
        Ok(())
    }

    /// Returns the edge between two vertices, if present.
    #[must_use]
    pub fn edge(&self, source: &str, target: &str) -> Option<&TaskEdge> {
        let source_index = *self.ref_index.get(source)?;
        let target_index = *self.ref_index.get(target)?;
        let edge_index = self.graph.find_edge(source_index, target_index)?;
        self.graph.edge_weight(edge_index)
    }

    /// Iterates all vertices.
    pub fn vertices(&self) -> impl Iterator<Item = &TaskVertex> {
        self.graph.node_weights()
    }

    /// Iterates all edges as `(source_ref, target_ref, payload)`.
    pub fn edges(&self) -> impl Iterator<Item = (&str, &str, &TaskEdge)> {
        self.graph.edge_references().filter_map(|edge| {
            let source = self.graph.node_weight(edge.source())?;
            let target = self.graph.node_weight(edge.target())?;
            Some((source.reference(), target.reference(), edge.weight()))
        })
    }

    /// Returns the number of vertices.
    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Returns the number of edges.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Returns the successors of a vertex with the connecting edges.
    pub fn successors(&self, reference: &str) -> Vec<(&TaskVertex, &TaskEdge)> {
        let Some(&index) = self.ref_index.get(reference) else {
            return Vec::new();
        };

        self.graph
            .edges_directed(index, Direction::Outgoing)
            .filter_map(|edge| {
                let target = self.graph.node_weight(edge.target())?;
                Some((target, edge.weight()))
            })
            .collect()
    }

    /// Returns the predecessors of a vertex with the connecting edges.
    pub fn predecessors(&self, reference: &str) -> Vec<(&TaskVertex, &TaskEdge)> {
        let Some(&index) = self.ref_index.get(reference) else {
            return Vec::new();
        };

        self.graph
            .edges_directed(index, Direction::Incoming)
            .filter_map(|edge| {
                let source = self.graph.node_weight(edge.source())?;
                Some((source, edge.weight()))
            })
            .collect()
    }

    /// Returns the number of incoming edges of a vertex.
    #[must_use]
    pub fn incoming_count(&self, reference: &str) -> usize {
        let Some(&index) = self.ref_index.get(reference) else {
            return 0;
        };
        self.graph.edges_directed(index, Direction::Incoming).count()
    }

    /// Rebuilds the reference-name index after deserialization or removal.
    pub fn rebuild_ref_index(&mut self) {
        self.ref_index.clear();
        for index in self.graph.node_indices() {
            if let Some(vertex) = self.graph.node_weight(index) {
                self.ref_index.insert(vertex.reference().to_string(), index);
            }
        }
    }
}

impl Default for TaskGraph {
    fn default() -> Self {
        Self::new()
    }
}

/// Custom serde for the petgraph DiGraph: vertices plus ref-keyed edges.
mod graph_serde {
    use super::*;
    use serde::de::{MapAccess, Visitor};
    use serde::ser::SerializeStruct;

    pub fn serialize<S>(
        graph: &DiGraph<TaskVertex, TaskEdge>,
        serializer: S,
    ) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let vertices: Vec<_> = graph.node_weights().cloned().collect();
        let edges: Vec<_> = graph
            .edge_references()
            .map(|e| {
                let source = graph.node_weight(e.source()).map(|v| v.reference().to_string());
                let target = graph.node_weight(e.target()).map(|v| v.reference().to_string());
                (source, target, e.weight().clone())
            })
            .collect();

        let mut state = serializer.serialize_struct("TaskGraph", 2)?;
        state.serialize_field("vertices", &vertices)?;
        state.serialize_field("edges", &edges)?;
        state.end()
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DiGraph<TaskVertex, TaskEdge>, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        type EdgeTuple = (Option<String>, Option<String>, TaskEdge);

        struct GraphVisitor;

        impl<'de> Visitor<'de> for GraphVisitor {
            type Value = DiGraph<TaskVertex, TaskEdge>;

            fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
                formatter.write_str("a task graph with vertices and edges")
            }

            fn visit_map<M>(self, mut map: M) -> Result<Self::Value, M::Error>
            where
                M: MapAccess<'de>,
            {
                let mut vertices: Option<Vec<TaskVertex>> = None;
                let mut edges: Option<Vec<EdgeTuple>> = None;

                while let Some(key) = map.next_key::<String>()? {
                    match key.as_str() {
                        "vertices" => vertices = Some(map.next_value()?),
                        "edges" => edges = Some(map.next_value()?),
                        _ => {
                            let _ = map.next_value::<serde::de::IgnoredAny>()?;
                        }
                    }
                }

                let vertices = vertices.unwrap_or_default();
                let edges = edges.unwrap_or_default();

                let mut graph = DiGraph::new();
                let mut ref_to_index = HashMap::new();

                for vertex in vertices {
                    let reference = vertex.reference().to_string();
                    let index = graph.add_node(vertex);
                    ref_to_index.insert(reference, index);
                }

                for (source, target, edge) in edges {
                    let (Some(source), Some(target)) = (source, target) else {
                        continue;
                    };
                    let (Some(&source_idx), Some(&target_idx)) =
                        (ref_to_index.get(&source), ref_to_index.get(&target))
                    else {
                        continue;
                    };
                    graph.add_edge(source_idx, target_idx, edge);
                }

                Ok(graph)
            }
        }

        deserializer.deserialize_struct("TaskGraph", &["vertices", "edges"], GraphVisitor)
    }
}
