//! Error types for the graph engine.
//!
//! Three kinds are kept strictly apart:
//! - [`StructuralError`]: a tree invariant was violated — fatal to the
//!   attempted operation, never silently recovered
//! - [`TraceError`]: the execution trace contradicts the definition — fatal
//!   to overlay resolution, the caller should refetch both
//! - legitimately-absent lookups (status of an unexecuted task, a missing
//!   executed case) are `Option`s, not errors

use std::fmt;

/// Errors from tree-structure violations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StructuralError {
    /// No vertex with this reference name exists in the current graph.
    TaskNotFound { ref_name: String },
    /// A fork is not immediately followed by its matching join.
    ForkWithoutJoin { fork_ref: String },
    /// A reference name is already taken by another vertex.
    DuplicateRef { ref_name: String },
    /// A structural mutation targeted the wrong construct.
    UnexpectedKind {
        ref_name: String,
        expected: &'static str,
    },
    /// The target vertex has no position in the definition tree (synthetic
    /// or dynamically-discovered) and cannot be edited.
    NoTreePosition { ref_name: String },
    /// The template catalog has no entry for this task type.
    UnsupportedType { type_name: String },
}

impl fmt::Display for StructuralError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TaskNotFound { ref_name } => {
                write!(f, "task not found: {ref_name}")
            }
            Self::ForkWithoutJoin { fork_ref } => {
                write!(f, "fork '{fork_ref}' must be followed by a join")
            }
            Self::DuplicateRef { ref_name } => {
                write!(f, "duplicate task reference name: {ref_name}")
            }
            Self::UnexpectedKind { ref_name, expected } => {
                write!(f, "task '{ref_name}' is not a {expected}")
            }
            Self::NoTreePosition { ref_name } => {
                write!(f, "task '{ref_name}' has no position in the definition tree")
            }
            Self::UnsupportedType { type_name } => {
                write!(f, "no template for task type '{type_name}'")
            }
        }
    }
}

impl std::error::Error for StructuralError {}

/// Errors from an execution trace that cannot be reconciled with itself.
///
/// These signal a definition/trace mismatch (e.g. a stale cached
/// definition); resolution aborts rather than guessing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TraceError {
    /// A result names a parent with no recorded result of its own.
    UnresolvedParent {
        child_ref: String,
        parent_ref: String,
    },
}

impl fmt::Display for TraceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnresolvedParent {
                child_ref,
                parent_ref,
            } => {
                write!(
                    f,
                    "task '{child_ref}' names parent '{parent_ref}' which has no recorded result"
                )
            }
        }
    }
}

impl std::error::Error for TraceError {}

/// Umbrella error for operations that touch both the tree and a trace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuilderError {
    /// A tree invariant was violated.
    Structural(StructuralError),
    /// The trace was inconsistent.
    Trace(TraceError),
}

impl fmt::Display for BuilderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Structural(err) => err.fmt(f),
            Self::Trace(err) => err.fmt(f),
        }
    }
}

impl std::error::Error for BuilderError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Structural(err) => Some(err),
            Self::Trace(err) => Some(err),
        }
    }
}

impl From<StructuralError> for BuilderError {
    fn from(err: StructuralError) -> Self {
        Self::Structural(err)
    }
}

impl From<TraceError> for BuilderError {
    fn from(err: TraceError) -> Self {
        Self::Trace(err)
    }
}
