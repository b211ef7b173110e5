//! Optimizer defects.
//!
//! Every variant here means the optimizer itself is wrong, never the
//! program being compiled. Facts about the user program (a read of an
//! unbound variable, a delete that must raise) are trace kinds, not errors.

use sable_ir::{NodeId, Span, VarId, Version};
use thiserror::Error;

use crate::abort::ExitKind;

#[derive(Debug, Error)]
pub enum FlowError {
    /// A `(variable, version)` key was inserted twice.
    #[error("duplicate trace for variable {} version {version}", .var.raw())]
    DuplicateTrace { var: VarId, version: Version },

    /// A lookup named a version that was never recorded.
    #[error("no trace for variable {} version {version}", .var.raw())]
    MissingTrace { var: VarId, version: Version },

    /// A variable id that is not in the variable table.
    #[error("variable {} is not registered", .0.raw())]
    UnknownVariable(VarId),

    /// A break or continue with no enclosing construct collecting it.
    #[error("{kind} outside of any construct tracking it")]
    ExitOutsideTracking { kind: ExitKind },

    /// A merge was requested with no input scopes.
    #[error("merge of zero branches")]
    EmptyMerge,

    /// A node of the wrong shape where a specific kind is required.
    #[error("node {} is not {expected}", .node.raw())]
    NodeKindMismatch {
        node: NodeId,
        expected: &'static str,
    },

    /// Failure while optimizing the statement at `span`.
    #[error("problem with statement at {span}: {source}")]
    InStatement {
        span: Span,
        #[source]
        source: Box<FlowError>,
    },
}

impl FlowError {
    pub(crate) fn mismatch(node: NodeId, expected: &'static str) -> Self {
        FlowError::NodeKindMismatch { node, expected }
    }

    /// Attach `span` unless an inner statement already did.
    pub(crate) fn in_statement(self, span: Span) -> Self {
        match self {
            err @ FlowError::InStatement { .. } => err,
            err => FlowError::InStatement {
                span,
                source: Box::new(err),
            },
        }
    }

    /// Span of the innermost failing statement, if known.
    pub fn span(&self) -> Option<Span> {
        match self {
            FlowError::InStatement { span, .. } => Some(*span),
            _ => None,
        }
    }

    /// The error with any statement context stripped.
    pub fn root_cause(&self) -> &FlowError {
        match self {
            FlowError::InStatement { source, .. } => source.root_cause(),
            err => err,
        }
    }
}

pub type Result<T> = std::result::Result<T, FlowError>;
