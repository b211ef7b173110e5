//! Node kinds of the procedural tree.
//!
//! The set of statement and expression kinds is closed: every pass that
//! walks the tree matches on [`Stmt`] and [`Expr`] exhaustively, so adding a
//! kind is a compile error everywhere it is not yet handled.
//!
//! Children are referenced by [`NodeId`](crate::NodeId) into the owning
//! [`Tree`](crate::Tree). Optional children use `Option<NodeId>`.

use crate::{NodeId, VarId, Version};

/// A tree node: either a statement or an expression.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Node {
    Stmt(Stmt),
    Expr(Expr),
}

/// Statement kinds.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Stmt {
    /// Statements executed in order. Never empty once optimized.
    Sequence { stmts: Vec<NodeId> },

    /// `target = value`. `version` is filled in by the optimizer with the
    /// version the write produced during the most recent pass.
    Assign {
        target: VarId,
        value: NodeId,
        version: Option<Version>,
    },

    /// `del target`. A `tolerant` delete does not raise when the variable
    /// is already unbound.
    Delete {
        target: VarId,
        tolerant: bool,
        version: Option<Version>,
    },

    /// Compiler-inserted release of a variable at scope exit.
    Release { target: VarId },

    /// Expression evaluated for its side effects.
    Expr { expr: NodeId },

    /// Two-armed conditional. Either arm may be absent.
    If {
        cond: NodeId,
        yes: Option<NodeId>,
        no: Option<NodeId>,
    },

    /// Unconditional repeat. `for` and `while` are lowered to this before
    /// optimization; the only ways out are `Break`, `Return` or an exception.
    Loop { body: Option<NodeId> },

    Break,

    Continue,

    Return { value: Option<NodeId> },
}

/// Expression kinds.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Expr {
    Constant(Constant),

    /// Read of a variable. `version` is the trace version the read resolved
    /// to during the most recent pass.
    VarRef { var: VarId, version: Option<Version> },

    /// Reference to a built-in name.
    Builtin { name: String },

    /// Call of an arbitrary callable. The callee may run any code.
    Call { callee: NodeId, args: Vec<NodeId> },

    /// `exec`/`eval` style evaluation of source text. May read or rebind
    /// any variable by name.
    DynamicEval { source: NodeId },
}

/// Compile-time constant values.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Constant {
    None,
    Bool(bool),
    Int(i64),
    Str(String),
    Ellipsis,
}

impl Constant {
    /// Truth value of the constant under the source language's rules.
    pub fn is_truthy(&self) -> bool {
        match self {
            Constant::None => false,
            Constant::Bool(b) => *b,
            Constant::Int(i) => *i != 0,
            Constant::Str(s) => !s.is_empty(),
            Constant::Ellipsis => true,
        }
    }
}
