//! Node arena.
//!
//! [`Tree`] stores nodes and their spans in parallel arrays indexed by
//! [`NodeId`]. Rewrites never patch a node in place to become a different
//! node; they allocate the replacement and the parent swaps its child id.
//! Replaced nodes stay in the arena unreferenced.

use std::fmt;

use crate::node::{Expr, Node, Stmt};
use crate::Span;

/// Index of a node in a [`Tree`].
#[derive(Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct NodeId(u32);

impl NodeId {
    #[inline]
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }

    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeId({})", self.0)
    }
}

/// Arena of statement and expression nodes.
#[derive(Clone, Debug, Default)]
pub struct Tree {
    nodes: Vec<Node>,
    spans: Vec<Span>,
}

impl Tree {
    pub fn new() -> Self {
        Self::default()
    }

    #[expect(
        clippy::cast_possible_truncation,
        reason = "node counts never exceed u32"
    )]
    fn push(&mut self, node: Node, span: Span) -> NodeId {
        let id = NodeId::new(self.nodes.len() as u32);
        self.nodes.push(node);
        self.spans.push(span);
        id
    }

    /// Allocate a statement node.
    pub fn push_stmt(&mut self, stmt: Stmt, span: Span) -> NodeId {
        self.push(Node::Stmt(stmt), span)
    }

    /// Allocate an expression node.
    pub fn push_expr(&mut self, expr: Expr, span: Span) -> NodeId {
        self.push(Node::Expr(expr), span)
    }

    #[inline]
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.index())
    }

    /// The statement at `id`, or `None` if `id` is an expression or out of
    /// range.
    pub fn stmt(&self, id: NodeId) -> Option<&Stmt> {
        match self.nodes.get(id.index()) {
            Some(Node::Stmt(stmt)) => Some(stmt),
            _ => None,
        }
    }

    pub fn stmt_mut(&mut self, id: NodeId) -> Option<&mut Stmt> {
        match self.nodes.get_mut(id.index()) {
            Some(Node::Stmt(stmt)) => Some(stmt),
            _ => None,
        }
    }

    /// The expression at `id`, or `None` if `id` is a statement or out of
    /// range.
    pub fn expr(&self, id: NodeId) -> Option<&Expr> {
        match self.nodes.get(id.index()) {
            Some(Node::Expr(expr)) => Some(expr),
            _ => None,
        }
    }

    pub fn expr_mut(&mut self, id: NodeId) -> Option<&mut Expr> {
        match self.nodes.get_mut(id.index()) {
            Some(Node::Expr(expr)) => Some(expr),
            _ => None,
        }
    }

    pub fn is_statement(&self, id: NodeId) -> bool {
        matches!(self.nodes.get(id.index()), Some(Node::Stmt(_)))
    }

    pub fn is_expression(&self, id: NodeId) -> bool {
        matches!(self.nodes.get(id.index()), Some(Node::Expr(_)))
    }

    /// Source span of `id`; [`Span::DUMMY`] when out of range.
    #[inline]
    pub fn span(&self, id: NodeId) -> Span {
        self.spans.get(id.index()).copied().unwrap_or(Span::DUMMY)
    }

    /// Statements of a `Sequence` node.
    pub fn sequence(&self, id: NodeId) -> Option<&[NodeId]> {
        match self.stmt(id) {
            Some(Stmt::Sequence { stmts }) => Some(stmts),
            _ => None,
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
