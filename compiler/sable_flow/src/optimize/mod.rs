//! Statement and expression rewriting against the current trace state.
//!
//! Every node kind is asked to optimize itself given the scope it runs in.
//! A node may
//!
//! - stay as it is (no [`Change`]),
//! - name a replacement node (the parent re-points its child), or
//! - for statements, return `None` to be deleted.
//!
//! Any result that carries a [`Change`] is reported to the driver through
//! the state's notifier, once, with the span of the node that was asked.
//!
//! # Entry Points
//!
//! - [`on_statement`]: optimize one statement (sequences included).
//! - [`on_expression`]: optimize one expression and, if the surviving node
//!   is a variable reference, count the read against the current trace.
//!   Counting happens after the rewrite so that a reference which rewrote
//!   itself away never shows up as a usage.
//!
//! Failures while optimizing a statement are logged with that statement's
//! span at every enclosing statement and propagated; the innermost span is
//! attached to the error.

mod control_flow;
mod expr;
mod loops;
mod stmt;

use std::borrow::Cow;

use sable_ir::{Expr, NodeId, Stmt, Tree, VariableKind};

use crate::error::{FlowError, Result};
use crate::notify::ChangeTag;
use crate::scope::Scope;
use crate::state::AnalysisState;

/// Minimum stack space to keep available before recursing into a child
/// statement.
#[cfg(not(target_arch = "wasm32"))]
const RED_ZONE: usize = 100 * 1024;

/// Stack space to allocate when growing.
#[cfg(not(target_arch = "wasm32"))]
const STACK_PER_RECURSION: usize = 1024 * 1024;

/// Run `f` with at least `RED_ZONE` bytes of stack, growing it if needed.
#[inline]
#[cfg(not(target_arch = "wasm32"))]
fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    stacker::maybe_grow(RED_ZONE, STACK_PER_RECURSION, f)
}

#[inline]
#[cfg(target_arch = "wasm32")]
fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    f()
}

/// A rewrite worth telling the driver about.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Change {
    pub tag: ChangeTag,
    pub message: Cow<'static, str>,
}

/// Result of asking a node to optimize itself.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Outcome<T> {
    /// The node that takes the asked node's place.
    pub node: T,
    pub change: Option<Change>,
}

impl<T> Outcome<T> {
    pub fn unchanged(node: T) -> Self {
        Self { node, change: None }
    }

    pub fn changed(node: T, tag: ChangeTag, message: impl Into<Cow<'static, str>>) -> Self {
        Self {
            node,
            change: Some(Change {
                tag,
                message: message.into(),
            }),
        }
    }
}

/// `None` deletes the statement.
pub type StmtOutcome = Outcome<Option<NodeId>>;

pub type ExprOutcome = Outcome<NodeId>;

/// Optimize the statement `id` in `scope`.
///
/// Returns the node that replaces it, or `None` if it was deleted.
pub fn on_statement(
    tree: &mut Tree,
    scope: &mut Scope,
    state: &mut AnalysisState<'_>,
    id: NodeId,
) -> Result<Option<NodeId>> {
    let span = tree.span(id);
    let result = ensure_sufficient_stack(|| optimize_statement(tree, scope, state, id));

    match result {
        Ok(outcome) => {
            if let Some(change) = &outcome.change {
                state.signal_change(change.tag, span, &change.message);
            }
            Ok(outcome.node)
        }
        Err(err) => {
            tracing::error!(%span, error = %err, "problem with statement");
            Err(err.in_statement(span))
        }
    }
}

/// Optimize the expression `id` in `scope`.
///
/// Returns the node that replaces it (possibly `id` itself).
pub fn on_expression(
    tree: &mut Tree,
    scope: &mut Scope,
    state: &mut AnalysisState<'_>,
    id: NodeId,
) -> Result<NodeId> {
    let outcome = expr::optimize_expression(tree, scope, state, id)?;
    if let Some(change) = &outcome.change {
        state.signal_change(change.tag, tree.span(id), &change.message);
    }

    let node = outcome.node;
    if let Some(&Expr::VarRef { var, .. }) = tree.expr(node) {
        let key = scope.current_key(state, var)?;
        state.mark_usage(key)?;

        let fallback = match state.variables().get(var).map(sable_ir::Variable::kind) {
            Some(VariableKind::MaybeLocal { fallback }) => fallback,
            _ => None,
        };
        if let Some(fallback) = fallback {
            let key = scope.current_key(state, fallback)?;
            state.mark_usage(key)?;
        }
    }

    Ok(node)
}

/// Dispatch on the statement kind.
fn optimize_statement(
    tree: &mut Tree,
    scope: &mut Scope,
    state: &mut AnalysisState<'_>,
    id: NodeId,
) -> Result<StmtOutcome> {
    let stmt = tree
        .stmt(id)
        .ok_or_else(|| FlowError::mismatch(id, "a statement"))?
        .clone();

    match stmt {
        Stmt::Sequence { stmts } => optimize_sequence(tree, scope, state, id, stmts),
        Stmt::Assign { target, value, .. } => {
            stmt::optimize_assign(tree, scope, state, id, target, value)
        }
        Stmt::Delete {
            target, tolerant, ..
        } => stmt::optimize_delete(tree, scope, state, id, target, tolerant),
        Stmt::Release { target } => stmt::optimize_release(scope, state, id, target),
        Stmt::Expr { expr } => stmt::optimize_expr_stmt(tree, scope, state, id, expr),
        Stmt::Return { value } => stmt::optimize_return(tree, scope, state, id, value),
        Stmt::If { cond, yes, no } => {
            control_flow::optimize_if(tree, scope, state, id, cond, yes, no)
        }
        Stmt::Loop { body } => loops::optimize_loop(tree, scope, state, id, body),
        Stmt::Break => control_flow::optimize_break(scope, state, id),
        Stmt::Continue => control_flow::optimize_continue(scope, state, id),
    }
}

/// Optimize a statement sequence left to right.
///
/// Nested sequences produced by rewrites are spliced in. Statements after
/// one that aborts can never run and are dropped. A sequence left with no
/// statements is deleted.
fn optimize_sequence(
    tree: &mut Tree,
    scope: &mut Scope,
    state: &mut AnalysisState<'_>,
    id: NodeId,
    stmts: Vec<NodeId>,
) -> Result<StmtOutcome> {
    let mut kept = Vec::with_capacity(stmts.len());
    let mut edited = false;

    for (i, &stmt) in stmts.iter().enumerate() {
        let Some(result) = on_statement(tree, scope, state, stmt)? else {
            edited = true;
            continue;
        };

        if let Some(inner) = tree.sequence(result) {
            kept.extend_from_slice(inner);
            edited = true;
        } else {
            edited |= result != stmt;
            kept.push(result);
        }

        if tree.is_aborting(result) && i + 1 < stmts.len() {
            let dead = stmts.len() - i - 1;
            state.signal_change(
                ChangeTag::NewStatements,
                tree.span(stmts[i + 1]),
                "Removed dead statements after aborting statement.",
            );
            tracing::debug!(dead, "dropping unreachable statements");
            edited = true;
            break;
        }
    }

    if kept.is_empty() {
        return Ok(Outcome::changed(
            None,
            ChangeTag::NewStatements,
            "Removed empty statement sequence.",
        ));
    }

    if edited {
        if let Some(Stmt::Sequence { stmts }) = tree.stmt_mut(id) {
            *stmts = kept;
        }
    }
    Ok(Outcome::unchanged(Some(id)))
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    reason = "tests use unwrap/expect to panic on unexpected state"
)]
mod tests;
