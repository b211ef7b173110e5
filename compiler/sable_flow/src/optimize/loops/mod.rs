//! The loop primitive.
//!
//! A loop repeats its body unconditionally. The only ways out are a
//! `break`, a `return` or an exception, so the state after the loop is the
//! join of every state a `break` was taken from.
//!
//! # Visit
//!
//! 1. Fork a scope for the body and track breaks and continues.
//! 2. Degrade every variable the body writes to `Unknown`: a later
//!    iteration may see a write that the first walk would otherwise take as
//!    a fact about the entry state.
//! 3. Walk the body sequence and re-point the loop at the result.
//! 4. Drop a `continue` that ends the body. Falling off the end already
//!    continues.
//! 5. Merge the break snapshots into the outer scope. With no breaks the
//!    outer scope is left alone: nothing falls through.
//! 6. Delete the loop if its body is exactly `break`.
//!
//! Only a body that is a lone `break` is deleted. A longer body that starts
//! with `break` is left to the sequence's dead-code removal, which shrinks
//! it to a lone `break` for the next pass.
//!
//! Continue snapshots are collected so that a `continue` never reaches an
//! outer loop's registry, and then discarded: the degraded entry state
//! already covers every value a continue could carry into the next
//! iteration.

use sable_ir::{NodeId, Stmt, Tree};

use super::{on_statement, Outcome, StmtOutcome};
use crate::abort::{AbortCatch, ExitKind};
use crate::error::{FlowError, Result};
use crate::notify::ChangeTag;
use crate::scope::Scope;
use crate::state::AnalysisState;

pub(super) fn optimize_loop(
    tree: &mut Tree,
    scope: &mut Scope,
    state: &mut AnalysisState<'_>,
    id: NodeId,
    body: Option<NodeId>,
) -> Result<StmtOutcome> {
    let Some(body) = body else {
        tracing::debug!(span = %tree.span(id), "loop with empty body never exits");
        return Ok(Outcome::unchanged(Some(id)));
    };
    if tree.sequence(body).is_none() {
        return Err(FlowError::mismatch(body, "a statement sequence"));
    }

    let written = tree.variables_written(body);
    let mut body_scope = scope.fork("loop");

    let (body, breaks) = {
        let mut tracked = state.track_aborts(AbortCatch::LOOP);
        body_scope.degrade_written(&mut tracked, &written)?;
        let body = on_statement(tree, &mut body_scope, &mut tracked, body)?;
        let breaks = tracked.take_exits(ExitKind::Break);
        let continues = tracked.take_exits(ExitKind::Continue);
        tracing::trace!(continues = continues.len(), "continue snapshots dropped");
        (body, breaks)
    };

    let mut outcome = Outcome::unchanged(Some(id));
    let body = match body {
        Some(body) => remove_tail_continue(tree, body, &mut outcome),
        None => None,
    };
    set_body(tree, id, body);

    tracing::debug!(
        written = written.len(),
        breaks = breaks.len(),
        "loop body walked"
    );
    if !breaks.is_empty() {
        scope.merge_n_branches(state, breaks)?;
    }

    let lone_break = body
        .and_then(|body| tree.sequence(body))
        .is_some_and(|stmts| matches!(stmts, [only] if matches!(tree.stmt(*only), Some(Stmt::Break))));
    if lone_break {
        return Ok(Outcome::changed(
            None,
            ChangeTag::NewStatements,
            "Removed useless loop with immediate 'break' statement.",
        ));
    }

    Ok(outcome)
}

/// Drop a trailing `continue` from the body sequence.
///
/// Returns the body the loop keeps; `None` if the `continue` was all there
/// was.
fn remove_tail_continue(
    tree: &mut Tree,
    body: NodeId,
    outcome: &mut StmtOutcome,
) -> Option<NodeId> {
    let Some(stmts) = tree.sequence(body) else {
        return Some(body);
    };
    let &last = stmts.last()?;
    if !matches!(tree.stmt(last), Some(Stmt::Continue)) {
        return Some(body);
    }

    *outcome = Outcome::changed(
        outcome.node,
        ChangeTag::NewStatements,
        "Removed useless terminal 'continue' as last statement of loop.",
    );

    if stmts.len() == 1 {
        return None;
    }
    if let Some(Stmt::Sequence { stmts }) = tree.stmt_mut(body) {
        stmts.pop();
    }
    Some(body)
}

fn set_body(tree: &mut Tree, id: NodeId, new_body: Option<NodeId>) {
    if let Some(Stmt::Loop { body }) = tree.stmt_mut(id) {
        *body = new_body;
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    reason = "tests use unwrap/expect to panic on unexpected state"
)]
