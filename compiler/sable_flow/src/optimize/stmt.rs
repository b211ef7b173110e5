//! Simple statements: bindings, releases, expression statements, return.

use sable_ir::{Expr, NodeId, Stmt, Tree, VarId};

use super::{on_expression, Outcome, StmtOutcome};
use crate::abort::ExitKind;
use crate::error::Result;
use crate::notify::ChangeTag;
use crate::scope::Scope;
use crate::state::AnalysisState;

pub(super) fn optimize_assign(
    tree: &mut Tree,
    scope: &mut Scope,
    state: &mut AnalysisState<'_>,
    id: NodeId,
    target: VarId,
    value: NodeId,
) -> Result<StmtOutcome> {
    // The value is evaluated before the target is bound.
    let value = on_expression(tree, scope, state, value)?;
    let key = scope.on_variable_assigned(state, target, id)?;

    if let Some(Stmt::Assign {
        value: v,
        version,
        ..
    }) = tree.stmt_mut(id)
    {
        *v = value;
        *version = Some(key.version);
    }
    Ok(Outcome::unchanged(Some(id)))
}

pub(super) fn optimize_delete(
    tree: &mut Tree,
    scope: &mut Scope,
    state: &mut AnalysisState<'_>,
    id: NodeId,
    target: VarId,
    tolerant: bool,
) -> Result<StmtOutcome> {
    let prior = scope.on_variable_deleted(state, target)?;

    if tolerant && state.must_not_have_value(prior)? {
        tracing::debug!(var = state.variables().name(target), "tolerant delete of unbound variable");
        return Ok(Outcome::changed(
            None,
            ChangeTag::NewStatements,
            "Removed tolerant 'del' statement without effect.",
        ));
    }

    let current = scope.active_version(target);
    if let Some(Stmt::Delete { version, .. }) = tree.stmt_mut(id) {
        *version = current;
    }
    Ok(Outcome::unchanged(Some(id)))
}

pub(super) fn optimize_release(
    scope: &mut Scope,
    state: &mut AnalysisState<'_>,
    id: NodeId,
    target: VarId,
) -> Result<StmtOutcome> {
    scope.on_variable_released(state, target)?;
    Ok(Outcome::unchanged(Some(id)))
}

pub(super) fn optimize_expr_stmt(
    tree: &mut Tree,
    scope: &mut Scope,
    state: &mut AnalysisState<'_>,
    id: NodeId,
    expr: NodeId,
) -> Result<StmtOutcome> {
    let expr = on_expression(tree, scope, state, expr)?;

    if matches!(tree.expr(expr), Some(Expr::Constant(_))) {
        return Ok(Outcome::changed(
            None,
            ChangeTag::NewStatements,
            "Removed statement without effect.",
        ));
    }

    if let Some(Stmt::Expr { expr: e }) = tree.stmt_mut(id) {
        *e = expr;
    }
    Ok(Outcome::unchanged(Some(id)))
}

pub(super) fn optimize_return(
    tree: &mut Tree,
    scope: &mut Scope,
    state: &mut AnalysisState<'_>,
    id: NodeId,
    value: Option<NodeId>,
) -> Result<StmtOutcome> {
    if let Some(value) = value {
        let value = on_expression(tree, scope, state, value)?;
        if let Some(Stmt::Return { value: v }) = tree.stmt_mut(id) {
            *v = Some(value);
        }
    }

    state.on_exit(ExitKind::Return, scope)?;
    Ok(Outcome::unchanged(Some(id)))
}
