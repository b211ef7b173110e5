//! Expression optimization.

use sable_ir::{Constant, Expr, NodeId, Tree};

use super::{on_expression, ExprOutcome, Outcome};
use crate::error::{FlowError, Result};
use crate::notify::ChangeTag;
use crate::scope::Scope;
use crate::state::AnalysisState;

pub(super) fn optimize_expression(
    tree: &mut Tree,
    scope: &mut Scope,
    state: &mut AnalysisState<'_>,
    id: NodeId,
) -> Result<ExprOutcome> {
    let expr = tree
        .expr(id)
        .ok_or_else(|| FlowError::mismatch(id, "an expression"))?
        .clone();

    match expr {
        Expr::Constant(_) => Ok(Outcome::unchanged(id)),
        Expr::VarRef { var, .. } => {
            let current = scope.current_version(state, var)?;
            if let Some(Expr::VarRef { version, .. }) = tree.expr_mut(id) {
                *version = Some(current);
            }
            Ok(Outcome::unchanged(id))
        }
        Expr::Builtin { name } => Ok(fold_builtin(tree, state, id, &name)),
        Expr::Call { callee, args } => {
            let callee = on_expression(tree, scope, state, callee)?;
            let mut new_args = Vec::with_capacity(args.len());
            for arg in args {
                new_args.push(on_expression(tree, scope, state, arg)?);
            }
            if let Some(Expr::Call { callee: c, args: a }) = tree.expr_mut(id) {
                *c = callee;
                *a = new_args;
            }

            // The callee may run arbitrary code.
            scope.escape_all_active_variables(state)?;
            Ok(Outcome::unchanged(id))
        }
        Expr::DynamicEval { source } => {
            let source = on_expression(tree, scope, state, source)?;
            if let Some(Expr::DynamicEval { source: s }) = tree.expr_mut(id) {
                *s = source;
            }

            state.assume_unclear_locals();
            scope.escape_all_active_variables(state)?;
            Ok(Outcome::unchanged(id))
        }
    }
}

/// Resolve a built-in name with a fixed value.
fn fold_builtin(
    tree: &mut Tree,
    state: &AnalysisState<'_>,
    id: NodeId,
    name: &str,
) -> ExprOutcome {
    let value = match name {
        "None" => Constant::None,
        "True" => Constant::Bool(true),
        "False" => Constant::Bool(false),
        "__debug__" => Constant::Bool(state.config().debug_enabled),
        "Ellipsis" => Constant::Ellipsis,
        _ => return Outcome::unchanged(id),
    };

    let span = tree.span(id);
    let folded = tree.push_expr(Expr::Constant(value), span);
    Outcome::changed(
        folded,
        ChangeTag::NewConstant,
        format!("Built-in constant '{name}' resolved."),
    )
}
