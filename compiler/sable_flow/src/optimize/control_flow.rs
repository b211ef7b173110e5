//! Conditionals and loop exits.

use sable_ir::{Expr, NodeId, Stmt, Tree};

use super::{on_expression, on_statement, Outcome, StmtOutcome};
use crate::abort::ExitKind;
use crate::error::Result;
use crate::notify::ChangeTag;
use crate::scope::Scope;
use crate::state::AnalysisState;

/// How one arm of a conditional reaches the join point.
enum Arm {
    /// No statements: the path changes nothing.
    Absent,
    /// Control never reaches the join from this arm.
    Aborting,
    Reached(Scope),
}

pub(super) fn optimize_if(
    tree: &mut Tree,
    scope: &mut Scope,
    state: &mut AnalysisState<'_>,
    id: NodeId,
    cond: NodeId,
    yes: Option<NodeId>,
    no: Option<NodeId>,
) -> Result<StmtOutcome> {
    let cond = on_expression(tree, scope, state, cond)?;

    let folded = match tree.expr(cond) {
        Some(Expr::Constant(value)) => Some(value.is_truthy()),
        _ => None,
    };
    if let Some(truthy) = folded {
        let taken = if truthy { yes } else { no };
        let replacement = match taken {
            Some(branch) => on_statement(tree, scope, state, branch)?,
            None => None,
        };
        return Ok(Outcome::changed(
            replacement,
            ChangeTag::NewStatements,
            format!("Condition for branch statement was predicted to be always {truthy}."),
        ));
    }

    let (yes, yes_arm) = walk_arm(tree, scope, state, yes, "branch yes")?;
    let (no, no_arm) = walk_arm(tree, scope, state, no, "branch no")?;

    match (yes_arm, no_arm) {
        (Arm::Aborting, Arm::Aborting | Arm::Absent) | (Arm::Absent, Arm::Aborting) => {}
        (Arm::Aborting, Arm::Reached(only)) | (Arm::Reached(only), Arm::Aborting) => {
            scope.merge_n_branches(state, vec![only])?;
        }
        (yes_arm, no_arm) => {
            scope.merge_two_branches(state, yes_arm.into_scope(), no_arm.into_scope())?;
        }
    }

    if yes.is_none() && no.is_none() {
        let span = tree.span(id);
        let replacement = tree.push_stmt(Stmt::Expr { expr: cond }, span);
        return Ok(Outcome::changed(
            Some(replacement),
            ChangeTag::NewStatements,
            "Removed conditional statement without effect.",
        ));
    }

    if let Some(Stmt::If {
        cond: c,
        yes: y,
        no: n,
    }) = tree.stmt_mut(id)
    {
        *c = cond;
        *y = yes;
        *n = no;
    }
    Ok(Outcome::unchanged(Some(id)))
}

/// Walk one arm in a fork of `scope`.
fn walk_arm(
    tree: &mut Tree,
    scope: &Scope,
    state: &mut AnalysisState<'_>,
    arm: Option<NodeId>,
    label: &'static str,
) -> Result<(Option<NodeId>, Arm)> {
    let Some(arm) = arm else {
        return Ok((None, Arm::Absent));
    };

    let mut branch = scope.fork(label);
    let result = on_statement(tree, &mut branch, state, arm)?;
    let reach = match result {
        Some(node) if tree.is_aborting(node) => Arm::Aborting,
        _ => Arm::Reached(branch),
    };
    Ok((result, reach))
}

impl Arm {
    fn into_scope(self) -> Option<Scope> {
        match self {
            Arm::Reached(scope) => Some(scope),
            Arm::Absent | Arm::Aborting => None,
        }
    }
}

pub(super) fn optimize_break(
    scope: &mut Scope,
    state: &mut AnalysisState<'_>,
    id: NodeId,
) -> Result<StmtOutcome> {
    state.on_exit(ExitKind::Break, scope)?;
    Ok(Outcome::unchanged(Some(id)))
}

pub(super) fn optimize_continue(
    scope: &mut Scope,
    state: &mut AnalysisState<'_>,
    id: NodeId,
) -> Result<StmtOutcome> {
    state.on_exit(ExitKind::Continue, scope)?;
    Ok(Outcome::unchanged(Some(id)))
}
