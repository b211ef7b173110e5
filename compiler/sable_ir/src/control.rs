//! Static abort queries.
//!
//! These answer, from the tree shape alone, whether control can leave a
//! statement through `break`, `continue` or `return`, and whether it can
//! fall through past it at all. Expressions never abort in this sense.

use crate::node::Stmt;
use crate::{NodeId, Tree};

impl Tree {
    /// Whether `id` may break out of the innermost enclosing loop.
    ///
    /// A loop never breaks an outer loop: its own breaks are absorbed.
    pub fn may_break(&self, id: NodeId) -> bool {
        match self.stmt(id) {
            Some(Stmt::Break) => true,
            Some(Stmt::Sequence { stmts }) => stmts.iter().any(|&s| self.may_break(s)),
            Some(Stmt::If { yes, no, .. }) => {
                yes.is_some_and(|s| self.may_break(s)) || no.is_some_and(|s| self.may_break(s))
            }
            Some(
                Stmt::Loop { .. }
                | Stmt::Assign { .. }
                | Stmt::Delete { .. }
                | Stmt::Release { .. }
                | Stmt::Expr { .. }
                | Stmt::Continue
                | Stmt::Return { .. },
            )
            | None => false,
        }
    }

    /// Whether `id` may continue the innermost enclosing loop.
    pub fn may_continue(&self, id: NodeId) -> bool {
        match self.stmt(id) {
            Some(Stmt::Continue) => true,
            Some(Stmt::Sequence { stmts }) => stmts.iter().any(|&s| self.may_continue(s)),
            Some(Stmt::If { yes, no, .. }) => {
                yes.is_some_and(|s| self.may_continue(s))
                    || no.is_some_and(|s| self.may_continue(s))
            }
            Some(
                Stmt::Loop { .. }
                | Stmt::Assign { .. }
                | Stmt::Delete { .. }
                | Stmt::Release { .. }
                | Stmt::Expr { .. }
                | Stmt::Break
                | Stmt::Return { .. },
            )
            | None => false,
        }
    }

    /// Whether `id` may return from the enclosing function.
    pub fn may_return(&self, id: NodeId) -> bool {
        match self.stmt(id) {
            Some(Stmt::Return { .. }) => true,
            Some(Stmt::Sequence { stmts }) => stmts.iter().any(|&s| self.may_return(s)),
            Some(Stmt::If { yes, no, .. }) => {
                yes.is_some_and(|s| self.may_return(s)) || no.is_some_and(|s| self.may_return(s))
            }
            Some(Stmt::Loop { body }) => body.is_some_and(|b| self.may_return(b)),
            Some(
                Stmt::Assign { .. }
                | Stmt::Delete { .. }
                | Stmt::Release { .. }
                | Stmt::Expr { .. }
                | Stmt::Break
                | Stmt::Continue,
            )
            | None => false,
        }
    }

    /// Whether control can never fall through past `id`.
    pub fn is_aborting(&self, id: NodeId) -> bool {
        match self.stmt(id) {
            Some(Stmt::Break | Stmt::Continue | Stmt::Return { .. }) => true,
            Some(Stmt::Sequence { stmts }) => stmts.iter().any(|&s| self.is_aborting(s)),
            Some(Stmt::If { yes, no, .. }) => match (yes, no) {
                (Some(yes), Some(no)) => self.is_aborting(*yes) && self.is_aborting(*no),
                _ => false,
            },
            // The only fall-through exit of a loop is a break.
            Some(Stmt::Loop { body }) => !body.is_some_and(|b| self.may_break(b)),
            Some(
                Stmt::Assign { .. } | Stmt::Delete { .. } | Stmt::Release { .. } | Stmt::Expr { .. },
            )
            | None => false,
        }
    }
}
