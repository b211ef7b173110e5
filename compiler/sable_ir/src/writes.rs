//! Syntactic write extraction.

use rustc_hash::FxHashSet;

use crate::node::Stmt;
use crate::{NodeId, Tree, VarId};

impl Tree {
    /// Every variable that an assignment or delete anywhere under `root`
    /// can write, in order of first appearance.
    ///
    /// This is a scan of the tree shape, not a dataflow fact: writes in
    /// branches that never execute are included, and nested loops are
    /// searched too.
    pub fn variables_written(&self, root: NodeId) -> Vec<VarId> {
        let mut seen = FxHashSet::default();
        let mut written = Vec::new();
        let mut stack = vec![root];

        while let Some(id) = stack.pop() {
            let Some(stmt) = self.stmt(id) else {
                continue;
            };
            match stmt {
                Stmt::Assign { target, .. } | Stmt::Delete { target, .. } => {
                    if seen.insert(*target) {
                        written.push(*target);
                    }
                }
                Stmt::Sequence { stmts } => stack.extend(stmts.iter().rev()),
                Stmt::If { yes, no, .. } => {
                    // Push `no` first so `yes` is visited first.
                    stack.extend(no.iter());
                    stack.extend(yes.iter());
                }
                Stmt::Loop { body } => stack.extend(body.iter()),
                Stmt::Release { .. }
                | Stmt::Expr { .. }
                | Stmt::Break
                | Stmt::Continue
                | Stmt::Return { .. } => {}
            }
        }

        written
    }
}
