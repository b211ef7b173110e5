//! Shared test utilities: a fixture owning everything a root collection
//! borrows, plus tree builders. Only compiled in test builds.

use sable_ir::{Constant, Expr, NodeId, Span, Stmt, Tree, VarId, VariableKind, VariableTable};

use crate::config::FlowConfig;
use crate::error::Result;
use crate::notify::ChangeLog;
use crate::root::{RootCollection, RootKind};
use crate::scope::Scope;
use crate::state::AnalysisState;

pub(crate) struct Fixture {
    pub variables: VariableTable,
    pub tree: Tree,
    pub log: ChangeLog,
    pub config: FlowConfig,
}

impl Fixture {
    pub fn new() -> Self {
        Self {
            variables: VariableTable::new(),
            tree: Tree::new(),
            log: ChangeLog::new(),
            config: FlowConfig::default(),
        }
    }

    /// Run `f` against a fresh state and an empty scope labelled `test`.
    pub fn with_state<R>(
        &mut self,
        f: impl FnOnce(&mut AnalysisState<'_>, &mut Scope) -> Result<R>,
    ) -> R {
        let mut state = AnalysisState::new(&mut self.variables, &mut self.log, self.config);
        let mut scope = Scope::new("test");
        match f(&mut state, &mut scope) {
            Ok(value) => value,
            Err(err) => panic!("analysis failed: {err}"),
        }
    }

    /// Build a root collection of `kind` and hand it the tree.
    pub fn with_root<R>(
        &mut self,
        kind: RootKind,
        f: impl FnOnce(&mut RootCollection<'_>, &mut Tree) -> Result<R>,
    ) -> Result<R> {
        let mut root = match kind {
            RootKind::Module => {
                RootCollection::module(&mut self.variables, &mut self.log, self.config)
            }
            RootKind::Function => {
                RootCollection::function(&mut self.variables, &mut self.log, self.config)
            }
        };
        f(&mut root, &mut self.tree)
    }

    /// Change messages recorded so far.
    pub fn messages(&self) -> Vec<&str> {
        self.log.entries().iter().map(|e| e.message.as_str()).collect()
    }

    pub fn local(&mut self, name: &str) -> VarId {
        self.variables.add(name, VariableKind::Local)
    }

    pub fn param(&mut self, name: &str) -> VarId {
        self.variables.add(name, VariableKind::Parameter)
    }

    pub fn module_var(&mut self, name: &str) -> VarId {
        self.variables.add(name, VariableKind::Module)
    }

    // Tree builders. Each node gets its own one-byte span at its arena
    // index so errors and notifications can be traced back to a node.

    fn next_span(&self) -> Span {
        #[expect(
            clippy::cast_possible_truncation,
            reason = "test trees stay far below u32::MAX nodes"
        )]
        let at = self.tree.len() as u32;
        Span::new(at, at + 1)
    }

    pub fn stmt(&mut self, stmt: Stmt) -> NodeId {
        let span = self.next_span();
        self.tree.push_stmt(stmt, span)
    }

    pub fn expr(&mut self, expr: Expr) -> NodeId {
        let span = self.next_span();
        self.tree.push_expr(expr, span)
    }

    pub fn int(&mut self, value: i64) -> NodeId {
        self.expr(Expr::Constant(Constant::Int(value)))
    }

    pub fn read(&mut self, var: VarId) -> NodeId {
        self.expr(Expr::VarRef { var, version: None })
    }

    pub fn builtin(&mut self, name: &str) -> NodeId {
        self.expr(Expr::Builtin {
            name: name.to_owned(),
        })
    }

    pub fn call(&mut self, callee: NodeId, args: Vec<NodeId>) -> NodeId {
        self.expr(Expr::Call { callee, args })
    }

    pub fn seq(&mut self, stmts: Vec<NodeId>) -> NodeId {
        self.stmt(Stmt::Sequence { stmts })
    }

    pub fn assign(&mut self, target: VarId, value: i64) -> NodeId {
        let value = self.int(value);
        self.assign_expr(target, value)
    }

    pub fn assign_expr(&mut self, target: VarId, value: NodeId) -> NodeId {
        self.stmt(Stmt::Assign {
            target,
            value,
            version: None,
        })
    }

    pub fn delete(&mut self, target: VarId, tolerant: bool) -> NodeId {
        self.stmt(Stmt::Delete {
            target,
            tolerant,
            version: None,
        })
    }

    pub fn expr_stmt(&mut self, expr: NodeId) -> NodeId {
        self.stmt(Stmt::Expr { expr })
    }

    pub fn if_(&mut self, cond: NodeId, yes: Option<NodeId>, no: Option<NodeId>) -> NodeId {
        self.stmt(Stmt::If { cond, yes, no })
    }

    pub fn loop_(&mut self, body: Option<NodeId>) -> NodeId {
        self.stmt(Stmt::Loop { body })
    }

    pub fn brk(&mut self) -> NodeId {
        self.stmt(Stmt::Break)
    }

    pub fn cont(&mut self) -> NodeId {
        self.stmt(Stmt::Continue)
    }

    pub fn ret(&mut self, value: Option<NodeId>) -> NodeId {
        self.stmt(Stmt::Return { value })
    }
}
