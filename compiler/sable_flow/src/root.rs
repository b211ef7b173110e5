//! Root collections: the analysis of one module or function body.

use sable_ir::{NodeId, Tree, VariableTable};

use crate::abort::{AbortCatch, ExitKind};
use crate::config::FlowConfig;
use crate::error::Result;
use crate::notify::ChangeNotifier;
use crate::optimize::on_statement;
use crate::scope::Scope;
use crate::state::AnalysisState;

/// What kind of body a root collection analyses.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RootKind {
    Module,
    Function,
}

/// Owner of the shared state for one body, plus the body's top scope.
pub struct RootCollection<'u> {
    kind: RootKind,
    state: AnalysisState<'u>,
    scope: Scope,
}

impl<'u> RootCollection<'u> {
    pub fn module(
        variables: &'u mut VariableTable,
        notifier: &'u mut dyn ChangeNotifier,
        config: FlowConfig,
    ) -> Self {
        Self::new(RootKind::Module, variables, notifier, config)
    }

    pub fn function(
        variables: &'u mut VariableTable,
        notifier: &'u mut dyn ChangeNotifier,
        config: FlowConfig,
    ) -> Self {
        Self::new(RootKind::Function, variables, notifier, config)
    }

    fn new(
        kind: RootKind,
        variables: &'u mut VariableTable,
        notifier: &'u mut dyn ChangeNotifier,
        config: FlowConfig,
    ) -> Self {
        let label = match kind {
            RootKind::Module => "module",
            RootKind::Function => "function",
        };
        Self {
            kind,
            state: AnalysisState::new(variables, notifier, config),
            scope: Scope::new(label),
        }
    }

    pub fn kind(&self) -> RootKind {
        self.kind
    }

    pub fn state(&self) -> &AnalysisState<'u> {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut AnalysisState<'u> {
        &mut self.state
    }

    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    /// Run one optimization pass over `body`.
    ///
    /// Returns the statement that replaces `body`, or `None` if the whole
    /// body was removed. For a function, the root scope afterwards holds the
    /// join of every `return` and of the fall-through path.
    pub fn optimize_body(&mut self, tree: &mut Tree, body: NodeId) -> Result<Option<NodeId>> {
        tracing::debug!(kind = ?self.kind, span = %tree.span(body), "optimizing body");

        match self.kind {
            RootKind::Module => on_statement(tree, &mut self.scope, &mut self.state, body),
            RootKind::Function => {
                let (result, mut exits) = {
                    let mut tracked = self.state.track_aborts(AbortCatch::FUNCTION);
                    let result = on_statement(tree, &mut self.scope, &mut tracked, body)?;
                    (result, tracked.take_exits(ExitKind::Return))
                };

                let falls_through = !result.is_some_and(|body| tree.is_aborting(body));
                if falls_through {
                    exits.push(self.scope.fork("fall through"));
                }
                if !exits.is_empty() {
                    self.scope.merge_n_branches(&mut self.state, exits)?;
                }
                Ok(result)
            }
        }
    }

    /// Every recorded trace, see [`AnalysisState::dump_traces`].
    pub fn dump_traces(&self) -> String {
        self.state.dump_traces()
    }

    /// The root scope's active versions, see [`Scope::dump_active_traces`].
    pub fn dump_active_traces(&self) -> String {
        self.scope.dump_active_traces(&self.state)
    }
}
