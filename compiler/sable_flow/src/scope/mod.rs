//! Analysis scopes and the read/write protocol.
//!
//! A [`Scope`] is the walk's view of "which version of each variable is
//! current here". The root scope of a module or function and every branch
//! forked from it (condition arms, loop bodies, exit snapshots) are the same
//! type; a branch is simply a copy of its parent's map taken at the fork.
//! All storage lives in the shared [`AnalysisState`].
//!
//! Variables enter a scope lazily: the first time a variable is looked up,
//! its entry-state trace is materialized at [`Version::ENTRY`] if the table
//! does not have one yet, and the scope records it as active.

use rustc_hash::FxHashMap;
use sable_ir::{NodeId, VarId, Version};

use crate::error::{FlowError, Result};
use crate::state::AnalysisState;
use crate::trace::{Trace, TraceKey, TraceKind};

/// Active version per variable at the walk's current position.
#[derive(Clone, Debug)]
pub struct Scope {
    label: &'static str,
    pub(crate) actives: FxHashMap<VarId, Version>,
}

impl Scope {
    /// An empty root scope.
    pub fn new(label: &'static str) -> Self {
        Self {
            label,
            actives: FxHashMap::default(),
        }
    }

    /// Branch off a child scope starting from this scope's versions.
    pub fn fork(&self, label: &'static str) -> Self {
        Self {
            label,
            actives: self.actives.clone(),
        }
    }

    pub fn label(&self) -> &'static str {
        self.label
    }

    /// Active version of `var` without materializing anything.
    pub fn active_version(&self, var: VarId) -> Option<Version> {
        self.actives.get(&var).copied()
    }

    /// Variables with an active version, in id order.
    pub fn active_variables(&self) -> Vec<VarId> {
        let mut vars: Vec<VarId> = self.actives.keys().copied().collect();
        vars.sort_unstable();
        vars
    }

    /// Active `(variable, version)` pairs, in variable order.
    pub fn active_versions(&self) -> Vec<(VarId, Version)> {
        let mut pairs: Vec<(VarId, Version)> =
            self.actives.iter().map(|(&v, &ver)| (v, ver)).collect();
        pairs.sort_unstable();
        pairs
    }

    pub(crate) fn mark_current(&mut self, var: VarId, version: Version) {
        self.actives.insert(var, version);
    }

    // Reads

    /// Version of `var` active in this scope, materializing the entry
    /// state on first observation.
    pub fn current_version(&mut self, state: &mut AnalysisState<'_>, var: VarId) -> Result<Version> {
        if let Some(&version) = self.actives.get(&var) {
            return Ok(version);
        }
        if !state.has_trace(TraceKey::new(var, Version::ENTRY)) {
            state.init_variable(var)?;
        }
        self.actives.insert(var, Version::ENTRY);
        Ok(Version::ENTRY)
    }

    /// Key of the trace currently active for `var`.
    pub fn current_key(&mut self, state: &mut AnalysisState<'_>, var: VarId) -> Result<TraceKey> {
        let version = self.current_version(state, var)?;
        Ok(TraceKey::new(var, version))
    }

    /// Trace currently active for `var`.
    ///
    /// A version missing from the table is an optimizer defect.
    pub fn current_trace<'s>(
        &mut self,
        state: &'s mut AnalysisState<'_>,
        var: VarId,
    ) -> Result<&'s Trace> {
        let key = self.current_key(state, var)?;
        state.trace(key)
    }

    // Writes

    /// Record that `node` assigned `var`.
    ///
    /// Allocates the next version, stores an `Assign` trace chained to the
    /// previously current version, and makes it current.
    pub fn on_variable_assigned(
        &mut self,
        state: &mut AnalysisState<'_>,
        var: VarId,
        node: NodeId,
    ) -> Result<TraceKey> {
        let previous = self.current_version(state, var)?;
        let version = state.allocate_version(var)?;
        let key = state.add_trace(Trace::new(
            TraceKey::new(var, version),
            TraceKind::Assign { node, previous },
        ))?;
        self.mark_current(var, version);
        Ok(key)
    }

    /// Record a delete of `var`.
    ///
    /// Installs a new `Uninit` version chained to the previous one and
    /// returns the key of the trace current *before* the delete, which tells
    /// the caller whether the delete is statically known to fail.
    pub fn on_variable_deleted(
        &mut self,
        state: &mut AnalysisState<'_>,
        var: VarId,
    ) -> Result<TraceKey> {
        let prior = self.current_key(state, var)?;
        let version = state.allocate_version(var)?;
        state.add_trace(Trace::new(
            TraceKey::new(var, version),
            TraceKind::Uninit {
                previous: Some(prior.version),
            },
        ))?;
        self.mark_current(var, version);
        Ok(prior)
    }

    /// Mark the current trace of `var` as released.
    pub fn on_variable_released(
        &mut self,
        state: &mut AnalysisState<'_>,
        var: VarId,
    ) -> Result<TraceKey> {
        let key = self.current_key(state, var)?;
        state.mark_release(key)?;
        Ok(key)
    }

    /// Mark the value currently bound to `var` as escaped.
    pub fn on_variable_content_escapes(
        &mut self,
        state: &mut AnalysisState<'_>,
        var: VarId,
    ) -> Result<()> {
        let key = self.current_key(state, var)?;
        state.mark_escaped(key)
    }

    // Escapes

    /// Force `var` to `Unknown` through a new version.
    ///
    /// The old trace stays in the table untouched.
    pub fn mark_unknown(&mut self, state: &mut AnalysisState<'_>, var: VarId) -> Result<Version> {
        let previous = self.current_version(state, var)?;
        let version = state.allocate_version(var)?;
        state.add_trace(Trace::new(
            TraceKey::new(var, version),
            TraceKind::Unknown {
                previous: Some(previous),
            },
        ))?;
        self.mark_current(var, version);
        Ok(version)
    }

    /// Degrade every variable that may be rebound from outside the normal
    /// flow: module variables always, closure-shared variables when the
    /// target semantics say so.
    pub fn escape_all_active_variables(&mut self, state: &mut AnalysisState<'_>) -> Result<()> {
        let escape_shared = state.config().escape_shared_variables;
        let mut escaped = 0usize;

        for var in self.active_variables() {
            let variable = state
                .variables()
                .get(var)
                .ok_or(FlowError::UnknownVariable(var))?;
            if variable.is_module() || (escape_shared && variable.is_shared()) {
                self.mark_unknown(state, var)?;
                escaped += 1;
            }
        }

        tracing::debug!(scope = self.label, escaped, "control flow escape");
        Ok(())
    }

    /// Degrade each variable in `written` to `Unknown`.
    ///
    /// Used before walking a loop body: a later iteration may observe a
    /// write that an earlier one would otherwise be taken as fact for.
    pub fn degrade_written(&mut self, state: &mut AnalysisState<'_>, written: &[VarId]) -> Result<()> {
        for &var in written {
            self.mark_unknown(state, var)?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    reason = "tests use unwrap/expect to panic on unexpected state"
)]
