//! Shared analysis state of one root collection.
//!
//! A module or function body owns exactly one [`AnalysisState`] for the
//! duration of a pass. Every [`Scope`](crate::Scope) forked while walking
//! that body, however deeply nested, reads and writes the same state:
//!
//! - the **trace table**, an append-only map from `(variable, version)` to
//!   [`Trace`];
//! - the **exit registries** for break/continue/return snapshots (see
//!   [`abort`](crate::abort));
//! - the injected [`ChangeNotifier`] and [`FlowConfig`].
//!
//! Scopes hold only their active-version maps and receive the state as an
//! explicit `&mut` argument, so branch collections never own storage.

use rustc_hash::FxHashMap;
use sable_ir::{Span, VarId, VariableKind, VariableTable, Version};

use crate::abort::ExitRegistries;
use crate::config::FlowConfig;
use crate::error::{FlowError, Result};
use crate::notify::{ChangeNotifier, ChangeTag};
use crate::trace::{Trace, TraceKey, TraceKind};

pub struct AnalysisState<'u> {
    variables: &'u mut VariableTable,
    notifier: &'u mut dyn ChangeNotifier,
    config: FlowConfig,
    traces: FxHashMap<TraceKey, Trace>,
    pub(crate) exits: ExitRegistries,
    unclear_locals: bool,
}

impl<'u> AnalysisState<'u> {
    pub fn new(
        variables: &'u mut VariableTable,
        notifier: &'u mut dyn ChangeNotifier,
        config: FlowConfig,
    ) -> Self {
        Self {
            variables,
            notifier,
            config,
            traces: FxHashMap::default(),
            exits: ExitRegistries::default(),
            unclear_locals: false,
        }
    }

    pub fn config(&self) -> FlowConfig {
        self.config
    }

    pub fn variables(&self) -> &VariableTable {
        &*self.variables
    }

    // Trace table

    pub fn has_trace(&self, key: TraceKey) -> bool {
        self.traces.contains_key(&key)
    }

    /// Look up a recorded trace.
    pub fn trace(&self, key: TraceKey) -> Result<&Trace> {
        self.traces.get(&key).ok_or(FlowError::MissingTrace {
            var: key.var,
            version: key.version,
        })
    }

    fn trace_mut(&mut self, key: TraceKey) -> Result<&mut Trace> {
        self.traces.get_mut(&key).ok_or(FlowError::MissingTrace {
            var: key.var,
            version: key.version,
        })
    }

    /// Number of traces recorded so far.
    pub fn trace_count(&self) -> usize {
        self.traces.len()
    }

    /// All traces, ordered by variable then version.
    pub fn traces(&self) -> Vec<&Trace> {
        let mut all: Vec<&Trace> = self.traces.values().collect();
        all.sort_by_key(|t| t.key());
        all
    }

    /// Traces of one variable, ordered by version.
    pub fn traces_of(&self, var: VarId) -> Vec<&Trace> {
        let mut of_var: Vec<&Trace> = self.traces.values().filter(|t| t.var() == var).collect();
        of_var.sort_by_key(|t| t.version());
        of_var
    }

    /// Insert a trace. Inserting an existing key is a defect.
    pub(crate) fn add_trace(&mut self, trace: Trace) -> Result<TraceKey> {
        let key = trace.key();
        if self.traces.contains_key(&key) {
            return Err(FlowError::DuplicateTrace {
                var: key.var,
                version: key.version,
            });
        }
        tracing::trace!(
            var = self.variables.name(key.var),
            version = key.version.raw(),
            kind = %trace.kind(),
            "trace added"
        );
        self.traces.insert(key, trace);
        Ok(key)
    }

    /// Allocate the next version of `var` from the unit-wide counter.
    pub(crate) fn allocate_version(&mut self, var: VarId) -> Result<Version> {
        self.variables
            .allocate_next_version(var)
            .ok_or(FlowError::UnknownVariable(var))
    }

    /// Record the entry-state trace of `var` at [`Version::ENTRY`].
    ///
    /// The kind follows from the static classification alone.
    pub(crate) fn init_variable(&mut self, var: VarId) -> Result<TraceKey> {
        let kind = self
            .variables
            .get(var)
            .ok_or(FlowError::UnknownVariable(var))?
            .kind();
        let trace_kind = match kind {
            VariableKind::Parameter => TraceKind::Init,
            VariableKind::Local | VariableKind::Temporary => TraceKind::Uninit { previous: None },
            VariableKind::MaybeLocal { .. } | VariableKind::Module => {
                TraceKind::Unknown { previous: None }
            }
        };
        self.add_trace(Trace::new(TraceKey::new(var, Version::ENTRY), trace_kind))
    }

    // Annotations

    /// Count a read of exactly `key`.
    ///
    /// Reading an unknown or merged version may observe any value it was
    /// derived from, so every predecessor is marked as potentially used,
    /// transitively. Each trace propagates at most once.
    pub fn mark_usage(&mut self, key: TraceKey) -> Result<()> {
        let trace = self.trace_mut(key)?;
        trace.mark_usage();
        if !(trace.is_unknown() || trace.is_merge()) {
            return Ok(());
        }

        let mut worklist: Vec<Version> = trace.previous().into_vec();
        while let Some(version) = worklist.pop() {
            let trace = self.trace_mut(TraceKey::new(key.var, version))?;
            if trace.mark_potential_usage() && (trace.is_unknown() || trace.is_merge()) {
                worklist.extend(trace.previous());
            }
        }
        Ok(())
    }

    /// Record an explicit release of `key`.
    pub fn mark_release(&mut self, key: TraceKey) -> Result<()> {
        self.trace_mut(key)?.mark_release();
        Ok(())
    }

    /// Record that the value bound at `key` escaped.
    pub fn mark_escaped(&mut self, key: TraceKey) -> Result<()> {
        self.trace_mut(key)?.mark_escaped();
        Ok(())
    }

    // Value facts

    /// Whether the variable is bound on every path reaching `key`.
    pub fn must_have_value(&self, key: TraceKey) -> Result<bool> {
        let trace = self.trace(key)?;
        match trace.kind() {
            TraceKind::Init | TraceKind::Assign { .. } => Ok(true),
            TraceKind::Uninit { .. } | TraceKind::Unknown { .. } => Ok(false),
            TraceKind::Merge { sources } => {
                for &version in sources {
                    if !self.must_have_value(TraceKey::new(key.var, version))? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
        }
    }

    /// Whether the variable is unbound on every path reaching `key`.
    pub fn must_not_have_value(&self, key: TraceKey) -> Result<bool> {
        let trace = self.trace(key)?;
        match trace.kind() {
            TraceKind::Uninit { .. } => Ok(true),
            TraceKind::Init | TraceKind::Assign { .. } | TraceKind::Unknown { .. } => Ok(false),
            TraceKind::Merge { sources } => {
                for &version in sources {
                    if !self.must_not_have_value(TraceKey::new(key.var, version))? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
        }
    }

    // Unclear locals

    /// Local variables may be read or written by name at run time.
    pub fn assume_unclear_locals(&mut self) {
        self.unclear_locals = true;
    }

    pub fn has_unclear_locals(&self) -> bool {
        self.unclear_locals
    }

    // Notification

    /// Forward a change to the injected notifier.
    pub fn signal_change(&mut self, tag: ChangeTag, span: Span, message: &str) {
        tracing::debug!(tag = tag.as_str(), %span, message, "change");
        self.notifier.signal_change(tag, span, message);
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    reason = "tests use unwrap/expect to panic on unexpected state"
)]
