//! Human-readable listings of the trace table and active maps.

use std::fmt::Write;

use crate::scope::Scope;
use crate::state::AnalysisState;
use crate::trace::TraceKey;

impl AnalysisState<'_> {
    /// List every `(variable, version) -> trace` pair, ordered by variable
    /// then version.
    pub fn dump_traces(&self) -> String {
        let mut out = String::from("Traces:\n");
        for trace in self.traces() {
            let _ = writeln!(
                out,
                "  {} ({}) v{}: {trace}",
                self.variables().name(trace.var()),
                trace.var().raw(),
                trace.version(),
            );
        }
        tracing::debug!("{out}");
        out
    }
}

impl Scope {
    /// List the versions active in this scope and the trace each resolves to.
    pub fn dump_active_traces(&self, state: &AnalysisState<'_>) -> String {
        let mut out = format!("Active traces ({}):\n", self.label());
        for (var, version) in self.active_versions() {
            let name = state.variables().name(var);
            match state.trace(TraceKey::new(var, version)) {
                Ok(trace) => {
                    let _ = writeln!(out, "  {name} v{version}: {trace}");
                }
                Err(_) => {
                    let _ = writeln!(out, "  {name} v{version}: <missing>");
                }
            }
        }
        tracing::debug!("{out}");
        out
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use sable_ir::{NodeId, VariableKind};

    use crate::test_helpers::Fixture;

    #[test]
    fn dump_lists_every_trace_in_order() {
        let mut fx = Fixture::new();
        let x = fx.variables.add("x", VariableKind::Local);
        let g = fx.variables.add("g", VariableKind::Module);
        fx.with_state(|state, scope| {
            scope.on_variable_assigned(state, x, NodeId::new(4))?;
            scope.current_version(state, g)?;

            assert_eq!(
                state.dump_traces(),
                "Traces:\n  x (0) v0: uninit\n  x (0) v1: assign by node 4 (prev 0)\n  g (1) v0: unknown\n"
            );
            assert_eq!(
                scope.dump_active_traces(state),
                "Active traces (test):\n  x v1: assign by node 4 (prev 0)\n  g v0: unknown\n"
            );
            Ok(())
        });
    }
}
