//! Value-trace dataflow core of the Sable optimizer.
//!
//! This crate provides:
//!
//! - **Traces** ([`Trace`], [`TraceKind`], [`TraceKey`]): one immutable
//!   fact per `(variable, version)`: unbound, bound on entry, unknown, bound
//!   by a specific assignment, or the join of several versions.
//!
//! - **Shared state** ([`AnalysisState`]): the append-only trace table and
//!   the exit registries of one module or function body, plus the injected
//!   [`ChangeNotifier`] and [`FlowConfig`].
//!
//! - **Scopes** ([`Scope`]): the active version of each variable at the
//!   walk's position. Control-flow arms fork scopes and join them again
//!   with [`Scope::merge_two_branches`] / [`Scope::merge_n_branches`].
//!
//! - **Abort tracking** ([`AbortTracking`]): scoped registries that route
//!   `break`, `continue` and `return` snapshots to the construct absorbing
//!   them, restored on every exit path.
//!
//! - **Rewriting** ([`on_statement`], [`on_expression`]): each node
//!   optimizes itself against the current scope and may be replaced or
//!   deleted. Every rewrite reports one change to the notifier; a driver
//!   re-runs [`RootCollection::optimize_body`] until a pass reports none.
//!
//! # Ownership
//!
//! A [`RootCollection`] owns the [`AnalysisState`] and borrows the
//! compilation unit's [`VariableTable`](sable_ir::VariableTable) (whose
//! version counters outlive a single pass) and the notifier. Scopes never
//! own storage: every operation that touches traces takes the state as an
//! explicit `&mut` argument.

mod abort;
mod config;
mod dump;
mod error;
mod merge;
mod notify;
mod optimize;
mod root;
mod scope;
mod state;
mod trace;

#[cfg(test)]
mod test_helpers;

use std::sync::Once;

pub use abort::{AbortCatch, AbortTracking, ExitKind};
pub use config::FlowConfig;
pub use error::{FlowError, Result};
pub use notify::{ChangeEntry, ChangeLog, ChangeNotifier, ChangeTag};
pub use optimize::{on_expression, on_statement, Change, ExprOutcome, Outcome, StmtOutcome};
pub use root::{RootCollection, RootKind};
pub use scope::Scope;
pub use state::AnalysisState;
pub use trace::{Trace, TraceKey, TraceKind, Versions};

static TRACING_INIT: Once = Once::new();

/// Install a `tracing` subscriber filtered by `RUST_LOG`.
///
/// Does nothing unless `RUST_LOG` is set. Safe to call more than once.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, prelude::*, EnvFilter};

        if std::env::var("RUST_LOG").is_ok() {
            let filter = EnvFilter::from_default_env();
            let _ = tracing_subscriber::registry()
                .with(fmt::layer().with_target(true).with_level(true))
                .with(filter)
                .try_init();
        }
    });
}
