//! Exit-point registries for `break`, `continue` and `return`.
//!
//! A construct that absorbs early exits (a loop absorbs breaks and
//! continues, a function absorbs returns) installs fresh registries for the
//! kinds it catches with [`AnalysisState::track_aborts`]. Exit statements at
//! any depth below it append a snapshot of their scope to the innermost
//! registry of their kind. The returned [`AbortTracking`] guard puts the
//! enclosing construct's registries back when it is dropped, on the error
//! path as well as the normal one, so nested loops never leak exits into
//! an outer loop.

use std::fmt;
use std::ops::{Deref, DerefMut};

use smallvec::SmallVec;

use crate::error::{FlowError, Result};
use crate::scope::Scope;
use crate::state::AnalysisState;

/// Kind of early exit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ExitKind {
    Break,
    Continue,
    Return,
}

impl ExitKind {
    fn snapshot_label(self) -> &'static str {
        match self {
            ExitKind::Break => "loop break",
            ExitKind::Continue => "loop continue",
            ExitKind::Return => "return",
        }
    }
}

impl fmt::Display for ExitKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ExitKind::Break => "break",
            ExitKind::Continue => "continue",
            ExitKind::Return => "return",
        })
    }
}

/// Which exit kinds a tracking scope catches.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AbortCatch {
    pub breaks: bool,
    pub continues: bool,
    pub returns: bool,
}

impl AbortCatch {
    /// What a loop catches: its own breaks and continues.
    pub const LOOP: AbortCatch = AbortCatch {
        breaks: true,
        continues: true,
        returns: false,
    };

    /// What a function body catches.
    pub const FUNCTION: AbortCatch = AbortCatch {
        breaks: false,
        continues: false,
        returns: true,
    };

    pub fn catches(self, kind: ExitKind) -> bool {
        match kind {
            ExitKind::Break => self.breaks,
            ExitKind::Continue => self.continues,
            ExitKind::Return => self.returns,
        }
    }

    fn kinds(self) -> impl Iterator<Item = ExitKind> {
        [ExitKind::Break, ExitKind::Continue, ExitKind::Return]
            .into_iter()
            .filter(move |&kind| self.catches(kind))
    }
}

/// The currently active registry per exit kind. `None` means no enclosing
/// construct catches that kind.
#[derive(Debug, Default)]
pub(crate) struct ExitRegistries {
    breaks: Option<Vec<Scope>>,
    continues: Option<Vec<Scope>>,
    returns: Option<Vec<Scope>>,
}

impl ExitRegistries {
    fn slot(&self, kind: ExitKind) -> &Option<Vec<Scope>> {
        match kind {
            ExitKind::Break => &self.breaks,
            ExitKind::Continue => &self.continues,
            ExitKind::Return => &self.returns,
        }
    }

    fn slot_mut(&mut self, kind: ExitKind) -> &mut Option<Vec<Scope>> {
        match kind {
            ExitKind::Break => &mut self.breaks,
            ExitKind::Continue => &mut self.continues,
            ExitKind::Return => &mut self.returns,
        }
    }
}

impl<'u> AnalysisState<'u> {
    /// Install fresh registries for the kinds in `catch`.
    ///
    /// The previous registries come back when the guard drops.
    pub fn track_aborts(&mut self, catch: AbortCatch) -> AbortTracking<'_, 'u> {
        let mut saved = SmallVec::new();
        for kind in catch.kinds() {
            let previous = self.exits.slot_mut(kind).replace(Vec::new());
            saved.push((kind, previous));
        }
        tracing::trace!(?catch, "abort tracking entered");
        AbortTracking { state: self, saved }
    }

    /// Record an exit of `kind` taken from `scope`.
    ///
    /// A `return` outside any function registry is ignored; module-level
    /// code has nowhere to return to that the optimizer tracks. A `break` or
    /// `continue` outside a loop is an optimizer defect.
    pub fn on_exit(&mut self, kind: ExitKind, scope: &Scope) -> Result<()> {
        match self.exits.slot_mut(kind) {
            Some(registry) => {
                registry.push(scope.fork(kind.snapshot_label()));
                Ok(())
            }
            None if kind == ExitKind::Return => Ok(()),
            None => Err(FlowError::ExitOutsideTracking { kind }),
        }
    }

    /// Snapshots collected so far by the innermost registry of `kind`.
    pub fn exits(&self, kind: ExitKind) -> Option<&[Scope]> {
        self.exits.slot(kind).as_deref()
    }
}

/// Guard returned by [`AnalysisState::track_aborts`].
///
/// Dereferences to the state so the tracked region is walked through it.
pub struct AbortTracking<'s, 'u> {
    state: &'s mut AnalysisState<'u>,
    saved: SmallVec<[(ExitKind, Option<Vec<Scope>>); 3]>,
}

impl AbortTracking<'_, '_> {
    /// Take the snapshots this guard collected for `kind`.
    ///
    /// Returns nothing for kinds this guard does not catch, so an outer
    /// construct's exits are never stolen.
    pub fn take_exits(&mut self, kind: ExitKind) -> Vec<Scope> {
        if !self.saved.iter().any(|(k, _)| *k == kind) {
            return Vec::new();
        }
        self.state
            .exits
            .slot_mut(kind)
            .as_mut()
            .map(std::mem::take)
            .unwrap_or_default()
    }
}

impl<'u> Deref for AbortTracking<'_, 'u> {
    type Target = AnalysisState<'u>;

    fn deref(&self) -> &Self::Target {
        &*self.state
    }
}

impl DerefMut for AbortTracking<'_, '_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut *self.state
    }
}

impl Drop for AbortTracking<'_, '_> {
    fn drop(&mut self) {
        for (kind, previous) in self.saved.drain(..).rev() {
            *self.state.exits.slot_mut(kind) = previous;
        }
        tracing::trace!("abort tracking restored");
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    reason = "tests use unwrap/expect to panic on unexpected state"
)]
