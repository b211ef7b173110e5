//! Control-flow join of scopes.
//!
//! At a join point the active maps of every incoming path are reconciled
//! into the scope that continues the walk.
//!
//! # Algorithm
//!
//! For each variable active in at least one input, collect the set of
//! versions it holds across all inputs. An input where the variable is not
//! active contributes [`Version::ENTRY`]: it never observed the variable,
//! so it still holds the entry state.
//!
//! - One distinct version: adopt it. Nothing was lost, no trace is created.
//! - Several: allocate a new version holding a `Merge` trace over the set.
//!
//! The version set is deduplicated by value and sorted, so the result does
//! not depend on the order of the inputs. Variables are processed in id
//! order, which keeps version allocation deterministic.
//!
//! Input scopes are taken by value: once folded they are gone.

use rustc_hash::FxHashMap;
use sable_ir::{VarId, Version};

use crate::error::{FlowError, Result};
use crate::scope::Scope;
use crate::state::AnalysisState;
use crate::trace::{Trace, TraceKey, Versions};

impl Scope {
    /// Join the two arms of a conditional into this scope.
    ///
    /// An absent arm means "that path changed nothing", so a single present
    /// arm is merged against this scope's own state.
    pub fn merge_two_branches(
        &mut self,
        state: &mut AnalysisState<'_>,
        yes: Option<Scope>,
        no: Option<Scope>,
    ) -> Result<()> {
        match (yes, no) {
            (None, None) => Ok(()),
            (Some(branch), None) | (None, Some(branch)) => {
                let own = self.fork("merge");
                self.merge_n_branches(state, vec![own, branch])
            }
            (Some(yes), Some(no)) => self.merge_n_branches(state, vec![yes, no]),
        }
    }

    /// Join any number of incoming paths into this scope.
    pub fn merge_n_branches(
        &mut self,
        state: &mut AnalysisState<'_>,
        branches: Vec<Scope>,
    ) -> Result<()> {
        match branches.len() {
            0 => return Err(FlowError::EmptyMerge),
            1 => {
                // Nothing to reconcile.
                for branch in branches {
                    self.replace_branch(branch);
                }
                return Ok(());
            }
            _ => {}
        }

        let mut versions: FxHashMap<VarId, Versions> = FxHashMap::default();
        for branch in &branches {
            for (&var, &version) in &branch.actives {
                let seen = versions.entry(var).or_default();
                if !seen.contains(&version) {
                    seen.push(version);
                }
            }
        }
        for branch in &branches {
            for (var, seen) in &mut versions {
                if !branch.actives.contains_key(var) && !seen.contains(&Version::ENTRY) {
                    seen.push(Version::ENTRY);
                }
            }
        }

        let mut joined: Vec<(VarId, Versions)> = versions.into_iter().collect();
        joined.sort_unstable_by_key(|(var, _)| *var);

        let mut merged = 0usize;
        self.actives.clear();
        for (var, mut seen) in joined {
            let version = if seen.len() == 1 {
                seen[0]
            } else {
                seen.sort_unstable();
                for &source in &seen {
                    state.trace(TraceKey::new(var, source))?;
                }
                let version = state.allocate_version(var)?;
                state.add_trace(Trace::merge(TraceKey::new(var, version), seen))?;
                merged += 1;
                version
            };
            self.mark_current(var, version);
        }

        tracing::debug!(
            scope = self.label(),
            inputs = branches.len(),
            merged,
            "branches merged"
        );
        Ok(())
    }

    /// Adopt `branch`'s versions wholesale.
    fn replace_branch(&mut self, branch: Scope) {
        self.actives.extend(branch.actives);
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    reason = "tests use unwrap/expect to panic on unexpected state"
)]
