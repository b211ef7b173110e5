//! Value traces.
//!
//! A [`Trace`] is one fact about one variable at one version: "`x` at
//! version 3 was bound by this assignment", "`y` at version 5 is one of
//! versions 2 or 4". Traces form a persistent log: once stored in the
//! [`AnalysisState`](crate::AnalysisState) table a trace's kind never
//! changes. Only the usage annotations grow, and only by appending.
//!
//! Predecessors are referenced by version, not by pointer. The owning
//! variable is the same for every predecessor, so `(trace.var(), version)`
//! is the predecessor's table key.

use std::fmt;

use sable_ir::{NodeId, VarId, Version};
use smallvec::SmallVec;

/// Table key of a trace.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TraceKey {
    pub var: VarId,
    pub version: Version,
}

impl TraceKey {
    #[inline]
    pub const fn new(var: VarId, version: Version) -> Self {
        Self { var, version }
    }
}

/// Predecessor versions of a trace.
pub type Versions = SmallVec<[Version; 2]>;

/// What a trace knows about its version.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TraceKind {
    /// Definitely unbound: entry state of locals and temporaries, or the
    /// state after a delete.
    Uninit { previous: Option<Version> },
    /// Definitely bound on entry, e.g. a parameter.
    Init,
    /// Nothing is trusted. Entry state of module and maybe-local variables,
    /// and the result of an escape or loop degradation.
    Unknown { previous: Option<Version> },
    /// Bound by one specific assignment node.
    Assign { node: NodeId, previous: Version },
    /// Join of two or more versions at a control-flow merge. `sources` is a
    /// set: sorted and free of duplicates.
    Merge { sources: Versions },
}

impl fmt::Display for TraceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TraceKind::Uninit { previous: None } => write!(f, "uninit"),
            TraceKind::Uninit {
                previous: Some(prev),
            } => write!(f, "uninit (deleted, prev {prev})"),
            TraceKind::Init => write!(f, "init"),
            TraceKind::Unknown { previous: None } => write!(f, "unknown"),
            TraceKind::Unknown {
                previous: Some(prev),
            } => write!(f, "unknown (prev {prev})"),
            TraceKind::Assign { node, previous } => {
                write!(f, "assign by node {} (prev {previous})", node.raw())
            }
            TraceKind::Merge { sources } => {
                write!(f, "merge of ")?;
                for (i, version) in sources.iter().enumerate() {
                    if i > 0 {
                        write!(f, " <-> ")?;
                    }
                    write!(f, "{version}")?;
                }
                Ok(())
            }
        }
    }
}

/// One `(variable, version)` value-state plus its usage annotations.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Trace {
    key: TraceKey,
    kind: TraceKind,
    usage_count: u32,
    potential_usages: bool,
    released: bool,
    escaped: bool,
}

impl Trace {
    pub(crate) fn new(key: TraceKey, kind: TraceKind) -> Self {
        Self {
            key,
            kind,
            usage_count: 0,
            potential_usages: false,
            released: false,
            escaped: false,
        }
    }

    /// Build a merge trace, normalizing `sources` into a sorted set.
    pub(crate) fn merge(key: TraceKey, sources: impl IntoIterator<Item = Version>) -> Self {
        let mut sources: Versions = sources.into_iter().collect();
        sources.sort_unstable();
        sources.dedup();
        Self::new(key, TraceKind::Merge { sources })
    }

    #[inline]
    pub fn key(&self) -> TraceKey {
        self.key
    }

    #[inline]
    pub fn var(&self) -> VarId {
        self.key.var
    }

    #[inline]
    pub fn version(&self) -> Version {
        self.key.version
    }

    #[inline]
    pub fn kind(&self) -> &TraceKind {
        &self.kind
    }

    pub fn is_uninit(&self) -> bool {
        matches!(self.kind, TraceKind::Uninit { .. })
    }

    pub fn is_init(&self) -> bool {
        matches!(self.kind, TraceKind::Init)
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self.kind, TraceKind::Unknown { .. })
    }

    pub fn is_assign(&self) -> bool {
        matches!(self.kind, TraceKind::Assign { .. })
    }

    pub fn is_merge(&self) -> bool {
        matches!(self.kind, TraceKind::Merge { .. })
    }

    /// The assignment node that produced this trace, if any.
    pub fn assign_node(&self) -> Option<NodeId> {
        match self.kind {
            TraceKind::Assign { node, .. } => Some(node),
            _ => None,
        }
    }

    /// Versions this trace was derived from.
    pub fn previous(&self) -> Versions {
        match &self.kind {
            TraceKind::Init => Versions::new(),
            TraceKind::Uninit { previous } | TraceKind::Unknown { previous } => {
                previous.iter().copied().collect()
            }
            TraceKind::Assign { previous, .. } => smallvec::smallvec![*previous],
            TraceKind::Merge { sources } => sources.clone(),
        }
    }

    /// Number of reads resolved to exactly this version.
    pub fn usage_count(&self) -> u32 {
        self.usage_count
    }

    pub fn has_definite_usages(&self) -> bool {
        self.usage_count > 0
    }

    /// Whether a read of a later unknown or merged version may observe this
    /// value.
    pub fn has_potential_usages(&self) -> bool {
        self.potential_usages
    }

    /// Whether this version was explicitly released.
    pub fn is_released(&self) -> bool {
        self.released
    }

    /// Whether the bound value escaped to code the optimizer cannot see.
    pub fn is_escaped(&self) -> bool {
        self.escaped
    }

    pub(crate) fn mark_usage(&mut self) {
        self.usage_count += 1;
    }

    /// Returns `true` if the flag was newly set.
    pub(crate) fn mark_potential_usage(&mut self) -> bool {
        !std::mem::replace(&mut self.potential_usages, true)
    }

    pub(crate) fn mark_release(&mut self) {
        self.released = true;
    }

    pub(crate) fn mark_escaped(&mut self) {
        self.escaped = true;
    }
}

impl fmt::Display for Trace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)?;
        if self.usage_count > 0 {
            write!(f, ", {} usages", self.usage_count)?;
        }
        if self.potential_usages {
            write!(f, ", potentially used")?;
        }
        if self.released {
            write!(f, ", released")?;
        }
        if self.escaped {
            write!(f, ", value escapes")?;
        }
        Ok(())
    }
}
