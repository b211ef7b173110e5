//! Variable identities and the per-variable version allocator.
//!
//! A [`Variable`] is one program variable slot. Its classification is fixed
//! at registration time and decides what the optimizer may assume about the
//! slot before any write is seen. Versions are allocated per variable from a
//! counter that lives for the whole compilation unit, so successive
//! optimization passes never hand out the same `(variable, version)` pair.

use std::fmt;

/// Index of a variable in a [`VariableTable`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct VarId(u32);

impl VarId {
    #[inline]
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }

    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// One value-state number of a variable.
///
/// [`Version::ENTRY`] is the state at scope entry; every later version is
/// produced by a write, a delete, an escape or a merge.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct Version(u32);

impl Version {
    pub const ENTRY: Version = Version(0);

    #[inline]
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }

    #[inline]
    pub const fn is_entry(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Static classification of a variable.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum VariableKind {
    /// Bound on entry by the call.
    Parameter,
    /// Function-local slot, unbound on entry.
    Local,
    /// Name resolution deferred to run time (unqualified access in a scope
    /// that also performs dynamic-name operations). `fallback` is the module
    /// variable the name resolves to when the local is unbound.
    MaybeLocal { fallback: Option<VarId> },
    /// Module-level global. Anything outside the current flow may rebind it.
    Module,
    /// Compiler-introduced temporary.
    Temporary,
}

/// A registered variable.
#[derive(Clone, Debug)]
pub struct Variable {
    name: String,
    kind: VariableKind,
    shared: bool,
    last_version: u32,
}

impl Variable {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> VariableKind {
        self.kind
    }

    /// Whether a nested closure captures this variable.
    pub fn is_shared(&self) -> bool {
        self.shared
    }

    pub fn is_module(&self) -> bool {
        matches!(self.kind, VariableKind::Module)
    }

    /// Last version handed out by [`VariableTable::allocate_next_version`].
    pub fn last_version(&self) -> Version {
        Version(self.last_version)
    }
}

/// Registry of every variable in a compilation unit.
#[derive(Clone, Debug, Default)]
pub struct VariableTable {
    vars: Vec<Variable>,
}

impl VariableTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a variable and return its id.
    #[expect(
        clippy::cast_possible_truncation,
        reason = "variable counts never exceed u32"
    )]
    pub fn add(&mut self, name: impl Into<String>, kind: VariableKind) -> VarId {
        let id = VarId::new(self.vars.len() as u32);
        self.vars.push(Variable {
            name: name.into(),
            kind,
            shared: false,
            last_version: 0,
        });
        id
    }

    /// Record that a nested closure captures `var`.
    ///
    /// Returns `false` if `var` is not registered.
    pub fn mark_shared(&mut self, var: VarId) -> bool {
        match self.vars.get_mut(var.index()) {
            Some(variable) => {
                variable.shared = true;
                true
            }
            None => false,
        }
    }

    pub fn get(&self, var: VarId) -> Option<&Variable> {
        self.vars.get(var.index())
    }

    /// Name of `var`, or `"<unknown>"` for an unregistered id.
    pub fn name(&self, var: VarId) -> &str {
        self.get(var).map_or("<unknown>", Variable::name)
    }

    /// Hand out the next version of `var`.
    ///
    /// Versions start at 1; 0 is reserved for the entry state.
    pub fn allocate_next_version(&mut self, var: VarId) -> Option<Version> {
        let variable = self.vars.get_mut(var.index())?;
        variable.last_version += 1;
        Some(Version(variable.last_version))
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (VarId, &Variable)> {
        self.vars
            .iter()
            .enumerate()
            .map(|(i, v)| (VarId::new(u32::try_from(i).unwrap_or(u32::MAX)), v))
    }
}
