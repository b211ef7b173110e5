//! Target-semantics switches for one compilation unit.

/// Options fixed for the lifetime of a root collection.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FlowConfig {
    /// When set, an escape also degrades every variable shared with a
    /// nested closure, not only module variables. Needed for targets where
    /// a closure may rebind the captured cell while control is elsewhere.
    pub escape_shared_variables: bool,
    /// Value `__debug__` folds to.
    pub debug_enabled: bool,
}

impl Default for FlowConfig {
    fn default() -> Self {
        Self {
            escape_shared_variables: true,
            debug_enabled: true,
        }
    }
}
