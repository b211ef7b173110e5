//! Procedural IR for the Sable optimizer.
//!
//! This crate holds the pieces of the front end that the dataflow core in
//! `sable_flow` consumes but does not own:
//!
//! - **Variables** ([`VariableTable`], [`Variable`], [`VariableKind`]):
//!   identity, static classification, closure sharing, and the per-variable
//!   [`Version`] allocator shared by every pass over a compilation unit.
//!
//! - **Tree** ([`Tree`], [`NodeId`], [`Stmt`], [`Expr`]): an arena of
//!   statement and expression nodes with a closed set of kinds. Rewrites
//!   allocate replacement nodes and re-point parents; nothing is patched
//!   into a different kind in place.
//!
//! - **Queries**: static abort analysis (`may_break`, `may_continue`,
//!   `may_return`, `is_aborting`) and syntactic write extraction
//!   (`variables_written`), both implemented on [`Tree`].

mod control;
mod node;
mod span;
mod tree;
mod variable;
mod writes;

pub use node::{Constant, Expr, Node, Stmt};
pub use span::Span;
pub use tree::{NodeId, Tree};
pub use variable::{VarId, Variable, VariableKind, VariableTable, Version};
