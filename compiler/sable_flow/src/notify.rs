//! Change notifications.
//!
//! Each successful rewrite or deletion reports exactly one change. The
//! driver re-runs the whole pass while a pass reports any.

use std::fmt;

use sable_ir::Span;

/// Category of a rewrite.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ChangeTag {
    /// Statements were removed, replaced or reordered.
    NewStatements,
    /// An expression became a compile-time constant.
    NewConstant,
    /// An expression was replaced by a different expression.
    NewExpression,
}

impl ChangeTag {
    pub fn as_str(self) -> &'static str {
        match self {
            ChangeTag::NewStatements => "new_statements",
            ChangeTag::NewConstant => "new_constant",
            ChangeTag::NewExpression => "new_expression",
        }
    }
}

impl fmt::Display for ChangeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Receiver of change notifications, injected once per root collection.
pub trait ChangeNotifier {
    fn signal_change(&mut self, tag: ChangeTag, span: Span, message: &str);
}

/// One recorded notification.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChangeEntry {
    pub tag: ChangeTag,
    pub span: Span,
    pub message: String,
}

/// Notifier that records every change in order.
#[derive(Clone, Debug, Default)]
pub struct ChangeLog {
    entries: Vec<ChangeEntry>,
}

impl ChangeLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[ChangeEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// `true` when the pass reached a fixed point.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl ChangeNotifier for ChangeLog {
    fn signal_change(&mut self, tag: ChangeTag, span: Span, message: &str) {
        self.entries.push(ChangeEntry {
            tag,
            span,
            message: message.to_owned(),
        });
    }
}
