//! Per-value source metadata for text round-tripping.

use std::collections::BTreeMap;

use crate::flags::MetaDataFlags;
use crate::id::Symbol;

/// Source position, presentation flags, name and comments of one value.
///
/// Owned by a context's metadata side-table, never by the value itself.
/// The name is a symbol in the owning context, so copying metadata
/// between contexts re-interns it.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MetaData {
    /// 1-based source line, 0 when unknown.
    pub line: i32,
    /// 1-based source column, 0 when unknown.
    pub column: i32,
    /// Presentation hints.
    pub flags: MetaDataFlags,
    /// Interned name, if any.
    pub name: Option<Symbol>,
    /// Comments keyed by their relative position.
    pub comments: BTreeMap<i32, String>,
}

impl MetaData {
    /// Reset every field.
    pub fn clear(&mut self) {
        self.line = 0;
        self.column = 0;
        self.flags = MetaDataFlags::empty();
        self.name = None;
        self.comments.clear();
    }

    /// Whether every field holds its default.
    pub fn is_empty(&self) -> bool {
        self.line == 0
            && self.column == 0
            && self.flags.is_empty()
            && self.name.is_none()
            && self.comments.is_empty()
    }
}
