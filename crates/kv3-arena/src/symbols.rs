//! String interning.

use indexmap::IndexSet;
use kv3_core::Symbol;

/// Interns strings and hands out stable [`Symbol`] ids.
///
/// A symbol stays valid until the table is cleared. Interning the same
/// text twice returns the same symbol.
#[derive(Debug, Default)]
pub struct SymbolTable {
    strings: IndexSet<Box<str>>,
}

impl SymbolTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Intern `s`, returning its symbol.
    pub fn intern(&mut self, s: &str) -> Symbol {
        if let Some(index) = self.strings.get_index_of(s) {
            return Symbol(index as u32);
        }
        let (index, _) = self.strings.insert_full(Box::from(s));
        Symbol(index as u32)
    }

    /// Look up a symbol's text.
    pub fn resolve(&self, symbol: Symbol) -> Option<&str> {
        self.strings.get_index(symbol.0 as usize).map(|s| &**s)
    }

    /// Look up an already interned string without interning it.
    pub fn find(&self, s: &str) -> Option<Symbol> {
        self.strings.get_index_of(s).map(|i| Symbol(i as u32))
    }

    /// Number of interned strings.
    pub fn len(&self) -> usize {
        self.strings.len()
    }

    /// Whether nothing is interned.
    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }

    /// Forget every symbol, keeping allocated capacity.
    pub fn clear(&mut self) {
        self.strings.clear();
    }

    /// Forget every symbol and release storage.
    pub fn purge(&mut self) {
        self.strings = IndexSet::new();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intern_is_idempotent() {
        let mut table = SymbolTable::new();
        let a = table.intern("origin");
        let b = table.intern("angles");
        assert_ne!(a, b);
        assert_eq!(table.intern("origin"), a);
        assert_eq!(table.len(), 2);
        assert_eq!(table.resolve(a), Some("origin"));
        assert_eq!(table.find("angles"), Some(b));
    }

    #[test]
    fn interning_is_case_sensitive() {
        let mut table = SymbolTable::new();
        assert_ne!(table.intern("Name"), table.intern("name"));
    }

    #[test]
    fn clear_forgets_symbols() {
        let mut table = SymbolTable::new();
        let a = table.intern("x");
        table.clear();
        assert!(table.is_empty());
        assert_eq!(table.resolve(a), None);
    }
}
