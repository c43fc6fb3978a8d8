//! Scoped symbol tables (spec §4.2).
//!
//! A class owns one class-scope table (statics, fields) and one
//! subroutine-scope table (args, locals); the latter is reset at the start
//! of every subroutine.

use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SymbolKind {
    Static,
    Field,
    Arg,
    Var,
}

#[derive(Debug, Clone)]
pub struct Symbol {
    pub type_name: String,
    pub kind: SymbolKind,
    pub index: u16,
}

#[derive(Debug, Default)]
pub struct SymbolTable {
    table: HashMap<String, Symbol>,
    counts: [u16; 4],
}

fn slot(kind: SymbolKind) -> usize {
    match kind {
        SymbolKind::Static => 0,
        SymbolKind::Field => 1,
        SymbolKind::Arg => 2,
        SymbolKind::Var => 3,
    }
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Empties the table and resets every kind's counter to zero.
    pub fn reset(&mut self) {
        self.table.clear();
        self.counts = [0; 4];
    }

    /// Defines `name` at the next free index for `kind`, overwriting any
    /// prior definition of the same name (spec: redefinition is undefined
    /// behavior, and this table chooses to overwrite).
    pub fn define(&mut self, name: &str, type_name: &str, kind: SymbolKind) {
        let index = self.counts[slot(kind)];
        self.counts[slot(kind)] += 1;
        self.table.insert(
            name.to_string(),
            Symbol {
                type_name: type_name.to_string(),
                kind,
                index,
            },
        );
    }

    pub fn count(&self, kind: SymbolKind) -> u16 {
        self.counts[slot(kind)]
    }

    pub fn kind_of(&self, name: &str) -> Option<SymbolKind> {
        self.table.get(name).map(|s| s.kind)
    }

    pub fn type_of(&self, name: &str) -> Option<&str> {
        self.table.get(name).map(|s| s.type_name.as_str())
    }

    pub fn index_of(&self, name: &str) -> Option<u16> {
        self.table.get(name).map(|s| s.index)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.table.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&Symbol> {
        self.table.get(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn indices_increment_per_kind_independently() {
        let mut t = SymbolTable::new();
        t.define("x", "int", SymbolKind::Field);
        t.define("y", "int", SymbolKind::Field);
        t.define("a", "int", SymbolKind::Static);

        assert_eq!(t.index_of("x"), Some(0));
        assert_eq!(t.index_of("y"), Some(1));
        assert_eq!(t.index_of("a"), Some(0));
        assert_eq!(t.count(SymbolKind::Field), 2);
        assert_eq!(t.count(SymbolKind::Static), 1);
    }

    #[test]
    fn kind_of_absent_name_is_none() {
        let t = SymbolTable::new();
        assert_eq!(t.kind_of("missing"), None);
    }

    #[test]
    fn reset_clears_entries_and_counters() {
        let mut t = SymbolTable::new();
        t.define("x", "int", SymbolKind::Var);
        t.reset();
        assert_eq!(t.count(SymbolKind::Var), 0);
        assert!(!t.contains("x"));
    }
}
