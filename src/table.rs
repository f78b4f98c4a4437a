//! Per-document symbol table.

use std::collections::HashMap;

use crate::builtins::BUILTINS;
use crate::symbol::{Symbol, normalize};

/// Symbols known in one document, keyed by uppercase name.
///
/// Enumeration follows insertion order, so built-ins come before the
/// document's own declarations. Overwriting a name keeps its original slot.
#[derive(Clone, Debug, Default)]
pub struct FileSymbolTable {
    symbols: Vec<Symbol>,
    by_name: HashMap<String, usize>,
}

impl FileSymbolTable {
    /// Create a table seeded with the built-in catalog.
    pub fn new() -> Self {
        let mut table = Self::empty();
        table.seed_builtins();
        table
    }

    /// Create a table without any built-ins.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Insert every built-in operator.
    pub fn seed_builtins(&mut self) {
        for builtin in BUILTINS.iter() {
            self.insert(builtin.name(), builtin.clone());
        }
    }

    /// Store `symbol` under the normalized `name`, replacing any previous entry.
    pub fn insert(&mut self, name: &str, symbol: impl Into<Symbol>) {
        let symbol = symbol.into();
        match self.by_name.get(&normalize(name)) {
            Some(&slot) => self.symbols[slot] = symbol,
            None => {
                self.by_name.insert(normalize(name), self.symbols.len());
                self.symbols.push(symbol);
            }
        }
    }

    pub fn exists(&self, name: &str) -> bool {
        self.by_name.contains_key(&normalize(name))
    }

    pub fn lookup(&self, name: &str) -> Option<&Symbol> {
        self.by_name
            .get(&normalize(name))
            .map(|&slot| &self.symbols[slot])
    }

    /// All symbols in insertion order.
    pub fn symbols(&self) -> &[Symbol] {
        &self.symbols
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbol::{Function, Span, SymbolKind, Variable};

    fn var(name: &str, description: &str) -> Variable {
        Variable::new(name, description, Span::new(0, name.len()), "test.dgibi")
    }

    #[test]
    fn test_new_table_is_seeded() {
        let table = FileSymbolTable::new();
        assert_eq!(table.len(), BUILTINS.len());
        assert!(table.exists("opti"));
        assert_eq!(table.lookup("OPTI").map(Symbol::kind), Some(SymbolKind::Function));
    }

    #[test]
    fn test_seeding_is_deterministic() {
        let a = FileSymbolTable::new();
        let b = FileSymbolTable::new();
        let names_a: Vec<_> = a.symbols().iter().map(Symbol::name).collect();
        let names_b: Vec<_> = b.symbols().iter().map(Symbol::name).collect();
        assert_eq!(names_a, names_b);
    }

    #[test]
    fn test_insert_and_lookup_ignore_case() {
        let mut table = FileSymbolTable::empty();
        table.insert("Count", var("count", "a counter"));

        assert!(table.exists("COUNT"));
        assert!(table.exists("count"));
        assert_eq!(table.lookup("cOuNt").map(Symbol::name), Some("COUNT"));
        assert!(table.lookup("total").is_none());
    }

    #[test]
    fn test_insert_overwrites_in_place() {
        let mut table = FileSymbolTable::empty();
        table.insert("A", var("a", "first"));
        table.insert("B", var("b", ""));
        table.insert("a", var("a", "second"));

        assert_eq!(table.len(), 2);
        assert_eq!(table.lookup("A").map(Symbol::description), Some("second"));
        let names: Vec<_> = table.symbols().iter().map(Symbol::name).collect();
        assert_eq!(names, ["A", "B"]);
    }

    #[test]
    fn test_builtins_enumerate_before_document_symbols() {
        let mut table = FileSymbolTable::new();
        table.insert("MAIL1", var("mail1", ""));

        let last = table.symbols().last().map(Symbol::name);
        assert_eq!(last, Some("MAIL1"));
        assert!(
            table.symbols()[..BUILTINS.len()]
                .iter()
                .all(|s| s.kind() == SymbolKind::Function)
        );
    }

    #[test]
    fn test_variable_can_shadow_builtin() {
        let mut table = FileSymbolTable::new();
        table.insert("fin", var("fin", ""));
        assert_eq!(table.len(), BUILTINS.len());
        assert_eq!(table.lookup("FIN").map(Symbol::kind), Some(SymbolKind::Variable));

        table.insert("FIN", Function::new("FIN", "again"));
        assert_eq!(table.lookup("FIN").map(Symbol::kind), Some(SymbolKind::Function));
    }
}
