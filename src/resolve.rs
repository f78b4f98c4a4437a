//! Identifier resolution against a symbol table.
//!
//! A word resolves to every symbol whose name equals it exactly. When there is
//! none, it resolves to every symbol whose name is a prefix of the word, so
//! `OPTION` finds the `OPTI` operator and `MAIL1X` finds `MAIL1`. Several
//! prefix candidates are all kept; callers decide how to present them.

use crate::symbol::{Symbol, Variable, normalize};
use crate::table::FileSymbolTable;

/// How a resolution was obtained.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MatchKind {
    Exact,
    Prefix,
}

/// Candidates for a word, in table enumeration order.
#[derive(Clone, Debug)]
pub struct Resolution<'t> {
    pub matched: MatchKind,
    pub symbols: Vec<&'t Symbol>,
}

impl<'t> Resolution<'t> {
    pub fn first(&self) -> Option<&'t Symbol> {
        self.symbols.first().copied()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    pub fn names(&self) -> Vec<&'t str> {
        self.symbols.iter().copied().map(Symbol::name).collect()
    }
}

/// Resolve `word` with the exact pass, then the prefix pass.
pub fn resolve<'t>(table: &'t FileSymbolTable, word: &str) -> Resolution<'t> {
    let word = normalize(word);

    let exact: Vec<_> = table
        .symbols()
        .iter()
        .filter(|s| s.name() == word)
        .collect();
    if !exact.is_empty() {
        return Resolution {
            matched: MatchKind::Exact,
            symbols: exact,
        };
    }

    let prefix = table
        .symbols()
        .iter()
        .filter(|s| word.starts_with(s.name()))
        .collect();
    Resolution {
        matched: MatchKind::Prefix,
        symbols: prefix,
    }
}

/// Find the variable a rename or reference search applies to.
///
/// Only exact matches count: rewriting the sites of a shorter name because the
/// cursor word happens to start with it would corrupt the document.
pub fn resolve_variable<'t>(table: &'t FileSymbolTable, word: &str) -> Option<&'t Variable> {
    let word = normalize(word);
    table
        .symbols()
        .iter()
        .filter_map(Symbol::as_variable)
        .find(|v| v.name() == word)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbol::{Function, Span};

    fn table_with(names: &[&str]) -> FileSymbolTable {
        let mut table = FileSymbolTable::empty();
        for (i, name) in names.iter().enumerate() {
            let var = Variable::new(name, "", Span::new(i * 10, i * 10 + name.len()), "t.dgibi");
            table.insert(name, var);
        }
        table
    }

    #[test]
    fn test_exact_match() {
        let table = table_with(&["X", "XY"]);
        let res = resolve(&table, "XY");
        assert_eq!(res.matched, MatchKind::Exact);
        assert_eq!(res.names(), ["XY"]);
    }

    #[test]
    fn test_exact_match_shadows_prefix_candidates() {
        let table = table_with(&["X", "XY", "XYZ"]);
        let res = resolve(&table, "xyz");
        assert_eq!(res.names(), ["XYZ"]);
    }

    #[test]
    fn test_prefix_fallback_returns_every_candidate() {
        let table = table_with(&["X", "XY", "Z"]);
        let res = resolve(&table, "XYZ");
        assert_eq!(res.matched, MatchKind::Prefix);
        assert_eq!(res.names(), ["X", "XY"]);
        assert_eq!(res.first().map(Symbol::name), Some("X"));
    }

    #[test]
    fn test_no_match_is_empty() {
        let table = table_with(&["X", "XY"]);
        let res = resolve(&table, "ABC");
        assert!(res.is_empty());
        assert!(res.first().is_none());

        let empty = FileSymbolTable::empty();
        let res = resolve(&empty, "X");
        assert!(res.is_empty());
    }

    #[test]
    fn test_resolution_ignores_case() {
        let table = table_with(&["MAIL", "MAILLAGE", "L1"]);
        for word in ["maillage2", "MAILLAGE2", "Maillage2", "l1", "L1", "mail"] {
            let lower = resolve(&table, &word.to_lowercase()).names();
            let upper = resolve(&table, &word.to_uppercase()).names();
            let as_is = resolve(&table, word).names();
            assert_eq!(as_is, lower, "{word}");
            assert_eq!(as_is, upper, "{word}");
        }
    }

    #[test]
    fn test_builtin_abbreviation() {
        let table = FileSymbolTable::new();
        let res = resolve(&table, "option");
        assert_eq!(res.names(), ["OPTI"]);
    }

    #[test]
    fn test_resolve_variable_skips_functions_and_prefixes() {
        let mut table = table_with(&["COUNT"]);
        table.insert("PRINT", Function::new("PRINT", "prints a value"));

        assert!(resolve_variable(&table, "print").is_none());
        assert!(resolve_variable(&table, "COUNTER").is_none());
        assert_eq!(resolve_variable(&table, "count").map(Variable::name), Some("COUNT"));
    }
}
