//! Symbols held by a document's symbol table.
//!
//! Gibiane is case-insensitive, so every name is stored uppercase. A symbol is
//! either a [`Variable`] declared in the document or a built-in [`Function`];
//! only variables carry a declaration span and use sites.

use std::path::{Path, PathBuf};

use serde::Serialize;

/// Byte range in a document's text.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }
}

/// Uppercase a name the way the table stores it.
pub fn normalize(name: &str) -> String {
    name.to_uppercase()
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum SymbolKind {
    Variable,
    Function,
}

/// A variable declared in the document.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Variable {
    name: String,
    description: String,
    declaration: Span,
    source_path: PathBuf,
    uses: Vec<Span>,
}

impl Variable {
    pub fn new(
        name: &str,
        description: impl Into<String>,
        declaration: Span,
        source_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            name: normalize(name),
            description: description.into(),
            declaration,
            source_path: source_path.into(),
            uses: Vec::new(),
        }
    }

    /// Attach the use sites collected for this variable.
    pub fn with_uses(mut self, uses: Vec<Span>) -> Self {
        self.uses = uses;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn declaration(&self) -> Span {
        self.declaration
    }

    pub fn source_path(&self) -> &Path {
        &self.source_path
    }

    pub fn uses(&self) -> &[Span] {
        &self.uses
    }
}

/// A built-in operator from the language catalog.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Function {
    name: String,
    description: String,
}

impl Function {
    pub fn new(name: &str, description: impl Into<String>) -> Self {
        Self {
            name: normalize(name),
            description: description.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "kind")]
pub enum Symbol {
    Variable(Variable),
    Function(Function),
}

impl Symbol {
    pub fn name(&self) -> &str {
        match self {
            Symbol::Variable(v) => v.name(),
            Symbol::Function(f) => f.name(),
        }
    }

    pub fn kind(&self) -> SymbolKind {
        match self {
            Symbol::Variable(_) => SymbolKind::Variable,
            Symbol::Function(_) => SymbolKind::Function,
        }
    }

    /// Documentation text. Empty means there is nothing to show on hover.
    pub fn description(&self) -> &str {
        match self {
            Symbol::Variable(v) => v.description(),
            Symbol::Function(f) => f.description(),
        }
    }

    pub fn as_variable(&self) -> Option<&Variable> {
        match self {
            Symbol::Variable(v) => Some(v),
            Symbol::Function(_) => None,
        }
    }
}

impl From<Variable> for Symbol {
    fn from(variable: Variable) -> Self {
        Symbol::Variable(variable)
    }
}

impl From<Function> for Symbol {
    fn from(function: Function) -> Self {
        Symbol::Function(function)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_are_uppercased() {
        let var = Variable::new("count", "", Span::new(0, 5), "a.dgibi");
        assert_eq!(var.name(), "COUNT");

        let func = Function::new("Opti", "options");
        assert_eq!(func.name(), "OPTI");
    }

    #[test]
    fn test_kind_follows_variant() {
        let var: Symbol = Variable::new("x", "", Span::new(0, 1), "a.dgibi").into();
        let func: Symbol = Function::new("mess", "").into();
        assert_eq!(var.kind(), SymbolKind::Variable);
        assert_eq!(func.kind(), SymbolKind::Function);
        assert!(var.as_variable().is_some());
        assert!(func.as_variable().is_none());
    }
}
