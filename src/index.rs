//! Symbol tables for every open document and the editor queries built on them.
//!
//! Each document has one [`FileSymbolTable`]. Reindexing builds a complete
//! new table and swaps it in with a single insert, so a reader always holds a
//! whole table, never a half-built one. Every query resolves words with
//! [`resolve`] and projects the candidates into what the request needs.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use dashmap::DashMap;

use crate::error::{IndexError, IndexResult};
use crate::resolve::{resolve, resolve_variable};
use crate::scan::index_text;
use crate::symbol::{Span, Symbol, SymbolKind};
use crate::table::FileSymbolTable;

/// Language tag attached to hover contents.
pub const HOVER_LANGUAGE: &str = "gibiane";

/// Entry representing a completion candidate.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompletionEntry {
    pub name: String,
    pub kind: SymbolKind,
    pub detail: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HoverText {
    pub language: &'static str,
    pub value: String,
}

/// Where a resolved variable is declared.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DefinitionTarget {
    pub span: Span,
    pub source_path: PathBuf,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OutlineEntry {
    pub name: String,
    pub kind: SymbolKind,
    pub span: Span,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TextEdit {
    pub span: Span,
    pub new_text: String,
}

/// All edits of one rename, applied together to a single document.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RenameEdit {
    pub uri: String,
    pub edits: Vec<TextEdit>,
}

/// Symbol tables keyed by document URI.
#[derive(Clone, Debug, Default)]
pub struct SymbolIndex {
    tables: Arc<DashMap<String, Arc<FileSymbolTable>>>,
}

impl SymbolIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Scan `text` and install the resulting table for `uri`.
    pub fn index_document(&self, uri: &str, source_path: &Path, text: &str) {
        let table = index_text(text, source_path);
        tracing::debug!(uri, symbols = table.len(), "Indexed document");
        self.replace(uri, table);
    }

    /// Install `table` for `uri`, replacing any previous table.
    pub fn replace(&self, uri: &str, table: FileSymbolTable) {
        self.tables.insert(uri.to_owned(), Arc::new(table));
    }

    /// Drop the table of a closed document.
    pub fn remove(&self, uri: &str) -> bool {
        self.tables.remove(uri).is_some()
    }

    pub fn contains(&self, uri: &str) -> bool {
        self.tables.contains_key(uri)
    }

    pub fn table(&self, uri: &str) -> IndexResult<Arc<FileSymbolTable>> {
        self.tables
            .get(uri)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or_else(|| IndexError::NotIndexed(uri.to_owned()))
    }

    /// Every symbol of the document. Narrowing by what was typed is the
    /// editor's job.
    pub fn completion(&self, uri: &str) -> IndexResult<Vec<CompletionEntry>> {
        let table = self.table(uri)?;
        Ok(table
            .symbols()
            .iter()
            .map(|symbol| CompletionEntry {
                name: symbol.name().to_owned(),
                kind: symbol.kind(),
                detail: symbol.description().to_owned(),
            })
            .collect())
    }

    /// Description of the first symbol `word` resolves to, if it has one.
    pub fn hover(&self, uri: &str, word: &str) -> IndexResult<Option<HoverText>> {
        let table = self.table(uri)?;
        let hover = resolve(&table, word)
            .first()
            .map(Symbol::description)
            .filter(|description| !description.is_empty())
            .map(|description| HoverText {
                language: HOVER_LANGUAGE,
                value: description.to_owned(),
            });
        Ok(hover)
    }

    /// Declarations of every candidate `word` resolves to. Built-ins have none.
    pub fn definition(&self, uri: &str, word: &str) -> IndexResult<Vec<DefinitionTarget>> {
        let table = self.table(uri)?;
        let targets = resolve(&table, word)
            .symbols
            .into_iter()
            .filter_map(|symbol| match symbol {
                Symbol::Variable(var) => Some(DefinitionTarget {
                    span: var.declaration(),
                    source_path: var.source_path().to_path_buf(),
                }),
                Symbol::Function(_) => None,
            })
            .collect();
        Ok(targets)
    }

    /// Spans to highlight as declared variables: each variable's declaration
    /// followed by its uses, variables in table order.
    ///
    /// The result is not sorted by position.
    pub fn semantic_tokens(&self, uri: &str) -> IndexResult<Vec<Span>> {
        let table = self.table(uri)?;
        let mut spans = Vec::new();
        for symbol in table.symbols() {
            match symbol {
                Symbol::Variable(var) => {
                    spans.push(var.declaration());
                    spans.extend_from_slice(var.uses());
                }
                Symbol::Function(_) => {}
            }
        }
        Ok(spans)
    }

    /// Variables of the document, for the outline view.
    pub fn outline(&self, uri: &str) -> IndexResult<Vec<OutlineEntry>> {
        let table = self.table(uri)?;
        let entries = table
            .symbols()
            .iter()
            .filter_map(Symbol::as_variable)
            .map(|var| OutlineEntry {
                name: var.name().to_owned(),
                kind: SymbolKind::Variable,
                span: var.declaration(),
            })
            .collect();
        Ok(entries)
    }

    /// Rewrite the declaration and every use of the variable named `word`.
    ///
    /// Returns `None` when `word` is not a variable of the document.
    pub fn rename(&self, uri: &str, word: &str, new_name: &str) -> IndexResult<Option<RenameEdit>> {
        let table = self.table(uri)?;
        let Some(var) = resolve_variable(&table, word) else {
            return Ok(None);
        };

        let edits = std::iter::once(var.declaration())
            .chain(var.uses().iter().copied())
            .map(|span| TextEdit {
                span,
                new_text: new_name.to_owned(),
            })
            .collect();

        Ok(Some(RenameEdit {
            uri: uri.to_owned(),
            edits,
        }))
    }

    /// Name to offer as rename placeholder, when `word` can be renamed.
    pub fn prepare_rename(&self, uri: &str, word: &str) -> IndexResult<Option<String>> {
        let table = self.table(uri)?;
        Ok(resolve_variable(&table, word).map(|var| var.name().to_owned()))
    }

    /// Use sites of the variable named `word`, optionally with its declaration
    /// first.
    pub fn references(
        &self,
        uri: &str,
        word: &str,
        include_declaration: bool,
    ) -> IndexResult<Vec<Span>> {
        let table = self.table(uri)?;
        let Some(var) = resolve_variable(&table, word) else {
            return Ok(Vec::new());
        };

        let mut spans = Vec::with_capacity(var.uses().len() + 1);
        if include_declaration {
            spans.push(var.declaration());
        }
        spans.extend_from_slice(var.uses());
        Ok(spans)
    }
}
