//! Declaration scanner for Gibiane source.
//!
//! Builds a document's symbol table from its text in one pass over the whole
//! document. The scanner knows just enough of the language to find names:
//!
//! - a line whose first character is `*` is a comment;
//! - text between single quotes is a string;
//! - statements end with `;`, and the names left of the first `=` of a
//!   statement are assigned (`MAIL1 MAIL2 = ...;`), except table indices
//!   (`T . I = ...;` assigns into `T`);
//! - `DEBP NAME ...;` (or any longer spelling of `DEBPROC`) declares the
//!   procedure `NAME`.
//!
//! The first assignment of a name is its declaration, and the comment block
//! right above that statement is its description. Every other occurrence of the
//! name is a use site.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::error::ScanError;
use crate::symbol::{Span, Variable, normalize};
use crate::table::FileSymbolTable;

/// A variable found by the scanner, with its use sites.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Declaration {
    pub name: String,
    pub description: String,
    pub span: Span,
    pub uses: Vec<Span>,
}

impl Declaration {
    pub fn into_variable(self, source_path: impl Into<PathBuf>) -> Variable {
        Variable::new(&self.name, self.description, self.span, source_path).with_uses(self.uses)
    }
}

/// Build the symbol table for a document: built-ins, then its declarations.
pub fn index_text(text: &str, source_path: &Path) -> FileSymbolTable {
    let mut table = FileSymbolTable::new();
    for decl in scan(text) {
        let name = decl.name.clone();
        table.insert(&name, decl.into_variable(source_path));
    }
    table
}

/// Read and index a file from disk.
pub fn index_file(path: &Path) -> Result<FileSymbolTable, ScanError> {
    let text = std::fs::read_to_string(path).map_err(|source| ScanError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(index_text(&text, path))
}

/// Find every declared variable in `text`, in declaration order.
pub fn scan(text: &str) -> Vec<Declaration> {
    let mut scanner = Scanner::default();
    let mut offset = 0;
    for raw in text.split_inclusive('\n') {
        let line = raw.trim_end_matches(['\n', '\r']);
        scanner.line(line, offset);
        offset += raw.len();
    }
    scanner.finish()
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Token {
    Ident(Span),
    Assign,
    Dot,
    End,
    Other,
}

#[derive(Default)]
struct Scanner {
    /// Comment lines waiting to document the next statement.
    pending_doc: Vec<String>,
    /// Description captured when the current statement started.
    statement_doc: Option<String>,
    /// Names seen before the first `=` of the current statement.
    lhs: Vec<(String, Span)>,
    assigned: bool,
    /// Set after `DEBP` until the procedure name is read.
    expects_procedure: bool,
    /// Set after a `.` left of the `=`: the names that follow are indices.
    indexing: bool,
    declarations: Vec<Declaration>,
    declared: HashMap<String, usize>,
    occurrences: Vec<(String, Span)>,
}

impl Scanner {
    fn line(&mut self, line: &str, offset: usize) {
        if line.starts_with('*') {
            let comment = line.trim_start_matches('*').trim();
            if !comment.is_empty() {
                self.pending_doc.push(comment.to_string());
            }
            return;
        }
        if line.trim().is_empty() {
            if self.statement_doc.is_none() {
                self.pending_doc.clear();
            }
            return;
        }
        for token in tokenize(line, offset) {
            self.token(token, line, offset);
        }
    }

    fn token(&mut self, token: Token, line: &str, offset: usize) {
        if token != Token::End && self.statement_doc.is_none() {
            self.statement_doc = Some(self.pending_doc.join("\n"));
            self.pending_doc.clear();
        }

        match token {
            Token::Ident(span) => {
                let name = normalize(&line[span.start - offset..span.end - offset]);
                if self.expects_procedure {
                    self.expects_procedure = false;
                    self.declare(&name, span);
                } else if self.lhs.is_empty() && !self.assigned && is_procedure_keyword(&name) {
                    // Kept as an assigned name in case an `=` follows.
                    self.lhs.push((name.clone(), span));
                    self.expects_procedure = true;
                } else if !self.assigned && !self.indexing {
                    self.lhs.push((name.clone(), span));
                }
                self.occurrences.push((name, span));
            }
            Token::Assign => {
                self.expects_procedure = false;
                if !self.assigned {
                    self.assigned = true;
                    for (name, span) in std::mem::take(&mut self.lhs) {
                        self.declare(&name, span);
                    }
                }
            }
            Token::Dot => {
                if !self.assigned && !self.lhs.is_empty() {
                    self.indexing = true;
                }
            }
            Token::End => {
                self.statement_doc = None;
                self.lhs.clear();
                self.assigned = false;
                self.expects_procedure = false;
                self.indexing = false;
                self.pending_doc.clear();
            }
            Token::Other => {}
        }
    }

    fn declare(&mut self, name: &str, span: Span) {
        if self.declared.contains_key(name) {
            return;
        }
        self.declared.insert(name.to_string(), self.declarations.len());
        self.declarations.push(Declaration {
            name: name.to_string(),
            description: self.statement_doc.clone().unwrap_or_default(),
            span,
            uses: Vec::new(),
        });
    }

    fn finish(mut self) -> Vec<Declaration> {
        for (name, span) in self.occurrences {
            if let Some(&index) = self.declared.get(&name) {
                let decl = &mut self.declarations[index];
                if decl.span != span {
                    decl.uses.push(span);
                }
            }
        }
        self.declarations
    }
}

/// `DEBPROC` may be shortened down to its first four letters.
fn is_procedure_keyword(name: &str) -> bool {
    name.len() >= 4 && "DEBPROC".starts_with(name)
}

fn is_ident_start(c: char) -> bool {
    c.is_alphabetic() || c == '_'
}

fn is_ident_continue(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Split one non-comment line into tokens. Spans are document byte offsets.
fn tokenize(line: &str, offset: usize) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut chars = line.char_indices().peekable();

    while let Some((start, c)) = chars.next() {
        match c {
            '\'' => {
                // Strings end at the next quote or at the end of the line.
                for (_, c) in chars.by_ref() {
                    if c == '\'' {
                        break;
                    }
                }
                tokens.push(Token::Other);
            }
            ';' => tokens.push(Token::End),
            '=' => tokens.push(Token::Assign),
            '.' => tokens.push(Token::Dot),
            c if is_ident_start(c) => {
                let mut end = start + c.len_utf8();
                while let Some(&(i, c)) = chars.peek() {
                    if !is_ident_continue(c) {
                        break;
                    }
                    end = i + c.len_utf8();
                    chars.next();
                }
                tokens.push(Token::Ident(Span::new(offset + start, offset + end)));
            }
            c if c.is_ascii_digit() => {
                // Numbers such as `1.5E3` must not leave `E3` behind as a name.
                while let Some(&(_, c)) = chars.peek() {
                    if !(c.is_alphanumeric() || c == '.') {
                        break;
                    }
                    chars.next();
                }
                tokens.push(Token::Other);
            }
            c if c.is_whitespace() => {}
            _ => tokens.push(Token::Other),
        }
    }

    tokens
}
