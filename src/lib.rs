//! Symbol index for the Gibiane language.
//!
//! Each open document gets a [`FileSymbolTable`] holding the built-in
//! operators and the variables the document declares. Editor queries resolve
//! the word under the cursor against that table through [`SymbolIndex`].

pub mod builtins;
pub mod error;
pub mod index;
pub mod resolve;
pub mod scan;
pub mod symbol;
pub mod table;

pub use crate::error::{IndexError, IndexResult, ScanError};
pub use crate::index::SymbolIndex;
pub use crate::resolve::{MatchKind, Resolution, resolve};
pub use crate::symbol::{Function, Span, Symbol, SymbolKind, Variable};
pub use crate::table::FileSymbolTable;
