//! Error types for indexing and lookups.

use std::path::PathBuf;

use derive_more::{Display, Error};

pub type IndexResult<T> = Result<T, IndexError>;

/// A request named a document that has no symbol table.
///
/// Documents are indexed on open, so this means the client queried a document
/// it never opened or already closed.
#[derive(Debug, Display, Error)]
pub enum IndexError {
    #[display("document is not indexed: {_0}")]
    NotIndexed(#[error(not(source))] String),
}

/// Failure to index a file from disk.
#[derive(Debug, Display, Error)]
pub enum ScanError {
    #[display("cannot read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
}
