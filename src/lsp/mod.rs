//! Language Server Protocol implementation for Gibiane.
//!
//! This module provides LSP support with features like:
//! - Completion: every built-in operator and document variable
//! - Hover: documentation of the symbol under the cursor
//! - Go to definition, find references and rename for variables
//! - Document symbols and semantic highlighting of variables

mod server;
mod text;
mod tracing_layer;

pub use server::serve;
