//! Command-line interface for the Gibiane language server.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "gibiane")]
#[command(about = "Gibiane symbol index and language server", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Start the Language Server Protocol (LSP) server
    #[command(alias = "lsp")]
    Serve {
        /// Log filter directive, overridden by RUST_LOG
        #[arg(long, default_value = "info")]
        log_level: String,
    },
    /// Index a file and print the variables it declares
    Index {
        file: PathBuf,
        /// Print every symbol, built-ins included, as JSON
        #[arg(long)]
        json: bool,
    },
}
