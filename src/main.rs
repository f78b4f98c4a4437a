//! Gibiane language server entry point.

mod cli;
mod lsp;

use std::path::Path;

use clap::Parser;
use cli::{Cli, Command};
use gibiane::FileSymbolTable;
use gibiane::scan::index_file;

fn main() {
    let cli = Cli::parse();

    match cli.command {
        Command::Serve { log_level } => {
            if let Err(e) = lsp::serve(&log_level) {
                eprintln!("LSP server error: {e}");
                std::process::exit(1);
            }
        }
        Command::Index { file, json } => {
            if let Err(e) = index(&file, json) {
                eprintln!("Error: {e}");
                std::process::exit(1);
            }
        }
    }
}

fn index(path: &Path, json: bool) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let table = index_file(path)?;
    if json {
        println!("{}", serde_json::to_string_pretty(table.symbols())?);
    } else {
        println!("=== {} ===", path.display());
        println!("{}", render_variables(&table));
    }
    Ok(())
}

/// One line per declared variable: name, declaration span, use count and
/// description.
fn render_variables(table: &FileSymbolTable) -> String {
    let variables: Vec<_> = table
        .symbols()
        .iter()
        .filter_map(gibiane::Symbol::as_variable)
        .collect();

    let mut lines = vec![format!("variables: {}", variables.len())];
    for var in variables {
        let decl = var.declaration();
        let mut line = format!(
            "{} {}..{} uses={}",
            var.name(),
            decl.start,
            decl.end,
            var.uses().len()
        );
        if !var.description().is_empty() {
            line.push_str(" # ");
            line.push_str(&var.description().replace('\n', " "));
        }
        lines.push(line);
    }
    lines.join("\n")
}
