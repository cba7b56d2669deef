//! Print the rows of one or more NFe files as `;`-separated text.
//!
//! ```text
//! RUST_LOG=nfe_tabular=debug cargo run --example extract_rows -- nota1.xml nota2.xml
//! ```

use std::process::ExitCode;

use nfe_tabular::core::ExtractOptions;
use nfe_tabular::table::{Row, extract_batch};
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let paths: Vec<String> = std::env::args().skip(1).collect();
    if paths.is_empty() {
        eprintln!("usage: extract_rows <nfe.xml>...");
        return ExitCode::FAILURE;
    }

    let mut documents = Vec::new();
    for path in &paths {
        match std::fs::read_to_string(path) {
            Ok(xml) => documents.push((path.clone(), xml)),
            Err(e) => tracing::error!(path = %path, error = %e, "cannot read file"),
        }
    }

    let outcomes = extract_batch(documents, &ExtractOptions::default());

    println!("{}", Row::COLUMNS.join(";"));
    let mut failed = 0;
    for outcome in &outcomes {
        match &outcome.result {
            Ok(rows) => {
                for row in rows {
                    println!("{}", row.display_cells().join(";"));
                }
            }
            Err(e) => {
                failed += 1;
                eprintln!("{}: {} ({})", outcome.source, e, e.kind());
            }
        }
    }

    if failed == 0 && outcomes.len() == paths.len() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
