//! Ledger Import Engine CLI
//!
//! Command-line interface for importing delimited transaction files into an
//! in-memory ledger store.
//!
//! # Usage
//!
//! ```bash
//! cargo run -- statement.csv
//! cargo run -- --on-unmapped create statement.csv
//! cargo run -- --batch-size 200 --workers 4 statement.csv
//! cargo run -- --map date=0 --map amount=3 --no-header statement.csv
//! cargo run -- --json statement.csv
//! ```
//!
//! The column mapping is inferred from the header row (when present) and can
//! be overridden per field with `--map`. The final report is printed as a
//! human-readable summary, or as JSON with `--json`.
//!
//! # Exit Codes
//!
//! - 0: Success (including runs with per-row errors; see the report)
//! - 1: Fatal error (unreadable file, malformed input, incomplete mapping)

use ledger_import_engine::cli;
use ledger_import_engine::core::{ImportCoordinator, InMemoryStore, StorageCoordinator};
use ledger_import_engine::io::{self, Dialect};
use ledger_import_engine::types::{ColumnMapping, EntityMapping, ImportReport, RowOutcome};
use std::process;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = cli::parse_args();

    let text = match std::fs::read_to_string(&args.input_file) {
        Ok(text) => text,
        Err(e) => {
            eprintln!("Error: cannot read '{}': {e}", args.input_file.display());
            process::exit(1);
        }
    };

    let dialect = Dialect {
        delimiter: args.delimiter.map(|c| c as u8).unwrap_or(b','),
        quote: b'"',
        has_header: !args.no_header,
    };

    // Infer the column mapping from the header, then apply --map overrides
    let mut mapping = match io::parse(&text, &dialect) {
        Ok(parsed) => parsed
            .header
            .as_deref()
            .map(ColumnMapping::from_header)
            .unwrap_or_default(),
        Err(e) => {
            eprintln!("Error: {e}");
            process::exit(1);
        }
    };
    if let Err(message) = args.apply_map_overrides(&mut mapping) {
        eprintln!("Error: {message}");
        process::exit(1);
    }

    let options = args.to_options();

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("Error: failed to start runtime: {e}");
            process::exit(1);
        }
    };

    let result = runtime.block_on(async {
        let store = Arc::new(InMemoryStore::new());
        let coordinator = ImportCoordinator::new(
            options,
            StorageCoordinator::new(store.clone()),
            store.clone(),
            store,
        );
        coordinator
            .run(
                &text,
                &dialect,
                &mapping,
                &EntityMapping::new(),
                None,
                &CancellationToken::new(),
            )
            .await
    });

    match result {
        Ok(report) => {
            if args.json {
                print_json(&report);
            } else {
                print_summary(&report);
            }
        }
        Err(e) => {
            eprintln!("Error: {e}");
            process::exit(1);
        }
    }
}

fn print_json(report: &ImportReport) {
    match serde_json::to_string_pretty(report) {
        Ok(json) => println!("{json}"),
        Err(e) => {
            eprintln!("Error: failed to serialize report: {e}");
            process::exit(1);
        }
    }
}

fn print_summary(report: &ImportReport) {
    let stats = &report.statistics;
    println!("rows:       {}", stats.total_rows);
    println!("imported:   {}", stats.imported);
    println!("duplicates: {}", stats.duplicates);
    println!("errors:     {}", stats.errors);
    println!("rows/sec:   {:.0}", stats.rows_per_second);

    for (row, outcome) in &report.outcomes {
        match outcome {
            RowOutcome::Imported => {}
            RowOutcome::Duplicate { of_row: Some(first) } => {
                println!("row {row}: duplicate of row {first}");
            }
            RowOutcome::Duplicate { of_row: None } => {
                println!("row {row}: duplicate of a stored transaction");
            }
            RowOutcome::Invalid { errors } => {
                for error in errors {
                    println!("row {row}: {error}");
                }
            }
            RowOutcome::StorageFailed { message } => {
                println!("row {row}: storage failure: {message}");
            }
        }
    }
}
