//! Benchmark suite for the import pipeline
//!
//! Measures end-to-end throughput (parse, validate, resolve, dedup, convert,
//! commit) over synthetic inputs of increasing size, and the effect of the
//! validator worker count.
//!
//! # Running Benchmarks
//!
//! ```bash
//! cargo bench
//! ```

use ledger_import_engine::core::{ImportCoordinator, InMemoryStore, StorageCoordinator};
use ledger_import_engine::io::Dialect;
use ledger_import_engine::types::{ColumnMapping, EntityMapping, Field, ImportOptions};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

fn main() {
    divan::main();
}

/// Build a synthetic statement with `rows` data rows across a handful of
/// accounts and a sprinkling of duplicates
fn synthetic_input(rows: u32) -> String {
    let accounts = ["Checking", "Savings", "Credit Card"];
    let mut text = String::from("date,amount,description,account\n");
    for i in 0..rows {
        // Every 50th row repeats the previous row's identity
        let seq = if i % 50 == 49 { i - 1 } else { i };
        let account = accounts[(seq % accounts.len() as u32) as usize];
        let day = (seq % 28) + 1;
        text.push_str(&format!(
            "2026-01-{day:02},{}.{:02},Purchase {seq},{account}\n",
            (seq % 900) + 1,
            seq % 100,
        ));
    }
    text
}

fn mapping() -> ColumnMapping {
    let mut mapping = ColumnMapping::new();
    mapping
        .set(Field::Date, 0)
        .set(Field::Amount, 1)
        .set(Field::Description, 2)
        .set(Field::Account, 3);
    mapping
}

fn run_import(text: &str, options: ImportOptions) {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .expect("failed to build runtime");

    runtime.block_on(async {
        let store = Arc::new(InMemoryStore::new());
        for account in ["Checking", "Savings", "Credit Card"] {
            store.register_account(account);
        }
        let coordinator = ImportCoordinator::new(
            options,
            StorageCoordinator::new(store.clone()),
            store.clone(),
            store,
        );
        coordinator
            .run(
                text,
                &Dialect::default(),
                &mapping(),
                &EntityMapping::new(),
                None,
                &CancellationToken::new(),
            )
            .await
            .expect("import failed");
    });
}

#[divan::bench]
fn import_small(bencher: divan::Bencher) {
    let text = synthetic_input(100);
    bencher.bench_local(|| run_import(&text, ImportOptions::default()));
}

#[divan::bench]
fn import_medium(bencher: divan::Bencher) {
    let text = synthetic_input(1_000);
    bencher.bench_local(|| run_import(&text, ImportOptions::default()));
}

#[divan::bench]
fn import_large(bencher: divan::Bencher) {
    let text = synthetic_input(10_000);
    bencher.bench_local(|| run_import(&text, ImportOptions::default()));
}

#[divan::bench]
fn import_medium_single_worker(bencher: divan::Bencher) {
    let text = synthetic_input(1_000);
    bencher.bench_local(|| run_import(&text, ImportOptions::new(500, 1)));
}

#[divan::bench]
fn import_medium_many_workers(bencher: divan::Bencher) {
    let text = synthetic_input(1_000);
    bencher.bench_local(|| run_import(&text, ImportOptions::new(500, 8)));
}
