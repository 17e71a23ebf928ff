//! Ledger Import Engine Library
//! # Overview
//!
//! This library turns an untrusted, user-supplied delimited-text file into
//! validated, deduplicated transaction records committed to a destination
//! store, with live progress reporting and final statistics.
//!
//! # Architecture
//!
//! The pipeline is composed strictly left-to-right, one component per stage:
//!
//! - [`io::parser`] - raw text to ordered header + data rows
//! - [`core::validator`] - per-row checks, fanned out across worker tasks
//! - [`core::resolver`] - raw entity values to destination ids (LRU-cached)
//! - [`core::dedup`] - fingerprint-based duplicate detection
//! - [`core::converter`] - resolved rows to domain transactions
//! - [`core::storage`] - the process-wide single-writer commit queue
//! - [`core::importer`] - orchestration, progress and statistics
//!
//! # Error model
//!
//! Only malformed input and an incomplete column mapping abort a run.
//! Validation failures, unresolved entities, duplicates, and per-batch
//! storage failures are captured in the per-row report and the run continues,
//! maximizing salvageable work on large files.

// Module declarations
pub mod cli;
pub mod core;
pub mod io;
pub mod types;

pub use crate::core::{
    CommitBackend, EntityDirectory, FingerprintSource, ImportCoordinator, InMemoryStore,
    StorageCoordinator,
};
pub use crate::io::{Dialect, ParsedInput, RawRow};
pub use crate::types::{
    AccountId, CategoryId, ColumnMapping, EntityMapping, Field, ImportError, ImportOptions,
    ImportReport, ImportStage, ImportStatistics, ProgressObserver, ProgressSnapshot, RowIndex,
    RowOutcome, Transaction, TransactionKind, UnmappedPolicy, ValidationError, ValidationErrorKind,
};
