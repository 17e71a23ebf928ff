//! Core data types for the import engine
//!
//! This module contains all the fundamental types used throughout the
//! pipeline: domain transactions, mapping/configuration inputs, the error
//! taxonomy, and progress/report outputs.

pub mod error;
pub mod mapping;
pub mod report;
pub mod transaction;

pub use error::{Field, ImportError, ValidationError, ValidationErrorKind};
pub use mapping::{ColumnMapping, EntityMapping, ImportOptions, UnmappedPolicy};
pub use report::{
    ImportReport, ImportStage, ImportStatistics, ProgressObserver, ProgressSnapshot, RowOutcome,
};
pub use transaction::{AccountId, CategoryId, RowIndex, Transaction, TransactionKind};
