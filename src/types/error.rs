//! Error types for the import engine
//!
//! Two layers of errors exist side by side:
//!
//! - [`ImportError`] is the crate-level error enum. Only the input-shaped
//!   variants (`MalformedInput`, `IncompleteMapping`) abort a run; storage
//!   failures are recoverable at the run level and are captured per batch.
//! - [`ValidationError`] is report *content*, not control flow: a failing row
//!   collects every error it has and the run continues.

use crate::types::RowIndex;
use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Logical input fields the pipeline knows how to interpret
///
/// A [`ColumnMapping`](crate::types::ColumnMapping) assigns each field to a
/// column index in the input file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Field {
    Date,
    Amount,
    Description,
    Account,
    Category,
    Currency,
}

impl Field {
    /// Fields that must be mapped before any row is processed
    pub const REQUIRED: [Field; 4] = [Field::Date, Field::Amount, Field::Description, Field::Account];

    /// Stable lowercase name, used in messages and header inference
    pub fn name(&self) -> &'static str {
        match self {
            Field::Date => "date",
            Field::Amount => "amount",
            Field::Description => "description",
            Field::Account => "account",
            Field::Category => "category",
            Field::Currency => "currency",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Main error type for the import engine
///
/// Each variant carries enough context to diagnose the failure without access
/// to the original input.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ImportError {
    /// The input text cannot be meaningfully interpreted
    ///
    /// This is a fatal error that aborts the whole run: unbalanced quoting,
    /// or row shapes wildly inconsistent with the header.
    #[error("malformed input at line {line}: {message}")]
    MalformedInput {
        /// 1-based line number in the raw text where the problem was detected
        line: u64,
        /// Description of what made the input unreadable
        message: String,
    },

    /// One or more required fields have no column assigned
    ///
    /// This is a fatal error, detected before any row is processed.
    #[error("column mapping incomplete: missing {missing}")]
    IncompleteMapping {
        /// Comma-separated names of the unmapped required fields
        missing: String,
    },

    /// A raw entity value could not be resolved to a destination identifier
    ///
    /// Recoverable: the affected row is excluded and the run continues.
    #[error("unresolved {entity} '{raw}' at row {row}")]
    UnresolvedEntity {
        /// Row the value appeared on
        row: RowIndex,
        /// Which kind of entity ("account" or "category")
        entity: String,
        /// The raw column value that failed to resolve
        raw: String,
    },

    /// The destination store rejected a commit
    ///
    /// Recoverable at the run level: the failing batch's rows are reported
    /// and subsequent batches still commit.
    #[error("storage failure: {message}")]
    StorageFailure {
        /// Description of the storage-level problem
        message: String,
    },
}

impl ImportError {
    /// Create a MalformedInput error
    pub fn malformed_input(line: u64, message: impl Into<String>) -> Self {
        ImportError::MalformedInput {
            line,
            message: message.into(),
        }
    }

    /// Create an IncompleteMapping error from the missing required fields
    pub fn incomplete_mapping(missing: &[Field]) -> Self {
        ImportError::IncompleteMapping {
            missing: missing
                .iter()
                .map(Field::name)
                .collect::<Vec<_>>()
                .join(", "),
        }
    }

    /// Create an UnresolvedEntity error
    pub fn unresolved_entity(row: RowIndex, entity: &str, raw: &str) -> Self {
        ImportError::UnresolvedEntity {
            row,
            entity: entity.to_string(),
            raw: raw.to_string(),
        }
    }

    /// Create a StorageFailure error
    pub fn storage_failure(message: impl Into<String>) -> Self {
        ImportError::StorageFailure {
            message: message.into(),
        }
    }

    /// Whether this error aborts the run instead of being captured per row
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            ImportError::MalformedInput { .. } | ImportError::IncompleteMapping { .. }
        )
    }
}

/// What went wrong with a single field of a single row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationErrorKind {
    /// A required field is absent or empty
    MissingField,
    /// The date matched none of the accepted formats
    DateFormat,
    /// The amount is not a parseable number
    AmountFormat,
    /// The amount parsed but its scale or magnitude is out of bounds
    AmountRange,
    /// The description is empty after trimming
    EmptyDescription,
    /// The currency code is not three ASCII letters
    CurrencyCode,
    /// The account value had no mapping and the policy rejects creation
    UnresolvedAccount,
    /// The category value had no mapping and the policy rejects creation
    UnresolvedCategory,
}

/// A single per-row, per-field validation problem
///
/// Multiple errors may attach to one row; all of them are reported, not just
/// the first one found.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationError {
    /// 1-based data-row index
    pub row: RowIndex,
    /// The logical field that failed
    pub field: Field,
    /// What kind of failure it was
    pub kind: ValidationErrorKind,
    /// The raw value as it appeared in the input
    pub raw: String,
}

impl ValidationError {
    pub fn new(row: RowIndex, field: Field, kind: ValidationErrorKind, raw: &str) -> Self {
        ValidationError {
            row,
            field,
            kind,
            raw: raw.to_string(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "row {}: {} field {:?} ('{}')",
            self.row, self.field, self.kind, self.raw
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::malformed(
        ImportError::malformed_input(7, "unbalanced quote"),
        "malformed input at line 7: unbalanced quote"
    )]
    #[case::incomplete(
        ImportError::incomplete_mapping(&[Field::Date, Field::Amount]),
        "column mapping incomplete: missing date, amount"
    )]
    #[case::unresolved(
        ImportError::unresolved_entity(3, "account", "Brokerage"),
        "unresolved account 'Brokerage' at row 3"
    )]
    #[case::storage(
        ImportError::storage_failure("disk full"),
        "storage failure: disk full"
    )]
    fn test_error_display(#[case] error: ImportError, #[case] expected: &str) {
        assert_eq!(error.to_string(), expected);
    }

    #[rstest]
    #[case::malformed(ImportError::malformed_input(1, "x"), true)]
    #[case::incomplete(ImportError::incomplete_mapping(&[Field::Date]), true)]
    #[case::unresolved(ImportError::unresolved_entity(1, "account", "x"), false)]
    #[case::storage(ImportError::storage_failure("x"), false)]
    fn test_fatality(#[case] error: ImportError, #[case] fatal: bool) {
        assert_eq!(error.is_fatal(), fatal);
    }

    #[test]
    fn test_validation_error_display_names_row_and_field() {
        let err = ValidationError::new(12, Field::Date, ValidationErrorKind::DateFormat, "not-a-date");
        let rendered = err.to_string();
        assert!(rendered.contains("row 12"));
        assert!(rendered.contains("date"));
        assert!(rendered.contains("not-a-date"));
    }
}
