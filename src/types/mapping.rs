//! Mapping and configuration types supplied by the surrounding application
//!
//! The import pipeline never guesses what a column means or which destination
//! entity a raw value refers to. Those decisions arrive here: a
//! [`ColumnMapping`] from logical field to column index, an [`EntityMapping`]
//! from raw values to destination identifiers, and the [`ImportOptions`]
//! tuning knobs.

use crate::types::{AccountId, CategoryId, Field, ImportError};
use std::collections::HashMap;
use tracing::warn;

/// Assignment of logical fields to column indices
///
/// Built by the caller (typically from user choices in a mapping dialog) or
/// inferred from a header row via [`ColumnMapping::from_header`]. All of
/// [`Field::REQUIRED`] must be present before the pipeline touches a row.
#[derive(Debug, Clone, Default)]
pub struct ColumnMapping {
    columns: HashMap<Field, usize>,
}

impl ColumnMapping {
    pub fn new() -> Self {
        Self::default()
    }

    /// Assign a field to a 0-based column index, replacing any previous assignment
    pub fn set(&mut self, field: Field, column: usize) -> &mut Self {
        self.columns.insert(field, column);
        self
    }

    /// Column index assigned to a field, if any
    pub fn get(&self, field: Field) -> Option<usize> {
        self.columns.get(&field).copied()
    }

    /// Infer a mapping from header labels
    ///
    /// Matching is case-insensitive on the trimmed label. Unrecognized labels
    /// are ignored; the result may be incomplete and should be passed through
    /// [`ColumnMapping::validate`] before use.
    pub fn from_header(header: &[String]) -> Self {
        let mut mapping = ColumnMapping::new();
        for (column, label) in header.iter().enumerate() {
            let label = label.trim().to_lowercase();
            let field = match label.as_str() {
                "date" | "posted" | "transaction date" => Some(Field::Date),
                "amount" | "value" => Some(Field::Amount),
                "description" | "memo" | "payee" => Some(Field::Description),
                "account" => Some(Field::Account),
                "category" => Some(Field::Category),
                "currency" => Some(Field::Currency),
                _ => None,
            };
            if let Some(field) = field {
                // First matching column wins; later duplicates are ignored
                mapping.columns.entry(field).or_insert(column);
            }
        }
        mapping
    }

    /// Verify that every required field has a column
    ///
    /// # Errors
    ///
    /// Returns [`ImportError::IncompleteMapping`] naming every missing
    /// required field, so the caller can fix the mapping in one pass.
    pub fn validate(&self) -> Result<(), ImportError> {
        let missing: Vec<Field> = Field::REQUIRED
            .iter()
            .copied()
            .filter(|field| !self.columns.contains_key(field))
            .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(ImportError::incomplete_mapping(&missing))
        }
    }
}

/// User-supplied mapping from raw column values to destination entities
///
/// May be partial; what happens to unmapped values is governed by
/// [`UnmappedPolicy`].
#[derive(Debug, Clone, Default)]
pub struct EntityMapping {
    accounts: HashMap<String, AccountId>,
    categories: HashMap<String, CategoryId>,
}

impl EntityMapping {
    pub fn new() -> Self {
        Self::default()
    }

    /// Map a raw account value to a destination account id
    pub fn map_account(&mut self, raw: impl Into<String>, id: AccountId) -> &mut Self {
        self.accounts.insert(raw.into(), id);
        self
    }

    /// Map a raw category value to a destination category id
    pub fn map_category(&mut self, raw: impl Into<String>, id: CategoryId) -> &mut Self {
        self.categories.insert(raw.into(), id);
        self
    }

    pub fn account(&self, raw: &str) -> Option<AccountId> {
        self.accounts.get(raw).copied()
    }

    pub fn category(&self, raw: &str) -> Option<CategoryId> {
        self.categories.get(raw).copied()
    }
}

/// Fallback behavior for entity values with no explicit mapping
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnmappedPolicy {
    /// Reject the row with an unresolved-entity error (the default)
    #[default]
    Reject,

    /// Ask the entity directory to create the entity on the fly
    Create,
}

/// Tuning options for one import run
///
/// None of these affect outcome correctness; they control commit granularity,
/// progress-event frequency, parallelism, and duplicate-detection scope.
#[derive(Debug, Clone)]
pub struct ImportOptions {
    /// Number of rows processed and committed together
    pub batch_size: usize,

    /// Accepted date formats, tried in order; first match wins
    pub date_formats: Vec<String>,

    /// Days of padding around the import's date range when querying the
    /// store for existing fingerprints
    pub dedup_window_days: u32,

    /// Capacity of each entity-resolution cache
    pub cache_capacity: usize,

    /// What to do with entity values that have no mapping
    pub unmapped_policy: UnmappedPolicy,

    /// Number of concurrent validation workers
    pub validator_workers: usize,

    /// Currency assumed when the input has no currency column
    pub default_currency: String,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            batch_size: 500,
            date_formats: vec![
                "%Y-%m-%d".to_string(),
                "%m/%d/%Y".to_string(),
                "%d.%m.%Y".to_string(),
            ],
            dedup_window_days: 3,
            cache_capacity: 256,
            unmapped_policy: UnmappedPolicy::default(),
            validator_workers: num_cpus::get(),
            default_currency: "USD".to_string(),
        }
    }
}

impl ImportOptions {
    /// Create options with validated batch size and worker count
    ///
    /// Zero values fall back to the defaults with a warning, mirroring how
    /// the rest of the configuration surface treats nonsense input: complain,
    /// then keep going.
    pub fn new(batch_size: usize, validator_workers: usize) -> Self {
        let default = Self::default();

        let batch_size = if batch_size == 0 {
            warn!(
                given = batch_size,
                fallback = default.batch_size,
                "invalid batch_size, using default"
            );
            default.batch_size
        } else {
            batch_size
        };

        let validator_workers = if validator_workers == 0 {
            warn!(
                given = validator_workers,
                fallback = default.validator_workers,
                "invalid validator_workers, using default"
            );
            default.validator_workers
        } else {
            validator_workers
        };

        Self {
            batch_size,
            validator_workers,
            ..default
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn header(labels: &[&str]) -> Vec<String> {
        labels.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_from_header_maps_known_labels() {
        let mapping =
            ColumnMapping::from_header(&header(&["Date", "Amount", "Description", "Account"]));

        assert_eq!(mapping.get(Field::Date), Some(0));
        assert_eq!(mapping.get(Field::Amount), Some(1));
        assert_eq!(mapping.get(Field::Description), Some(2));
        assert_eq!(mapping.get(Field::Account), Some(3));
        assert!(mapping.validate().is_ok());
    }

    #[rstest]
    #[case::memo("memo", Field::Description)]
    #[case::payee("Payee", Field::Description)]
    #[case::posted("posted", Field::Date)]
    #[case::value("VALUE", Field::Amount)]
    fn test_from_header_aliases(#[case] label: &str, #[case] field: Field) {
        let mapping = ColumnMapping::from_header(&header(&[label]));
        assert_eq!(mapping.get(field), Some(0));
    }

    #[test]
    fn test_from_header_ignores_unknown_labels() {
        let mapping = ColumnMapping::from_header(&header(&["balance", "check number"]));
        assert_eq!(mapping.get(Field::Date), None);
        assert_eq!(mapping.get(Field::Amount), None);
    }

    #[test]
    fn test_from_header_first_duplicate_wins() {
        let mapping = ColumnMapping::from_header(&header(&["date", "date"]));
        assert_eq!(mapping.get(Field::Date), Some(0));
    }

    #[test]
    fn test_validate_reports_all_missing_fields() {
        let mut mapping = ColumnMapping::new();
        mapping.set(Field::Date, 0);

        let err = mapping.validate().unwrap_err();
        match err {
            ImportError::IncompleteMapping { missing } => {
                assert!(missing.contains("amount"));
                assert!(missing.contains("description"));
                assert!(missing.contains("account"));
                assert!(!missing.contains("date"));
            }
            other => panic!("expected IncompleteMapping, got {other:?}"),
        }
    }

    #[test]
    fn test_entity_mapping_lookup() {
        let mut entities = EntityMapping::new();
        entities.map_account("Checking", 7);
        entities.map_category("Groceries", 3);

        assert_eq!(entities.account("Checking"), Some(7));
        assert_eq!(entities.account("Savings"), None);
        assert_eq!(entities.category("Groceries"), Some(3));
        assert_eq!(entities.category("Rent"), None);
    }

    #[rstest]
    #[case::zero_batch(0, 4, 500, 4)]
    #[case::zero_workers(100, 0, 100, num_cpus::get())]
    #[case::both_valid(250, 2, 250, 2)]
    fn test_options_zero_values_fall_back(
        #[case] batch: usize,
        #[case] workers: usize,
        #[case] expected_batch: usize,
        #[case] expected_workers: usize,
    ) {
        let options = ImportOptions::new(batch, workers);
        assert_eq!(options.batch_size, expected_batch);
        assert_eq!(options.validator_workers, expected_workers);
    }
}
