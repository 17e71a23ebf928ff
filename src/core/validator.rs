//! Per-row validation
//!
//! For each raw row plus the column mapping, produces either a typed,
//! field-complete row or a non-empty list of validation errors. Every check
//! runs even after one fails, so a row's report entry lists all of its
//! problems in one pass instead of short-circuiting at the first.
//!
//! # Concurrency
//!
//! Rows are independent of each other and the only shared state (mapping,
//! options) is read-only behind an `Arc`, so batch validation fans out across
//! worker tasks and re-joins the results by original row index. Output order
//! therefore equals file order for any worker count, which keeps reports and
//! statistics reproducible across runs regardless of scheduling.

use crate::io::RawRow;
use crate::types::{
    ColumnMapping, Field, ImportOptions, RowIndex, ValidationError, ValidationErrorKind,
};
use chrono::NaiveDate;
use futures::future::join_all;
use rust_decimal::Decimal;
use std::str::FromStr;
use std::sync::Arc;
use tracing::error;

/// Largest accepted absolute amount (sanity bound, not a business rule)
const MAX_AMOUNT_UNITS: i64 = 1_000_000_000_000;

/// Largest accepted number of decimal places on an amount
const MAX_SCALE: u32 = 4;

/// A row whose fields all decoded successfully, prior to entity resolution
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedRow {
    pub index: RowIndex,
    pub date: NaiveDate,
    /// Signed amount: negative values are debits
    pub amount: Decimal,
    pub description: String,
    pub currency: String,
    /// Raw account column value, resolved in the next stage
    pub account_raw: String,
    /// Raw category column value, if the input carried one
    pub category_raw: Option<String>,
}

/// Stateless row validator
///
/// Holds the read-only mapping and options; safe to share across worker
/// tasks without locking.
#[derive(Debug)]
pub struct RowValidator {
    mapping: ColumnMapping,
    options: ImportOptions,
}

impl RowValidator {
    pub fn new(mapping: ColumnMapping, options: ImportOptions) -> Self {
        Self { mapping, options }
    }

    /// Validate a single row, collecting every error it has
    pub fn validate_row(&self, row: &RawRow) -> Result<ValidatedRow, Vec<ValidationError>> {
        let mut errors = Vec::new();

        let date = self.check_date(row, &mut errors);
        let amount = self.check_amount(row, &mut errors);
        let description = self.check_description(row, &mut errors);
        let account_raw = self.check_account(row, &mut errors);
        let currency = self.check_currency(row, &mut errors);
        let category_raw = self
            .mapping
            .get(Field::Category)
            .and_then(|column| row.field(column))
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(str::to_string);

        match (date, amount, description, account_raw, currency) {
            (Some(date), Some(amount), Some(description), Some(account_raw), Some(currency))
                if errors.is_empty() =>
            {
                Ok(ValidatedRow {
                    index: row.index,
                    date,
                    amount,
                    description,
                    currency,
                    account_raw,
                    category_raw,
                })
            }
            _ => Err(errors),
        }
    }

    fn raw_field<'a>(&self, row: &'a RawRow, field: Field) -> Option<&'a str> {
        self.mapping
            .get(field)
            .and_then(|column| row.field(column))
            .map(str::trim)
            .filter(|value| !value.is_empty())
    }

    fn check_date(&self, row: &RawRow, errors: &mut Vec<ValidationError>) -> Option<NaiveDate> {
        let raw = match self.raw_field(row, Field::Date) {
            Some(raw) => raw,
            None => {
                errors.push(ValidationError::new(
                    row.index,
                    Field::Date,
                    ValidationErrorKind::MissingField,
                    "",
                ));
                return None;
            }
        };

        // First matching format wins; the list order is part of the contract
        for format in &self.options.date_formats {
            if let Ok(date) = NaiveDate::parse_from_str(raw, format) {
                return Some(date);
            }
        }

        errors.push(ValidationError::new(
            row.index,
            Field::Date,
            ValidationErrorKind::DateFormat,
            raw,
        ));
        None
    }

    fn check_amount(&self, row: &RawRow, errors: &mut Vec<ValidationError>) -> Option<Decimal> {
        let raw = match self.raw_field(row, Field::Amount) {
            Some(raw) => raw,
            None => {
                errors.push(ValidationError::new(
                    row.index,
                    Field::Amount,
                    ValidationErrorKind::MissingField,
                    "",
                ));
                return None;
            }
        };

        let amount = match parse_amount(raw) {
            Some(amount) => amount,
            None => {
                errors.push(ValidationError::new(
                    row.index,
                    Field::Amount,
                    ValidationErrorKind::AmountFormat,
                    raw,
                ));
                return None;
            }
        };

        if amount.scale() > MAX_SCALE || amount.abs() > Decimal::new(MAX_AMOUNT_UNITS, 0) {
            errors.push(ValidationError::new(
                row.index,
                Field::Amount,
                ValidationErrorKind::AmountRange,
                raw,
            ));
            return None;
        }

        Some(amount)
    }

    fn check_description(
        &self,
        row: &RawRow,
        errors: &mut Vec<ValidationError>,
    ) -> Option<String> {
        match self.raw_field(row, Field::Description) {
            Some(raw) => Some(raw.to_string()),
            None => {
                errors.push(ValidationError::new(
                    row.index,
                    Field::Description,
                    ValidationErrorKind::EmptyDescription,
                    "",
                ));
                None
            }
        }
    }

    fn check_account(&self, row: &RawRow, errors: &mut Vec<ValidationError>) -> Option<String> {
        match self.raw_field(row, Field::Account) {
            Some(raw) => Some(raw.to_string()),
            None => {
                errors.push(ValidationError::new(
                    row.index,
                    Field::Account,
                    ValidationErrorKind::MissingField,
                    "",
                ));
                None
            }
        }
    }

    fn check_currency(&self, row: &RawRow, errors: &mut Vec<ValidationError>) -> Option<String> {
        let raw = match self.raw_field(row, Field::Currency) {
            Some(raw) => raw,
            // Unmapped or empty currency falls back to the configured default
            None => return Some(self.options.default_currency.clone()),
        };

        if raw.len() == 3 && raw.chars().all(|c| c.is_ascii_alphabetic()) {
            Some(raw.to_ascii_uppercase())
        } else {
            errors.push(ValidationError::new(
                row.index,
                Field::Currency,
                ValidationErrorKind::CurrencyCode,
                raw,
            ));
            None
        }
    }
}

/// Parse a statement amount into a decimal
///
/// Accepts plain decimals, thousands separators, a leading currency symbol,
/// and the parenthesized-negative convention used by many bank exports.
pub fn parse_amount(raw: &str) -> Option<Decimal> {
    let cleaned = raw.replace(',', "").replace('$', "");
    let cleaned = cleaned.trim();

    if let Some(inner) = cleaned.strip_prefix('(').and_then(|v| v.strip_suffix(')')) {
        return Decimal::from_str(inner.trim()).ok().map(|amount| -amount);
    }

    Decimal::from_str(cleaned).ok()
}

/// Validate a batch of rows concurrently, re-joined by row index
///
/// Rows are chunked across the configured number of worker tasks. The result
/// vector is sorted by original row index, so downstream stages and the
/// final report observe file order no matter how the work was scheduled.
pub async fn validate_batch(
    validator: Arc<RowValidator>,
    rows: Vec<RawRow>,
) -> Vec<(RowIndex, Result<ValidatedRow, Vec<ValidationError>>)> {
    let workers = validator.options.validator_workers.max(1);

    if workers == 1 || rows.len() <= 1 {
        return rows
            .iter()
            .map(|row| (row.index, validator.validate_row(row)))
            .collect();
    }

    let chunk_size = rows.len().div_ceil(workers);
    let mut tasks = Vec::with_capacity(workers);
    for chunk in rows.chunks(chunk_size) {
        let chunk = chunk.to_vec();
        let validator = Arc::clone(&validator);
        tasks.push(tokio::spawn(async move {
            chunk
                .iter()
                .map(|row| (row.index, validator.validate_row(row)))
                .collect::<Vec<_>>()
        }));
    }

    let mut results = Vec::with_capacity(rows.len());
    for task in join_all(tasks).await {
        match task {
            Ok(part) => results.extend(part),
            Err(e) => error!("validation task panicked: {e:?}"),
        }
    }

    results.sort_by_key(|(index, _)| *index);
    results
}
