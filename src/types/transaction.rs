//! Transaction-related types for the import engine
//!
//! This module defines the domain transaction record produced by the pipeline
//! and the identifier types used to reference destination entities.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Destination account identifier
///
/// Assigned by the destination store when an account is created.
pub type AccountId = u64;

/// Destination category identifier
pub type CategoryId = u64;

/// 1-based index of a data row in the input file
///
/// Used as the stable key for per-row outcomes and error reporting.
/// The header row (if any) is not counted.
pub type RowIndex = u32;

/// Direction of a transaction
///
/// Derived from the sign of the amount column: non-negative amounts become
/// credits, negative amounts become debits. The stored amount is always the
/// absolute magnitude.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    /// Funds flowing into the account
    Credit,

    /// Funds flowing out of the account
    Debit,
}

/// A fully-formed domain transaction, ready to be persisted
///
/// Only constructed for rows that passed validation, entity resolution, and
/// duplicate detection. By that point every field is well-typed, so the type
/// itself carries no error states.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Transaction {
    /// Credit or debit, derived from the amount sign
    pub kind: TransactionKind,

    /// Absolute transaction amount
    pub amount: Decimal,

    /// ISO 4217 currency code, uppercased
    pub currency: String,

    /// Posting date
    pub date: NaiveDate,

    /// Description as it appeared in the input (not normalized)
    pub description: String,

    /// Resolved destination account
    pub account: AccountId,

    /// Resolved destination category, if the input carried one
    pub category: Option<CategoryId>,

    /// Input row this transaction originated from
    pub source_row: RowIndex,
}

impl Transaction {
    /// Signed amount: negative for debits, positive for credits
    ///
    /// This is the canonical value used for balance arithmetic and for
    /// fingerprint computation, so that the same business transaction yields
    /// the same signed value whether it is observed before or after
    /// conversion into kind + magnitude.
    pub fn signed_amount(&self) -> Decimal {
        match self.kind {
            TransactionKind::Credit => self.amount,
            TransactionKind::Debit => -self.amount,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(kind: TransactionKind) -> Transaction {
        Transaction {
            kind,
            amount: Decimal::new(12345, 2),
            currency: "USD".to_string(),
            date: NaiveDate::from_ymd_opt(2026, 1, 15).unwrap(),
            description: "Coffee".to_string(),
            account: 1,
            category: None,
            source_row: 1,
        }
    }

    #[test]
    fn test_signed_amount_credit_is_positive() {
        assert_eq!(
            sample(TransactionKind::Credit).signed_amount(),
            Decimal::new(12345, 2)
        );
    }

    #[test]
    fn test_signed_amount_debit_is_negative() {
        assert_eq!(
            sample(TransactionKind::Debit).signed_amount(),
            Decimal::new(-12345, 2)
        );
    }
}
