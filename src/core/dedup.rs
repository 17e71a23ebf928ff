//! Content-based duplicate detection
//!
//! A transaction's business identity is its fingerprint: a SHA-256 digest of
//! date, signed amount, normalized description, and account id. Two rows with
//! equal fingerprints are the same transaction, whether the earlier copy sits
//! in the same file or is already persisted in the destination store.
//!
//! Description normalization is case-insensitive and whitespace-collapsing,
//! so `"Coffee "` and `"coffee"` do not defeat detection.

use crate::core::resolver::ResolvedRow;
use crate::types::{AccountId, RowIndex, Transaction};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use sha2::{Digest, Sha256};
use std::collections::HashMap;

/// Collapse whitespace runs to single spaces and lowercase the result
pub fn normalize_description(raw: &str) -> String {
    raw.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Deterministic derived key identifying a transaction's business identity
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Compute a fingerprint from the identity-bearing fields
    ///
    /// The amount is normalized (trailing zeros stripped) before hashing so
    /// `100.00` and `100.0` agree, and the signed value is used so a credit
    /// and a debit of the same magnitude stay distinct.
    pub fn compute(
        date: NaiveDate,
        amount: Decimal,
        description: &str,
        account: AccountId,
    ) -> Self {
        let canonical = format!(
            "{}|{}|{}|{}",
            date.format("%Y-%m-%d"),
            amount.normalize(),
            normalize_description(description),
            account
        );
        let mut hasher = Sha256::new();
        hasher.update(canonical.as_bytes());
        Fingerprint(hex::encode(hasher.finalize()))
    }

    /// Fingerprint of a resolved row awaiting conversion
    pub fn of_row(row: &ResolvedRow) -> Self {
        Self::compute(row.date, row.amount, &row.description, row.account)
    }

    /// Fingerprint of a persisted domain transaction
    ///
    /// Uses the signed amount so the digest matches the one computed from
    /// the source row before conversion split sign and magnitude.
    pub fn of_transaction(transaction: &Transaction) -> Self {
        Self::compute(
            transaction.date,
            transaction.signed_amount(),
            &transaction.description,
            transaction.account,
        )
    }

    pub fn as_hex(&self) -> &str {
        &self.0
    }

    pub fn into_hex(self) -> String {
        self.0
    }
}

/// Verdict for one row's fingerprint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DuplicateCheck {
    /// First occurrence; the row proceeds to conversion
    Unique,
    /// Duplicates an earlier row of the same file
    DuplicateOfRow(RowIndex),
    /// Duplicates a record already persisted before this run
    DuplicateOfStored,
}

/// Set-membership test over fingerprints seen so far
///
/// Seeded with fingerprints of already-persisted records in the relevant
/// date window, then fed every accepted row of the run. Purely in-memory;
/// never mutates the persisted store.
#[derive(Debug, Default)]
pub struct DuplicateDetector {
    /// fingerprint hex → first in-file row, or None for store-side records
    seen: HashMap<String, Option<RowIndex>>,
}

impl DuplicateDetector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a fingerprint of an already-persisted record
    ///
    /// Never displaces an in-file first occurrence recorded earlier in the
    /// run, so re-seeding the same window across batches is harmless.
    pub fn seed_persisted(&mut self, fingerprint: String) {
        self.seen.entry(fingerprint).or_insert(None);
    }

    /// Test a fingerprint and record it if unseen
    ///
    /// First occurrence wins: the first row presenting a fingerprint is
    /// `Unique`, every later one is a duplicate of it.
    pub fn check_and_record(&mut self, fingerprint: &Fingerprint, row: RowIndex) -> DuplicateCheck {
        match self.seen.get(fingerprint.as_hex()) {
            Some(Some(first)) => DuplicateCheck::DuplicateOfRow(*first),
            Some(None) => DuplicateCheck::DuplicateOfStored,
            None => {
                self.seen.insert(fingerprint.as_hex().to_string(), Some(row));
                DuplicateCheck::Unique
            }
        }
    }

    /// Number of distinct fingerprints known
    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 1, 1).unwrap()
    }

    #[rstest]
    #[case::collapse_spaces("Coffee  Shop", "coffee shop")]
    #[case::trim("  Coffee ", "coffee")]
    #[case::lowercase("COFFEE", "coffee")]
    #[case::tabs_and_newlines("Coffee\t\nShop", "coffee shop")]
    fn test_normalize_description(#[case] raw: &str, #[case] expected: &str) {
        assert_eq!(normalize_description(raw), expected);
    }

    #[test]
    fn test_fingerprint_ignores_cosmetic_description_differences() {
        let a = Fingerprint::compute(date(), Decimal::new(10000, 2), "Coffee", 1);
        let b = Fingerprint::compute(date(), Decimal::new(10000, 2), "coffee ", 1);
        assert_eq!(a, b);
    }

    #[test]
    fn test_fingerprint_ignores_amount_representation() {
        let a = Fingerprint::compute(date(), Decimal::new(10000, 2), "Coffee", 1); // 100.00
        let b = Fingerprint::compute(date(), Decimal::new(1000, 1), "Coffee", 1); // 100.0
        assert_eq!(a, b);
    }

    #[rstest]
    #[case::different_date(
        Fingerprint::compute(NaiveDate::from_ymd_opt(2026, 1, 2).unwrap(), Decimal::new(10000, 2), "Coffee", 1)
    )]
    #[case::different_amount(Fingerprint::compute(date(), Decimal::new(10001, 2), "Coffee", 1))]
    #[case::different_sign(Fingerprint::compute(date(), Decimal::new(-10000, 2), "Coffee", 1))]
    #[case::different_description(Fingerprint::compute(date(), Decimal::new(10000, 2), "Tea", 1))]
    #[case::different_account(Fingerprint::compute(date(), Decimal::new(10000, 2), "Coffee", 2))]
    fn test_fingerprint_distinguishes_identity_fields(#[case] other: Fingerprint) {
        let base = Fingerprint::compute(date(), Decimal::new(10000, 2), "Coffee", 1);
        assert_ne!(base, other);
    }

    #[test]
    fn test_first_occurrence_wins() {
        let mut detector = DuplicateDetector::new();
        let fp = Fingerprint::compute(date(), Decimal::new(500, 2), "Lunch", 1);

        assert_eq!(detector.check_and_record(&fp, 3), DuplicateCheck::Unique);
        assert_eq!(
            detector.check_and_record(&fp, 9),
            DuplicateCheck::DuplicateOfRow(3)
        );
        assert_eq!(
            detector.check_and_record(&fp, 20),
            DuplicateCheck::DuplicateOfRow(3)
        );
    }

    #[test]
    fn test_seeded_fingerprint_reports_stored_duplicate() {
        let mut detector = DuplicateDetector::new();
        let fp = Fingerprint::compute(date(), Decimal::new(500, 2), "Lunch", 1);
        detector.seed_persisted(fp.as_hex().to_string());

        assert_eq!(
            detector.check_and_record(&fp, 1),
            DuplicateCheck::DuplicateOfStored
        );
    }

    #[test]
    fn test_seeding_does_not_displace_in_file_first() {
        let mut detector = DuplicateDetector::new();
        let fp = Fingerprint::compute(date(), Decimal::new(500, 2), "Lunch", 1);

        assert_eq!(detector.check_and_record(&fp, 4), DuplicateCheck::Unique);
        detector.seed_persisted(fp.as_hex().to_string());
        assert_eq!(
            detector.check_and_record(&fp, 8),
            DuplicateCheck::DuplicateOfRow(4)
        );
    }

    #[test]
    fn test_distinct_fingerprints_are_all_unique() {
        let mut detector = DuplicateDetector::new();
        for i in 1..=10u32 {
            let fp = Fingerprint::compute(date(), Decimal::new(i as i64 * 100, 2), "Row", 1);
            assert_eq!(detector.check_and_record(&fp, i), DuplicateCheck::Unique);
        }
        assert_eq!(detector.len(), 10);
    }
}
