//! In-memory destination store
//!
//! Reference implementation of the three collaborator contracts, used by the
//! CLI and by tests. DashMap-backed so reads (balances, record counts,
//! fingerprint queries) proceed concurrently while the single writer task
//! applies commits.

use crate::core::dedup::Fingerprint;
use crate::core::traits::{CommitBackend, EntityDirectory, FingerprintSource};
use crate::types::{AccountId, CategoryId, ImportError, Transaction};
use chrono::NaiveDate;
use dashmap::DashMap;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

/// Dashmap-backed store of committed transactions and entities
#[derive(Debug, Default)]
pub struct InMemoryStore {
    next_record_id: AtomicU64,
    next_entity_id: AtomicU64,
    accounts: DashMap<String, AccountId>,
    categories: DashMap<String, CategoryId>,
    balances: DashMap<AccountId, Decimal>,
    records: DashMap<u64, Transaction>,
    fingerprints: DashMap<String, NaiveDate>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            next_record_id: AtomicU64::new(1),
            next_entity_id: AtomicU64::new(1),
            ..Self::default()
        }
    }

    /// Create an account by name, or return the existing one
    pub fn register_account(&self, name: &str) -> AccountId {
        *self
            .accounts
            .entry(name.to_string())
            .or_insert_with(|| self.next_entity_id.fetch_add(1, Ordering::SeqCst))
    }

    /// Create a category by name, or return the existing one
    pub fn register_category(&self, name: &str) -> CategoryId {
        *self
            .categories
            .entry(name.to_string())
            .or_insert_with(|| self.next_entity_id.fetch_add(1, Ordering::SeqCst))
    }

    /// Number of committed transactions
    pub fn record_count(&self) -> usize {
        self.records.len()
    }

    /// Running balance of an account (zero if never touched)
    pub fn balance(&self, account: AccountId) -> Decimal {
        self.balances
            .get(&account)
            .map(|entry| *entry.value())
            .unwrap_or(Decimal::ZERO)
    }
}

impl EntityDirectory for InMemoryStore {
    fn lookup_account(&self, raw: &str) -> Option<AccountId> {
        self.accounts.get(raw).map(|entry| *entry.value())
    }

    fn lookup_category(&self, raw: &str) -> Option<CategoryId> {
        self.categories.get(raw).map(|entry| *entry.value())
    }

    fn create_account(&self, raw: &str) -> Result<AccountId, ImportError> {
        Ok(self.register_account(raw))
    }

    fn create_category(&self, raw: &str) -> Result<CategoryId, ImportError> {
        Ok(self.register_category(raw))
    }
}

impl CommitBackend for InMemoryStore {
    /// Persist a batch and update running balances as one logical unit
    ///
    /// Balance deltas are staged with checked arithmetic first; the batch is
    /// applied only once every delta is known to be representable, so a
    /// rejected batch leaves no partial effects behind.
    fn commit_batch(&self, batch: Vec<Transaction>) -> Result<(), ImportError> {
        let mut deltas: HashMap<AccountId, Decimal> = HashMap::new();
        for transaction in &batch {
            let delta = deltas.entry(transaction.account).or_insert(Decimal::ZERO);
            *delta = delta
                .checked_add(transaction.signed_amount())
                .ok_or_else(|| {
                    ImportError::storage_failure(format!(
                        "balance overflow for account {}",
                        transaction.account
                    ))
                })?;
        }
        for (account, delta) in &deltas {
            let current = self.balance(*account);
            current.checked_add(*delta).ok_or_else(|| {
                ImportError::storage_failure(format!("balance overflow for account {account}"))
            })?;
        }

        for (account, delta) in deltas {
            let mut balance = self.balances.entry(account).or_insert(Decimal::ZERO);
            *balance += delta;
        }
        for transaction in batch {
            let fingerprint = Fingerprint::of_transaction(&transaction);
            self.fingerprints
                .insert(fingerprint.into_hex(), transaction.date);
            let id = self.next_record_id.fetch_add(1, Ordering::SeqCst);
            self.records.insert(id, transaction);
        }

        Ok(())
    }
}

impl FingerprintSource for InMemoryStore {
    fn fingerprints_in(&self, start: NaiveDate, end: NaiveDate) -> Vec<String> {
        self.fingerprints
            .iter()
            .filter(|entry| (start..=end).contains(entry.value()))
            .map(|entry| entry.key().clone())
            .collect()
    }
}
