//! Entity resolution
//!
//! Maps raw account/category column values to destination identifiers using
//! the user-supplied [`EntityMapping`], a bounded LRU cache, and the
//! [`EntityDirectory`] collaborator. Resolution order per value:
//!
//! 1. explicit mapping (user decision, always wins),
//! 2. cache entry from an earlier row in the same run,
//! 3. directory lookup against existing destination entities,
//! 4. the configured fallback: reject the row, or create the entity.
//!
//! A raw value is never resolved twice within a run while the cache still
//! holds it.

use crate::core::cache::LruCache;
use crate::core::traits::EntityDirectory;
use crate::core::validator::ValidatedRow;
use crate::types::{
    AccountId, CategoryId, EntityMapping, Field, RowIndex, UnmappedPolicy, ValidationError,
    ValidationErrorKind,
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::sync::Arc;

/// A validated row with destination entity identifiers attached
///
/// Never constructed for a row that failed validation or resolution.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedRow {
    pub index: RowIndex,
    pub date: NaiveDate,
    /// Signed amount: negative values are debits
    pub amount: Decimal,
    pub description: String,
    pub currency: String,
    pub account: AccountId,
    pub category: Option<CategoryId>,
}

/// Resolution counters, reported for diagnostics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResolverStats {
    /// Values answered by the explicit mapping
    pub mapping_hits: u64,
    /// Values answered by the LRU cache
    pub cache_hits: u64,
    /// Values answered by a directory lookup
    pub directory_hits: u64,
    /// Entities created on the fly
    pub created: u64,
}

/// Resolves raw entity values for one import run
///
/// Owns its caches exclusively; nothing here is shared across concurrent
/// imports. The directory collaborator is injected, never ambient.
pub struct EntityResolver {
    mapping: EntityMapping,
    policy: UnmappedPolicy,
    accounts: LruCache<String, AccountId>,
    categories: LruCache<String, CategoryId>,
    directory: Arc<dyn EntityDirectory>,
    stats: ResolverStats,
}

impl EntityResolver {
    pub fn new(
        mapping: EntityMapping,
        policy: UnmappedPolicy,
        cache_capacity: usize,
        directory: Arc<dyn EntityDirectory>,
    ) -> Self {
        Self {
            mapping,
            policy,
            accounts: LruCache::new(cache_capacity),
            categories: LruCache::new(cache_capacity),
            directory,
            stats: ResolverStats::default(),
        }
    }

    /// Attach entity identifiers to a validated row
    ///
    /// # Errors
    ///
    /// Returns a single [`ValidationError`] of kind `UnresolvedAccount` or
    /// `UnresolvedCategory` when a value cannot be resolved under the
    /// configured policy; the row is excluded and the run continues.
    pub fn resolve(&mut self, row: ValidatedRow) -> Result<ResolvedRow, ValidationError> {
        let account = self.resolve_account(&row.account_raw, row.index)?;
        let category = match &row.category_raw {
            Some(raw) => Some(self.resolve_category(raw, row.index)?),
            None => None,
        };

        Ok(ResolvedRow {
            index: row.index,
            date: row.date,
            amount: row.amount,
            description: row.description,
            currency: row.currency,
            account,
            category,
        })
    }

    fn resolve_account(&mut self, raw: &str, row: RowIndex) -> Result<AccountId, ValidationError> {
        if let Some(id) = self.mapping.account(raw) {
            self.stats.mapping_hits += 1;
            return Ok(id);
        }
        if let Some(id) = self.accounts.get(&raw.to_string()) {
            self.stats.cache_hits += 1;
            return Ok(*id);
        }
        if let Some(id) = self.directory.lookup_account(raw) {
            self.stats.directory_hits += 1;
            self.accounts.insert(raw.to_string(), id);
            return Ok(id);
        }

        match self.policy {
            UnmappedPolicy::Create => match self.directory.create_account(raw) {
                Ok(id) => {
                    self.stats.created += 1;
                    self.accounts.insert(raw.to_string(), id);
                    Ok(id)
                }
                Err(_) => Err(ValidationError::new(
                    row,
                    Field::Account,
                    ValidationErrorKind::UnresolvedAccount,
                    raw,
                )),
            },
            UnmappedPolicy::Reject => Err(ValidationError::new(
                row,
                Field::Account,
                ValidationErrorKind::UnresolvedAccount,
                raw,
            )),
        }
    }

    fn resolve_category(
        &mut self,
        raw: &str,
        row: RowIndex,
    ) -> Result<CategoryId, ValidationError> {
        if let Some(id) = self.mapping.category(raw) {
            self.stats.mapping_hits += 1;
            return Ok(id);
        }
        if let Some(id) = self.categories.get(&raw.to_string()) {
            self.stats.cache_hits += 1;
            return Ok(*id);
        }
        if let Some(id) = self.directory.lookup_category(raw) {
            self.stats.directory_hits += 1;
            self.categories.insert(raw.to_string(), id);
            return Ok(id);
        }

        match self.policy {
            UnmappedPolicy::Create => match self.directory.create_category(raw) {
                Ok(id) => {
                    self.stats.created += 1;
                    self.categories.insert(raw.to_string(), id);
                    Ok(id)
                }
                Err(_) => Err(ValidationError::new(
                    row,
                    Field::Category,
                    ValidationErrorKind::UnresolvedCategory,
                    raw,
                )),
            },
            UnmappedPolicy::Reject => Err(ValidationError::new(
                row,
                Field::Category,
                ValidationErrorKind::UnresolvedCategory,
                raw,
            )),
        }
    }

    pub fn stats(&self) -> ResolverStats {
        self.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ImportError;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::Mutex;

    /// Directory stub that counts lookups and creations
    struct StubDirectory {
        existing_accounts: Mutex<HashMap<String, AccountId>>,
        lookups: AtomicU64,
        creations: AtomicU64,
        next_id: AtomicU64,
    }

    impl StubDirectory {
        fn new(existing: &[(&str, AccountId)]) -> Self {
            Self {
                existing_accounts: Mutex::new(
                    existing
                        .iter()
                        .map(|(name, id)| (name.to_string(), *id))
                        .collect(),
                ),
                lookups: AtomicU64::new(0),
                creations: AtomicU64::new(0),
                next_id: AtomicU64::new(100),
            }
        }
    }

    impl EntityDirectory for StubDirectory {
        fn lookup_account(&self, raw: &str) -> Option<AccountId> {
            self.lookups.fetch_add(1, Ordering::SeqCst);
            self.existing_accounts.lock().unwrap().get(raw).copied()
        }

        fn lookup_category(&self, _raw: &str) -> Option<CategoryId> {
            None
        }

        fn create_account(&self, raw: &str) -> Result<AccountId, ImportError> {
            self.creations.fetch_add(1, Ordering::SeqCst);
            let id = self.next_id.fetch_add(1, Ordering::SeqCst);
            self.existing_accounts
                .lock()
                .unwrap()
                .insert(raw.to_string(), id);
            Ok(id)
        }

        fn create_category(&self, _raw: &str) -> Result<CategoryId, ImportError> {
            Ok(1)
        }
    }

    fn validated(index: RowIndex, account: &str) -> ValidatedRow {
        ValidatedRow {
            index,
            date: NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(),
            amount: Decimal::new(1000, 2),
            description: "test".to_string(),
            currency: "USD".to_string(),
            account_raw: account.to_string(),
            category_raw: None,
        }
    }

    #[test]
    fn test_explicit_mapping_wins() {
        let directory = Arc::new(StubDirectory::new(&[("Checking", 99)]));
        let mut mapping = EntityMapping::new();
        mapping.map_account("Checking", 7);
        let mut resolver =
            EntityResolver::new(mapping, UnmappedPolicy::Reject, 8, directory.clone());

        let resolved = resolver.resolve(validated(1, "Checking")).unwrap();

        // The user's mapping beats the directory's own entry
        assert_eq!(resolved.account, 7);
        assert_eq!(directory.lookups.load(Ordering::SeqCst), 0);
        assert_eq!(resolver.stats().mapping_hits, 1);
    }

    #[test]
    fn test_directory_hit_is_cached_and_not_looked_up_twice() {
        let directory = Arc::new(StubDirectory::new(&[("Checking", 42)]));
        let mut resolver = EntityResolver::new(
            EntityMapping::new(),
            UnmappedPolicy::Reject,
            8,
            directory.clone(),
        );

        for i in 1..=5 {
            let resolved = resolver.resolve(validated(i, "Checking")).unwrap();
            assert_eq!(resolved.account, 42);
        }

        assert_eq!(directory.lookups.load(Ordering::SeqCst), 1);
        assert_eq!(resolver.stats().cache_hits, 4);
    }

    #[test]
    fn test_reject_policy_rejects_unknown_value() {
        let directory = Arc::new(StubDirectory::new(&[]));
        let mut resolver =
            EntityResolver::new(EntityMapping::new(), UnmappedPolicy::Reject, 8, directory);

        let error = resolver.resolve(validated(3, "Brokerage")).unwrap_err();

        assert_eq!(error.row, 3);
        assert_eq!(error.kind, ValidationErrorKind::UnresolvedAccount);
        assert_eq!(error.raw, "Brokerage");
    }

    #[test]
    fn test_create_policy_creates_once_then_caches() {
        let directory = Arc::new(StubDirectory::new(&[]));
        let mut resolver = EntityResolver::new(
            EntityMapping::new(),
            UnmappedPolicy::Create,
            8,
            directory.clone(),
        );

        let first = resolver.resolve(validated(1, "Brokerage")).unwrap();
        let second = resolver.resolve(validated(2, "Brokerage")).unwrap();

        assert_eq!(first.account, second.account);
        assert_eq!(directory.creations.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_eviction_causes_fresh_lookup() {
        let directory = Arc::new(StubDirectory::new(&[
            ("A", 1),
            ("B", 2),
            ("C", 3),
        ]));
        let mut resolver = EntityResolver::new(
            EntityMapping::new(),
            UnmappedPolicy::Reject,
            2,
            directory.clone(),
        );

        resolver.resolve(validated(1, "A")).unwrap();
        resolver.resolve(validated(2, "B")).unwrap();
        resolver.resolve(validated(3, "C")).unwrap(); // evicts A
        resolver.resolve(validated(4, "A")).unwrap(); // must hit the directory again

        assert_eq!(directory.lookups.load(Ordering::SeqCst), 4);
    }

    #[test]
    fn test_category_resolution_respects_policy() {
        let directory = Arc::new(StubDirectory::new(&[]));
        let mut resolver =
            EntityResolver::new(EntityMapping::new(), UnmappedPolicy::Reject, 8, directory);

        let mut row = validated(1, "Checking");
        row.category_raw = Some("Food".to_string());
        // Account fails first, so seed a mapping for it
        let mut mapping = EntityMapping::new();
        mapping.map_account("Checking", 1);
        resolver.mapping = mapping;

        let error = resolver.resolve(row).unwrap_err();
        assert_eq!(error.kind, ValidationErrorKind::UnresolvedCategory);
    }
}
