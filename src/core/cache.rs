//! Bounded least-recently-used cache
//!
//! Backs entity resolution: entities referenced repeatedly throughout a large
//! file stay resident while one-off values are evicted, so memory stays
//! proportional to the configured capacity rather than to input size.
//!
//! # Complexity
//!
//! Lookups and insertions are O(1) amortized: a hash map indexes into a
//! slab of entries that are threaded onto an intrusive doubly-linked recency
//! list. A linear-scan recency order would degrade to O(n²) over a large
//! file, which is exactly what this structure exists to avoid.

use std::collections::HashMap;
use std::hash::Hash;

/// Sentinel for "no neighbor" in the intrusive list
const NIL: usize = usize::MAX;

/// One slab slot: key + value threaded onto the recency list
#[derive(Debug)]
struct Entry<K, V> {
    key: K,
    value: V,
    prev: usize,
    next: usize,
}

/// Fixed-capacity LRU map
///
/// `head` is the most recently used entry, `tail` the least recently used;
/// eviction always removes the tail.
#[derive(Debug)]
pub struct LruCache<K, V> {
    capacity: usize,
    map: HashMap<K, usize>,
    entries: Vec<Entry<K, V>>,
    head: usize,
    tail: usize,
}

impl<K: Eq + Hash + Clone, V> LruCache<K, V> {
    /// Create a cache that holds at most `capacity` entries
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero; a zero-capacity cache cannot satisfy
    /// its own contract.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "LruCache capacity must be at least 1");
        Self {
            capacity,
            map: HashMap::with_capacity(capacity),
            entries: Vec::with_capacity(capacity),
            head: NIL,
            tail: NIL,
        }
    }

    /// Number of entries currently cached
    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Configured maximum number of entries
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Whether a key is cached, without touching recency
    pub fn contains(&self, key: &K) -> bool {
        self.map.contains_key(key)
    }

    /// Look up a value and mark it as most recently used
    pub fn get(&mut self, key: &K) -> Option<&V> {
        let index = *self.map.get(key)?;
        self.detach(index);
        self.attach_front(index);
        Some(&self.entries[index].value)
    }

    /// Look up a value without touching recency
    pub fn peek(&self, key: &K) -> Option<&V> {
        let index = *self.map.get(key)?;
        Some(&self.entries[index].value)
    }

    /// Insert a key/value pair, returning the evicted entry if the cache was full
    ///
    /// Inserting an existing key updates its value and recency without
    /// evicting anything.
    pub fn insert(&mut self, key: K, value: V) -> Option<(K, V)> {
        if let Some(&index) = self.map.get(&key) {
            self.entries[index].value = value;
            self.detach(index);
            self.attach_front(index);
            return None;
        }

        if self.map.len() < self.capacity {
            let index = self.entries.len();
            self.entries.push(Entry {
                key: key.clone(),
                value,
                prev: NIL,
                next: NIL,
            });
            self.map.insert(key, index);
            self.attach_front(index);
            return None;
        }

        // Full: reuse the least-recently-used slot for the new entry
        let index = self.tail;
        self.detach(index);
        let old = std::mem::replace(
            &mut self.entries[index],
            Entry {
                key: key.clone(),
                value,
                prev: NIL,
                next: NIL,
            },
        );
        self.map.remove(&old.key);
        self.map.insert(key, index);
        self.attach_front(index);
        Some((old.key, old.value))
    }

    /// Unlink an entry from the recency list
    fn detach(&mut self, index: usize) {
        let (prev, next) = (self.entries[index].prev, self.entries[index].next);
        if prev != NIL {
            self.entries[prev].next = next;
        } else {
            self.head = next;
        }
        if next != NIL {
            self.entries[next].prev = prev;
        } else {
            self.tail = prev;
        }
        self.entries[index].prev = NIL;
        self.entries[index].next = NIL;
    }

    /// Link an entry in as most recently used
    fn attach_front(&mut self, index: usize) {
        self.entries[index].prev = NIL;
        self.entries[index].next = self.head;
        if self.head != NIL {
            self.entries[self.head].prev = index;
        }
        self.head = index;
        if self.tail == NIL {
            self.tail = index;
        }
    }

    /// Keys ordered most- to least-recently used (test/diagnostic helper)
    #[cfg(test)]
    fn recency_order(&self) -> Vec<K> {
        let mut keys = Vec::with_capacity(self.map.len());
        let mut index = self.head;
        while index != NIL {
            keys.push(self.entries[index].key.clone());
            index = self.entries[index].next;
        }
        keys
    }
}
