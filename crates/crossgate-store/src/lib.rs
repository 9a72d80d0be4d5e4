//! Crossgate Store - ordered key -> record tables
//!
//! Every persisted entity of the proxy is one `Table` keyed by a domain
//! value, optionally paired with `Index` maps for secondary lookup, plus
//! `Singleton` records and generic `Counters`. All state is explicitly
//! owned and injected into the pipeline; there are no ambient globals.
//!
//! # Invariants
//!
//! 1. Primary keys are unique; `insert` never overwrites
//! 2. Iteration order is the key order (lowerbound scans are cheap)
//! 3. Counters only move forward through `advance`

use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Debug;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from table mutation
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("Record already exists for key {0}")]
    DuplicateKey(String),

    #[error("Index entry already exists for key {0}")]
    DuplicateIndexKey(String),

    #[error("Singleton already initialized")]
    AlreadyInitialized,
}

pub type StoreResult<T> = Result<T, StoreError>;

/// A record stored under a primary key it derives from itself.
pub trait Record {
    type Key: Ord + Clone + Debug;

    fn primary_key(&self) -> Self::Key;
}

/// An ordered table of records keyed by their primary key.
#[derive(Debug, Clone)]
pub struct Table<R: Record> {
    rows: BTreeMap<R::Key, R>,
}

impl<R: Record> Default for Table<R> {
    fn default() -> Self {
        Self {
            rows: BTreeMap::new(),
        }
    }
}

impl<R: Record> Table<R> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn contains(&self, key: &R::Key) -> bool {
        self.rows.contains_key(key)
    }

    pub fn get(&self, key: &R::Key) -> Option<&R> {
        self.rows.get(key)
    }

    pub fn get_mut(&mut self, key: &R::Key) -> Option<&mut R> {
        self.rows.get_mut(key)
    }

    /// Insert a new record; duplicate keys are refused.
    pub fn insert(&mut self, record: R) -> StoreResult<()> {
        let key = record.primary_key();
        if self.rows.contains_key(&key) {
            return Err(StoreError::DuplicateKey(format!("{key:?}")));
        }
        self.rows.insert(key, record);
        Ok(())
    }

    /// Insert or replace.
    pub fn upsert(&mut self, record: R) {
        self.rows.insert(record.primary_key(), record);
    }

    pub fn remove(&mut self, key: &R::Key) -> Option<R> {
        self.rows.remove(key)
    }

    /// The record with the smallest key, if any.
    pub fn first(&self) -> Option<&R> {
        self.rows.values().next()
    }

    /// Remove and return the record with the smallest key.
    pub fn pop_first(&mut self) -> Option<R> {
        let key = self.rows.keys().next().cloned()?;
        self.rows.remove(&key)
    }

    pub fn iter(&self) -> impl Iterator<Item = &R> {
        self.rows.values()
    }

    pub fn keys(&self) -> impl Iterator<Item = &R::Key> {
        self.rows.keys()
    }
}

/// A unique secondary index mapping an alternate key to a primary key.
#[derive(Debug, Clone)]
pub struct Index<I: Ord + Clone + Debug, K: Clone> {
    map: BTreeMap<I, K>,
}

impl<I: Ord + Clone + Debug, K: Clone> Default for Index<I, K> {
    fn default() -> Self {
        Self {
            map: BTreeMap::new(),
        }
    }
}

impl<I: Ord + Clone + Debug, K: Clone> Index<I, K> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, index_key: &I) -> bool {
        self.map.contains_key(index_key)
    }

    pub fn get(&self, index_key: &I) -> Option<&K> {
        self.map.get(index_key)
    }

    /// Bind an index key to a primary key; rebinding is refused.
    pub fn insert(&mut self, index_key: I, primary: K) -> StoreResult<()> {
        if self.map.contains_key(&index_key) {
            return Err(StoreError::DuplicateIndexKey(format!("{index_key:?}")));
        }
        self.map.insert(index_key, primary);
        Ok(())
    }

    pub fn remove(&mut self, index_key: &I) -> Option<K> {
        self.map.remove(index_key)
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

/// A non-unique secondary index mapping an alternate key to primary keys.
#[derive(Debug, Clone)]
pub struct MultiIndex<I: Ord + Clone + Debug, K: Ord + Clone> {
    map: BTreeMap<I, BTreeSet<K>>,
}

impl<I: Ord + Clone + Debug, K: Ord + Clone> Default for MultiIndex<I, K> {
    fn default() -> Self {
        Self {
            map: BTreeMap::new(),
        }
    }
}

impl<I: Ord + Clone + Debug, K: Ord + Clone> MultiIndex<I, K> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, index_key: I, primary: K) {
        self.map.entry(index_key).or_default().insert(primary);
    }

    pub fn remove(&mut self, index_key: &I, primary: &K) {
        if let Some(set) = self.map.get_mut(index_key) {
            set.remove(primary);
            if set.is_empty() {
                self.map.remove(index_key);
            }
        }
    }

    pub fn get(&self, index_key: &I) -> impl Iterator<Item = &K> {
        self.map.get(index_key).into_iter().flatten()
    }

    pub fn contains(&self, index_key: &I) -> bool {
        self.map.contains_key(index_key)
    }
}

/// A single optional record, e.g. the account cache.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Singleton<T> {
    value: Option<T>,
}

// Manual impl: the record type itself need not be Default to start empty.
impl<T> Default for Singleton<T> {
    fn default() -> Self {
        Self { value: None }
    }
}

impl<T> Singleton<T> {
    pub fn new() -> Self {
        Self { value: None }
    }

    pub fn is_initialized(&self) -> bool {
        self.value.is_some()
    }

    pub fn get(&self) -> Option<&T> {
        self.value.as_ref()
    }

    pub fn get_mut(&mut self) -> Option<&mut T> {
        self.value.as_mut()
    }

    /// First write; fails if already set.
    pub fn initialize(&mut self, value: T) -> StoreResult<()> {
        if self.value.is_some() {
            return Err(StoreError::AlreadyInitialized);
        }
        self.value = Some(value);
        Ok(())
    }

    pub fn set(&mut self, value: T) {
        self.value = Some(value);
    }
}

/// A generic keyed counter record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Counter {
    pub key: u64,
    pub count: u64,
}

impl Record for Counter {
    type Key = u64;

    fn primary_key(&self) -> u64 {
        self.key
    }
}

/// Monotonic counters keyed by small integers.
#[derive(Debug, Clone, Default)]
pub struct Counters {
    table: Table<Counter>,
}

impl Counters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: u64) -> Option<u64> {
        self.table.get(&key).map(|c| c.count)
    }

    /// Read the counter, seeding it with `seed` on first access.
    pub fn read_or_seed(&mut self, key: u64, seed: u64) -> u64 {
        if let Some(counter) = self.table.get(&key) {
            return counter.count;
        }
        self.table.upsert(Counter { key, count: seed });
        seed
    }

    /// Advance the counter by one, seeding it with `seed` when absent.
    /// Returns the stored value.
    pub fn advance(&mut self, key: u64, seed: u64) -> u64 {
        match self.table.get_mut(&key) {
            Some(counter) => {
                counter.count += 1;
                counter.count
            }
            None => {
                self.table.upsert(Counter { key, count: seed });
                seed
            }
        }
    }
}
