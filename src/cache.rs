//! Memoization of select results.
//!
//! Results are keyed by a [Fingerprint] of the filter and of the full record
//! collection at query time. Any change to the records produces a new
//! fingerprint, so stale entries are never served; they simply stop being
//! reachable. Entries are never evicted.

use std::collections::HashMap;
use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::hash::{Hash, Hasher};

use tracing::debug;

use crate::query::Clause;
use crate::table::{Record, TableCollection};

/// Cache key derived from a filter and the data it runs against.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Fingerprint {
    /// Hash of every record, in storage order.
    data_hash: u64,
    /// Canonical form of the filter (clauses are sorted maps).
    filter: String,
}

impl Fingerprint {
    pub fn new(collection: &TableCollection, filter: Option<&Clause>) -> Self {
        let mut hasher = DefaultHasher::new();
        collection.records.hash(&mut hasher);

        Self {
            data_hash: hasher.finish(),
            filter: match filter {
                Some(clause) => format!("{clause:?}"),
                None => "*".to_string(),
            },
        }
    }

    pub fn data_hash(&self) -> u64 {
        self.data_hash
    }

    pub fn filter(&self) -> &str {
        &self.filter
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}:{}", self.data_hash, self.filter)
    }
}

/// Snapshot of the cache for inspection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub entries: usize,
    pub hits: u64,
    pub misses: u64,
    /// Fingerprints currently stored, sorted.
    pub keys: Vec<Fingerprint>,
}

/// Unbounded select-result cache.
///
/// One instance is meant to live as long as the [crate::Database] it is
/// handed to; it holds no reference to storage.
#[derive(Debug, Default)]
pub struct QueryCache {
    entries: HashMap<Fingerprint, Vec<Record>>,
    hits: u64,
    misses: u64,
}

impl QueryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached result for `(collection, filter)`, or runs
    /// `compute`, stores its result and returns it.
    pub fn get_or_compute<F>(&mut self, collection: &TableCollection, filter: Option<&Clause>, compute: F) -> Vec<Record>
    where
        F: FnOnce() -> Vec<Record>,
    {
        let key = Fingerprint::new(collection, filter);

        if let Some(rows) = self.entries.get(&key) {
            self.hits += 1;
            debug!(fingerprint = %key, rows = rows.len(), "query cache hit");
            return rows.clone();
        }

        self.misses += 1;
        let rows = compute();
        debug!(fingerprint = %key, rows = rows.len(), "query cache miss");
        self.entries.insert(key, rows.clone());
        rows
    }

    /// Drops every entry and resets the hit/miss counters.
    pub fn clear(&mut self) {
        debug!(entries = self.entries.len(), "clearing query cache");
        self.entries.clear();
        self.hits = 0;
        self.misses = 0;
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn stats(&self) -> CacheStats {
        let mut keys: Vec<Fingerprint> = self.entries.keys().cloned().collect();
        keys.sort();

        CacheStats {
            entries: self.entries.len(),
            hits: self.hits,
            misses: self.misses,
            keys,
        }
    }
}
