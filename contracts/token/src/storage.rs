//! Keyed record store consumed by the ledger.
//!
//! The ledger only needs point reads, point writes and an ordered prefix scan.
//! Hosts plug in their own engine by implementing [`KeyedStore`]; [`MemoryStore`]
//! is the in-process implementation used by the server and the tests.

use std::collections::BTreeMap;
use thiserror::Error;

/// Failures reported by a store backend.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("Backend error: {0}")]
    Backend(String),

    #[error("Corrupt record at {key}: {details}")]
    Corrupt { key: String, details: String },
}

pub type StoreResult<T> = Result<T, StoreError>;

/// A single `(key, value)` pair yielded by [`KeyedStore::scan`].
pub type Entry = (Vec<u8>, Vec<u8>);

/// Lazy, ordered iterator over the entries under a prefix.
pub type ScanIter<'a> = Box<dyn Iterator<Item = StoreResult<Entry>> + 'a>;

pub trait KeyedStore {
    /// Read a value. `Ok(None)` when the key was never written.
    fn get(&self, key: &[u8]) -> StoreResult<Option<Vec<u8>>>;

    /// Overwrite a value.
    fn put(&mut self, key: &[u8], value: &[u8]) -> StoreResult<()>;

    /// Iterate every entry whose key starts with `prefix`.
    ///
    /// Implementations must yield keys in a stable order (lexicographic byte order
    /// for ordered engines) so that repeated scans over the same state agree.
    fn scan(&self, prefix: &[u8]) -> StoreResult<ScanIter<'_>>;

    /// Apply a set of writes in order and atomically.
    ///
    /// On `Err` none of the entries may be visible to later reads. Every ledger
    /// operation commits through this call, so an engine that can only fail
    /// half-way must stage the batch and publish it in one step.
    fn write_batch(&mut self, batch: Vec<Entry>) -> StoreResult<()>;
}

// ── In-memory engine ──────────────────────────────────────────────────────────

/// Ordered in-memory store. Keys sort lexicographically by bytes, which gives
/// composite keys prefix locality.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: BTreeMap<Vec<u8>, Vec<u8>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl KeyedStore for MemoryStore {
    fn get(&self, key: &[u8]) -> StoreResult<Option<Vec<u8>>> {
        Ok(self.entries.get(key).cloned())
    }

    fn put(&mut self, key: &[u8], value: &[u8]) -> StoreResult<()> {
        self.entries.insert(key.to_vec(), value.to_vec());
        Ok(())
    }

    fn scan(&self, prefix: &[u8]) -> StoreResult<ScanIter<'_>> {
        let prefix = prefix.to_vec();
        let iter = self
            .entries
            .range(prefix.clone()..)
            .take_while(move |(key, _)| key.starts_with(&prefix))
            .map(|(key, value)| Ok((key.clone(), value.clone())));
        Ok(Box::new(iter))
    }

    fn write_batch(&mut self, batch: Vec<Entry>) -> StoreResult<()> {
        // Puts on a BTreeMap cannot fail, so the batch is all-or-nothing.
        self.entries.extend(batch);
        Ok(())
    }
}
