//! Invocation context.
//!
//! An [`Env`] wraps the host store for the duration of one operation. Reads go
//! straight to the committed state; writes and events are staged and only
//! reach the store when [`Env::commit`] applies them as a single batch. An
//! `Env` dropped without committing leaves the store untouched.

use crate::errors::{LedgerError, LedgerResult};
use crate::events::LedgerEvent;
use crate::storage::{KeyedStore, ScanIter};
use std::collections::BTreeMap;

pub struct Env<'a> {
    store: &'a mut dyn KeyedStore,
    writes: BTreeMap<Vec<u8>, Vec<u8>>,
    events: Vec<LedgerEvent>,
}

impl<'a> Env<'a> {
    pub fn new(store: &'a mut dyn KeyedStore) -> Self {
        Self {
            store,
            writes: BTreeMap::new(),
            events: Vec::new(),
        }
    }

    /// Run `op` in a fresh context and commit it if it succeeds.
    pub fn run<T>(
        store: &'a mut dyn KeyedStore,
        op: impl FnOnce(&mut Env<'a>) -> LedgerResult<T>,
    ) -> LedgerResult<(T, Vec<LedgerEvent>)> {
        let mut env = Env::new(store);
        let value = op(&mut env)?;
        let events = env.commit()?;
        Ok((value, events))
    }

    pub fn get(&self, key: &[u8]) -> LedgerResult<Option<Vec<u8>>> {
        self.store.get(key).map_err(LedgerError::StoreIo)
    }

    pub fn set(&mut self, key: Vec<u8>, value: Vec<u8>) {
        self.writes.insert(key, value);
    }

    pub fn scan(&self, prefix: &[u8]) -> LedgerResult<ScanIter<'_>> {
        self.store.scan(prefix).map_err(LedgerError::StoreIteration)
    }

    pub fn publish(&mut self, event: LedgerEvent) {
        self.events.push(event);
    }

    pub fn pending_writes(&self) -> usize {
        self.writes.len()
    }

    /// Apply every staged write as one batch and hand back the events.
    pub fn commit(self) -> LedgerResult<Vec<LedgerEvent>> {
        let Env {
            store,
            writes,
            events,
        } = self;
        if !writes.is_empty() {
            tracing::debug!(writes = writes.len(), events = events.len(), "committing");
            store
                .write_batch(writes.into_iter().collect())
                .map_err(LedgerError::StoreIo)?;
        }
        Ok(events)
    }
}
