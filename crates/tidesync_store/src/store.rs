//! Store traits consumed by the sync engine.

use crate::error::StoreResult;
use serde_json::Value;
use tidesync_model::{Entity, SyncStamp};

/// The local persistent store, as seen by the sync engine.
///
/// The store is the single source of truth for the UI. The engine needs no
/// query capability beyond find-by-id, one index lookup, and delete;
/// anything richer stays behind this trait with the embedding application.
pub trait LocalStore: Send + Sync {
    /// False while the store is locked (e.g. pending an encryption unlock).
    /// Sync runs against a locked store are silent no-ops.
    fn is_unlocked(&self) -> bool;

    /// Looks up one record snapshot by collection and id.
    fn get(&self, entity_type: &str, id: &str) -> StoreResult<Option<Box<dyn Entity>>>;

    /// Returns every record in a collection whose indexed attribute equals
    /// `value`.
    fn find(
        &self,
        entity_type: &str,
        attribute: &str,
        value: &Value,
    ) -> StoreResult<Vec<Box<dyn Entity>>>;

    /// Returns every record in a collection carrying unpushed local state.
    fn dirty(&self, entity_type: &str) -> StoreResult<Vec<Box<dyn Entity>>>;

    /// Reads the staleness record for a composite key, defaulting to
    /// never-synced when absent.
    fn stamp(&self, parts: &[&str]) -> StoreResult<SyncStamp>;

    /// Runs `f` inside a write transaction. Writes apply atomically when `f`
    /// returns `Ok`; a failed closure leaves the store untouched.
    fn transaction(
        &self,
        f: &mut dyn FnMut(&mut dyn StoreTransaction) -> StoreResult<()>,
    ) -> StoreResult<()>;
}

/// One open write transaction against a [`LocalStore`].
pub trait StoreTransaction {
    /// Looks up one record, observing writes buffered in this transaction.
    fn get(&self, entity_type: &str, id: &str) -> StoreResult<Option<Box<dyn Entity>>>;

    /// Inserts or replaces a record.
    fn upsert(&mut self, entity: Box<dyn Entity>) -> StoreResult<()>;

    /// Deletes a record by collection and id.
    fn delete(&mut self, entity_type: &str, id: &str) -> StoreResult<()>;

    /// Writes a staleness record alongside the data it gates.
    fn put_stamp(&mut self, stamp: &SyncStamp) -> StoreResult<()>;
}
