//! Merging fetched state into the local store.

use std::collections::HashMap;
use tidesync_model::{merge_changed_fields, Entity};
use tidesync_store::{StoreResult, StoreTransaction};

/// Default bound for recursive relationship merges; doubles as the cycle
/// guard for relationship graphs that loop back on themselves.
pub const DEFAULT_MERGE_DEPTH: usize = 4;

/// Previously persisted snapshots by id, built before a sync run and
/// drained as incoming records are matched. Whatever remains afterwards is
/// an orphan for that scope.
#[derive(Default)]
pub struct ExistingIndex {
    items: HashMap<String, Box<dyn Entity>>,
}

impl ExistingIndex {
    /// Creates an empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds an index from persisted snapshots; records without an id are
    /// skipped.
    pub fn from_entities(entities: impl IntoIterator<Item = Box<dyn Entity>>) -> Self {
        let mut index = Self::new();
        for entity in entities {
            index.insert(entity);
        }
        index
    }

    /// Adds one snapshot keyed by its id.
    pub fn insert(&mut self, entity: Box<dyn Entity>) {
        if let Some(id) = entity.id() {
            let id = id.to_owned();
            self.items.insert(id, entity);
        }
    }

    /// Looks up a snapshot by id.
    pub fn get(&self, id: &str) -> Option<&dyn Entity> {
        self.items.get(id).map(|entity| &**entity)
    }

    /// Removes a snapshot by id.
    pub fn remove(&mut self, id: &str) -> Option<Box<dyn Entity>> {
        self.items.remove(id)
    }

    /// Number of snapshots still unmatched.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// True when every snapshot was matched.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    fn drain(&mut self) -> Vec<Box<dyn Entity>> {
        self.items.drain().map(|(_, entity)| entity).collect()
    }
}

/// The merge algorithm combining locally edited and freshly fetched state.
///
/// Orphan cleanup is explicit per-resource configuration: it must stay off
/// for filtered fetches that cover only a subset of a scope, and should be
/// enabled only when the fetch is authoritative for the whole
/// [`ExistingIndex`] handed in.
#[derive(Debug, Clone)]
pub struct Reconciler {
    max_depth: usize,
    orphan_cleanup: bool,
}

impl Reconciler {
    /// Creates a reconciler with the default depth bound and orphan cleanup
    /// disabled.
    pub fn new() -> Self {
        Self {
            max_depth: DEFAULT_MERGE_DEPTH,
            orphan_cleanup: false,
        }
    }

    /// Sets the recursive merge depth bound.
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Opts into deleting orphans after an error-free authoritative fetch.
    pub fn with_orphan_cleanup(mut self, enabled: bool) -> Self {
        self.orphan_cleanup = enabled;
        self
    }

    /// Merges incoming records into the store.
    ///
    /// Returns the clean flag: false if any record was skipped because its
    /// persisted version is locally deleted. Orphans left in `existing` are
    /// deleted only when cleanup was opted into and `fetch_had_errors` is
    /// false; locally created records that have not been pushed yet are
    /// never deleted.
    pub fn save_all(
        &self,
        txn: &mut dyn StoreTransaction,
        incoming: Vec<Box<dyn Entity>>,
        existing: &mut ExistingIndex,
        fetch_had_errors: bool,
    ) -> StoreResult<bool> {
        let mut clean = true;

        for entity in incoming {
            if !self.save_entity(txn, entity, existing)? {
                clean = false;
            }
        }

        if self.orphan_cleanup && !fetch_had_errors {
            delete_orphans(txn, existing.drain())?;
        }

        Ok(clean)
    }

    /// Merges a single record with no orphan bookkeeping.
    pub fn save_one(
        &self,
        txn: &mut dyn StoreTransaction,
        entity: Box<dyn Entity>,
    ) -> StoreResult<bool> {
        let mut index = ExistingIndex::new();
        self.save_entity(txn, entity, &mut index)
    }

    fn save_entity(
        &self,
        txn: &mut dyn StoreTransaction,
        entity: Box<dyn Entity>,
        existing: &mut ExistingIndex,
    ) -> StoreResult<bool> {
        let id = entity.id().map(str::to_owned);

        // a refresh must never resurrect a record deleted locally but not
        // pushed yet
        if let Some(id) = &id {
            let deleted_locally = match existing.get(id) {
                Some(persisted) => persisted.change_state().is_deleted,
                None => txn
                    .get(entity.entity_type(), id)?
                    .is_some_and(|persisted| persisted.change_state().is_deleted),
            };
            if deleted_locally {
                existing.remove(id);
                return Ok(false);
            }
        }

        let merged = self.merge_with_existing(txn, entity, self.max_depth)?;
        txn.upsert(merged)?;
        if let Some(id) = &id {
            existing.remove(id);
        }
        Ok(true)
    }

    fn merge_with_existing(
        &self,
        txn: &mut dyn StoreTransaction,
        mut entity: Box<dyn Entity>,
        depth: usize,
    ) -> StoreResult<Box<dyn Entity>> {
        let persisted = match entity.id() {
            Some(id) => txn.get(entity.entity_type(), id)?,
            None => None,
        };

        if let Some(persisted) = persisted {
            // placeholder stubs never clobber a resolved record
            if entity.is_placeholder()
                && (!entity.replaces_placeholder() || !persisted.is_placeholder())
            {
                return Ok(persisted);
            }
            if persisted.change_state().is_deleted {
                return Ok(persisted);
            }
            if persisted.change_state().has_changed_fields() {
                // locally edited fields shadow the server's values
                merge_changed_fields(&mut *entity, &*persisted);
            }
            entity.merge_local_attributes(&*persisted);
        }

        if depth > 0 {
            self.merge_children(txn, &mut *entity, depth - 1)?;
        }

        Ok(entity)
    }

    fn merge_children(
        &self,
        txn: &mut dyn StoreTransaction,
        entity: &mut dyn Entity,
        depth: usize,
    ) -> StoreResult<()> {
        let mut failure = None;
        entity.for_each_child(&mut |child| {
            if failure.is_some() {
                return;
            }
            match self.merge_with_existing(txn, child.clone_entity(), depth) {
                Ok(merged) => child.assign_from(&*merged),
                Err(error) => failure = Some(error),
            }
        });
        match failure {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

impl Default for Reconciler {
    fn default() -> Self {
        Self::new()
    }
}

/// Deletes previously persisted records absent from an authoritative fetch,
/// keeping locally created records the server does not know about yet
/// (unless they were also deleted locally).
pub fn delete_orphans(
    txn: &mut dyn StoreTransaction,
    orphans: impl IntoIterator<Item = Box<dyn Entity>>,
) -> StoreResult<()> {
    for orphan in orphans {
        let state = orphan.change_state();
        if state.is_new && !state.is_deleted {
            continue;
        }
        if let Some(id) = orphan.id() {
            txn.delete(orphan.entity_type(), id)?;
        }
    }
    Ok(())
}
