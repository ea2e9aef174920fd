//! In-memory reference store.

use crate::error::{StoreError, StoreResult};
use crate::store::{LocalStore, StoreTransaction};
use parking_lot::RwLock;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use tidesync_model::{Entity, SyncStamp};

/// An in-memory [`LocalStore`] used in tests and as the reference
/// implementation for disk-backed stores.
///
/// Transactions buffer their writes and apply them only when the closure
/// succeeds, so observers never see a partially merged result. Reads take a
/// shared lock and proceed while no transaction is committing.
pub struct MemoryStore {
    unlocked: AtomicBool,
    inner: RwLock<Inner>,
}

#[derive(Default)]
struct Inner {
    records: HashMap<(String, String), Box<dyn Entity>>,
    stamps: HashMap<String, SyncStamp>,
}

enum Op {
    Upsert(Box<dyn Entity>),
    Delete { entity_type: String, id: String },
    PutStamp(SyncStamp),
}

impl MemoryStore {
    /// Creates an unlocked, empty store.
    pub fn new() -> Self {
        Self {
            unlocked: AtomicBool::new(true),
            inner: RwLock::new(Inner::default()),
        }
    }

    /// Marks the store locked; sync runs become silent no-ops.
    pub fn lock(&self) {
        self.unlocked.store(false, Ordering::SeqCst);
    }

    /// Marks the store unlocked.
    pub fn unlock(&self) {
        self.unlocked.store(true, Ordering::SeqCst);
    }

    /// Number of records across all collections.
    pub fn len(&self) -> usize {
        self.inner.read().records.len()
    }

    /// True if the store holds no records.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl Inner {
    fn apply(&mut self, op: Op) {
        match op {
            Op::Upsert(entity) => {
                if let Some(id) = entity.id() {
                    let key = (entity.entity_type().to_owned(), id.to_owned());
                    self.records.insert(key, entity);
                }
            }
            Op::Delete { entity_type, id } => {
                self.records.remove(&(entity_type, id));
            }
            Op::PutStamp(stamp) => {
                self.stamps.insert(stamp.id().to_owned(), stamp);
            }
        }
    }
}

impl LocalStore for MemoryStore {
    fn is_unlocked(&self) -> bool {
        self.unlocked.load(Ordering::SeqCst)
    }

    fn get(&self, entity_type: &str, id: &str) -> StoreResult<Option<Box<dyn Entity>>> {
        let inner = self.inner.read();
        Ok(inner
            .records
            .get(&(entity_type.to_owned(), id.to_owned()))
            .map(|entity| entity.clone_entity()))
    }

    fn find(
        &self,
        entity_type: &str,
        attribute: &str,
        value: &Value,
    ) -> StoreResult<Vec<Box<dyn Entity>>> {
        let inner = self.inner.read();
        Ok(inner
            .records
            .iter()
            .filter(|((kind, _), _)| kind == entity_type)
            .filter(|(_, entity)| entity.attribute(attribute).as_ref() == Some(value))
            .map(|(_, entity)| entity.clone_entity())
            .collect())
    }

    fn dirty(&self, entity_type: &str) -> StoreResult<Vec<Box<dyn Entity>>> {
        let inner = self.inner.read();
        Ok(inner
            .records
            .iter()
            .filter(|((kind, _), _)| kind == entity_type)
            .filter(|(_, entity)| entity.change_state().is_dirty())
            .map(|(_, entity)| entity.clone_entity())
            .collect())
    }

    fn stamp(&self, parts: &[&str]) -> StoreResult<SyncStamp> {
        let key = SyncStamp::key(parts);
        let inner = self.inner.read();
        Ok(inner
            .stamps
            .get(&key)
            .cloned()
            .unwrap_or_else(|| SyncStamp::new(parts)))
    }

    fn transaction(
        &self,
        f: &mut dyn FnMut(&mut dyn StoreTransaction) -> StoreResult<()>,
    ) -> StoreResult<()> {
        let mut inner = self.inner.write();
        let ops = {
            let mut txn = MemoryTransaction {
                base: &*inner,
                ops: Vec::new(),
            };
            f(&mut txn)?;
            txn.ops
        };
        for op in ops {
            inner.apply(op);
        }
        Ok(())
    }
}

struct MemoryTransaction<'a> {
    base: &'a Inner,
    ops: Vec<Op>,
}

impl StoreTransaction for MemoryTransaction<'_> {
    fn get(&self, entity_type: &str, id: &str) -> StoreResult<Option<Box<dyn Entity>>> {
        // buffered writes shadow the base map, last write wins
        for op in self.ops.iter().rev() {
            match op {
                Op::Upsert(entity)
                    if entity.entity_type() == entity_type && entity.id() == Some(id) =>
                {
                    return Ok(Some(entity.clone_entity()));
                }
                Op::Delete {
                    entity_type: kind,
                    id: deleted,
                } if kind == entity_type && deleted == id => {
                    return Ok(None);
                }
                _ => {}
            }
        }
        Ok(self
            .base
            .records
            .get(&(entity_type.to_owned(), id.to_owned()))
            .map(|entity| entity.clone_entity()))
    }

    fn upsert(&mut self, entity: Box<dyn Entity>) -> StoreResult<()> {
        if entity.id().is_none() {
            return Err(StoreError::aborted("record has no id"));
        }
        self.ops.push(Op::Upsert(entity));
        Ok(())
    }

    fn delete(&mut self, entity_type: &str, id: &str) -> StoreResult<()> {
        self.ops.push(Op::Delete {
            entity_type: entity_type.to_owned(),
            id: id.to_owned(),
        });
        Ok(())
    }

    fn put_stamp(&mut self, stamp: &SyncStamp) -> StoreResult<()> {
        self.ops.push(Op::PutStamp(stamp.clone()));
        Ok(())
    }
}
