//! Change-tracking bookkeeping for offline edits.

use std::collections::BTreeSet;

/// Per-record bookkeeping for offline edits.
///
/// Every synced record embeds one of these. Editing code enables tracking,
/// mutates fields (each setter calling [`ChangeState::mark_changed`]), and
/// the resulting changed-field set drives partial updates and merge
/// protection until the server confirms the write.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeState {
    /// The record was created locally and has not been pushed yet.
    pub is_new: bool,
    /// The record was deleted locally and the deletion has not been pushed
    /// yet.
    pub is_deleted: bool,
    tracking: bool,
    changed_fields: BTreeSet<String>,
}

impl ChangeState {
    /// Creates a clean state with tracking disabled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates the state of a locally created record.
    pub fn new_record() -> Self {
        Self {
            is_new: true,
            ..Self::default()
        }
    }

    /// Enables or disables change tracking.
    pub fn set_tracking(&mut self, tracking: bool) {
        self.tracking = tracking;
    }

    /// Returns true while field changes are being recorded.
    pub fn is_tracking(&self) -> bool {
        self.tracking
    }

    /// Records a changed field. A field may only be marked while tracking is
    /// enabled; calls made outside a tracking window are ignored.
    pub fn mark_changed(&mut self, field: &str) {
        if self.tracking {
            self.changed_fields.insert(field.to_owned());
        }
    }

    /// Returns true if any field changes are pending.
    pub fn has_changed_fields(&self) -> bool {
        !self.changed_fields.is_empty()
    }

    /// Iterates the distinct changed field names.
    pub fn changed_fields(&self) -> impl Iterator<Item = &str> {
        self.changed_fields.iter().map(String::as_str)
    }

    /// Forgets a single changed field.
    pub fn clear_changed(&mut self, field: &str) {
        self.changed_fields.remove(field);
    }

    /// Forgets every changed field.
    pub fn clear_all_changed(&mut self) {
        self.changed_fields.clear();
    }

    /// Returns true if the record carries any unpushed local state.
    pub fn is_dirty(&self) -> bool {
        self.is_new || self.is_deleted || self.has_changed_fields()
    }
}
