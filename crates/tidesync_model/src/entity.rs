//! The contract every synced record implements.

use crate::change::ChangeState;
use serde_json::Value;
use std::any::Any;

/// A synced record as the engine sees it.
///
/// Concrete record types live outside the engine; this contract exposes the
/// identity, change bookkeeping, and declared relationship graph the merge
/// algorithm needs. Relationship recursion walks [`Entity::for_each_child`]
/// instead of runtime reflection, so every nested reference a record wants
/// merged must be declared there.
pub trait Entity: Any + Send + Sync {
    /// Stable identity, once known. Locally created records carry a
    /// client-generated id until the server acknowledges them.
    fn id(&self) -> Option<&str>;

    /// The store collection this record belongs to.
    fn entity_type(&self) -> &'static str;

    /// Change-tracking bookkeeping.
    fn change_state(&self) -> &ChangeState;

    /// Mutable change-tracking bookkeeping.
    fn change_state_mut(&mut self) -> &mut ChangeState;

    /// True for stubs created only to satisfy a relationship reference.
    fn is_placeholder(&self) -> bool {
        false
    }

    /// True if this snapshot may upgrade a persisted unresolved placeholder.
    fn replaces_placeholder(&self) -> bool {
        false
    }

    /// Copies the named field's value from another snapshot of the same
    /// concrete type, re-marking it changed on self. Marking only takes
    /// effect while tracking is enabled; see [`merge_changed_fields`].
    fn merge_changed_field(&mut self, source: &dyn Entity, field: &str);

    /// Carries forward attributes that never cross the wire, so they survive
    /// a full overwrite by a fetched record.
    fn merge_local_attributes(&mut self, _existing: &dyn Entity) {}

    /// Visits the declared relationship references and relationship lists.
    fn for_each_child(&mut self, _f: &mut dyn FnMut(&mut dyn Entity)) {}

    /// Current value of a declared wire attribute. `None` when `name` is not
    /// an attribute of this record; `Value::Null` when the attribute is
    /// explicitly unset.
    fn attribute(&self, _name: &str) -> Option<Value> {
        None
    }

    /// Whether the named field holds the same value in both snapshots. Used
    /// to clear change markers once a pushed write is confirmed.
    fn field_matches(&self, _other: &dyn Entity, _field: &str) -> bool {
        false
    }

    /// Replaces self with another snapshot of the same concrete type.
    fn assign_from(&mut self, other: &dyn Entity);

    /// Deep copy behind the object-safe contract.
    fn clone_entity(&self) -> Box<dyn Entity>;

    /// Upcast used by implementations to downcast peers.
    fn as_any(&self) -> &dyn Any;
}

impl Clone for Box<dyn Entity> {
    fn clone(&self) -> Self {
        self.clone_entity()
    }
}

/// Copies every field `source` recorded as changed onto `target`, re-marking
/// each as changed so the local edits keep shadowing server values until
/// they are pushed.
pub fn merge_changed_fields(target: &mut dyn Entity, source: &dyn Entity) {
    let fields: Vec<String> = source
        .change_state()
        .changed_fields()
        .map(str::to_owned)
        .collect();
    target.change_state_mut().set_tracking(true);
    for field in &fields {
        target.merge_changed_field(source, field);
    }
    target.change_state_mut().set_tracking(false);
}

/// Clears change markers on `target` for every field the pushed snapshot
/// recorded as changed whose current values still match, leaving markers for
/// fields edited again since the push.
pub fn clear_changed_matching(target: &mut dyn Entity, pushed: &dyn Entity) {
    let to_clear: Vec<String> = pushed
        .change_state()
        .changed_fields()
        .filter(|field| target.field_matches(pushed, field))
        .map(str::to_owned)
        .collect();
    for field in &to_clear {
        target.change_state_mut().clear_changed(field);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Default)]
    struct Note {
        id: Option<String>,
        title: Option<String>,
        body: Option<String>,
        change: ChangeState,
    }

    impl Note {
        fn set_title(&mut self, title: Option<String>) {
            if self.title != title {
                self.change.mark_changed("title");
            }
            self.title = title;
        }

        fn set_body(&mut self, body: Option<String>) {
            if self.body != body {
                self.change.mark_changed("body");
            }
            self.body = body;
        }
    }

    impl Entity for Note {
        fn id(&self) -> Option<&str> {
            self.id.as_deref()
        }

        fn entity_type(&self) -> &'static str {
            "notes"
        }

        fn change_state(&self) -> &ChangeState {
            &self.change
        }

        fn change_state_mut(&mut self) -> &mut ChangeState {
            &mut self.change
        }

        fn merge_changed_field(&mut self, source: &dyn Entity, field: &str) {
            let Some(source) = source.as_any().downcast_ref::<Self>() else {
                return;
            };
            match field {
                "title" => self.set_title(source.title.clone()),
                "body" => self.set_body(source.body.clone()),
                _ => {}
            }
        }

        fn field_matches(&self, other: &dyn Entity, field: &str) -> bool {
            let Some(other) = other.as_any().downcast_ref::<Self>() else {
                return false;
            };
            match field {
                "title" => self.title == other.title,
                "body" => self.body == other.body,
                _ => false,
            }
        }

        fn assign_from(&mut self, other: &dyn Entity) {
            if let Some(other) = other.as_any().downcast_ref::<Self>() {
                *self = other.clone();
            }
        }

        fn clone_entity(&self) -> Box<dyn Entity> {
            Box::new(self.clone())
        }

        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    fn dirty_note(title: &str) -> Note {
        let mut note = Note {
            id: Some("n1".into()),
            title: Some("server title".into()),
            body: Some("server body".into()),
            ..Note::default()
        };
        note.change.set_tracking(true);
        note.set_title(Some(title.into()));
        note.change.set_tracking(false);
        note
    }

    #[test]
    fn merge_copies_only_changed_fields() {
        let local = dirty_note("local edit");
        let mut incoming = Note {
            id: Some("n1".into()),
            title: Some("fresh title".into()),
            body: Some("fresh body".into()),
            ..Note::default()
        };

        merge_changed_fields(&mut incoming, &local);

        assert_eq!(incoming.title.as_deref(), Some("local edit"));
        assert_eq!(incoming.body.as_deref(), Some("fresh body"));
        // the copied field stays marked so a later push still carries it
        assert_eq!(
            incoming.change.changed_fields().collect::<Vec<_>>(),
            vec!["title"]
        );
        assert!(!incoming.change.is_tracking());
    }

    #[test]
    fn clear_matching_drops_confirmed_fields() {
        let pushed = dirty_note("pushed title");
        let mut persisted = dirty_note("pushed title");

        clear_changed_matching(&mut persisted, &pushed);
        assert!(!persisted.change.has_changed_fields());
    }

    #[test]
    fn clear_matching_keeps_reedited_fields() {
        let pushed = dirty_note("pushed title");
        let mut persisted = dirty_note("pushed title");
        // the user edited the field again while the push was in flight
        persisted.change.set_tracking(true);
        persisted.set_title(Some("newer edit".into()));
        persisted.change.set_tracking(false);

        clear_changed_matching(&mut persisted, &pushed);
        assert_eq!(
            persisted.change.changed_fields().collect::<Vec<_>>(),
            vec!["title"]
        );
    }

    #[test]
    fn boxed_entities_clone() {
        let note: Box<dyn Entity> = Box::new(dirty_note("a"));
        let copy = note.clone();
        assert_eq!(copy.id(), Some("n1"));
        assert!(copy.change_state().has_changed_fields());
    }
}
