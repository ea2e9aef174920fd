//! Sample synced records.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::{json, Value};
use std::any::Any;
use tidesync_api::JSON_ATTR_UPDATED_IN_DB_AT;
use tidesync_model::{ChangeState, Entity};
use uuid::Uuid;

/// Collection name for [`Contact`].
pub const CONTACT_TYPE: &str = "contacts";

/// Collection name for [`EmailAddress`].
pub const EMAIL_TYPE: &str = "email_addresses";

/// A contact record, the primary fixture entity.
///
/// Setters follow the tracking discipline: a field is only recorded as
/// changed while tracking is enabled on the embedded [`ChangeState`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Contact {
    /// Server id, or a client-generated id for unpushed records.
    #[serde(default)]
    pub id: Option<String>,
    /// Owning account.
    #[serde(default)]
    pub account_id: Option<String>,
    /// Display name.
    #[serde(default)]
    pub name: Option<String>,
    /// Monthly pledge amount.
    #[serde(default)]
    pub amount: Option<f64>,
    /// Concurrency stamp echoed back on partial updates.
    #[serde(default)]
    pub updated_in_db_at: Option<DateTime<Utc>>,
    /// Nested email addresses from the include graph.
    #[serde(default)]
    pub emails: Vec<EmailAddress>,
    /// Locally starred flag; never crosses the wire.
    #[serde(skip)]
    pub starred: bool,
    /// Placeholder marker for relationship stubs.
    #[serde(skip)]
    pub placeholder: bool,
    /// Whether this snapshot may upgrade a persisted placeholder.
    #[serde(skip)]
    pub replace_placeholder: bool,
    /// Change bookkeeping.
    #[serde(skip)]
    pub change: ChangeState,
}

impl Contact {
    /// Creates a locally new contact with a client-generated id.
    pub fn new_local(account_id: &str, name: &str) -> Self {
        Self {
            id: Some(Uuid::new_v4().to_string()),
            account_id: Some(account_id.to_owned()),
            name: Some(name.to_owned()),
            change: ChangeState::new_record(),
            ..Self::default()
        }
    }

    /// Creates a placeholder stub for a relationship reference.
    pub fn placeholder(id: &str) -> Self {
        Self {
            id: Some(id.to_owned()),
            placeholder: true,
            ..Self::default()
        }
    }

    /// Sets the name, recording the change while tracking is enabled.
    pub fn set_name(&mut self, name: Option<String>) {
        if self.name != name {
            self.change.mark_changed("name");
        }
        self.name = name;
    }

    /// Sets the amount, recording the change while tracking is enabled.
    pub fn set_amount(&mut self, amount: Option<f64>) {
        if self.amount != amount {
            self.change.mark_changed("amount");
        }
        self.amount = amount;
    }
}

impl Entity for Contact {
    fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    fn entity_type(&self) -> &'static str {
        CONTACT_TYPE
    }

    fn change_state(&self) -> &ChangeState {
        &self.change
    }

    fn change_state_mut(&mut self) -> &mut ChangeState {
        &mut self.change
    }

    fn is_placeholder(&self) -> bool {
        self.placeholder
    }

    fn replaces_placeholder(&self) -> bool {
        self.replace_placeholder
    }

    fn merge_changed_field(&mut self, source: &dyn Entity, field: &str) {
        let Some(source) = source.as_any().downcast_ref::<Self>() else {
            return;
        };
        match field {
            "name" => self.set_name(source.name.clone()),
            "amount" => self.set_amount(source.amount),
            _ => {}
        }
    }

    fn merge_local_attributes(&mut self, existing: &dyn Entity) {
        if let Some(existing) = existing.as_any().downcast_ref::<Self>() {
            self.starred = existing.starred;
        }
    }

    fn for_each_child(&mut self, f: &mut dyn FnMut(&mut dyn Entity)) {
        for email in &mut self.emails {
            f(email);
        }
    }

    fn attribute(&self, name: &str) -> Option<Value> {
        match name {
            "account_id" => Some(self.account_id.as_deref().map_or(Value::Null, |a| json!(a))),
            "name" => Some(self.name.as_deref().map_or(Value::Null, |n| json!(n))),
            "amount" => Some(self.amount.map_or(Value::Null, |a| json!(a))),
            JSON_ATTR_UPDATED_IN_DB_AT => {
                Some(self.updated_in_db_at.map_or(Value::Null, |at| json!(at)))
            }
            _ => None,
        }
    }

    fn field_matches(&self, other: &dyn Entity, field: &str) -> bool {
        let Some(other) = other.as_any().downcast_ref::<Self>() else {
            return false;
        };
        match field {
            "name" => self.name == other.name,
            "amount" => self.amount == other.amount,
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

/// An email address nested under a contact.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EmailAddress {
    /// Server id.
    #[serde(default)]
    pub id: Option<String>,
    /// The address itself.
    #[serde(default)]
    pub address: Option<String>,
    /// Whether this is the contact's primary address.
    #[serde(default)]
    pub primary: bool,
    /// Placeholder marker for relationship stubs.
    #[serde(skip)]
    pub placeholder: bool,
    /// Whether this snapshot may upgrade a persisted placeholder.
    #[serde(skip)]
    pub replace_placeholder: bool,
    /// Change bookkeeping.
    #[serde(skip)]
    pub change: ChangeState,
}

impl EmailAddress {
    /// Creates a placeholder stub for a relationship reference.
    pub fn placeholder(id: &str) -> Self {
        Self {
            id: Some(id.to_owned()),
            placeholder: true,
            ..Self::default()
        }
    }

    /// Sets the address, recording the change while tracking is enabled.
    pub fn set_address(&mut self, address: Option<String>) {
        if self.address != address {
            self.change.mark_changed("address");
        }
        self.address = address;
    }
}

impl Entity for EmailAddress {
    fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    fn entity_type(&self) -> &'static str {
        EMAIL_TYPE
    }

    fn change_state(&self) -> &ChangeState {
        &self.change
    }

    fn change_state_mut(&mut self) -> &mut ChangeState {
        &mut self.change
    }

    fn is_placeholder(&self) -> bool {
        self.placeholder
    }

    fn replaces_placeholder(&self) -> bool {
        self.replace_placeholder
    }

    fn merge_changed_field(&mut self, source: &dyn Entity, field: &str) {
        let Some(source) = source.as_any().downcast_ref::<Self>() else {
            return;
        };
        if field == "address" {
            self.set_address(source.address.clone());
        }
    }

    fn attribute(&self, name: &str) -> Option<Value> {
        match name {
            "address" => Some(self.address.as_deref().map_or(Value::Null, |a| json!(a))),
            "primary" => Some(json!(self.primary)),
            _ => None,
        }
    }

    fn field_matches(&self, other: &dyn Entity, field: &str) -> bool {
        let Some(other) = other.as_any().downcast_ref::<Self>() else {
            return false;
        };
        field == "address" && self.address == other.address
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn setters_respect_tracking() {
        let mut contact = Contact::default();
        contact.set_name(Some("Ada".into()));
        assert!(!contact.change.has_changed_fields());

        contact.change.set_tracking(true);
        contact.set_amount(Some(25.0));
        contact.change.set_tracking(false);
        assert_eq!(
            contact.change.changed_fields().collect::<Vec<_>>(),
            vec!["amount"]
        );
    }

    #[test]
    fn new_local_records_are_dirty() {
        let contact = Contact::new_local("a1", "Draft");
        assert!(contact.change.is_new);
        assert!(contact.change.is_dirty());
        assert!(contact.id.is_some());
    }

    #[test]
    fn deserializes_from_wire_shape() {
        let contact: Contact = serde_json::from_str(
            r#"{
                "id": "c1",
                "account_id": "a1",
                "name": "Ada",
                "amount": 25.0,
                "emails": [{"id": "e1", "address": "ada@example.com", "primary": true}]
            }"#,
        )
        .unwrap();

        assert_eq!(contact.id.as_deref(), Some("c1"));
        assert_eq!(contact.emails.len(), 1);
        assert!(!contact.change.is_dirty());
    }
}
