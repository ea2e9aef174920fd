//! Partial-update write envelopes.

use crate::JSON_ATTR_UPDATED_IN_DB_AT;
use serde::Serialize;
use serde_json::{Map, Value};
use tidesync_model::Entity;

/// A JSON:API write envelope for a single resource.
#[derive(Debug, Clone, Serialize)]
pub struct WriteEnvelope {
    /// The resource being written.
    pub data: WriteResource,
}

/// The resource object inside a write envelope.
#[derive(Debug, Clone, Serialize)]
pub struct WriteResource {
    /// JSON:API resource type.
    #[serde(rename = "type")]
    pub kind: String,
    /// Resource id; absent for creates.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Attribute values to write.
    pub attributes: Map<String, Value>,
}

/// Builds a minimal write payload for a dirty record: only its changed-field
/// names plus the concurrency stamp. Attributes with no current value
/// serialize as explicit `null` so a field can be cleared server-side.
pub fn partial_update(entity: &dyn Entity) -> WriteEnvelope {
    let mut attributes = Map::new();
    for field in entity.change_state().changed_fields() {
        attributes.insert(
            field.to_owned(),
            entity.attribute(field).unwrap_or(Value::Null),
        );
    }
    attributes.insert(
        JSON_ATTR_UPDATED_IN_DB_AT.to_owned(),
        entity
            .attribute(JSON_ATTR_UPDATED_IN_DB_AT)
            .unwrap_or(Value::Null),
    );

    WriteEnvelope {
        data: WriteResource {
            kind: entity.entity_type().to_owned(),
            id: entity.id().map(str::to_owned),
            attributes,
        },
    }
}
