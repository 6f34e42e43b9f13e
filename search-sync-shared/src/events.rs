//! Change events consumed from the authoritative entity store.
//!
//! The external transport delivers each event at least once, in order per
//! entity id, unordered across ids. This crate only defines the shape; the
//! engine consumes events read-only.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::entity::{EntitySnapshot, EntityType};

/// The lifecycle transition an event describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChangeType {
    Created,
    Updated,
    SoftDeleted,
    Restored,
    Deleted,
}

/// An opaque, monotonically increasing entity revision.
///
/// The engine only ever compares revisions for equality: an update that
/// keeps the revision unchanged carries a field delta instead of a new
/// snapshot version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Revision(pub u64);

/// One field touched by an update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldChange {
    /// The document field name (camelCase, as indexed).
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_value: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub old_value: Option<Value>,
}

impl FieldChange {
    pub fn new(name: impl Into<String>, new_value: Option<Value>) -> Self {
        Self {
            name: name.into(),
            new_value,
            old_value: None,
        }
    }
}

/// The per-field delta attached to an update event.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeDescription {
    #[serde(default)]
    pub fields_added: Vec<FieldChange>,
    #[serde(default)]
    pub fields_updated: Vec<FieldChange>,
    #[serde(default)]
    pub fields_deleted: Vec<FieldChange>,
}

impl ChangeDescription {
    pub fn is_empty(&self) -> bool {
        self.fields_added.is_empty()
            && self.fields_updated.is_empty()
            && self.fields_deleted.is_empty()
    }
}

/// A change to one entity in the authoritative store.
#[derive(Debug, Clone)]
pub struct EntityChangeEvent {
    pub entity_id: Uuid,
    pub entity_type: EntityType,
    pub change_type: ChangeType,
    pub entity: EntitySnapshot,
    pub previous_revision: Option<Revision>,
    pub current_revision: Revision,
    pub entity_fqn: String,
    pub change_description: Option<ChangeDescription>,
}

impl EntityChangeEvent {
    pub fn new(
        entity_type: EntityType,
        change_type: ChangeType,
        entity: EntitySnapshot,
        current_revision: Revision,
    ) -> Self {
        let entity_id = entity.id();
        let entity_fqn = entity
            .fully_qualified_name()
            .unwrap_or_else(|| entity.name())
            .to_string();
        Self {
            entity_id,
            entity_type,
            change_type,
            entity,
            previous_revision: None,
            current_revision,
            entity_fqn,
            change_description: None,
        }
    }

    pub fn with_previous_revision(mut self, revision: Revision) -> Self {
        self.previous_revision = Some(revision);
        self
    }

    pub fn with_change_description(mut self, change: ChangeDescription) -> Self {
        self.change_description = Some(change);
        self
    }

    /// True when the update did not bump the entity revision (an
    /// out-of-band event carrying only a field delta).
    pub fn is_revision_preserving(&self) -> bool {
        self.previous_revision == Some(self.current_revision)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::{EntityCore, Glossary};

    fn glossary_snapshot(name: &str) -> EntitySnapshot {
        EntitySnapshot::Glossary(Glossary {
            core: EntityCore::new(Uuid::new_v4(), name),
        })
    }

    #[test]
    fn test_revision_preserving_update() {
        let event = EntityChangeEvent::new(
            EntityType::Glossary,
            ChangeType::Updated,
            glossary_snapshot("business"),
            Revision(3),
        )
        .with_previous_revision(Revision(3));

        assert!(event.is_revision_preserving());
    }

    #[test]
    fn test_revision_bumping_update() {
        let event = EntityChangeEvent::new(
            EntityType::Glossary,
            ChangeType::Updated,
            glossary_snapshot("business"),
            Revision(4),
        )
        .with_previous_revision(Revision(3));

        assert!(!event.is_revision_preserving());
    }

    #[test]
    fn test_created_event_has_no_previous_revision() {
        let event = EntityChangeEvent::new(
            EntityType::Glossary,
            ChangeType::Created,
            glossary_snapshot("business"),
            Revision(1),
        );

        assert!(event.previous_revision.is_none());
        assert!(!event.is_revision_preserving());
        assert_eq!(event.entity_fqn, "business");
    }

    #[test]
    fn test_change_description_empty() {
        let mut change = ChangeDescription::default();
        assert!(change.is_empty());

        change
            .fields_updated
            .push(FieldChange::new("description", Some(Value::from("new"))));
        assert!(!change.is_empty());
    }
}
