//! Document builders: one per indexed entity type.
//!
//! Each builder is a pure function from a typed entity snapshot to the
//! flat index document, registered in a typed registry selected at
//! initialization. No two builders share mutable state.

mod assets;
mod governance;
mod people;
mod quality;
pub mod support;

use std::collections::HashMap;

use crate::errors::PipelineError;
use search_sync_shared::{EntitySnapshot, EntityType, IndexDocument};

pub use assets::{
    ContainerDocumentBuilder, DashboardDocumentBuilder, MlModelDocumentBuilder,
    PipelineDocumentBuilder, QueryDocumentBuilder, TableDocumentBuilder, TopicDocumentBuilder,
};
pub use governance::{
    DataProductDocumentBuilder, GlossaryTermDocumentBuilder, TagDocumentBuilder,
};
pub use people::{TeamDocumentBuilder, UserDocumentBuilder};
pub use quality::TestCaseDocumentBuilder;

/// Converts one entity type's snapshots into index documents.
///
/// Building is a pure function of the snapshot: applying a builder twice
/// to an unchanged snapshot produces byte-identical documents.
pub trait DocumentBuilder: Send + Sync {
    fn build(&self, snapshot: &EntitySnapshot) -> Result<IndexDocument, PipelineError>;
}

/// Typed registry mapping entity types to their builders, populated once
/// at initialization.
pub struct BuilderRegistry {
    builders: HashMap<EntityType, Box<dyn DocumentBuilder>>,
}

impl BuilderRegistry {
    pub fn new() -> Self {
        Self {
            builders: HashMap::new(),
        }
    }

    /// Registry covering every indexed entity type.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(EntityType::Table, Box::new(TableDocumentBuilder));
        registry.register(EntityType::Topic, Box::new(TopicDocumentBuilder));
        registry.register(EntityType::Dashboard, Box::new(DashboardDocumentBuilder));
        registry.register(EntityType::Pipeline, Box::new(PipelineDocumentBuilder));
        registry.register(EntityType::MlModel, Box::new(MlModelDocumentBuilder));
        registry.register(EntityType::Container, Box::new(ContainerDocumentBuilder));
        registry.register(EntityType::Query, Box::new(QueryDocumentBuilder));
        registry.register(EntityType::GlossaryTerm, Box::new(GlossaryTermDocumentBuilder));
        registry.register(EntityType::Tag, Box::new(TagDocumentBuilder));
        registry.register(EntityType::User, Box::new(UserDocumentBuilder));
        registry.register(EntityType::Team, Box::new(TeamDocumentBuilder));
        registry.register(EntityType::TestCase, Box::new(TestCaseDocumentBuilder));
        registry.register(EntityType::DataProduct, Box::new(DataProductDocumentBuilder));
        registry
    }

    pub fn register(&mut self, entity_type: EntityType, builder: Box<dyn DocumentBuilder>) {
        self.builders.insert(entity_type, builder);
    }

    /// Build a document for the given entity type.
    pub fn build(
        &self,
        entity_type: EntityType,
        snapshot: &EntitySnapshot,
    ) -> Result<IndexDocument, PipelineError> {
        let builder = self.builders.get(&entity_type).ok_or_else(|| {
            PipelineError::builder(format!("No document builder registered for {}", entity_type))
        })?;
        builder.build(snapshot)
    }
}

impl Default for BuilderRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

/// The standard mismatch error when a builder receives a foreign snapshot.
pub(crate) fn snapshot_mismatch(expected: EntityType) -> PipelineError {
    PipelineError::builder(format!("Snapshot does not match entity type {}", expected))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_registry_covers_all_indexed_types() {
        let registry = BuilderRegistry::with_defaults();
        for entity_type in EntityType::INDEXED {
            assert!(
                registry.builders.contains_key(&entity_type),
                "missing builder for {}",
                entity_type
            );
        }
    }

    #[test]
    fn test_unregistered_type_is_an_error() {
        let registry = BuilderRegistry::new();
        let snapshot = EntitySnapshot::Glossary(search_sync_shared::entity::Glossary {
            core: search_sync_shared::entity::EntityCore::new(uuid::Uuid::new_v4(), "g"),
        });

        let result = registry.build(EntityType::Glossary, &snapshot);
        assert!(matches!(result, Err(PipelineError::BuilderError(_))));
    }
}
