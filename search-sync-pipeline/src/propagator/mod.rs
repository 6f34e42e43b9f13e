//! Change propagator: decides the index operation(s) for each entity
//! change event.
//!
//! The propagator never reads a document before writing. Single-document
//! work goes through upserts, scripted merges and flag flips; relationship
//! cascades go through server-side query-scoped operations, except the
//! per-document tag removal which runs through the batch reindexer.

pub mod delta;

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::builders::BuilderRegistry;
use crate::errors::PipelineError;
use crate::propagator::delta::delta_patch;
use crate::reindexer::BatchReindexer;
use search_sync_repository::{
    DocumentFilter, DocumentPatch, DocumentScript, SearchStoreClient,
};
use search_sync_shared::{
    ChangeType, EntityChangeEvent, EntitySnapshot, EntityType, IndexDocument,
};
use serde_json::json;

/// Propagates entity change events into the search store.
pub struct ChangePropagator {
    store: Arc<dyn SearchStoreClient>,
    builders: BuilderRegistry,
    reindexer: BatchReindexer,
}

impl ChangePropagator {
    pub fn new(store: Arc<dyn SearchStoreClient>) -> Self {
        Self {
            reindexer: BatchReindexer::new(store.clone()),
            builders: BuilderRegistry::with_defaults(),
            store,
        }
    }

    /// Entry point for data assets and their parents (services, databases,
    /// schemas, glossaries, test suites).
    pub async fn on_entity_changed(&self, event: &EntityChangeEvent) -> Result<(), PipelineError> {
        match event.entity_type {
            entity_type if entity_type.is_service() => self.cascade_service(event).await,
            EntityType::Database => {
                self.cascade_parent(event, EntityType::Table, "database.id").await
            }
            EntityType::DatabaseSchema => {
                self.cascade_parent(event, EntityType::Table, "databaseSchema.id")
                    .await
            }
            EntityType::Glossary => self.cascade_glossary(event).await,
            EntityType::TestSuite => self.cascade_test_suite(event).await,
            EntityType::GlossaryTerm => self.apply_glossary_term(event).await,
            EntityType::TestCase => self.apply_test_case(event).await,
            EntityType::User | EntityType::Team => self.on_user_changed(event).await,
            EntityType::Tag => self.on_tag_changed(event).await,
            EntityType::Classification => self.on_classification_changed(event).await,
            EntityType::Domain => self.on_domain_changed(event).await,
            _ => self.apply_document_lifecycle(event).await,
        }
    }

    /// Entry point for users and teams. Updates always rebuild the full
    /// document; there is no field-delta path for people entities.
    pub async fn on_user_changed(&self, event: &EntityChangeEvent) -> Result<(), PipelineError> {
        let Some(index) = event.entity_type.index_name() else {
            warn!(entity_type = %event.entity_type, "Unexpected entity family for user handler");
            return Ok(());
        };

        match event.change_type {
            ChangeType::Created => {
                let Some(document) = self.build_document(event)? else {
                    return Ok(());
                };
                self.store.upsert(index, &event.entity_id, &document).await?;
            }
            ChangeType::Updated => {
                let Some(document) = self.build_document(event)? else {
                    return Ok(());
                };
                let patch = DocumentPatch::from_document(&document);
                self.store
                    .scripted_upsert(index, &event.entity_id, &patch)
                    .await?;
            }
            ChangeType::SoftDeleted => {
                self.store
                    .flag_update(index, &event.entity_id, "deleted", true)
                    .await?;
            }
            ChangeType::Restored => {
                self.store
                    .flag_update(index, &event.entity_id, "deleted", false)
                    .await?;
            }
            ChangeType::Deleted => {
                self.store.delete_document(index, &event.entity_id).await?;
            }
        }
        Ok(())
    }

    /// Entry point for tags. Deleting a tag removes its own document, then
    /// runs the per-document batch correction stripping the label from
    /// every referencing document.
    pub async fn on_tag_changed(&self, event: &EntityChangeEvent) -> Result<(), PipelineError> {
        if event.change_type != ChangeType::Deleted {
            return self.apply_document_lifecycle(event).await;
        }

        let index = index_for(EntityType::Tag);
        self.store.delete_document(index, &event.entity_id).await?;

        let summary = self.reindexer.remove_tag_label(&event.entity_fqn).await?;
        info!(
            tag_fqn = %event.entity_fqn,
            pages = summary.pages,
            updated = summary.updated,
            "Removed deleted tag from referencing documents"
        );
        Ok(())
    }

    /// Entry point for classifications. Deletion purges the classification's
    /// tags from the tag index by wildcard FQN; entities referencing those
    /// tags are corrected out of band. Updates mirror the disabled flag
    /// onto the classification's tags in one query-scoped operation.
    pub async fn on_classification_changed(
        &self,
        event: &EntityChangeEvent,
    ) -> Result<(), PipelineError> {
        let index = index_for(EntityType::Tag);
        match event.change_type {
            ChangeType::Deleted => {
                let pattern = format!("{}.*", event.entity.name());
                self.store
                    .delete_by_query(index, &DocumentFilter::wildcard("fullyQualifiedName", pattern))
                    .await?;
            }
            ChangeType::Updated => {
                let EntitySnapshot::Classification(classification) = &event.entity else {
                    warn!(entity_id = %event.entity_id, "Classification event without classification snapshot, skipping");
                    return Ok(());
                };
                let filter = DocumentFilter::term("classification.id", event.entity_id.to_string());
                let patch = DocumentPatch::new().set("disabled", json!(classification.disabled));
                self.store
                    .update_by_query(index, &filter, &DocumentScript::SetFields(patch))
                    .await?;
            }
            _ => {
                debug!(entity_id = %event.entity_id, change_type = ?event.change_type, "No index work for classification event");
            }
        }
        Ok(())
    }

    /// Entry point for domains: lifecycle events fan out to the domain's
    /// data products.
    pub async fn on_domain_changed(&self, event: &EntityChangeEvent) -> Result<(), PipelineError> {
        let index = index_for(EntityType::DataProduct);
        let filter = DocumentFilter::term("domain.id", event.entity_id.to_string());
        match event.change_type {
            ChangeType::Deleted => self.store.delete_by_query(index, &filter).await?,
            ChangeType::SoftDeleted => self.flag_children(index, &filter, true).await?,
            ChangeType::Restored => self.flag_children(index, &filter, false).await?,
            _ => {
                debug!(entity_id = %event.entity_id, change_type = ?event.change_type, "No index work for domain event");
            }
        }
        Ok(())
    }

    /// The single-document state machine shared by all indexed types.
    async fn apply_document_lifecycle(
        &self,
        event: &EntityChangeEvent,
    ) -> Result<(), PipelineError> {
        let Some(index) = event.entity_type.index_name() else {
            warn!(entity_type = %event.entity_type, "No index for entity type, skipping event");
            return Ok(());
        };

        match event.change_type {
            ChangeType::Created => {
                let Some(document) = self.build_document(event)? else {
                    return Ok(());
                };
                self.store.upsert(index, &event.entity_id, &document).await?;
            }
            ChangeType::Updated => {
                if event.is_revision_preserving() {
                    // Out-of-band event: merge only the changed keys.
                    let patch = event
                        .change_description
                        .as_ref()
                        .map(delta_patch)
                        .unwrap_or_default();
                    if patch.is_empty() {
                        debug!(entity_id = %event.entity_id, "Revision-preserving update with empty delta, nothing to do");
                        return Ok(());
                    }
                    self.store
                        .scripted_upsert(index, &event.entity_id, &patch)
                        .await?;
                } else {
                    // Rebuild, but merge by key so concurrently-written
                    // derived fields survive.
                    let Some(document) = self.build_document(event)? else {
                        return Ok(());
                    };
                    let patch = DocumentPatch::from_document(&document);
                    self.store
                        .scripted_upsert(index, &event.entity_id, &patch)
                        .await?;
                }
            }
            ChangeType::SoftDeleted => {
                self.store
                    .flag_update(index, &event.entity_id, "deleted", true)
                    .await?;
            }
            ChangeType::Restored => {
                self.store
                    .flag_update(index, &event.entity_id, "deleted", false)
                    .await?;
            }
            ChangeType::Deleted => {
                self.store.delete_document(index, &event.entity_id).await?;
            }
        }
        Ok(())
    }

    /// Glossary terms delete by id-or-parent-id so documents about the
    /// term's children go with it; everything else is the standard
    /// lifecycle.
    async fn apply_glossary_term(&self, event: &EntityChangeEvent) -> Result<(), PipelineError> {
        if event.change_type != ChangeType::Deleted {
            return self.apply_document_lifecycle(event).await;
        }

        let index = index_for(EntityType::GlossaryTerm);
        self.store
            .delete_by_query(index, &DocumentFilter::id_or_parent(event.entity_id))
            .await?;
        Ok(())
    }

    /// Test cases branch on the owning suite's executable flag at deletion:
    /// executable suites own their cases (delete the document), logical
    /// suites only reference them (drop the suite entry, keep the
    /// document).
    async fn apply_test_case(&self, event: &EntityChangeEvent) -> Result<(), PipelineError> {
        if event.change_type != ChangeType::Deleted {
            return self.apply_document_lifecycle(event).await;
        }

        let EntitySnapshot::TestCase(test_case) = &event.entity else {
            warn!(entity_id = %event.entity_id, "Test case event without test case snapshot, skipping");
            return Ok(());
        };
        let index = index_for(EntityType::TestCase);

        let Some(suite) = &test_case.test_suite else {
            self.store.delete_document(index, &event.entity_id).await?;
            return Ok(());
        };

        if suite.executable {
            self.store.delete_document(index, &event.entity_id).await?;
        } else {
            let remaining: Vec<_> = test_case
                .test_suites
                .iter()
                .filter(|entry| entry.id != suite.id)
                .collect();
            let patch = DocumentPatch::new().set("testSuites", json!(remaining));
            self.store
                .scripted_upsert(index, &event.entity_id, &patch)
                .await?;
        }
        Ok(())
    }

    /// Service lifecycle fans out to every dependent document by
    /// `service.id` in one server-side operation per event.
    async fn cascade_service(&self, event: &EntityChangeEvent) -> Result<(), PipelineError> {
        let Some(index) = event.entity_type.service_child_index() else {
            warn!(entity_type = %event.entity_type, "Service type without child index, skipping");
            return Ok(());
        };
        let filter = DocumentFilter::term("service.id", event.entity_id.to_string());

        match event.change_type {
            ChangeType::Deleted => self.store.delete_by_query(index, &filter).await?,
            ChangeType::SoftDeleted => self.flag_children(index, &filter, true).await?,
            ChangeType::Restored => self.flag_children(index, &filter, false).await?,
            _ => {
                debug!(entity_id = %event.entity_id, change_type = ?event.change_type, "No index work for service event");
            }
        }
        Ok(())
    }

    /// Database and schema lifecycle cascades onto the table index by the
    /// parent id field.
    async fn cascade_parent(
        &self,
        event: &EntityChangeEvent,
        child_type: EntityType,
        parent_field: &str,
    ) -> Result<(), PipelineError> {
        let index = index_for(child_type);
        let filter = DocumentFilter::term(parent_field, event.entity_id.to_string());

        match event.change_type {
            ChangeType::Deleted => self.store.delete_by_query(index, &filter).await?,
            ChangeType::SoftDeleted => self.flag_children(index, &filter, true).await?,
            ChangeType::Restored => self.flag_children(index, &filter, false).await?,
            _ => {
                debug!(entity_id = %event.entity_id, change_type = ?event.change_type, "No index work for parent event");
            }
        }
        Ok(())
    }

    /// Deleting a glossary removes every term document belonging to it.
    async fn cascade_glossary(&self, event: &EntityChangeEvent) -> Result<(), PipelineError> {
        if event.change_type != ChangeType::Deleted {
            debug!(entity_id = %event.entity_id, change_type = ?event.change_type, "No index work for glossary event");
            return Ok(());
        }
        let index = index_for(EntityType::GlossaryTerm);
        let filter = DocumentFilter::term("glossary.id", event.entity_id.to_string());
        self.store.delete_by_query(index, &filter).await?;
        Ok(())
    }

    /// Deleting an executable test suite deletes its cases; deleting a
    /// logical suite strips its entry from every case's suite list.
    async fn cascade_test_suite(&self, event: &EntityChangeEvent) -> Result<(), PipelineError> {
        if event.change_type != ChangeType::Deleted {
            debug!(entity_id = %event.entity_id, change_type = ?event.change_type, "No index work for test suite event");
            return Ok(());
        }

        let EntitySnapshot::TestSuite(suite) = &event.entity else {
            warn!(entity_id = %event.entity_id, "Test suite event without test suite snapshot, skipping");
            return Ok(());
        };
        let index = index_for(EntityType::TestCase);
        let filter = DocumentFilter::term("testSuites.id", event.entity_id.to_string());

        if suite.executable {
            self.store.delete_by_query(index, &filter).await?;
        } else {
            let script = DocumentScript::RemoveListEntry {
                field: "testSuites".to_string(),
                id: event.entity_id,
            };
            self.store.update_by_query(index, &filter, &script).await?;
        }
        Ok(())
    }

    /// Uniform flag flip across all documents matching a parent filter:
    /// one query plus script on the server side, never a client-side loop.
    async fn flag_children(
        &self,
        index: &str,
        filter: &DocumentFilter,
        deleted: bool,
    ) -> Result<(), PipelineError> {
        let patch = DocumentPatch::new().set("deleted", json!(deleted));
        self.store
            .update_by_query(index, filter, &DocumentScript::SetFields(patch))
            .await?;
        Ok(())
    }

    /// Build the document for an event, skipping the event (with a
    /// warning) when the snapshot does not resolve to this entity type.
    fn build_document(
        &self,
        event: &EntityChangeEvent,
    ) -> Result<Option<IndexDocument>, PipelineError> {
        match self.builders.build(event.entity_type, &event.entity) {
            Ok(document) => Ok(Some(document)),
            Err(PipelineError::BuilderError(reason)) => {
                warn!(
                    entity_id = %event.entity_id,
                    entity_type = %event.entity_type,
                    reason = %reason,
                    "Skipping event with unresolvable snapshot"
                );
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }
}

/// Index name for a type statically known to be indexed.
fn index_for(entity_type: EntityType) -> &'static str {
    entity_type.index_name().expect("indexed entity type")
}
