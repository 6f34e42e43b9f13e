//! Batch reindexer: paginated bulk corrections across indices.
//!
//! Used when a correction differs per document (each document keeps a
//! different remainder of its tag list), unlike uniform flag flips which
//! are a single query-scoped script. Every job is bounded, restartable and
//! idempotent: replaying after a partial failure converges to the same end
//! state.

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, info, warn};

use crate::errors::PipelineError;
use search_sync_repository::{BulkOperation, DocumentFilter, DocumentPatch, SearchStoreClient};
use search_sync_shared::EntityType;

/// Documents fetched and patched per round.
pub const DEFAULT_BATCH_SIZE: usize = 50;

/// Outcome of one batch correction job.
#[derive(Debug, Clone, Default)]
pub struct ReindexSummary {
    /// Search+patch rounds executed.
    pub pages: usize,
    /// Documents scanned across all pages.
    pub scanned: usize,
    /// Documents patched successfully.
    pub updated: usize,
    /// Documents whose patch failed; the job keeps going and a retry of
    /// the triggering event converges them.
    pub failed: usize,
}

/// Executes paginated, cursor-driven bulk corrections.
pub struct BatchReindexer {
    store: Arc<dyn SearchStoreClient>,
    batch_size: usize,
}

impl BatchReindexer {
    pub fn new(store: Arc<dyn SearchStoreClient>) -> Self {
        Self {
            store,
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }

    pub fn with_batch_size(store: Arc<dyn SearchStoreClient>, batch_size: usize) -> Self {
        Self { store, batch_size }
    }

    /// Remove one tag label from every document referencing it, across all
    /// entity indices.
    ///
    /// The pagination loop requires the EXACT total-hit count from the
    /// scan page; an approximate cap would terminate early and leave stale
    /// references. Removing an already-absent label is a no-op, so
    /// replaying the job after at-least-once redelivery is safe.
    pub async fn remove_tag_label(&self, tag_fqn: &str) -> Result<ReindexSummary, PipelineError> {
        let indices: Vec<&str> = EntityType::INDEXED
            .iter()
            .filter_map(|entity_type| entity_type.index_name())
            .collect();
        let filter = DocumentFilter::term("tags.tagFQN", tag_fqn);

        let mut summary = ReindexSummary::default();
        let mut cursor = 0usize;

        loop {
            let page = self
                .store
                .search_page(&indices, &filter, cursor, self.batch_size)
                .await?;
            if page.hits.is_empty() {
                break;
            }

            let mut operations = Vec::new();
            for hit in &page.hits {
                let Some(remaining) = remaining_tags(&hit.source, tag_fqn) else {
                    continue;
                };
                operations.push(BulkOperation::Patch {
                    index: hit.index.clone(),
                    id: hit.id.clone(),
                    patch: DocumentPatch::new().set("tags", Value::Array(remaining)),
                });
            }

            summary.scanned += page.hits.len();
            summary.pages += 1;

            if !operations.is_empty() {
                // A failed page does not stop the loop; applied patches are
                // permanent and the next run converges the rest.
                match self.store.bulk(operations).await {
                    Ok(bulk) => {
                        summary.updated += bulk.succeeded;
                        summary.failed += bulk.failed;
                    }
                    Err(e) => {
                        warn!(tag_fqn = %tag_fqn, error = %e, "Bulk page failed, continuing scan");
                        summary.failed += page.hits.len();
                    }
                }
            }

            cursor += page.hits.len();
            debug!(
                tag_fqn = %tag_fqn,
                cursor,
                total = page.total,
                "Tag removal page complete"
            );
            if cursor as u64 >= page.total {
                break;
            }
        }

        info!(
            tag_fqn = %tag_fqn,
            pages = summary.pages,
            scanned = summary.scanned,
            updated = summary.updated,
            failed = summary.failed,
            "Tag removal job complete"
        );
        Ok(summary)
    }
}

/// The document's tag list without the target label, or `None` when the
/// document does not actually carry it (nothing to patch).
fn remaining_tags(source: &Value, tag_fqn: &str) -> Option<Vec<Value>> {
    let tags = source.get("tags")?.as_array()?;
    let remaining: Vec<Value> = tags
        .iter()
        .filter(|tag| tag.get("tagFQN").and_then(Value::as_str) != Some(tag_fqn))
        .cloned()
        .collect();
    if remaining.len() == tags.len() {
        return None;
    }
    Some(remaining)
}
