//! Startup index bootstrap.
//!
//! Mapping definitions are versioned in code and re-applied idempotently at
//! startup. Each entity type's outcome is returned to the caller instead of
//! being recorded in shared mutable state.

use tracing::{error, info};

use crate::config::LanguageAnalyzer;
use crate::interfaces::requests::IndexStatus;
use crate::interfaces::search_store::SearchStoreClient;
use search_sync_shared::EntityType;

/// Aggregated outcome of a bootstrap pass over all indexed entity types.
#[derive(Debug)]
pub struct BootstrapReport {
    pub statuses: Vec<(EntityType, IndexStatus)>,
}

impl BootstrapReport {
    /// Entity types whose index could not be created or mapped.
    pub fn failed_types(&self) -> Vec<EntityType> {
        self.statuses
            .iter()
            .filter(|(_, status)| !status.is_created())
            .map(|(entity_type, _)| *entity_type)
            .collect()
    }

    pub fn all_created(&self) -> bool {
        self.statuses.iter().all(|(_, status)| status.is_created())
    }
}

/// Ensure every indexed entity type's index exists with its current
/// mapping. A failure for one type is recorded and the pass continues.
pub async fn bootstrap_indexes(
    store: &dyn SearchStoreClient,
    analyzer: LanguageAnalyzer,
) -> BootstrapReport {
    let mut statuses = Vec::with_capacity(EntityType::INDEXED.len());

    for entity_type in EntityType::INDEXED {
        let status = store.create_index(entity_type, analyzer).await;
        match &status {
            IndexStatus::Created => {
                info!(entity_type = %entity_type, "Search index ready");
            }
            IndexStatus::Failed(reason) => {
                error!(entity_type = %entity_type, reason = %reason, "Search index bootstrap failed");
            }
        }
        statuses.push((entity_type, status));
    }

    BootstrapReport { statuses }
}
