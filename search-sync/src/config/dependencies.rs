//! Dependency initialization and wiring for the search-sync engine.

use std::env;
use std::sync::Arc;
use tracing::{info, warn};

use crate::IndexingError;
use search_sync_pipeline::{ChangePropagator, EventSender, Orchestrator};
use search_sync_repository::{
    bootstrap_indexes, LanguageAnalyzer, OpenSearchStore, SearchStoreClient, SearchStoreConfig,
};

/// Default search store URL.
const DEFAULT_SEARCH_STORE_URL: &str = "http://localhost:9200";

/// Default two-letter language code for index analyzers.
const DEFAULT_SEARCH_LANGUAGE: &str = "en";

/// Container for all initialized dependencies.
pub struct Dependencies {
    /// The configured orchestrator ready to run.
    pub orchestrator: Orchestrator,
    /// Handle the external event pipeline pushes change events through.
    pub events: EventSender,
}

impl Dependencies {
    /// Initialize all dependencies from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `SEARCH_STORE_URL`: search engine URL (default: http://localhost:9200)
    /// - `SEARCH_STORE_USERNAME` / `SEARCH_STORE_PASSWORD`: optional basic auth
    /// - `SEARCH_LANGUAGE`: index analyzer language code, en/jp/zh (default: en)
    ///
    /// # Returns
    ///
    /// * `Ok(Dependencies)` - Initialized dependencies
    /// * `Err(IndexingError)` - If initialization fails
    pub async fn new() -> Result<Self, IndexingError> {
        let url =
            env::var("SEARCH_STORE_URL").unwrap_or_else(|_| DEFAULT_SEARCH_STORE_URL.to_string());
        let language =
            env::var("SEARCH_LANGUAGE").unwrap_or_else(|_| DEFAULT_SEARCH_LANGUAGE.to_string());
        let analyzer = LanguageAnalyzer::from_code(&language)
            .ok_or_else(|| IndexingError::config(format!("Unknown search language: {}", language)))?;

        let mut config = SearchStoreConfig::new(&url);
        if let (Ok(username), Ok(password)) = (
            env::var("SEARCH_STORE_USERNAME"),
            env::var("SEARCH_STORE_PASSWORD"),
        ) {
            config = config.with_credentials(username, password);
        }

        info!(url = %url, language = %language, "Initializing dependencies");

        let store = OpenSearchStore::new(config)
            .map_err(|e| IndexingError::config(format!("Failed to create search store client: {}", e)))?;

        // Verify the search store is reachable
        let healthy = store
            .health_check()
            .await
            .map_err(|e| IndexingError::config(format!("Search store health check failed: {}", e)))?;
        if !healthy {
            return Err(IndexingError::config("Search store is unhealthy"));
        }

        info!("Search store connection verified");

        let store: Arc<dyn SearchStoreClient> = Arc::new(store);

        // Re-apply index mappings idempotently; one failing entity type
        // does not abort the rest.
        let report = bootstrap_indexes(store.as_ref(), analyzer).await;
        if !report.all_created() {
            warn!(
                failed = ?report.failed_types(),
                "Some search indexes failed to bootstrap; their events will fail until a reindex"
            );
        }

        let propagator = ChangePropagator::new(store);
        let (orchestrator, events) = Orchestrator::new(propagator);

        Ok(Self {
            orchestrator,
            events,
        })
    }
}
