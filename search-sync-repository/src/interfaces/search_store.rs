//! Search store client trait definition.
//!
//! This module defines the abstract interface for search store operations,
//! allowing for different backend implementations (OpenSearch, in-memory
//! test stores, etc.). Nothing above this trait knows the engine's wire
//! protocol.

use async_trait::async_trait;
use serde_json::Value;
use uuid::Uuid;

use crate::config::LanguageAnalyzer;
use crate::errors::SearchError;
use crate::interfaces::requests::{
    BulkOperation, BulkSummary, DocumentFilter, DocumentPatch, DocumentScript, IndexStatus,
    SearchOptions, SearchPage, SuggestOptions,
};
use search_sync_shared::{EntityType, IndexDocument};

/// Abstract interface for the search store backing the index documents.
///
/// All calls are network I/O with bounded timeouts; errors surface as
/// typed `SearchError` values and are never silently swallowed, except
/// where an operation is explicitly idempotent (delete-if-exists).
///
/// Implementations must be `Send + Sync` for use across async tasks.
#[async_trait]
pub trait SearchStoreClient: Send + Sync {
    /// Ensure the index for an entity type exists with its mapping.
    ///
    /// Idempotent: if the index already exists its mapping schema is
    /// registered without re-creation. A failure is reported as
    /// `IndexStatus::Failed` rather than an error so one bad mapping never
    /// aborts bootstrap for the remaining entity types.
    async fn create_index(&self, entity_type: EntityType, analyzer: LanguageAnalyzer)
        -> IndexStatus;

    /// Apply the current mapping to an existing index, creating the index
    /// if it is absent.
    async fn update_index_mapping(
        &self,
        entity_type: EntityType,
        analyzer: LanguageAnalyzer,
    ) -> Result<(), SearchError>;

    /// Delete an entity type's index. No-op if the index is absent.
    async fn delete_index(&self, entity_type: EntityType) -> Result<(), SearchError>;

    /// Insert or fully replace one document.
    async fn upsert(
        &self,
        index: &str,
        id: &Uuid,
        document: &IndexDocument,
    ) -> Result<(), SearchError>;

    /// Server-side merge: set every patch field on the document, creating
    /// it when absent instead of failing.
    async fn scripted_upsert(
        &self,
        index: &str,
        id: &Uuid,
        patch: &DocumentPatch,
    ) -> Result<(), SearchError>;

    /// Set a single boolean field via script, without fetching the
    /// document first.
    async fn flag_update(
        &self,
        index: &str,
        id: &Uuid,
        field: &str,
        value: bool,
    ) -> Result<(), SearchError>;

    /// Delete one document. Absence is success.
    async fn delete_document(&self, index: &str, id: &Uuid) -> Result<(), SearchError>;

    /// Server-side bulk delete of every document matching the filter; used
    /// for cascades too large to enumerate client-side.
    async fn delete_by_query(
        &self,
        index: &str,
        filter: &DocumentFilter,
    ) -> Result<(), SearchError>;

    /// Apply one script to every document matching the filter in a single
    /// server-side operation (uniform flag flips, list-entry removal).
    async fn update_by_query(
        &self,
        index: &str,
        filter: &DocumentFilter,
        script: &DocumentScript,
    ) -> Result<(), SearchError>;

    /// Submit a heterogeneous batch. Returns per-item success/failure
    /// counts; never fails atomically as a whole.
    async fn bulk(&self, operations: Vec<BulkOperation>) -> Result<BulkSummary, SearchError>;

    /// One page of a filtered scan across the given indices, with an EXACT
    /// total-hit count. This is the pagination primitive for terminating
    /// batch loops; approximate counts would risk premature termination.
    async fn search_page(
        &self,
        indices: &[&str],
        filter: &DocumentFilter,
        from: usize,
        size: usize,
    ) -> Result<SearchPage, SearchError>;

    /// Interactive search for the query layer. Returns the engine's raw
    /// response body (hits plus aggregations).
    async fn search(&self, options: &SearchOptions) -> Result<Value, SearchError>;

    /// Completion suggestions for the query layer.
    async fn suggest(&self, options: &SuggestOptions) -> Result<Value, SearchError>;

    /// Terms aggregation over one field, optionally scoped by a raw
    /// engine-native query.
    async fn aggregate(
        &self,
        index: EntityType,
        field: &str,
        value_filter: &str,
        raw_query: Option<&str>,
    ) -> Result<Value, SearchError>;

    /// Whether the search store is reachable and healthy.
    async fn health_check(&self) -> Result<bool, SearchError>;
}
