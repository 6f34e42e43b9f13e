//! OpenSearch client implementation.
//!
//! This module provides the concrete implementation of `SearchStoreClient`
//! using the OpenSearch Rust client. No component above it knows the
//! engine's wire protocol.

use async_trait::async_trait;
use opensearch::auth::Credentials;
use opensearch::http::request::JsonBody;
use opensearch::http::transport::{SingleNodeConnectionPool, TransportBuilder};
use opensearch::http::StatusCode;
use opensearch::indices::{
    IndicesCreateParts, IndicesDeleteParts, IndicesExistsParts, IndicesPutMappingParts,
};
use opensearch::{
    BulkParts, DeleteByQueryParts, DeleteParts, OpenSearch, SearchParts, UpdateByQueryParts,
    UpdateParts,
};
use serde_json::{json, Value};
use tracing::{debug, error, info, warn};
use url::Url;
use uuid::Uuid;

use crate::config::{LanguageAnalyzer, SearchStoreConfig};
use crate::errors::SearchError;
use crate::interfaces::{
    BulkFailure, BulkOperation, BulkSummary, DocumentFilter, DocumentPatch, DocumentScript,
    IndexStatus, PageHit, SearchOptions, SearchPage, SearchStoreClient, SuggestOptions,
};
use crate::opensearch::index_config::{index_mapping, mapping_body};
use crate::opensearch::queries;
use search_sync_shared::{EntityType, IndexDocument};

/// OpenSearch-backed search store.
pub struct OpenSearchStore {
    client: OpenSearch,
    config: SearchStoreConfig,
}

impl OpenSearchStore {
    /// Create a new store client from the given configuration.
    pub fn new(config: SearchStoreConfig) -> Result<Self, SearchError> {
        let parsed_url =
            Url::parse(&config.url).map_err(|e| SearchError::connection(e.to_string()))?;

        let conn_pool = SingleNodeConnectionPool::new(parsed_url);
        let mut builder = TransportBuilder::new(conn_pool).disable_proxy();
        if let (Some(username), Some(password)) = (&config.username, &config.password) {
            builder = builder.auth(Credentials::Basic(username.clone(), password.clone()));
        }
        let transport = builder
            .build()
            .map_err(|e| SearchError::connection(e.to_string()))?;

        info!(url = %config.url, "Created OpenSearch store client");

        Ok(Self {
            client: OpenSearch::new(transport),
            config,
        })
    }

    /// Whether an index exists on the cluster.
    async fn index_exists(&self, index: &str) -> Result<bool, SearchError> {
        let response = self
            .client
            .indices()
            .exists(IndicesExistsParts::Index(&[index]))
            .send()
            .await
            .map_err(|e| SearchError::transport(e.to_string()))?;
        Ok(response.status_code() == StatusCode::OK)
    }

    /// Parse a raw engine-native filter fragment from the query layer.
    ///
    /// Accepts either a full `{"query": ...}` body or a bare query clause.
    /// An unparseable fragment is dropped with a warning; the base query
    /// still executes.
    fn parse_raw_filter(raw: &str) -> Option<Value> {
        if raw.trim().is_empty() || raw.trim() == "{}" {
            return None;
        }
        match serde_json::from_str::<Value>(raw) {
            Ok(Value::Object(mut object)) => {
                if let Some(query) = object.remove("query") {
                    Some(query)
                } else {
                    Some(Value::Object(object))
                }
            }
            Ok(_) => {
                warn!("Query filter is not a JSON object, ignoring filter");
                None
            }
            Err(e) => {
                warn!(error = %e, "Error parsing query filter, ignoring filter");
                None
            }
        }
    }

    /// Fail on any non-success status, logging the response body.
    async fn check_status(
        response: opensearch::http::response::Response,
        context: &str,
        on_error: fn(String) -> SearchError,
    ) -> Result<opensearch::http::response::Response, SearchError> {
        let status = response.status_code();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(status = %status, body = %body, "{} request failed", context);
            return Err(on_error(format!(
                "{} failed with status {}: {}",
                context, status, body
            )));
        }
        Ok(response)
    }

    /// Parse one scan-page response into hits plus the exact total.
    fn parse_page(body: &Value) -> Result<SearchPage, SearchError> {
        let total = body["hits"]["total"]["value"]
            .as_u64()
            .ok_or_else(|| SearchError::parse("Missing total hit count in scan response"))?;

        let hits = body["hits"]["hits"]
            .as_array()
            .map(|hits| {
                hits.iter()
                    .filter_map(|hit| {
                        Some(PageHit {
                            index: hit["_index"].as_str()?.to_string(),
                            id: hit["_id"].as_str()?.to_string(),
                            source: hit["_source"].clone(),
                        })
                    })
                    .collect()
            })
            .unwrap_or_default();

        Ok(SearchPage { hits, total })
    }

    /// Build the newline-delimited action/source pairs of a bulk request.
    fn bulk_body(operations: &[BulkOperation]) -> Vec<JsonBody<Value>> {
        let mut body: Vec<JsonBody<Value>> = Vec::with_capacity(operations.len() * 2);
        for operation in operations {
            match operation {
                BulkOperation::Upsert {
                    index,
                    id,
                    document,
                } => {
                    body.push(json!({ "update": { "_index": index, "_id": id } }).into());
                    body.push(
                        json!({ "doc": document, "doc_as_upsert": true }).into(),
                    );
                }
                BulkOperation::Patch { index, id, patch } => {
                    body.push(json!({ "update": { "_index": index, "_id": id } }).into());
                    body.push(
                        json!({
                            "script": queries::merge_script(patch),
                            "scripted_upsert": true,
                            "upsert": {}
                        })
                        .into(),
                    );
                }
                BulkOperation::Delete { index, id } => {
                    body.push(json!({ "delete": { "_index": index, "_id": id } }).into());
                }
            }
        }
        body
    }

    /// Tally per-item outcomes from a bulk response body.
    fn summarize_bulk(body: &Value, total: usize) -> BulkSummary {
        let mut summary = BulkSummary {
            total,
            ..BulkSummary::empty()
        };

        let Some(items) = body["items"].as_array() else {
            summary.succeeded = total;
            return summary;
        };

        for item in items {
            let Some(result) = item.as_object().and_then(|o| o.values().next()) else {
                continue;
            };
            if let Some(error) = result.get("error") {
                summary.failed += 1;
                summary.failures.push(BulkFailure {
                    index: result["_index"].as_str().unwrap_or_default().to_string(),
                    id: result["_id"].as_str().unwrap_or_default().to_string(),
                    reason: error["reason"].as_str().unwrap_or("unknown").to_string(),
                });
            } else {
                summary.succeeded += 1;
            }
        }
        summary
    }
}

#[async_trait]
impl SearchStoreClient for OpenSearchStore {
    async fn create_index(
        &self,
        entity_type: EntityType,
        analyzer: LanguageAnalyzer,
    ) -> IndexStatus {
        let Some(index) = entity_type.index_name() else {
            return IndexStatus::Failed(format!("{} has no search index", entity_type));
        };

        let exists = match self.index_exists(index).await {
            Ok(exists) => exists,
            Err(e) => return IndexStatus::Failed(e.to_string()),
        };

        let result = if exists {
            // Register the current mapping without re-creating the index.
            self.client
                .indices()
                .put_mapping(IndicesPutMappingParts::Index(&[index]))
                .body(mapping_body(entity_type, analyzer))
                .send()
                .await
        } else {
            self.client
                .indices()
                .create(IndicesCreateParts::Index(index))
                .body(index_mapping(entity_type, analyzer))
                .send()
                .await
        };

        match result {
            Ok(response) if response.status_code().is_success() => {
                info!(index = %index, created = !exists, "Search index ensured");
                IndexStatus::Created
            }
            Ok(response) => {
                let status = response.status_code();
                let body = response.text().await.unwrap_or_default();
                error!(index = %index, status = %status, body = %body, "Index creation failed");
                IndexStatus::Failed(format!("status {}: {}", status, body))
            }
            Err(e) => {
                error!(index = %index, error = %e, "Index creation failed");
                IndexStatus::Failed(e.to_string())
            }
        }
    }

    async fn update_index_mapping(
        &self,
        entity_type: EntityType,
        analyzer: LanguageAnalyzer,
    ) -> Result<(), SearchError> {
        let index = entity_type
            .index_name()
            .ok_or_else(|| SearchError::mapping(format!("{} has no search index", entity_type)))?;

        let response = if self.index_exists(index).await? {
            self.client
                .indices()
                .put_mapping(IndicesPutMappingParts::Index(&[index]))
                .body(mapping_body(entity_type, analyzer))
                .send()
                .await
        } else {
            self.client
                .indices()
                .create(IndicesCreateParts::Index(index))
                .body(index_mapping(entity_type, analyzer))
                .send()
                .await
        }
        .map_err(|e| SearchError::transport(e.to_string()))?;

        Self::check_status(response, "Mapping update", SearchError::mapping).await?;
        debug!(index = %index, "Index mapping applied");
        Ok(())
    }

    async fn delete_index(&self, entity_type: EntityType) -> Result<(), SearchError> {
        let Some(index) = entity_type.index_name() else {
            return Ok(());
        };
        if !self.index_exists(index).await? {
            return Ok(());
        }

        let response = self
            .client
            .indices()
            .delete(IndicesDeleteParts::Index(&[index]))
            .send()
            .await
            .map_err(|e| SearchError::transport(e.to_string()))?;

        Self::check_status(response, "Index delete", SearchError::delete).await?;
        info!(index = %index, "Search index deleted");
        Ok(())
    }

    async fn upsert(
        &self,
        index: &str,
        id: &Uuid,
        document: &IndexDocument,
    ) -> Result<(), SearchError> {
        let doc_id = id.to_string();
        let response = self
            .client
            .update(UpdateParts::IndexId(index, &doc_id))
            .request_timeout(self.config.query_timeout)
            .body(json!({ "doc": document, "doc_as_upsert": true }))
            .send()
            .await
            .map_err(|e| SearchError::transport(e.to_string()))?;

        Self::check_status(response, "Upsert", SearchError::index).await?;
        debug!(index = %index, id = %doc_id, "Document upserted");
        Ok(())
    }

    async fn scripted_upsert(
        &self,
        index: &str,
        id: &Uuid,
        patch: &DocumentPatch,
    ) -> Result<(), SearchError> {
        if patch.is_empty() {
            return Ok(());
        }

        let doc_id = id.to_string();
        let response = self
            .client
            .update(UpdateParts::IndexId(index, &doc_id))
            .request_timeout(self.config.query_timeout)
            .body(json!({
                "script": queries::merge_script(patch),
                "scripted_upsert": true,
                "upsert": {}
            }))
            .send()
            .await
            .map_err(|e| SearchError::transport(e.to_string()))?;

        Self::check_status(response, "Scripted upsert", SearchError::update).await?;
        debug!(index = %index, id = %doc_id, "Document patched");
        Ok(())
    }

    async fn flag_update(
        &self,
        index: &str,
        id: &Uuid,
        field: &str,
        value: bool,
    ) -> Result<(), SearchError> {
        let doc_id = id.to_string();
        let response = self
            .client
            .update(UpdateParts::IndexId(index, &doc_id))
            .request_timeout(self.config.query_timeout)
            .body(json!({ "script": queries::flag_script(field, value) }))
            .send()
            .await
            .map_err(|e| SearchError::transport(e.to_string()))?;

        // A flag flip for a document that was never indexed is not an error
        // worth failing the event over; the full reindex job converges it.
        if response.status_code() == StatusCode::NOT_FOUND {
            warn!(index = %index, id = %doc_id, "Flag update on missing document");
            return Ok(());
        }

        Self::check_status(response, "Flag update", SearchError::update).await?;
        debug!(index = %index, id = %doc_id, field = %field, value, "Flag updated");
        Ok(())
    }

    async fn delete_document(&self, index: &str, id: &Uuid) -> Result<(), SearchError> {
        let doc_id = id.to_string();
        let response = self
            .client
            .delete(DeleteParts::IndexId(index, &doc_id))
            .request_timeout(self.config.query_timeout)
            .send()
            .await
            .map_err(|e| SearchError::transport(e.to_string()))?;

        // 404 is acceptable - document may not exist
        let status = response.status_code();
        if !status.is_success() && status != StatusCode::NOT_FOUND {
            let body = response.text().await.unwrap_or_default();
            error!(status = %status, body = %body, "Delete request failed");
            return Err(SearchError::delete(format!(
                "Delete failed with status {}: {}",
                status, body
            )));
        }

        debug!(index = %index, id = %doc_id, "Document deleted");
        Ok(())
    }

    async fn delete_by_query(
        &self,
        index: &str,
        filter: &DocumentFilter,
    ) -> Result<(), SearchError> {
        let response = self
            .client
            .delete_by_query(DeleteByQueryParts::Index(&[index]))
            .request_timeout(self.config.scan_timeout)
            .body(json!({ "query": queries::filter_query(filter) }))
            .send()
            .await
            .map_err(|e| SearchError::transport(e.to_string()))?;

        Self::check_status(response, "Delete by query", SearchError::delete).await?;
        debug!(index = %index, ?filter, "Delete by query executed");
        Ok(())
    }

    async fn update_by_query(
        &self,
        index: &str,
        filter: &DocumentFilter,
        script: &DocumentScript,
    ) -> Result<(), SearchError> {
        let response = self
            .client
            .update_by_query(UpdateByQueryParts::Index(&[index]))
            .request_timeout(self.config.scan_timeout)
            .body(json!({
                "query": queries::filter_query(filter),
                "script": queries::document_script(script)
            }))
            .send()
            .await
            .map_err(|e| SearchError::transport(e.to_string()))?;

        Self::check_status(response, "Update by query", SearchError::update).await?;
        debug!(index = %index, ?filter, "Update by query executed");
        Ok(())
    }

    async fn bulk(&self, operations: Vec<BulkOperation>) -> Result<BulkSummary, SearchError> {
        if operations.is_empty() {
            return Ok(BulkSummary::empty());
        }
        let total = operations.len();

        let response = self
            .client
            .bulk(BulkParts::None)
            .request_timeout(self.config.scan_timeout)
            .body(Self::bulk_body(&operations))
            .send()
            .await
            .map_err(|e| SearchError::transport(e.to_string()))?;

        let response =
            Self::check_status(response, "Bulk", SearchError::bulk_operation).await?;
        let body = response
            .json::<Value>()
            .await
            .map_err(|e| SearchError::parse(e.to_string()))?;

        let summary = Self::summarize_bulk(&body, total);
        if summary.failed > 0 {
            warn!(
                total = summary.total,
                failed = summary.failed,
                "Bulk submission had item failures"
            );
        }
        Ok(summary)
    }

    async fn search_page(
        &self,
        indices: &[&str],
        filter: &DocumentFilter,
        from: usize,
        size: usize,
    ) -> Result<SearchPage, SearchError> {
        let response = self
            .client
            .search(SearchParts::Index(indices))
            .request_timeout(self.config.scan_timeout)
            .body(queries::scan_body(filter, from, size))
            .send()
            .await
            .map_err(|e| SearchError::transport(e.to_string()))?;

        let response = Self::check_status(response, "Scan", SearchError::query).await?;
        let body = response
            .json::<Value>()
            .await
            .map_err(|e| SearchError::parse(e.to_string()))?;

        Self::parse_page(&body)
    }

    async fn search(&self, options: &SearchOptions) -> Result<Value, SearchError> {
        let index = options
            .index
            .index_name()
            .ok_or_else(|| SearchError::query(format!("{} has no search index", options.index)))?;

        let parsed_filter = options
            .raw_filter
            .as_deref()
            .and_then(Self::parse_raw_filter);
        let body = queries::build_search_body(options, parsed_filter, self.config.approximate_hit_cap);

        let response = self
            .client
            .search(SearchParts::Index(&[index]))
            .request_timeout(self.config.query_timeout)
            .body(body)
            .send()
            .await
            .map_err(|e| SearchError::transport(e.to_string()))?;

        let response = Self::check_status(response, "Search", SearchError::query).await?;
        response
            .json::<Value>()
            .await
            .map_err(|e| SearchError::parse(e.to_string()))
    }

    async fn suggest(&self, options: &SuggestOptions) -> Result<Value, SearchError> {
        let index = options
            .index
            .index_name()
            .ok_or_else(|| SearchError::query(format!("{} has no search index", options.index)))?;

        let response = self
            .client
            .search(SearchParts::Index(&[index]))
            .request_timeout(self.config.query_timeout)
            .body(queries::build_suggest_body(options))
            .send()
            .await
            .map_err(|e| SearchError::transport(e.to_string()))?;

        let response = Self::check_status(response, "Suggest", SearchError::query).await?;
        let body = response
            .json::<Value>()
            .await
            .map_err(|e| SearchError::parse(e.to_string()))?;
        Ok(body["suggest"].clone())
    }

    async fn aggregate(
        &self,
        index: EntityType,
        field: &str,
        value_filter: &str,
        raw_query: Option<&str>,
    ) -> Result<Value, SearchError> {
        let index_name = index
            .index_name()
            .ok_or_else(|| SearchError::query(format!("{} has no search index", index)))?;

        let parsed_query = raw_query.and_then(Self::parse_raw_filter);
        let response = self
            .client
            .search(SearchParts::Index(&[index_name]))
            .request_timeout(self.config.query_timeout)
            .body(queries::build_aggregate_body(field, value_filter, parsed_query))
            .send()
            .await
            .map_err(|e| SearchError::transport(e.to_string()))?;

        let response = Self::check_status(response, "Aggregate", SearchError::query).await?;
        let body = response
            .json::<Value>()
            .await
            .map_err(|e| SearchError::parse(e.to_string()))?;
        Ok(body["aggregations"].clone())
    }

    async fn health_check(&self) -> Result<bool, SearchError> {
        let response = self
            .client
            .ping()
            .send()
            .await
            .map_err(|e| SearchError::connection(e.to_string()))?;
        Ok(response.status_code().is_success())
    }
}
