//! In-memory search store for pipeline tests.
//!
//! Models the store semantics the pipeline relies on: single-document
//! writes are visible to search immediately, while bulk submissions stay
//! invisible until `refresh()` — mirroring an engine whose scans do not
//! observe in-flight bulk work within a job.

use std::collections::BTreeMap;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::{json, Value};
use uuid::Uuid;

use search_sync_repository::{
    BulkOperation, BulkSummary, DocumentFilter, DocumentPatch, DocumentScript, IndexStatus,
    LanguageAnalyzer, PageHit, SearchError, SearchOptions, SearchPage, SearchStoreClient,
    SuggestOptions,
};
use search_sync_shared::{EntityType, IndexDocument};

type DocKey = (String, String);

#[derive(Default)]
pub(crate) struct InMemorySearchStore {
    committed: Mutex<BTreeMap<DocKey, Value>>,
    staged: Mutex<Vec<BulkOperation>>,
    fail_index_for: Mutex<Vec<EntityType>>,
    pub update_by_query_calls: Mutex<usize>,
    pub delete_by_query_calls: Mutex<usize>,
}

impl InMemorySearchStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_index_creation_for(&self, entity_type: EntityType) {
        self.fail_index_for.lock().unwrap().push(entity_type);
    }

    pub fn insert_raw(&self, index: &str, id: &str, source: Value) {
        self.committed
            .lock()
            .unwrap()
            .insert((index.to_string(), id.to_string()), source);
    }

    pub fn get(&self, index: &str, id: &str) -> Option<Value> {
        self.committed
            .lock()
            .unwrap()
            .get(&(index.to_string(), id.to_string()))
            .cloned()
    }

    pub fn contains(&self, index: &str, id: &str) -> bool {
        self.get(index, id).is_some()
    }

    pub fn count_matching(&self, filter: &DocumentFilter) -> usize {
        self.committed
            .lock()
            .unwrap()
            .iter()
            .filter(|((_, id), source)| matches_filter(filter, id, source))
            .count()
    }

    /// Make staged bulk writes visible to search, like an index refresh.
    pub fn refresh(&self) {
        let staged: Vec<BulkOperation> = self.staged.lock().unwrap().drain(..).collect();
        let mut committed = self.committed.lock().unwrap();
        for operation in staged {
            match operation {
                BulkOperation::Upsert {
                    index,
                    id,
                    document,
                } => {
                    committed.insert((index, id), document.into_value());
                }
                BulkOperation::Patch { index, id, patch } => {
                    let entry = committed.entry((index, id)).or_insert_with(|| json!({}));
                    apply_patch(entry, &patch);
                }
                BulkOperation::Delete { index, id } => {
                    committed.remove(&(index, id));
                }
            }
        }
    }
}

fn apply_patch(target: &mut Value, patch: &DocumentPatch) {
    if let Value::Object(object) = target {
        for (key, value) in patch.fields() {
            object.insert(key.clone(), value.clone());
        }
        for key in patch.removals() {
            object.remove(key);
        }
    }
}

/// Collect the values at a dotted path, flattening through arrays.
fn field_values<'a>(source: &'a Value, path: &str) -> Vec<&'a Value> {
    let mut current = vec![source];
    for segment in path.split('.') {
        let mut next = Vec::new();
        for value in current {
            match value {
                Value::Object(object) => {
                    if let Some(child) = object.get(segment) {
                        next.push(child);
                    }
                }
                Value::Array(items) => {
                    for item in items {
                        if let Some(child) = item.get(segment) {
                            next.push(child);
                        }
                    }
                }
                _ => {}
            }
        }
        current = next;
    }
    current
        .into_iter()
        .flat_map(|value| match value {
            Value::Array(items) => items.iter().collect(),
            other => vec![other],
        })
        .collect()
}

fn value_equals(value: &Value, expected: &str) -> bool {
    match value {
        Value::String(s) => s == expected,
        other => other.to_string() == expected,
    }
}

fn matches_filter(filter: &DocumentFilter, id: &str, source: &Value) -> bool {
    match filter {
        DocumentFilter::Term { field, value } => field_values(source, field)
            .iter()
            .any(|candidate| value_equals(candidate, value)),
        DocumentFilter::Wildcard { field, pattern } => {
            let prefix = pattern.strip_suffix('*').unwrap_or(pattern);
            field_values(source, field)
                .iter()
                .any(|candidate| candidate.as_str().map_or(false, |s| s.starts_with(prefix)))
        }
        DocumentFilter::IdOrParentId { id: target } => {
            let target = target.to_string();
            id == target
                || field_values(source, "id")
                    .iter()
                    .any(|candidate| value_equals(candidate, &target))
                || field_values(source, "parent.id")
                    .iter()
                    .any(|candidate| value_equals(candidate, &target))
        }
    }
}

fn apply_script(target: &mut Value, script: &DocumentScript) {
    match script {
        DocumentScript::SetFields(patch) => apply_patch(target, patch),
        DocumentScript::RemoveListEntry { field, id } => {
            if let Some(Value::Array(items)) = target.get_mut(field) {
                let id = id.to_string();
                items.retain(|item| {
                    item.get("id")
                        .map_or(true, |candidate| !value_equals(candidate, &id))
                });
            }
        }
    }
}

#[async_trait]
impl SearchStoreClient for InMemorySearchStore {
    async fn create_index(
        &self,
        entity_type: EntityType,
        _analyzer: LanguageAnalyzer,
    ) -> IndexStatus {
        if self.fail_index_for.lock().unwrap().contains(&entity_type) {
            IndexStatus::Failed("mapping rejected".to_string())
        } else {
            IndexStatus::Created
        }
    }

    async fn update_index_mapping(
        &self,
        _entity_type: EntityType,
        _analyzer: LanguageAnalyzer,
    ) -> Result<(), SearchError> {
        Ok(())
    }

    async fn delete_index(&self, entity_type: EntityType) -> Result<(), SearchError> {
        if let Some(index) = entity_type.index_name() {
            self.committed
                .lock()
                .unwrap()
                .retain(|(doc_index, _), _| doc_index != index);
        }
        Ok(())
    }

    async fn upsert(
        &self,
        index: &str,
        id: &Uuid,
        document: &IndexDocument,
    ) -> Result<(), SearchError> {
        self.insert_raw(index, &id.to_string(), document.clone().into_value());
        Ok(())
    }

    async fn scripted_upsert(
        &self,
        index: &str,
        id: &Uuid,
        patch: &DocumentPatch,
    ) -> Result<(), SearchError> {
        let mut committed = self.committed.lock().unwrap();
        let entry = committed
            .entry((index.to_string(), id.to_string()))
            .or_insert_with(|| json!({}));
        apply_patch(entry, patch);
        Ok(())
    }

    async fn flag_update(
        &self,
        index: &str,
        id: &Uuid,
        field: &str,
        value: bool,
    ) -> Result<(), SearchError> {
        let mut committed = self.committed.lock().unwrap();
        if let Some(Value::Object(object)) =
            committed.get_mut(&(index.to_string(), id.to_string()))
        {
            object.insert(field.to_string(), json!(value));
        }
        Ok(())
    }

    async fn delete_document(&self, index: &str, id: &Uuid) -> Result<(), SearchError> {
        self.committed
            .lock()
            .unwrap()
            .remove(&(index.to_string(), id.to_string()));
        Ok(())
    }

    async fn delete_by_query(
        &self,
        index: &str,
        filter: &DocumentFilter,
    ) -> Result<(), SearchError> {
        *self.delete_by_query_calls.lock().unwrap() += 1;
        self.committed
            .lock()
            .unwrap()
            .retain(|(doc_index, id), source| {
                doc_index != index || !matches_filter(filter, id, source)
            });
        Ok(())
    }

    async fn update_by_query(
        &self,
        index: &str,
        filter: &DocumentFilter,
        script: &DocumentScript,
    ) -> Result<(), SearchError> {
        *self.update_by_query_calls.lock().unwrap() += 1;
        let mut committed = self.committed.lock().unwrap();
        for ((doc_index, id), source) in committed.iter_mut() {
            if doc_index == index && matches_filter(filter, id, source) {
                apply_script(source, script);
            }
        }
        Ok(())
    }

    async fn bulk(&self, operations: Vec<BulkOperation>) -> Result<BulkSummary, SearchError> {
        let total = operations.len();
        self.staged.lock().unwrap().extend(operations);
        Ok(BulkSummary {
            total,
            succeeded: total,
            failed: 0,
            failures: vec![],
        })
    }

    async fn search_page(
        &self,
        indices: &[&str],
        filter: &DocumentFilter,
        from: usize,
        size: usize,
    ) -> Result<SearchPage, SearchError> {
        let committed = self.committed.lock().unwrap();
        let matching: Vec<PageHit> = committed
            .iter()
            .filter(|((index, id), source)| {
                indices.contains(&index.as_str()) && matches_filter(filter, id, source)
            })
            .map(|((index, id), source)| PageHit {
                index: index.clone(),
                id: id.clone(),
                source: source.clone(),
            })
            .collect();

        let total = matching.len() as u64;
        let hits = matching.into_iter().skip(from).take(size).collect();
        Ok(SearchPage { hits, total })
    }

    async fn search(&self, _options: &SearchOptions) -> Result<Value, SearchError> {
        Ok(json!({}))
    }

    async fn suggest(&self, _options: &SuggestOptions) -> Result<Value, SearchError> {
        Ok(json!({}))
    }

    async fn aggregate(
        &self,
        _index: EntityType,
        _field: &str,
        _value_filter: &str,
        _raw_query: Option<&str>,
    ) -> Result<Value, SearchError> {
        Ok(json!({}))
    }

    async fn health_check(&self) -> Result<bool, SearchError> {
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use search_sync_repository::bootstrap_indexes;

    #[test]
    fn test_field_values_traverses_arrays() {
        let source = json!({
            "testSuites": [ { "id": "a" }, { "id": "b" } ],
            "service": { "id": "s" }
        });

        let values = field_values(&source, "testSuites.id");
        assert_eq!(values.len(), 2);
        assert_eq!(field_values(&source, "service.id")[0], "s");
        assert!(field_values(&source, "missing.path").is_empty());
    }

    #[test]
    fn test_matches_wildcard_prefix() {
        let source = json!({ "fullyQualifiedName": "PII.Sensitive" });
        let filter = DocumentFilter::wildcard("fullyQualifiedName", "PII.*");
        assert!(matches_filter(&filter, "x", &source));

        let other = json!({ "fullyQualifiedName": "Tier.Tier1" });
        assert!(!matches_filter(&filter, "x", &other));
    }

    #[tokio::test]
    async fn test_bulk_writes_invisible_until_refresh() {
        let store = InMemorySearchStore::new();
        store.insert_raw("table_search_index", "a", json!({ "tags": [] }));

        store
            .bulk(vec![BulkOperation::Patch {
                index: "table_search_index".to_string(),
                id: "a".to_string(),
                patch: DocumentPatch::new().set("deleted", json!(true)),
            }])
            .await
            .unwrap();

        assert_eq!(store.get("table_search_index", "a").unwrap()["deleted"], json!(null));
        store.refresh();
        assert_eq!(store.get("table_search_index", "a").unwrap()["deleted"], true);
    }

    #[tokio::test]
    async fn test_bootstrap_aggregates_per_type_failures() {
        let store = InMemorySearchStore::new();
        store.fail_index_creation_for(EntityType::Topic);

        let report = bootstrap_indexes(&store, LanguageAnalyzer::English).await;

        assert!(!report.all_created());
        assert_eq!(report.failed_types(), vec![EntityType::Topic]);
        let created = report
            .statuses
            .iter()
            .filter(|(_, status)| status.is_created())
            .count();
        assert_eq!(created, EntityType::INDEXED.len() - 1);
    }
}
