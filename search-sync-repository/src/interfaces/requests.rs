//! Request and response value objects for search store operations.
//!
//! Patches, filters and scripts are immutable value objects built once and
//! handed to the client, so the merge semantics live in a single primitive
//! instead of ad-hoc script maps at every call site.

use std::collections::BTreeMap;

use serde_json::Value;
use uuid::Uuid;

use search_sync_shared::{EntityType, IndexDocument};

/// A set of field writes (and removals) applied to one document by a
/// server-side scripted merge. For every key in `fields` the store sets
/// `document[key] = value`; every name in `removals` is dropped.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocumentPatch {
    fields: BTreeMap<String, Value>,
    removals: Vec<String>,
}

impl DocumentPatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a patch carrying every field of a full document, for
    /// merge-by-key upserts of rebuilt documents.
    pub fn from_document(document: &IndexDocument) -> Self {
        let mut patch = Self::new();
        for (key, value) in document.iter() {
            patch.fields.insert(key.clone(), value.clone());
        }
        patch
    }

    pub fn set(mut self, field: impl Into<String>, value: Value) -> Self {
        self.fields.insert(field.into(), value);
        self
    }

    pub fn unset(mut self, field: impl Into<String>) -> Self {
        self.removals.push(field.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty() && self.removals.is_empty()
    }

    pub fn fields(&self) -> &BTreeMap<String, Value> {
        &self.fields
    }

    pub fn removals(&self) -> &[String] {
        &self.removals
    }
}

/// An engine-agnostic document filter used for cascades and batch scans.
#[derive(Debug, Clone, PartialEq)]
pub enum DocumentFilter {
    /// Exact match on a (possibly nested) field.
    Term { field: String, value: String },
    /// Wildcard match on a keyword field, e.g. `PII.*`.
    Wildcard { field: String, pattern: String },
    /// Documents whose own id or `parent.id` equals the given id.
    IdOrParentId { id: Uuid },
}

impl DocumentFilter {
    pub fn term(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self::Term {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn wildcard(field: impl Into<String>, pattern: impl Into<String>) -> Self {
        Self::Wildcard {
            field: field.into(),
            pattern: pattern.into(),
        }
    }

    pub fn id_or_parent(id: Uuid) -> Self {
        Self::IdOrParentId { id }
    }
}

/// A server-side mutation applied to every document matching a filter.
#[derive(Debug, Clone, PartialEq)]
pub enum DocumentScript {
    /// Merge the patch into each document.
    SetFields(DocumentPatch),
    /// Remove entries with the given id from a list-valued field
    /// (e.g. drop one suite from every test case's `testSuites`).
    RemoveListEntry { field: String, id: Uuid },
}

/// One entry of a heterogeneous bulk submission.
#[derive(Debug, Clone)]
pub enum BulkOperation {
    /// Insert or fully replace.
    Upsert {
        index: String,
        id: String,
        document: IndexDocument,
    },
    /// Scripted merge of the patch into an existing document.
    Patch {
        index: String,
        id: String,
        patch: DocumentPatch,
    },
    /// Delete if present.
    Delete { index: String, id: String },
}

impl BulkOperation {
    pub fn index(&self) -> &str {
        match self {
            BulkOperation::Upsert { index, .. }
            | BulkOperation::Patch { index, .. }
            | BulkOperation::Delete { index, .. } => index,
        }
    }

    pub fn id(&self) -> &str {
        match self {
            BulkOperation::Upsert { id, .. }
            | BulkOperation::Patch { id, .. }
            | BulkOperation::Delete { id, .. } => id,
        }
    }
}

/// One failed item of a bulk submission.
#[derive(Debug, Clone)]
pub struct BulkFailure {
    pub index: String,
    pub id: String,
    pub reason: String,
}

/// Per-item outcome of a bulk submission. A bulk request never fails
/// atomically as a whole; callers inspect the counts.
#[derive(Debug, Clone, Default)]
pub struct BulkSummary {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub failures: Vec<BulkFailure>,
}

impl BulkSummary {
    pub fn empty() -> Self {
        Self::default()
    }
}

/// One hit of a filtered scan page.
#[derive(Debug, Clone)]
pub struct PageHit {
    /// The index the hit lives in (scans may span several).
    pub index: String,
    pub id: String,
    pub source: Value,
}

/// One page of a filtered scan, with an exact total so terminating
/// pagination loops never undercount.
#[derive(Debug, Clone)]
pub struct SearchPage {
    pub hits: Vec<PageHit>,
    /// Exact total hit count across all pages (never the approximate cap).
    pub total: u64,
}

/// The status of one entity type's index after creation or mapping update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IndexStatus {
    /// Index exists and its mapping is registered.
    Created,
    /// Creation or mapping registration failed; other entity types proceed.
    Failed(String),
}

impl IndexStatus {
    pub fn is_created(&self) -> bool {
        matches!(self, IndexStatus::Created)
    }
}

/// Sort direction for interactive search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Ascending,
    Descending,
}

impl SortOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Ascending => "asc",
            SortOrder::Descending => "desc",
        }
    }
}

/// An interactive search request from the query layer.
#[derive(Debug, Clone)]
pub struct SearchOptions {
    pub index: EntityType,
    /// Free-text query in the engine's query-string syntax.
    pub query: String,
    /// Raw engine-native filter fragment, merged with the generated query
    /// by boolean AND. Unparseable fragments are dropped with a warning.
    pub raw_filter: Option<String>,
    pub from: usize,
    pub size: usize,
    pub sort: Option<(String, SortOrder)>,
    /// Match soft-deleted documents instead of live ones.
    pub deleted: bool,
    /// Request an exact total-hit count instead of the approximate cap.
    pub exact_hits: bool,
}

impl SearchOptions {
    pub fn new(index: EntityType, query: impl Into<String>) -> Self {
        Self {
            index,
            query: query.into(),
            raw_filter: None,
            from: 0,
            size: 10,
            sort: None,
            deleted: false,
            exact_hits: false,
        }
    }

    pub fn with_raw_filter(mut self, raw_filter: impl Into<String>) -> Self {
        self.raw_filter = Some(raw_filter.into());
        self
    }

    pub fn with_pagination(mut self, from: usize, size: usize) -> Self {
        self.from = from;
        self.size = size;
        self
    }

    pub fn with_sort(mut self, field: impl Into<String>, order: SortOrder) -> Self {
        self.sort = Some((field.into(), order));
        self
    }

    pub fn with_deleted(mut self, deleted: bool) -> Self {
        self.deleted = deleted;
        self
    }

    pub fn with_exact_hits(mut self) -> Self {
        self.exact_hits = true;
        self
    }
}

/// A completion-suggest request from the query layer.
#[derive(Debug, Clone)]
pub struct SuggestOptions {
    pub index: EntityType,
    /// The completion field to query, e.g. `suggest` or `column_suggest`.
    pub field: String,
    pub prefix: String,
    pub size: usize,
    /// Category context applied to the primary `suggest` field.
    pub deleted: bool,
}

impl SuggestOptions {
    pub fn new(index: EntityType, field: impl Into<String>, prefix: impl Into<String>) -> Self {
        Self {
            index,
            field: field.into(),
            prefix: prefix.into(),
            size: 10,
            deleted: false,
        }
    }
}
