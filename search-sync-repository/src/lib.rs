//! # Search Sync Repository
//!
//! This crate provides the engine-agnostic search store contract and its
//! OpenSearch implementation: index lifecycle, single-document writes,
//! scripted merges, query-scoped bulk corrections, and the query surface
//! (search, suggest, aggregate) exposed to the query layer.

pub mod config;
pub mod errors;
pub mod interfaces;
pub mod opensearch;

pub use config::{LanguageAnalyzer, SearchStoreConfig};
pub use errors::SearchError;
pub use interfaces::{
    bootstrap_indexes, BootstrapReport, BulkOperation, BulkSummary, DocumentFilter, DocumentPatch,
    DocumentScript, IndexStatus, PageHit, SearchOptions, SearchPage, SearchStoreClient,
    SortOrder, SuggestOptions,
};
pub use opensearch::OpenSearchStore;
