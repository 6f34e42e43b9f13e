//! Interface definitions for the search store client.
//!
//! This module defines the abstract `SearchStoreClient` trait and the
//! value objects its operations exchange, allowing for dependency
//! injection and swappable backend implementations.

mod bootstrap;
mod requests;
mod search_store;

pub use bootstrap::{bootstrap_indexes, BootstrapReport};
pub use requests::{
    BulkFailure, BulkOperation, BulkSummary, DocumentFilter, DocumentPatch, DocumentScript,
    IndexStatus, PageHit, SearchOptions, SearchPage, SortOrder, SuggestOptions,
};
pub use search_store::SearchStoreClient;
