//! OpenSearch implementation of the search store client.
//!
//! This module provides a concrete implementation of `SearchStoreClient`
//! using OpenSearch as the backend.

mod client;
mod index_config;
pub mod queries;

pub use client::OpenSearchStore;
pub use index_config::{index_mapping, mapping_body};
