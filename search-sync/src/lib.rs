//! # Search Sync
//!
//! Main library for the metadata catalog search-index synchronization
//! engine.
//!
//! This crate provides the entry point and configuration for running the
//! synchronization pipeline: wiring the search store client, bootstrapping
//! index mappings, and exposing the event intake handle.

pub mod config;

pub use config::Dependencies;

use thiserror::Error;

/// Errors that can occur during engine initialization or execution.
#[derive(Error, Debug)]
pub enum IndexingError {
    /// Configuration error.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Pipeline error.
    #[error("Pipeline error: {0}")]
    PipelineError(#[from] search_sync_pipeline::PipelineError),

    /// Search error.
    #[error("Search error: {0}")]
    SearchError(#[from] search_sync_repository::SearchError),

    /// IO error.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl IndexingError {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }
}
