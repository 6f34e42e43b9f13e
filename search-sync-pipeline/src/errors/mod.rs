//! Error types for the search-sync pipeline.

use search_sync_repository::SearchError;
use thiserror::Error;

/// Errors that can occur in the search-sync pipeline.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// A document builder could not process the given snapshot.
    #[error("Builder error: {0}")]
    BuilderError(String),

    /// A change event could not be propagated to the index.
    #[error("Propagation error: {0}")]
    PropagationError(String),

    /// A batch correction failed.
    #[error("Reindex error: {0}")]
    ReindexError(String),

    /// Error from the search store.
    #[error("Search error: {0}")]
    SearchError(#[from] SearchError),

    /// Error serializing a snapshot or patch.
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// Channel communication error.
    #[error("Channel error: {0}")]
    ChannelError(String),
}

impl PipelineError {
    /// Create a builder error.
    pub fn builder(msg: impl Into<String>) -> Self {
        Self::BuilderError(msg.into())
    }

    /// Create a propagation error.
    pub fn propagation(msg: impl Into<String>) -> Self {
        Self::PropagationError(msg.into())
    }

    /// Create a reindex error.
    pub fn reindex(msg: impl Into<String>) -> Self {
        Self::ReindexError(msg.into())
    }

    /// Create a serialization error.
    pub fn serialization(msg: impl Into<String>) -> Self {
        Self::SerializationError(msg.into())
    }

    /// Create a channel error.
    pub fn channel(msg: impl Into<String>) -> Self {
        Self::ChannelError(msg.into())
    }
}
