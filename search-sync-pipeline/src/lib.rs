//! # Search Sync Pipeline
//!
//! This crate turns entity-change events into search index operations.
//!
//! ## Architecture
//!
//! 1. **Builders**: transform typed entity snapshots into flat documents
//! 2. **Propagator**: decide the index operation(s) for each change event
//! 3. **Reindexer**: paginated bulk corrections across indices
//! 4. **Orchestrator**: route events from the intake channel

pub mod builders;
pub mod errors;
pub mod orchestrator;
pub mod propagator;
pub mod reindexer;

#[cfg(test)]
pub(crate) mod testing;

pub use builders::{BuilderRegistry, DocumentBuilder};
pub use errors::PipelineError;
pub use orchestrator::{EventSender, Orchestrator, OrchestratorConfig};
pub use propagator::ChangePropagator;
pub use reindexer::{BatchReindexer, ReindexSummary};
