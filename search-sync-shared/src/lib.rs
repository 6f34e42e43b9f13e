//! # Search Sync Shared
//!
//! Shared data model for the search-index synchronization engine: the
//! entity type registry, typed entity snapshots, change events, and the
//! flat index-document representation that all other crates exchange.

pub mod document;
pub mod entity;
pub mod events;

pub use document::{IndexDocument, SuggestEntry};
pub use entity::{Column, EntityCore, EntityRef, EntitySnapshot, EntityType, TagLabel};
pub use events::{ChangeDescription, ChangeType, EntityChangeEvent, FieldChange, Revision};
