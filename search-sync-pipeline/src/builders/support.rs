//! Shared helpers for document builders: serialization with field
//! exclusion, suggest entries, tag parsing and nested-structure flattening.

use serde::Serialize;
use serde_json::json;

use crate::errors::PipelineError;
use search_sync_shared::{Column, EntityCore, EntityRef, IndexDocument, SuggestEntry, TagLabel};

/// The distinguished classification whose labels become the `tier` field
/// instead of general tags.
const TIER_CLASSIFICATION_PREFIX: &str = "Tier.";

/// Serialize a snapshot and drop its non-indexable fields.
pub fn base_document<T: Serialize>(
    snapshot: &T,
    excluded_fields: &[&str],
) -> Result<IndexDocument, PipelineError> {
    let value =
        serde_json::to_value(snapshot).map_err(|e| PipelineError::serialization(e.to_string()))?;
    let mut doc = IndexDocument::from_value(value)
        .ok_or_else(|| PipelineError::serialization("Snapshot did not serialize to an object"))?;
    for field in excluded_fields {
        doc.remove(field);
    }
    Ok(doc)
}

/// The primary suggester: name or display name at weight 10, fully
/// qualified name at weight 5.
pub fn primary_suggest(core: &EntityCore) -> Vec<SuggestEntry> {
    let mut suggest = Vec::with_capacity(2);
    if let Some(fqn) = &core.fully_qualified_name {
        suggest.push(SuggestEntry::new(fqn, 5));
    }
    suggest.push(SuggestEntry::new(
        core.display_name.as_deref().unwrap_or(&core.name),
        10,
    ));
    suggest
}

/// Secondary suggester over a service reference.
pub fn service_suggest(service: &EntityRef) -> Vec<SuggestEntry> {
    vec![SuggestEntry::new(&service.name, 5)]
}

/// Secondary suggester over flattened leaf names.
pub fn leaf_suggest(leaves: &[FlatColumn]) -> Vec<SuggestEntry> {
    leaves
        .iter()
        .map(|leaf| SuggestEntry::new(&leaf.name, 5))
        .collect()
}

/// Entity tags split into general tags and the distinguished tier label.
#[derive(Debug, Clone, Default)]
pub struct ParsedTags {
    pub tags: Vec<TagLabel>,
    pub tier: Option<TagLabel>,
}

/// Split a tag-label set: the first `Tier.*` label is the tier, everything
/// else stays a general tag.
pub fn parse_tags(labels: &[TagLabel]) -> ParsedTags {
    let mut parsed = ParsedTags::default();
    for label in labels {
        if label.tag_fqn.starts_with(TIER_CLASSIFICATION_PREFIX) {
            if parsed.tier.is_none() {
                parsed.tier = Some(label.clone());
            }
        } else {
            parsed.tags.push(label.clone());
        }
    }
    parsed
}

/// Entity-level labels plus the labels carried by flattened leaves.
pub fn collect_tags(entity_labels: &[TagLabel], leaves: &[FlatColumn]) -> Vec<TagLabel> {
    let mut labels = entity_labels.to_vec();
    for leaf in leaves {
        for tag in &leaf.tags {
            if !labels.iter().any(|existing| existing.tag_fqn == tag.tag_fqn) {
                labels.push(tag.clone());
            }
        }
    }
    labels
}

/// Follower ids as indexed.
pub fn follower_ids(followers: &[EntityRef]) -> Vec<String> {
    followers
        .iter()
        .map(|follower| follower.id.to_string())
        .collect()
}

/// One flattened leaf of a nested column/field tree.
#[derive(Debug, Clone, PartialEq)]
pub struct FlatColumn {
    /// Dotted qualified name: parent path + "." + local name.
    pub name: String,
    pub description: Option<String>,
    pub tags: Vec<TagLabel>,
}

/// Recursively flatten a column tree into leaves with dotted qualified
/// names. The containment tree has no cycles, so plain recursion is fine.
pub fn flatten_columns(columns: &[Column]) -> Vec<FlatColumn> {
    let mut leaves = Vec::new();
    flatten_into(columns, None, &mut leaves);
    leaves
}

fn flatten_into(columns: &[Column], parent: Option<&str>, leaves: &mut Vec<FlatColumn>) {
    for column in columns {
        let qualified_name = match parent {
            Some(parent) => format!("{}.{}", parent, column.name),
            None => column.name.clone(),
        };
        leaves.push(FlatColumn {
            name: qualified_name.clone(),
            description: column.description.clone(),
            tags: column.tags.clone(),
        });
        if !column.children.is_empty() {
            flatten_into(&column.children, Some(&qualified_name), leaves);
        }
    }
}

/// Default a missing owner display name to the owner's name.
pub fn normalize_owner(owner: &mut Option<EntityRef>) {
    if let Some(owner) = owner {
        if owner.display_name.as_deref().map_or(true, str::is_empty) {
            owner.display_name = Some(owner.name.clone());
        }
    }
}

/// Stamp the synthetic fields every document carries.
pub fn stamp_common(
    doc: &mut IndexDocument,
    entity_type: &str,
    core: &EntityCore,
    parsed: &ParsedTags,
    suggest: &[SuggestEntry],
) {
    doc.insert(
        "displayName",
        json!(core.display_name.as_deref().unwrap_or(&core.name)),
    );
    doc.insert_serialized("tags", &parsed.tags);
    doc.insert_serialized("tier", &parsed.tier);
    doc.insert_serialized("followers", &follower_ids(&core.followers));
    doc.insert_serialized("suggest", &suggest);
    doc.insert("entityType", json!(entity_type));
    doc.insert("deleted", json!(core.deleted));
}
