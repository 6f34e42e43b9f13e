//! Minimal field-delta patches for revision-preserving updates.
//!
//! An update that does not bump the entity revision carries a change
//! description instead of a meaningful new snapshot; only the named fields
//! are merged, so concurrently-written derived fields are not clobbered.

use search_sync_repository::DocumentPatch;
use search_sync_shared::ChangeDescription;

/// Turn a change description into a patch: added and updated fields become
/// sets, deleted fields become removals. Fields without a new value are
/// skipped.
pub fn delta_patch(change: &ChangeDescription) -> DocumentPatch {
    let mut patch = DocumentPatch::new();
    for field in change.fields_added.iter().chain(&change.fields_updated) {
        if let Some(value) = &field.new_value {
            patch = patch.set(field.name.clone(), value.clone());
        }
    }
    for field in &change.fields_deleted {
        patch = patch.unset(field.name.clone());
    }
    patch
}
