//! Edit sets: what changed locally since the last agreed state.

use crate::{
    document::{Fields, Shadow},
    patch::{PatchEngine, PatchScript},
    UserId, Version,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// The difference between a document's live state and its shadow,
/// expressed the way the remote store consumes it.
///
/// `base_version` is always present; every other member is independently
/// optional. Tag and collaborator changes travel as whole add/remove
/// sets, content changes as an opaque patch script.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditSet {
    /// Shadow version these edits are based on.
    pub base_version: Version,
    /// New name, when renamed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "BTreeSet::is_empty", default)]
    pub tags_added: BTreeSet<String>,
    #[serde(skip_serializing_if = "BTreeSet::is_empty", default)]
    pub tags_removed: BTreeSet<String>,
    #[serde(skip_serializing_if = "BTreeSet::is_empty", default)]
    pub collaborators_added: BTreeSet<UserId>,
    #[serde(skip_serializing_if = "BTreeSet::is_empty", default)]
    pub collaborators_removed: BTreeSet<UserId>,
    /// Script rewriting the shadow content into the live content.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub patch: Option<PatchScript>,
}

impl EditSet {
    /// Compare live fields against their shadow.
    ///
    /// Returns `None` when the shadow has no id or version yet (there is
    /// nothing agreed to diff against) or when no field differs. A
    /// returned edit set is never empty.
    pub fn between(shadow: &Shadow, live: &Fields, patch: &dyn PatchEngine) -> Option<EditSet> {
        if shadow.id.is_none() {
            return None;
        }
        let base_version = shadow.version?;

        let mut edits = EditSet {
            base_version,
            name: None,
            tags_added: BTreeSet::new(),
            tags_removed: BTreeSet::new(),
            collaborators_added: BTreeSet::new(),
            collaborators_removed: BTreeSet::new(),
            patch: None,
        };

        if live.name != shadow.fields.name {
            edits.name = Some(live.name.clone());
        }
        if live.tags != shadow.fields.tags {
            edits.tags_added = live.tags.difference(&shadow.fields.tags).cloned().collect();
            edits.tags_removed = shadow.fields.tags.difference(&live.tags).cloned().collect();
        }
        if live.collaborators != shadow.fields.collaborators {
            edits.collaborators_added = live
                .collaborators
                .difference(&shadow.fields.collaborators)
                .cloned()
                .collect();
            edits.collaborators_removed = shadow
                .fields
                .collaborators
                .difference(&live.collaborators)
                .cloned()
                .collect();
        }
        if live.content != shadow.fields.content {
            edits.patch = Some(patch.make(&shadow.fields.content, &live.content));
        }

        if edits.is_empty() {
            None
        } else {
            Some(edits)
        }
    }

    /// True when no field-level change is recorded.
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.tags_added.is_empty()
            && self.tags_removed.is_empty()
            && self.collaborators_added.is_empty()
            && self.collaborators_removed.is_empty()
            && self.patch.is_none()
    }
}
