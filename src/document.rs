//! Document state and the sync state machine.
//!
//! A document carries two copies of its fields: the live state the user
//! edits, and a shadow of the last state agreed with the remote store.
//! [`Document::sync`] compares the two, looks at what the last index
//! fetch reported, and issues at most one remote operation to move both
//! sides forward.

use crate::{
    edit::EditSet,
    error::{Result, SyncError},
    patch::PatchEngine,
    remote::{IndexEntry, RemoteResponse, RemoteStore},
    ConflictList, DocumentId, UserId, Version,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Stable, controller-assigned identity for a document.
///
/// Survives the document gaining or losing its remote id, which is what
/// delete requests and destroy notifications key on.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct DocumentHandle(pub(crate) u64);

/// The user-visible field group of a document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Fields {
    /// Document name
    pub name: String,
    /// Tag set
    #[serde(skip_serializing_if = "BTreeSet::is_empty", default)]
    pub tags: BTreeSet<String>,
    /// Ids of users the document is shared with
    #[serde(skip_serializing_if = "BTreeSet::is_empty", default)]
    pub collaborators: BTreeSet<UserId>,
    /// Document text
    pub content: String,
}

/// The last document state known to be agreed with the remote store.
///
/// `id` and `version` are `None` for a document that has never been
/// persisted remotely. Shadow fields are only ever overwritten by
/// [`Document::apply_remote_response`], never by user edits.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Shadow {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<DocumentId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<Version>,
    pub fields: Fields,
}

/// Controller capabilities a document needs while syncing.
///
/// Documents are polymorphic over "can reach the remote store and the
/// patch engine, and accepts updated/destroy notifications" — never over
/// a concrete controller type.
pub trait SyncContext {
    /// The transport collaborator.
    fn remote(&mut self) -> &mut dyn RemoteStore;

    /// The text-diff collaborator.
    fn patch(&self) -> &dyn PatchEngine;

    /// A remote response has been folded into the document.
    fn updated(&mut self, document: &Document);

    /// A deletion was confirmed; the owner must drop the document.
    fn destroy(&mut self, document: &Document);
}

/// One document, holding both live and shadow state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    handle: DocumentHandle,
    live: Fields,
    shadow: Shadow,
    #[serde(skip_serializing_if = "Option::is_none")]
    server_version: Option<Version>,
    deleted_from_server: bool,
    deleted_from_client: bool,
}

impl Document {
    /// A brand-new local document; the server has never seen it.
    pub(crate) fn new_local(handle: DocumentHandle, fields: Fields) -> Self {
        Self {
            handle,
            live: fields,
            shadow: Shadow::default(),
            server_version: None,
            deleted_from_server: false,
            deleted_from_client: false,
        }
    }

    /// Materialize a document the server holds but the client has never
    /// seen.
    ///
    /// The index entry is summary data: the shadow gets the remote id and
    /// name but no version, so the next sync pulls the full content.
    pub(crate) fn from_index_entry(handle: DocumentHandle, entry: IndexEntry) -> Self {
        let fields = Fields {
            name: entry.name,
            ..Fields::default()
        };
        Self {
            handle,
            live: fields.clone(),
            shadow: Shadow {
                id: Some(entry.id),
                version: None,
                fields,
            },
            server_version: Some(entry.version),
            deleted_from_server: false,
            deleted_from_client: false,
        }
    }

    /// The controller-assigned handle.
    pub fn handle(&self) -> DocumentHandle {
        self.handle
    }

    /// The live, user-visible fields.
    pub fn live(&self) -> &Fields {
        &self.live
    }

    /// Mutable access to the live fields. Edits recorded here are picked
    /// up by the next reconciliation pass.
    pub fn live_mut(&mut self) -> &mut Fields {
        &mut self.live
    }

    /// The last state agreed with the remote store.
    pub fn shadow(&self) -> &Shadow {
        &self.shadow
    }

    /// The remote id, if the document has one.
    pub fn shadow_id(&self) -> Option<&DocumentId> {
        self.shadow.id.as_ref()
    }

    /// The last version agreed with the remote store.
    pub fn shadow_version(&self) -> Option<Version> {
        self.shadow.version
    }

    /// The version observed in the most recent index fetch.
    pub fn server_version(&self) -> Option<Version> {
        self.server_version
    }

    /// True when the last index fetch no longer listed this document.
    pub fn deleted_from_server(&self) -> bool {
        self.deleted_from_server
    }

    /// True when the user requested deletion of a server-known document.
    pub fn deleted_from_client(&self) -> bool {
        self.deleted_from_client
    }

    pub(crate) fn record_index_match(&mut self, version: Version) {
        self.server_version = Some(version);
        self.deleted_from_server = false;
    }

    pub(crate) fn record_index_miss(&mut self) {
        self.deleted_from_server = true;
    }

    pub(crate) fn schedule_client_delete(&mut self) {
        self.deleted_from_client = true;
    }

    /// Compute the difference between live and shadow state.
    ///
    /// `None` when the shadow is unset or no field differs.
    pub fn compute_edit_set(&self, patch: &dyn PatchEngine) -> Option<EditSet> {
        EditSet::between(&self.shadow, &self.live, patch)
    }

    /// True when any live field differs from its shadow counterpart.
    ///
    /// Equivalent to [`Document::compute_edit_set`] being non-empty,
    /// without paying for the patch script.
    pub fn has_local_edits(&self) -> bool {
        self.shadow.id.is_some() && self.shadow.version.is_some() && self.live != self.shadow.fields
    }

    /// True when the last index fetch saw a version the shadow has not
    /// caught up to.
    pub fn has_server_edits(&self) -> bool {
        self.shadow.version != self.server_version
    }

    /// True once the document has a remote identity.
    pub fn is_known_to_server(&self) -> bool {
        self.shadow.id.is_some()
    }

    /// True for a document materialized from the index this pass and not
    /// yet round-tripped through a create or fetch response.
    pub fn is_freshly_inserted_from_server(&self) -> bool {
        self.server_version.is_some() && self.shadow.version.is_none()
    }

    /// Run the sync state machine: decide which single remote operation
    /// this document needs and perform it.
    ///
    /// Branches are evaluated in strict priority order; the first match
    /// wins and determines exactly one network operation (or none).
    /// Deletions always yield to edits: a server-side delete racing a
    /// local edit re-creates the document, and a client-side delete
    /// racing an unseen server edit fetches instead of deleting.
    pub fn sync(&mut self, ctx: &mut dyn SyncContext) -> Result<Option<ConflictList>> {
        if self.deleted_from_server {
            if self.has_local_edits() {
                // The remote copy is gone; re-post the live state as new.
                self.deleted_from_server = false;
                return self.create(ctx);
            }
            ctx.destroy(self);
            return Ok(None);
        }
        if self.deleted_from_client {
            if self.has_server_edits() {
                // The server moved on since the delete was requested;
                // pull the new state rather than deleting it.
                self.deleted_from_client = false;
                return self.fetch(ctx);
            }
            return self.delete(ctx);
        }

        if !self.is_known_to_server() {
            return self.create(ctx);
        }
        if self.is_freshly_inserted_from_server() {
            // The index only carried summary fields.
            return self.fetch(ctx);
        }

        if self.has_local_edits() {
            return self.update(ctx);
        }
        if self.has_server_edits() {
            return self.fetch(ctx);
        }

        Ok(None)
    }

    fn create(&mut self, ctx: &mut dyn SyncContext) -> Result<Option<ConflictList>> {
        tracing::info!("creating: {}", self);
        let response = ctx.remote().create(&self.live)?;
        Ok(self.apply_remote_response(response, ctx))
    }

    fn fetch(&mut self, ctx: &mut dyn SyncContext) -> Result<Option<ConflictList>> {
        let id = self.known_id()?;
        tracing::info!("fetching: {}", self);
        let response = ctx.remote().fetch(&id)?;
        Ok(self.apply_remote_response(response, ctx))
    }

    fn update(&mut self, ctx: &mut dyn SyncContext) -> Result<Option<ConflictList>> {
        let id = self.known_id()?;
        let Some(edits) = self.compute_edit_set(ctx.patch()) else {
            return Ok(None);
        };
        tracing::info!("updating: {}", self);
        let response = ctx.remote().update(&id, &edits)?;
        Ok(self.apply_remote_response(response, ctx))
    }

    fn delete(&mut self, ctx: &mut dyn SyncContext) -> Result<Option<ConflictList>> {
        let id = self.known_id()?;
        let version = self.shadow.version.ok_or(SyncError::NeverSynced)?;
        tracing::info!("deleting: {}", self);
        let response = ctx.remote().delete(&id, version)?;
        Ok(self.apply_remote_response(response, ctx))
    }

    fn known_id(&self) -> Result<DocumentId> {
        self.shadow.id.clone().ok_or(SyncError::NeverSynced)
    }

    /// Fold a remote response into the document: every field present in
    /// the response overwrites its shadow counterpart and is mirrored
    /// into the live state. A version of `0` is a real version.
    ///
    /// If the document was scheduled for deletion on the client when the
    /// response arrived, the response must not resurrect it: the owner is
    /// asked to destroy the document and any field data is discarded.
    pub fn apply_remote_response(
        &mut self,
        response: RemoteResponse,
        ctx: &mut dyn SyncContext,
    ) -> Option<ConflictList> {
        if self.deleted_from_client {
            ctx.destroy(self);
            return None;
        }

        if let Some(id) = response.id {
            self.shadow.id = Some(id);
        }
        if let Some(version) = response.version {
            self.shadow.version = Some(version);
            self.server_version = Some(version);
        }
        if let Some(name) = response.name {
            self.shadow.fields.name = name.clone();
            self.live.name = name;
        }
        if let Some(tags) = response.tags {
            self.shadow.fields.tags = tags.clone();
            self.live.tags = tags;
        }
        if let Some(collaborators) = response.collaborators {
            self.shadow.fields.collaborators = collaborators.clone();
            self.live.collaborators = collaborators;
        }
        if let Some(content) = response.content {
            self.shadow.fields.content = content.clone();
            self.live.content = content;
        }

        ctx.updated(self);

        response.conflicts.filter(|conflicts| !conflicts.is_empty())
    }
}

impl fmt::Display for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let id = self.shadow.id.as_deref().unwrap_or("-");
        match self.shadow.version {
            Some(version) => write!(f, "{:?} {} v{}", self.live.name, id, version),
            None => write!(f, "{:?} {} v-", self.live.name, id),
        }
    }
}
