//! The synchronizer: owns the document collection and reconciles it
//! against the remote store.
//!
//! The collection is a single-owner container. Nothing outside holds a
//! long-lived reference into it; iteration is exposed through read-only
//! views and mutation happens only through [`Synchronizer::create_local`]
//! and [`Synchronizer::destroy`].

use crate::{
    document::{Document, DocumentHandle, Fields, SyncContext},
    error::{Result, SyncError},
    patch::PatchEngine,
    remote::{IndexEntry, RemoteStore},
    ConflictList, DocumentId,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A conflict surfaced by one reconciliation pass.
///
/// Reported for observability only; the engine never retries and never
/// overwrites the losing side. The next pass re-resolves against a fresh
/// index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConflictReport {
    /// Handle of the conflicted document.
    pub handle: DocumentHandle,
    /// Document name at the time of the conflict.
    pub name: String,
    /// Fields the server could not merge; `["version"]` when a versioned
    /// update or delete was rejected outright.
    pub fields: ConflictList,
}

/// Owns the full document collection and reconciles it against the
/// remote store, one document at a time.
///
/// The remote store cannot process more than one in-flight document
/// operation, so a pass is strictly serial; taking `&mut self` also
/// means a second pass cannot start while one is running.
pub struct Synchronizer<R, P> {
    remote: R,
    patch: P,
    documents: Vec<Document>,
    next_handle: u64,
}

impl<R: RemoteStore, P: PatchEngine> Synchronizer<R, P> {
    /// Create a synchronizer over an empty collection.
    pub fn new(remote: R, patch: P) -> Self {
        Self {
            remote,
            patch,
            documents: Vec::new(),
            next_handle: 0,
        }
    }

    /// Borrow the transport collaborator.
    pub fn remote(&self) -> &R {
        &self.remote
    }

    /// Mutable access to the transport collaborator.
    pub fn remote_mut(&mut self) -> &mut R {
        &mut self.remote
    }

    /// All owned documents except those scheduled for deletion on the
    /// client.
    pub fn visible_documents(&self) -> impl Iterator<Item = &Document> {
        self.documents.iter().filter(|d| !d.deleted_from_client())
    }

    /// Look up a document by handle.
    pub fn document(&self, handle: DocumentHandle) -> Option<&Document> {
        self.documents.iter().find(|d| d.handle() == handle)
    }

    /// Look up a document by handle for live-field edits.
    pub fn document_mut(&mut self, handle: DocumentHandle) -> Option<&mut Document> {
        self.documents.iter_mut().find(|d| d.handle() == handle)
    }

    /// Number of owned documents, including those scheduled for delete.
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    /// True when the collection holds no documents at all.
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Create a document from user-supplied fields.
    ///
    /// The shadow is left unset; the next reconciliation pass posts the
    /// document to the server.
    pub fn create_local(&mut self, fields: Fields) -> &Document {
        let handle = self.allocate_handle();
        let document = Document::new_local(handle, fields);
        tracing::info!("created: {}", document);
        let index = self.documents.len();
        self.documents.push(document);
        &self.documents[index]
    }

    /// Schedule a document for deletion.
    ///
    /// A document the server has never seen is discarded immediately with
    /// no network round trip; anything else is soft-deleted, disappears
    /// from [`Synchronizer::visible_documents`], and is resolved by the
    /// next pass.
    pub fn request_delete(&mut self, handle: DocumentHandle) {
        let Some(document) = self.documents.iter_mut().find(|d| d.handle() == handle) else {
            return;
        };
        if document.is_known_to_server() {
            document.schedule_client_delete();
            tracing::info!("scheduled delete: {}", document);
        } else {
            self.destroy(handle);
        }
    }

    /// Remove a document from the collection. No-op if it is already
    /// gone.
    pub fn destroy(&mut self, handle: DocumentHandle) {
        if let Some(position) = self.documents.iter().position(|d| d.handle() == handle) {
            let document = self.documents.remove(position);
            tracing::info!("deleted: {}", document);
        }
    }

    /// Notification hook: a document's state changed. Observability only.
    pub fn updated(&self, document: &Document) {
        tracing::info!("updated: {}", document);
    }

    /// Run one reconciliation pass.
    ///
    /// Fetches the remote index, classifies every owned document as
    /// matched, server-deleted, or untouched, materializes local
    /// documents for index entries the client has never seen, then syncs
    /// each participant in turn. Safe to repeat: with no intervening
    /// changes on either side, a pass performs no mutating operations.
    ///
    /// Transport failures abort the pass. Documents already synced keep
    /// their new state; the failing document is restored so the next
    /// pass can retry it.
    pub fn reconcile(&mut self) -> Result<Vec<ConflictReport>> {
        let mut remote_index: BTreeMap<DocumentId, IndexEntry> = self
            .remote
            .list_index()?
            .into_iter()
            .map(|entry| (entry.id.clone(), entry))
            .collect();

        // Classify before any content moves: every owned document either
        // consumes its index entry or learns it is gone from the server.
        let mut participants: Vec<DocumentHandle> = Vec::with_capacity(self.documents.len());
        for document in &mut self.documents {
            if let Some(id) = document.shadow_id().cloned() {
                match remote_index.remove(&id) {
                    Some(entry) => document.record_index_match(entry.version),
                    None => document.record_index_miss(),
                }
            }
            participants.push(document.handle());
        }

        // Whatever the index still holds is new to the client. Sorted
        // drain keeps materialization order stable across passes.
        for (_, entry) in remote_index {
            let handle = self.allocate_handle();
            let document = Document::from_index_entry(handle, entry);
            tracing::info!("created: {}", document);
            self.documents.push(document);
            participants.push(handle);
        }

        let mut reports = Vec::new();
        for handle in participants {
            self.sync_one(handle, &mut reports)?;
        }
        Ok(reports)
    }

    fn sync_one(&mut self, handle: DocumentHandle, reports: &mut Vec<ConflictReport>) -> Result<()> {
        let Some(position) = self.documents.iter().position(|d| d.handle() == handle) else {
            return Ok(());
        };
        let mut document = self.documents.remove(position);
        let checkpoint = document.clone();

        let mut reclassified = false;
        loop {
            let (result, destroyed) = {
                let mut pass = Pass {
                    remote: &mut self.remote,
                    patch: &self.patch,
                    destroyed: false,
                };
                let result = document.sync(&mut pass);
                (result, pass.destroyed)
            };

            match result {
                Ok(conflicts) => {
                    if let Some(fields) = conflicts {
                        tracing::warn!("conflicts on {}: {:?}", document, fields);
                        reports.push(ConflictReport {
                            handle,
                            name: document.live().name.clone(),
                            fields,
                        });
                    }
                    if !destroyed {
                        self.documents.insert(position, document);
                    }
                    return Ok(());
                }
                Err(SyncError::NotFound(_)) if !reclassified => {
                    // The id vanished between the index fetch and this
                    // call: a server delete discovered late. Reclassify
                    // and run the state machine once more.
                    reclassified = true;
                    document = checkpoint.clone();
                    document.record_index_miss();
                }
                Err(SyncError::VersionConflict { .. }) => {
                    // Not fatal: surface it and let the next pass
                    // re-resolve against a fresh index.
                    tracing::warn!("version conflict on {}", document);
                    reports.push(ConflictReport {
                        handle,
                        name: document.live().name.clone(),
                        fields: vec!["version".to_string()],
                    });
                    self.documents.insert(position, document);
                    return Ok(());
                }
                Err(err) => {
                    // Transport and the rest abort the pass. The document
                    // goes back untouched so a retry starts clean.
                    self.documents.insert(position, checkpoint);
                    return Err(err);
                }
            }
        }
    }

    fn allocate_handle(&mut self) -> DocumentHandle {
        let handle = DocumentHandle(self.next_handle);
        self.next_handle += 1;
        handle
    }
}

/// Per-pass sync context handed to documents: access to the collaborators
/// plus the updated/destroy notification channel.
struct Pass<'a, R, P> {
    remote: &'a mut R,
    patch: &'a P,
    destroyed: bool,
}

impl<R: RemoteStore, P: PatchEngine> SyncContext for Pass<'_, R, P> {
    fn remote(&mut self) -> &mut dyn RemoteStore {
        &mut *self.remote
    }

    fn patch(&self) -> &dyn PatchEngine {
        self.patch
    }

    fn updated(&mut self, document: &Document) {
        tracing::info!("updated: {}", document);
    }

    fn destroy(&mut self, document: &Document) {
        tracing::info!("deleted: {}", document);
        self.destroyed = true;
    }
}
