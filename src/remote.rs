//! The remote store boundary and its wire shapes.
//!
//! The engine drives a document CRUD surface over an abstract transport.
//! Responses are sparse: only the fields the server chose to send are
//! present, and absent is distinct from empty — a version of `0` is a
//! real version.

use crate::{
    document::Fields, edit::EditSet, error::Result, ConflictList, DocumentId, UserId, Version,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// One row of the remote index: the summary the server publishes for
/// every document it holds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexEntry {
    /// Remote identifier of the document
    pub id: DocumentId,
    /// Version currently held by the server
    pub version: Version,
    /// Document name
    pub name: String,
}

/// The server's view of a document after an operation.
///
/// Every field is optional; [`Document::apply_remote_response`] folds in
/// exactly the fields that are present.
///
/// [`Document::apply_remote_response`]: crate::Document::apply_remote_response
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<DocumentId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<Version>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<BTreeSet<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub collaborators: Option<BTreeSet<UserId>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    /// Fields the server could not merge automatically.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conflicts: Option<ConflictList>,
}

/// The document CRUD surface of the remote store.
///
/// One call here is one network round trip. The store cannot process more
/// than one in-flight document operation, so callers issue these strictly
/// one at a time.
pub trait RemoteStore {
    /// Fetch the summary index of every document the store holds.
    fn list_index(&mut self) -> Result<Vec<IndexEntry>>;

    /// Create a new document from full field state.
    fn create(&mut self, fields: &Fields) -> Result<RemoteResponse>;

    /// Fetch the full state of one document.
    fn fetch(&mut self, id: &DocumentId) -> Result<RemoteResponse>;

    /// Apply an edit set to one document. The edit set's base version
    /// must match the store's current version.
    fn update(&mut self, id: &DocumentId, edits: &EditSet) -> Result<RemoteResponse>;

    /// Delete one document. `version` must match the store's current
    /// version so a racing edit is not silently discarded.
    fn delete(&mut self, id: &DocumentId, version: Version) -> Result<RemoteResponse>;
}
