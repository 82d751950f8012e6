//! # Quill Engine
//!
//! Shadow-copy differential synchronization for a collection of editable
//! text documents.
//!
//! Every document carries two copies of its state: the **live** fields the
//! user edits and a **shadow** of the last state agreed with the remote
//! store. One [`Synchronizer::reconcile`] pass fetches the remote index,
//! classifies each document as matched, deleted on the server, or new on
//! the server, and then gives every affected document exactly one network
//! operation to move both sides forward.
//!
//! ## Design Principles
//!
//! - **No IO**: the engine drives two injected collaborators — a
//!   [`RemoteStore`] transport and a [`PatchEngine`] text differ — and
//!   performs no network or file access of its own.
//! - **Deterministic**: a pass visits documents in a stable order and
//!   issues at most one operation per document; repeating a pass with no
//!   intervening changes on either side performs no mutating operations.
//! - **Edits win over deletes**: a server-side delete racing a local edit
//!   re-creates the document, and a client-side delete racing an unseen
//!   server edit fetches instead of deleting. Content is never silently
//!   dropped.
//!
//! ## Core Concepts
//!
//! ### Documents
//!
//! A [`Document`] pairs its live [`Fields`] (name, tags, collaborators,
//! content) with a [`Shadow`] of the same fields plus the remote id and
//! version. Shadow state is only ever overwritten by remote responses,
//! so comparing live against shadow is exactly "what changed locally".
//!
//! ### Edit sets
//!
//! Local changes travel as an [`EditSet`]: the base version, an optional
//! new name, tag and collaborator add/remove sets, and an opaque
//! [`PatchScript`] rewriting the shadow content into the live content.
//!
//! ### Reconciliation
//!
//! The [`Synchronizer`] owns the collection. Its `reconcile` pass matches
//! the remote index against local shadows before any content moves, so
//! the per-document state machine only ever resolves a single, already
//! classified case. Conflicts reported by the store come back as
//! [`ConflictReport`]s and are left for the next pass.
//!
//! ## Quick Start
//!
//! ```rust
//! use quill_engine::{
//!     DocumentId, EditSet, Fields, IndexEntry, PatchEngine, PatchScript,
//!     RemoteResponse, RemoteStore, Result, Synchronizer, Version,
//! };
//!
//! // A stub transport; a real client would speak HTTP here.
//! #[derive(Default)]
//! struct Remote {
//!     created: u64,
//! }
//!
//! impl RemoteStore for Remote {
//!     fn list_index(&mut self) -> Result<Vec<IndexEntry>> {
//!         Ok(Vec::new())
//!     }
//!     fn create(&mut self, fields: &Fields) -> Result<RemoteResponse> {
//!         self.created += 1;
//!         Ok(RemoteResponse {
//!             id: Some(format!("doc-{}", self.created)),
//!             version: Some(0),
//!             name: Some(fields.name.clone()),
//!             content: Some(fields.content.clone()),
//!             ..RemoteResponse::default()
//!         })
//!     }
//!     fn fetch(&mut self, _id: &DocumentId) -> Result<RemoteResponse> {
//!         Ok(RemoteResponse::default())
//!     }
//!     fn update(&mut self, _id: &DocumentId, _edits: &EditSet) -> Result<RemoteResponse> {
//!         Ok(RemoteResponse::default())
//!     }
//!     fn delete(&mut self, _id: &DocumentId, _version: Version) -> Result<RemoteResponse> {
//!         Ok(RemoteResponse::default())
//!     }
//! }
//!
//! // A stub differ that ships the new text whole.
//! struct Differ;
//!
//! impl PatchEngine for Differ {
//!     fn make(&self, _old: &str, new: &str) -> PatchScript {
//!         PatchScript::new(new)
//!     }
//!     fn apply(&self, _base: &str, script: &PatchScript) -> Result<String> {
//!         Ok(script.as_str().to_string())
//!     }
//! }
//!
//! let mut sync = Synchronizer::new(Remote::default(), Differ);
//! let handle = sync
//!     .create_local(Fields {
//!         name: "notes".to_string(),
//!         content: "first draft".to_string(),
//!         ..Fields::default()
//!     })
//!     .handle();
//!
//! let conflicts = sync.reconcile()?;
//! assert!(conflicts.is_empty());
//!
//! let doc = sync.document(handle).unwrap();
//! assert!(doc.is_known_to_server());
//! assert_eq!(doc.shadow_version(), Some(0));
//! assert_eq!(doc.live().content, doc.shadow().fields.content);
//! # Ok::<(), quill_engine::SyncError>(())
//! ```

pub mod controller;
pub mod document;
pub mod edit;
pub mod error;
pub mod patch;
pub mod remote;

// Re-export main types at crate root
pub use controller::{ConflictReport, Synchronizer};
pub use document::{Document, DocumentHandle, Fields, Shadow, SyncContext};
pub use edit::EditSet;
pub use error::{Result, SyncError};
pub use patch::{PatchEngine, PatchScript};
pub use remote::{IndexEntry, RemoteResponse, RemoteStore};

/// Type aliases for clarity
pub type DocumentId = String;
pub type UserId = String;
pub type Version = u64;
/// Fields the remote store reported as unmergeable.
pub type ConflictList = Vec<String>;
