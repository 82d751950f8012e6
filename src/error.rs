//! Error types for the sync engine.

use crate::{DocumentId, Version};
use thiserror::Error;

/// All possible errors from a sync pass.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SyncError {
    /// Network or authentication failure in the transport. Aborts the
    /// reconciliation pass; documents not yet synced keep their prior
    /// state and are retried on the next pass.
    #[error("transport failure: {0}")]
    Transport(String),

    /// The remote store no longer knows the id. Mid-pass this is treated
    /// as a server-side delete discovered late.
    #[error("document not found on server: {0}")]
    NotFound(DocumentId),

    /// The submitted base version no longer matches the server's.
    #[error("version conflict for document {id}: submitted {submitted}, server at {current}")]
    VersionConflict {
        id: DocumentId,
        submitted: Version,
        current: Version,
    },

    /// A patch script could not be applied to its base text.
    #[error("patch could not be applied: {0}")]
    PatchFailed(String),

    /// A remote operation was issued for a document that has never been
    /// persisted remotely.
    #[error("document has never been synced to the server")]
    NeverSynced,
}

/// Result type for sync operations.
pub type Result<T> = std::result::Result<T, SyncError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = SyncError::Transport("connection reset".into());
        assert_eq!(err.to_string(), "transport failure: connection reset");

        let err = SyncError::NotFound("doc-42".into());
        assert_eq!(err.to_string(), "document not found on server: doc-42");

        let err = SyncError::VersionConflict {
            id: "doc-42".into(),
            submitted: 3,
            current: 5,
        };
        assert_eq!(
            err.to_string(),
            "version conflict for document doc-42: submitted 3, server at 5"
        );
    }
}
