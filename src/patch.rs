//! The text-diff collaborator boundary.
//!
//! The engine never diffs or patches text itself. It hands the shadow and
//! live content strings to a [`PatchEngine`] and ships the resulting
//! script to the remote store, which applies it on its side.

use crate::error::Result;
use serde::{Deserialize, Serialize};

/// An opaque, serializable edit script produced by a [`PatchEngine`].
///
/// The engine never inspects a script; it only moves it between the patch
/// engine and the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PatchScript(String);

impl PatchScript {
    /// Wrap a raw script produced by a patch engine.
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// The raw script text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Converts between pairs of strings and edit scripts.
///
/// Implementations are expected to be pure: the same inputs produce the
/// same script, and `apply(old, make(old, new))` reproduces `new`.
pub trait PatchEngine {
    /// Build a script that rewrites `old` into `new`.
    fn make(&self, old: &str, new: &str) -> PatchScript;

    /// Apply a script to a base string.
    ///
    /// Fails when the base has diverged too far from the text the script
    /// was made against.
    fn apply(&self, base: &str, script: &PatchScript) -> Result<String>;
}
