//! Whole-document key-value storage.
//!
//! Stores persist opaque document bytes under a [`DocKey`]. They have no notion
//! of partial updates: callers load a document, change it in memory and save
//! the whole thing back. Concurrency control lives one level up, in
//! [`crate::calendar::CalendarStore`].

mod file;
mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

use async_trait::async_trait;
use std::fmt;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Kinds of documents kept in a store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DocKind {
    /// Per-user calendar and sync ledger
    User,
    /// Shared workout plan
    Plan,
}

impl DocKind {
    /// Directory / namespace name for this kind.
    pub fn namespace(&self) -> &'static str {
        match self {
            DocKind::User => "users",
            DocKind::Plan => "plans",
        }
    }
}

/// Address of a document in a store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DocKey {
    pub kind: DocKind,
    pub id: String,
}

impl DocKey {
    pub fn new(kind: DocKind, id: impl Into<String>) -> Self {
        Self {
            kind,
            id: id.into(),
        }
    }

    pub fn user(user_id: &str) -> Self {
        Self::new(DocKind::User, user_id)
    }

    pub fn plan(plan_id: uuid::Uuid) -> Self {
        Self::new(DocKind::Plan, plan_id.to_string())
    }

    /// Rejects ids that could escape the store's namespace.
    pub fn validate(&self) -> Result<(), StoreError> {
        let id = self.id.as_str();
        if id.is_empty()
            || id.contains('/')
            || id.contains('\\')
            || id.contains("..")
            || id.starts_with('.')
        {
            return Err(StoreError::InvalidId(id.to_string()));
        }
        Ok(())
    }
}

impl fmt::Display for DocKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.kind.namespace(), self.id)
    }
}

/// Errors that can occur during document storage operations.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("I/O error for {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Invalid document id: '{0}'")]
    InvalidId(String),

    #[error("Version conflict on {key}: checked out {expected}, store has {found}")]
    VersionConflict {
        key: DocKey,
        expected: u64,
        found: u64,
    },

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        StoreError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Persisted whole-document storage.
///
/// Every method is a suspend point; implementations must not hold locks across
/// calls, so interleavings between concurrent callers are real.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Loads a document. Returns `Ok(None)` if it doesn't exist.
    async fn load(&self, key: &DocKey) -> Result<Option<Vec<u8>>, StoreError>;

    /// Replaces a document with `bytes` in a single write.
    async fn save(&self, key: &DocKey, bytes: &[u8]) -> Result<(), StoreError>;

    /// Deletes a document. Returns `Ok(false)` if it didn't exist.
    async fn delete(&self, key: &DocKey) -> Result<bool, StoreError>;

    /// Lists the keys of every document of one kind, sorted by id.
    async fn list(&self, kind: DocKind) -> Result<Vec<DocKey>, StoreError>;
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_doc_key_display() {
        assert_eq!(DocKey::user("alice").to_string(), "users/alice");
        let plan_id = uuid::Uuid::new_v4();
        assert_eq!(DocKey::plan(plan_id).to_string(), format!("plans/{}", plan_id));
    }

    #[test]
    fn test_doc_key_validation() {
        assert!(DocKey::user("alice").validate().is_ok());
        assert!(DocKey::user("alice_2024-x").validate().is_ok());

        for bad in ["", "../etc", "a/b", "a\\b", ".hidden", "x..y"] {
            assert!(
                matches!(DocKey::user(bad).validate(), Err(StoreError::InvalidId(_))),
                "expected '{}' to be rejected",
                bad
            );
        }
    }
}
