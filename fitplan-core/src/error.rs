use thiserror::Error;
use uuid::Uuid;

use crate::automerge::CodecError;
use crate::storage::StoreError;

/// Errors raised by the calendar store and the plan repository.
#[derive(Error, Debug)]
pub enum RepositoryError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error("Plan not found: {0}")]
    NotFound(Uuid),
}

impl RepositoryError {
    /// True when an optimistic commit lost against another writer.
    pub fn is_version_conflict(&self) -> bool {
        matches!(
            self,
            RepositoryError::Store(StoreError::VersionConflict { .. })
        )
    }
}
