//! Fitplan Core Library
//!
//! Shared workout plans, the user's workout calendar, and the engine that
//! syncs one into the other.

pub mod automerge;
pub mod calendar;
pub mod error;
pub mod models;
pub mod plans;
pub mod session;
pub mod share_id;
pub mod storage;
pub mod sync;

pub use crate::automerge::CodecError;
pub use calendar::{CalendarCheckout, CalendarStore, ConcurrencyMode, UserLocks};
pub use error::RepositoryError;
pub use models::{
    DailyWorkout, Difficulty, Exercise, ModelError, PlanUpdate, SharedWorkoutPlan, SyncLedger,
    SyncReceipt, SyncStatus, UserCalendar, Visibility, WeekdayIndex,
};
pub use plans::PlanRepository;
pub use session::{Session, Workspace};
pub use share_id::{ShareId, ShareIdError};
pub use storage::{DocKey, DocKind, DocumentStore, FileStore, MemoryStore, StoreError};
pub use sync::{
    detect_conflicts, detect_conflicts_for_weeks, plan_dates, Conflict, RemovalResult,
    SyncEngine, SyncOptions, SyncPreview, SyncResult, MAX_REPEAT_WEEKS,
};

pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!version().is_empty());
    }
}
