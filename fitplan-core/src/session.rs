//! Workspaces and per-user sessions.
//!
//! A [`Workspace`] owns the document store, the concurrency mode and the lock
//! registry. Sessions opened from the same workspace share its locks, so two
//! sessions for one user coordinate in locked and versioned modes.

use std::sync::Arc;

use crate::calendar::{CalendarStore, ConcurrencyMode, UserLocks};
use crate::plans::PlanRepository;
use crate::storage::{DocKey, DocumentStore, FileStore, MemoryStore, StoreError};
use crate::sync::SyncEngine;

#[derive(Clone)]
pub struct Workspace {
    store: Arc<dyn DocumentStore>,
    mode: ConcurrencyMode,
    locks: Arc<UserLocks>,
}

impl Workspace {
    pub fn new(store: Arc<dyn DocumentStore>, mode: ConcurrencyMode) -> Self {
        Self {
            store,
            mode,
            locks: Arc::new(UserLocks::new()),
        }
    }

    /// Workspace over a data directory.
    pub fn open(data_dir: impl Into<std::path::PathBuf>, mode: ConcurrencyMode) -> Self {
        Self::new(Arc::new(FileStore::new(data_dir)), mode)
    }

    /// Workspace that lives only as long as the process.
    pub fn in_memory(mode: ConcurrencyMode) -> Self {
        Self::new(Arc::new(MemoryStore::new()), mode)
    }

    pub fn mode(&self) -> ConcurrencyMode {
        self.mode
    }

    pub fn store(&self) -> Arc<dyn DocumentStore> {
        self.store.clone()
    }

    /// Opens a session for `user_id`. Fails if the id can't name a document.
    pub fn session(&self, user_id: &str) -> Result<Session, StoreError> {
        DocKey::user(user_id).validate()?;
        tracing::debug!(user = %user_id, mode = %self.mode, "opened session");

        Ok(Session {
            user_id: user_id.to_string(),
            plans: PlanRepository::new(self.store.clone()),
            engine: SyncEngine::new(CalendarStore::new(
                self.store.clone(),
                user_id,
                self.mode,
                self.locks.clone(),
            )),
        })
    }

    pub fn plans(&self) -> PlanRepository {
        PlanRepository::new(self.store.clone())
    }
}

impl std::fmt::Debug for Workspace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Workspace")
            .field("mode", &self.mode)
            .finish_non_exhaustive()
    }
}

/// Everything one user works with.
#[derive(Debug, Clone)]
pub struct Session {
    user_id: String,
    plans: PlanRepository,
    engine: SyncEngine,
}

impl Session {
    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn calendar(&self) -> &CalendarStore {
        self.engine.calendar()
    }

    pub fn plans(&self) -> &PlanRepository {
        &self.plans
    }

    pub fn sync_engine(&self) -> &SyncEngine {
        &self.engine
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DailyWorkout, SharedWorkoutPlan, SyncStatus, WeekdayIndex};
    use crate::sync::{SyncOptions, SyncResult};
    use chrono::NaiveDate;
    use tempfile::TempDir;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    fn plan(title: &str, slots: &[u8]) -> SharedWorkoutPlan {
        slots.iter().fold(SharedWorkoutPlan::new(title, "coach"), |plan, &i| {
            plan.with_workout(
                WeekdayIndex::new(i).unwrap(),
                DailyWorkout::new(format!("{} {}", title, i)),
            )
        })
    }

    /// Two sessions for the same user sync disjoint plans at the same time.
    async fn race(mode: ConcurrencyMode) -> (Workspace, [SyncResult; 2]) {
        let workspace = Workspace::in_memory(mode);
        let first = workspace.session("alice").unwrap();
        let second = workspace.session("alice").unwrap();

        let mon_wed_fri = plan("A", &[0, 2, 4]);
        let tue_thu = plan("B", &[1, 3]);
        let options = SyncOptions::new(date(1));

        let (a, b) = tokio::join!(
            first.sync_engine().execute_sync(&mon_wed_fri, &options),
            second.sync_engine().execute_sync(&tue_thu, &options),
        );
        (workspace, [a, b])
    }

    async fn stored_dates(workspace: &Workspace) -> usize {
        let session = workspace.session("alice").unwrap();
        session.calendar().calendar().await.unwrap().len()
    }

    #[tokio::test]
    async fn test_unguarded_race_loses_an_update() {
        let (workspace, results) = race(ConcurrencyMode::Unguarded).await;

        // Both sessions believe they synced
        assert!(results.iter().all(|r| r.status() == SyncStatus::Synced));
        assert!(stored_dates(&workspace).await < 5);
    }

    #[tokio::test]
    async fn test_locked_race_keeps_both() {
        let (workspace, results) = race(ConcurrencyMode::Locked).await;

        assert!(results.iter().all(|r| r.status() == SyncStatus::Synced));
        assert_eq!(stored_dates(&workspace).await, 5);

        let session = workspace.session("alice").unwrap();
        let receipts = session.sync_engine().list_sync_statuses().await.unwrap();
        assert_eq!(receipts.len(), 2);
    }

    #[tokio::test]
    async fn test_versioned_race_fails_one_writer() {
        let (workspace, results) = race(ConcurrencyMode::Versioned).await;

        let failed: Vec<_> = results
            .iter()
            .filter(|r| r.status() == SyncStatus::Failed)
            .collect();
        assert_eq!(failed.len(), 1);
        assert!(failed[0].error_message().unwrap().contains("Version conflict"));

        let winner = results
            .iter()
            .find(|r| r.status() == SyncStatus::Synced)
            .unwrap();
        assert_eq!(
            stored_dates(&workspace).await,
            winner.synced_dates().len()
        );
    }

    #[tokio::test]
    async fn test_versioned_retry_succeeds() {
        let workspace = Workspace::in_memory(ConcurrencyMode::Versioned);
        let session = workspace.session("alice").unwrap();
        let stale = session.calendar().checkout().await.unwrap();

        let first = plan("A", &[0]);
        let result = session
            .sync_engine()
            .execute_sync(&first, &SyncOptions::new(date(1)))
            .await;
        assert_eq!(result.status(), SyncStatus::Synced);

        // A checkout taken before the sync no longer commits
        let mut stale = stale;
        stale.put_entry(date(2), DailyWorkout::new("Late")).unwrap();
        assert!(session
            .calendar()
            .commit(stale)
            .await
            .unwrap_err()
            .is_version_conflict());

        let second = plan("B", &[1]);
        let retry = session
            .sync_engine()
            .execute_sync(&second, &SyncOptions::new(date(1)))
            .await;
        assert_eq!(retry.synced_dates(), &[date(2)]);
    }

    #[tokio::test]
    async fn test_users_are_isolated() {
        let workspace = Workspace::in_memory(ConcurrencyMode::Locked);
        let alice = workspace.session("alice").unwrap();
        let bob = workspace.session("bob").unwrap();

        alice
            .sync_engine()
            .execute_sync(&plan("A", &[0, 1]), &SyncOptions::new(date(1)))
            .await;

        assert_eq!(alice.calendar().calendar().await.unwrap().len(), 2);
        assert!(bob.calendar().calendar().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_plans_shared_across_users() {
        let workspace = Workspace::in_memory(ConcurrencyMode::Locked);
        let author = workspace.session("coach").unwrap();
        let athlete = workspace.session("alice").unwrap();

        let shared = plan("PPL", &[0, 2, 4]);
        author.plans().put(&shared).await.unwrap();

        let found = athlete
            .plans()
            .find_by_share_id(&shared.share_id)
            .await
            .unwrap()
            .unwrap();
        let result = athlete
            .sync_engine()
            .execute_sync(&found, &SyncOptions::new(date(1)))
            .await;
        assert_eq!(result.synced_dates().len(), 3);
        assert!(author.calendar().calendar().await.unwrap().is_empty());
    }

    #[test]
    fn test_invalid_user_id_rejected() {
        let workspace = Workspace::in_memory(ConcurrencyMode::Locked);
        assert!(matches!(
            workspace.session("../root"),
            Err(StoreError::InvalidId(_))
        ));
    }

    #[tokio::test]
    async fn test_file_workspace_round_trip() {
        let temp = TempDir::new().unwrap();
        let shared = plan("PPL", &[0, 2, 4]);
        let options = SyncOptions::new(date(1)).repeat_weeks(2);

        {
            let workspace = Workspace::open(temp.path(), ConcurrencyMode::Locked);
            let session = workspace.session("alice").unwrap();
            session.plans().put(&shared).await.unwrap();
            session.sync_engine().execute_sync(&shared, &options).await;
        }

        let workspace = Workspace::open(temp.path(), ConcurrencyMode::Locked);
        let session = workspace.session("alice").unwrap();
        let loaded = session.plans().get(shared.id).await.unwrap().unwrap();
        assert_eq!(loaded.schedule, shared.schedule);

        let receipt = session
            .sync_engine()
            .get_sync_status(shared.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(receipt.synced_dates.len(), 6);

        let removed = session.sync_engine().remove_synced_workouts(shared.id).await;
        assert_eq!(removed.removed_dates().len(), 6);
        assert!(session.calendar().calendar().await.unwrap().is_empty());
    }
}
