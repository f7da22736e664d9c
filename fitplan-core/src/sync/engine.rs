use chrono::NaiveDate;
use serde::Serialize;
use uuid::Uuid;

use super::conflict::{conflicts_at, plan_dates, Conflict};
use super::{execute_sync, remove_synced_workouts, RemovalResult, SyncOptions, SyncResult};
use crate::calendar::CalendarStore;
use crate::error::RepositoryError;
use crate::models::{SharedWorkoutPlan, SyncReceipt};

/// What a sync would do, computed without writing anything.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SyncPreview {
    pub plan_id: Uuid,
    /// Every date the plan would occupy, ascending.
    pub dates: Vec<NaiveDate>,
    pub conflicts: Vec<Conflict>,
}

impl SyncPreview {
    pub fn has_conflicts(&self) -> bool {
        !self.conflicts.is_empty()
    }
}

/// Sync operations for one user's calendar.
#[derive(Debug, Clone)]
pub struct SyncEngine {
    calendar: CalendarStore,
}

impl SyncEngine {
    pub fn new(calendar: CalendarStore) -> Self {
        Self { calendar }
    }

    pub fn calendar(&self) -> &CalendarStore {
        &self.calendar
    }

    /// Single-week preview starting at `start_date`.
    pub async fn prepare_sync(
        &self,
        plan: &SharedWorkoutPlan,
        start_date: NaiveDate,
    ) -> Result<SyncPreview, RepositoryError> {
        self.prepare_sync_with(plan, &SyncOptions::new(start_date))
            .await
    }

    pub async fn prepare_sync_with(
        &self,
        plan: &SharedWorkoutPlan,
        options: &SyncOptions,
    ) -> Result<SyncPreview, RepositoryError> {
        let calendar = self.calendar.calendar().await?;
        let slots = plan_dates(plan, options.start_date, options.repeat_weeks);
        let conflicts = conflicts_at(plan, &slots, &calendar);

        Ok(SyncPreview {
            plan_id: plan.id,
            dates: slots.into_iter().map(|(date, _)| date).collect(),
            conflicts,
        })
    }

    pub async fn execute_sync(
        &self,
        plan: &SharedWorkoutPlan,
        options: &SyncOptions,
    ) -> SyncResult {
        execute_sync(&self.calendar, plan, options).await
    }

    pub async fn get_sync_status(
        &self,
        plan_id: Uuid,
    ) -> Result<Option<SyncReceipt>, RepositoryError> {
        Ok(self.calendar.ledger().await?.get(plan_id).cloned())
    }

    /// Every receipt, most recent sync first.
    pub async fn list_sync_statuses(&self) -> Result<Vec<SyncReceipt>, RepositoryError> {
        let mut receipts: Vec<_> = self.calendar.ledger().await?.receipts().cloned().collect();
        receipts.sort_by(|a, b| b.last_sync.cmp(&a.last_sync));
        Ok(receipts)
    }

    pub async fn remove_synced_workouts(&self, plan_id: Uuid) -> RemovalResult {
        remove_synced_workouts(&self.calendar, plan_id).await
    }
}
