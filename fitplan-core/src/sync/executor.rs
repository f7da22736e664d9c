use chrono::NaiveDate;
use serde::Serialize;

use super::conflict::{conflicts_at, plan_dates, Conflict};
use super::SyncOptions;
use crate::calendar::CalendarStore;
use crate::error::RepositoryError;
use crate::models::{SharedWorkoutPlan, SyncReceipt, SyncStatus};

/// Outcome of applying a plan to the calendar.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum SyncResult {
    /// Dates written by this call, ascending.
    Synced { synced_dates: Vec<NaiveDate> },
    /// Nothing was written; these dates are already taken.
    Conflict { conflicts: Vec<Conflict> },
    /// Nothing was written.
    Failed { message: String },
}

impl SyncResult {
    pub fn status(&self) -> SyncStatus {
        match self {
            SyncResult::Synced { .. } => SyncStatus::Synced,
            SyncResult::Conflict { .. } => SyncStatus::Conflict,
            SyncResult::Failed { .. } => SyncStatus::Failed,
        }
    }

    pub fn synced_dates(&self) -> &[NaiveDate] {
        match self {
            SyncResult::Synced { synced_dates } => synced_dates,
            _ => &[],
        }
    }

    pub fn conflicts(&self) -> &[Conflict] {
        match self {
            SyncResult::Conflict { conflicts } => conflicts,
            _ => &[],
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        match self {
            SyncResult::Failed { message } => Some(message),
            _ => None,
        }
    }
}

/// Applies `plan` to the calendar under `options`.
///
/// Conflicts are detected against a fresh checkout, never a preview. Entries
/// and the plan's receipt go out in one commit; any storage error comes back
/// as [`SyncResult::Failed`] with nothing written.
pub async fn execute_sync(
    calendar: &CalendarStore,
    plan: &SharedWorkoutPlan,
    options: &SyncOptions,
) -> SyncResult {
    match try_execute_sync(calendar, plan, options).await {
        Ok(result) => result,
        Err(e) => {
            tracing::warn!(
                user = %calendar.user_id(),
                plan = %plan.id,
                error = %e,
                "sync failed"
            );
            SyncResult::Failed {
                message: e.to_string(),
            }
        }
    }
}

async fn try_execute_sync(
    calendar: &CalendarStore,
    plan: &SharedWorkoutPlan,
    options: &SyncOptions,
) -> Result<SyncResult, RepositoryError> {
    let mut checkout = calendar.checkout().await?;

    let slots = plan_dates(plan, options.start_date, options.repeat_weeks);
    let conflicts = conflicts_at(plan, &slots, checkout.calendar());
    if !conflicts.is_empty() && options.aborts_on_conflict() {
        tracing::info!(
            user = %calendar.user_id(),
            plan = %plan.id,
            conflicts = conflicts.len(),
            "sync stopped on conflicts"
        );
        return Ok(SyncResult::Conflict { conflicts });
    }

    let mut synced_dates = Vec::with_capacity(slots.len());
    for (date, weekday) in slots {
        if checkout.calendar().contains(date) && options.keeps_existing() {
            continue;
        }
        let Some(workout) = plan.workout(weekday) else {
            continue;
        };
        let workout = if options.modify_plan {
            workout.marked_modified()
        } else {
            workout.clone()
        };
        checkout.put_entry(date, workout)?;
        synced_dates.push(date);
    }

    // Earlier syncs of this plan stay covered so a rollback removes them too.
    let mut receipt_dates = synced_dates.clone();
    if let Some(previous) = checkout.ledger().get(plan.id) {
        receipt_dates.extend(
            previous
                .synced_dates
                .iter()
                .copied()
                .filter(|date| checkout.calendar().contains(*date)),
        );
    }
    checkout.record_receipt(SyncReceipt::synced(plan.id, receipt_dates))?;
    calendar.commit(checkout).await?;

    tracing::info!(
        user = %calendar.user_id(),
        plan = %plan.id,
        dates = synced_dates.len(),
        "synced plan"
    );
    Ok(SyncResult::Synced { synced_dates })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::{ConcurrencyMode, UserLocks};
    use crate::models::{DailyWorkout, Exercise, WeekdayIndex};
    use crate::storage::testing::FlakyStore;
    use crate::storage::MemoryStore;
    use crate::sync::detect_conflicts;
    use pretty_assertions::assert_eq;
    use std::sync::Arc;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    fn day(i: u8) -> WeekdayIndex {
        WeekdayIndex::new(i).unwrap()
    }

    fn mon_wed_fri() -> SharedWorkoutPlan {
        SharedWorkoutPlan::new("Full Body", "coach")
            .with_workout(
                day(0),
                DailyWorkout::new("Squat Day")
                    .with_exercises(vec![Exercise::new("Squat", 5, 5).with_weight(100.0)]),
            )
            .with_workout(day(2), DailyWorkout::new("Bench Day"))
            .with_workout(day(4), DailyWorkout::new("Deadlift Day"))
    }

    fn calendar_store() -> CalendarStore {
        CalendarStore::new(
            Arc::new(MemoryStore::new()),
            "alice",
            ConcurrencyMode::Locked,
            Arc::new(UserLocks::new()),
        )
    }

    async fn with_existing_wednesday() -> CalendarStore {
        let calendar = calendar_store();
        calendar
            .put(date(3), DailyWorkout::new("Yoga"))
            .await
            .unwrap();
        calendar
    }

    #[tokio::test]
    async fn test_sync_into_empty_calendar() {
        let calendar = calendar_store();
        let plan = mon_wed_fri();

        let result = execute_sync(&calendar, &plan, &SyncOptions::new(date(1))).await;

        assert_eq!(result.status(), SyncStatus::Synced);
        assert_eq!(result.synced_dates(), &[date(1), date(3), date(5)]);
        let stored = calendar.calendar().await.unwrap();
        assert_eq!(stored.get(date(1)), plan.workout(day(0)));
        assert_eq!(stored.get(date(5)).unwrap().title, "Deadlift Day");
    }

    #[tokio::test]
    async fn test_conflict_writes_nothing() {
        let calendar = with_existing_wednesday().await;
        let before = calendar.calendar().await.unwrap();

        let result = execute_sync(&calendar, &mon_wed_fri(), &SyncOptions::new(date(1))).await;

        assert_eq!(result.status(), SyncStatus::Conflict);
        assert_eq!(result.conflicts().len(), 1);
        assert_eq!(result.conflicts()[0].date, date(3));
        assert_eq!(result.conflicts()[0].existing.title, "Yoga");
        assert!(result.synced_dates().is_empty());
        assert_eq!(calendar.calendar().await.unwrap(), before);
        assert!(calendar.ledger().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_skip_conflicts_preserves_existing() {
        let calendar = with_existing_wednesday().await;
        let options = SyncOptions::new(date(1)).skip_conflicts();

        let result = execute_sync(&calendar, &mon_wed_fri(), &options).await;

        assert_eq!(result.synced_dates(), &[date(1), date(5)]);
        let stored = calendar.calendar().await.unwrap();
        assert_eq!(stored.get(date(3)).unwrap().title, "Yoga");
        assert_eq!(stored.len(), 3);
    }

    #[tokio::test]
    async fn test_replace_overwrites_conflicts() {
        let calendar = with_existing_wednesday().await;
        let plan = mon_wed_fri();
        let options = SyncOptions::new(date(1)).replace_existing();

        let result = execute_sync(&calendar, &plan, &options).await;

        assert_eq!(result.synced_dates(), &[date(1), date(3), date(5)]);
        assert_eq!(
            calendar.get(date(3)).await.unwrap().as_ref(),
            plan.workout(day(2))
        );
    }

    #[tokio::test]
    async fn test_replace_wins_when_both_flags_set() {
        let calendar = with_existing_wednesday().await;
        let options = SyncOptions::new(date(1)).skip_conflicts().replace_existing();

        let result = execute_sync(&calendar, &mon_wed_fri(), &options).await;

        assert!(result.synced_dates().contains(&date(3)));
        assert_eq!(calendar.get(date(3)).await.unwrap().unwrap().title, "Bench Day");
    }

    #[tokio::test]
    async fn test_receipt_matches_synced_dates() {
        let calendar = with_existing_wednesday().await;
        let plan = mon_wed_fri();
        let options = SyncOptions::new(date(1)).skip_conflicts();

        let result = execute_sync(&calendar, &plan, &options).await;

        let ledger = calendar.ledger().await.unwrap();
        let receipt = ledger.get(plan.id).unwrap();
        assert_eq!(receipt.synced_dates, result.synced_dates());
        assert_eq!(receipt.status, SyncStatus::Synced);
        let stored = calendar.calendar().await.unwrap();
        assert!(receipt.synced_dates.iter().all(|d| stored.contains(*d)));
    }

    #[tokio::test]
    async fn test_resync_accumulates_receipt_dates() {
        let calendar = calendar_store();
        let plan = mon_wed_fri();

        execute_sync(&calendar, &plan, &SyncOptions::new(date(1))).await;
        let second = execute_sync(&calendar, &plan, &SyncOptions::new(date(8))).await;

        assert_eq!(second.synced_dates(), &[date(8), date(10), date(12)]);
        let ledger = calendar.ledger().await.unwrap();
        assert_eq!(
            ledger.get(plan.id).unwrap().synced_dates,
            vec![date(1), date(3), date(5), date(8), date(10), date(12)]
        );
    }

    #[tokio::test]
    async fn test_modify_plan_marks_written_entries() {
        let calendar = calendar_store();
        let options = SyncOptions::new(date(1)).modify_plan();

        execute_sync(&calendar, &mon_wed_fri(), &options).await;

        let stored = calendar.calendar().await.unwrap();
        assert!(stored.iter().all(|(_, workout)| workout.modified));
    }

    #[tokio::test]
    async fn test_repeat_weeks_writes_each_week() {
        let calendar = calendar_store();
        let options = SyncOptions::new(date(1)).repeat_weeks(2);

        let result = execute_sync(&calendar, &mon_wed_fri(), &options).await;

        assert_eq!(
            result.synced_dates(),
            &[date(1), date(3), date(5), date(8), date(10), date(12)]
        );
    }

    #[tokio::test]
    async fn test_no_false_conflicts_after_sync() {
        let calendar = calendar_store();
        let plan = mon_wed_fri();
        execute_sync(&calendar, &plan, &SyncOptions::new(date(1))).await;

        let stored = calendar.calendar().await.unwrap();
        // The following week is free
        assert!(detect_conflicts(&plan, date(8), &stored).is_empty());
        assert_eq!(detect_conflicts(&plan, date(1), &stored).len(), 3);
    }

    #[tokio::test]
    async fn test_store_failure_reports_failed() {
        let inner = Arc::new(MemoryStore::new());
        let flaky = Arc::new(FlakyStore::new(inner));
        let calendar = CalendarStore::new(
            flaky.clone(),
            "alice",
            ConcurrencyMode::Locked,
            Arc::new(UserLocks::new()),
        );
        calendar
            .put(date(2), DailyWorkout::new("Existing"))
            .await
            .unwrap();

        flaky.set_fail_saves(true);
        let result = execute_sync(&calendar, &mon_wed_fri(), &SyncOptions::new(date(1))).await;

        assert_eq!(result.status(), SyncStatus::Failed);
        assert!(result.synced_dates().is_empty());
        assert!(result.error_message().unwrap().contains("refused"));

        let stored = calendar.calendar().await.unwrap();
        assert_eq!(stored.dates().collect::<Vec<_>>(), vec![date(2)]);
        assert!(calendar.ledger().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_load_failure_reports_failed() {
        let flaky = Arc::new(FlakyStore::new(Arc::new(MemoryStore::new())));
        flaky.set_fail_loads(true);
        let calendar = CalendarStore::new(
            flaky,
            "alice",
            ConcurrencyMode::Locked,
            Arc::new(UserLocks::new()),
        );

        let result = execute_sync(&calendar, &mon_wed_fri(), &SyncOptions::new(date(1))).await;
        assert!(matches!(result, SyncResult::Failed { .. }));
    }

    #[test]
    fn test_result_json_shape() {
        let result = SyncResult::Synced {
            synced_dates: vec![date(1)],
        };
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "status": "synced", "synced_dates": ["2024-01-01"] })
        );
    }
}
