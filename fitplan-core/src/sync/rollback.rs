use chrono::NaiveDate;
use serde::Serialize;
use uuid::Uuid;

use crate::calendar::CalendarStore;
use crate::error::RepositoryError;

/// Outcome of removing a plan's synced workouts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RemovalResult {
    /// The receipt and every date it listed were deleted.
    Removed { dates: Vec<NaiveDate> },
    /// No receipt for this plan; nothing was written.
    NothingToRemove,
    /// Nothing was written.
    Failed { message: String },
}

impl RemovalResult {
    pub fn removed_dates(&self) -> &[NaiveDate] {
        match self {
            RemovalResult::Removed { dates } => dates,
            _ => &[],
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, RemovalResult::Failed { .. })
    }
}

/// Deletes the dates recorded in a plan's receipt, then the receipt, in one
/// commit.
///
/// Entries are deleted even if they were edited after the sync. Calling this
/// again once the receipt is gone does nothing.
pub async fn remove_synced_workouts(calendar: &CalendarStore, plan_id: Uuid) -> RemovalResult {
    match try_remove(calendar, plan_id).await {
        Ok(result) => result,
        Err(e) => {
            tracing::warn!(
                user = %calendar.user_id(),
                plan = %plan_id,
                error = %e,
                "removing synced workouts failed"
            );
            RemovalResult::Failed {
                message: e.to_string(),
            }
        }
    }
}

async fn try_remove(
    calendar: &CalendarStore,
    plan_id: Uuid,
) -> Result<RemovalResult, RepositoryError> {
    let mut checkout = calendar.checkout().await?;

    let Some(receipt) = checkout.remove_receipt(plan_id)? else {
        tracing::debug!(user = %calendar.user_id(), plan = %plan_id, "no receipt to remove");
        return Ok(RemovalResult::NothingToRemove);
    };

    for date in &receipt.synced_dates {
        checkout.remove_entry(*date)?;
    }
    calendar.commit(checkout).await?;

    tracing::info!(
        user = %calendar.user_id(),
        plan = %plan_id,
        dates = receipt.synced_dates.len(),
        "removed synced workouts"
    );
    Ok(RemovalResult::Removed {
        dates: receipt.synced_dates,
    })
}
