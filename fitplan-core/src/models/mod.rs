mod calendar;
mod daily_workout;
mod exercise;
mod plan_meta;
mod sync_receipt;
mod weekday;
mod workout_plan;

pub use calendar::UserCalendar;
pub use daily_workout::DailyWorkout;
pub use exercise::Exercise;
pub use plan_meta::{Difficulty, Visibility};
pub use sync_receipt::{SyncLedger, SyncReceipt, SyncStatus};
pub use weekday::WeekdayIndex;
pub use workout_plan::{PlanUpdate, SharedWorkoutPlan};

use thiserror::Error;

/// Validation errors for model values.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ModelError {
    #[error("Weekday index {0} out of range (expected 0-6)")]
    WeekdayOutOfRange(i64),

    #[error("Invalid weekday index '{0}'")]
    InvalidWeekday(String),

    #[error("Invalid difficulty '{0}'. Valid options: beginner, intermediate, advanced")]
    InvalidDifficulty(String),

    #[error("Invalid visibility '{0}'. Valid options: private, friends, public")]
    InvalidVisibility(String),

    #[error("Invalid sync status '{0}'")]
    InvalidStatus(String),
}
