//! Plan-to-calendar synchronization.
//!
//! ## Flow
//!
//! 1. [`detect_conflicts`] maps a plan's weekday slots onto dates and reports
//!    every date the calendar already holds (read-only, used for previews)
//! 2. [`execute_sync`] re-detects on a fresh checkout, applies the plan under
//!    the chosen policy and records a receipt in the same commit
//! 3. [`remove_synced_workouts`] deletes the dates a receipt lists, and the
//!    receipt itself
//!
//! ## Date mapping
//!
//! Slot `k` lands on `start + k` days. With `repeat_weeks = W` the plan is laid
//! down `W` times, week `w` at `start + 7w + k`. `W` is capped at
//! [`MAX_REPEAT_WEEKS`].

mod conflict;
mod engine;
mod executor;
mod rollback;

pub use conflict::{detect_conflicts, detect_conflicts_for_weeks, plan_dates, Conflict};
pub use engine::{SyncEngine, SyncPreview};
pub use executor::{execute_sync, SyncResult};
pub use rollback::{remove_synced_workouts, RemovalResult};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Upper bound on `repeat_weeks`, about ten years.
pub const MAX_REPEAT_WEEKS: u32 = 520;

/// How a sync treats dates the calendar already holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncOptions {
    pub start_date: NaiveDate,
    /// Overwrite existing entries. Wins over `skip_conflicts`.
    #[serde(default)]
    pub replace_existing: bool,
    /// Leave existing entries alone and sync the rest.
    #[serde(default)]
    pub skip_conflicts: bool,
    /// Flag every written workout as modified.
    #[serde(default)]
    pub modify_plan: bool,
    #[serde(default = "default_repeat_weeks")]
    pub repeat_weeks: u32,
}

fn default_repeat_weeks() -> u32 {
    1
}

impl SyncOptions {
    /// Single-week sync that aborts on any conflict.
    pub fn new(start_date: NaiveDate) -> Self {
        Self {
            start_date,
            replace_existing: false,
            skip_conflicts: false,
            modify_plan: false,
            repeat_weeks: default_repeat_weeks(),
        }
    }

    pub fn skip_conflicts(mut self) -> Self {
        self.skip_conflicts = true;
        self
    }

    pub fn replace_existing(mut self) -> Self {
        self.replace_existing = true;
        self
    }

    pub fn modify_plan(mut self) -> Self {
        self.modify_plan = true;
        self
    }

    /// Clamped to `1..=MAX_REPEAT_WEEKS`.
    pub fn repeat_weeks(mut self, weeks: u32) -> Self {
        self.repeat_weeks = weeks.clamp(1, MAX_REPEAT_WEEKS);
        self
    }

    /// True when an existing entry must not be touched.
    fn keeps_existing(&self) -> bool {
        self.skip_conflicts && !self.replace_existing
    }

    /// True when conflicts abort the sync.
    fn aborts_on_conflict(&self) -> bool {
        !self.skip_conflicts && !self.replace_existing
    }
}
