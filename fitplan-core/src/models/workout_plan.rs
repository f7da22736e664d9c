use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use uuid::Uuid;

use super::daily_workout::DailyWorkout;
use super::plan_meta::{Difficulty, Visibility};
use super::weekday::WeekdayIndex;
use crate::share_id::ShareId;

/// A shareable weekly workout template.
///
/// The schedule is keyed by weekday slot rather than date, so one plan can be
/// applied to any user's calendar starting at any date. Iteration over the
/// schedule is always in ascending slot order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SharedWorkoutPlan {
    pub id: Uuid,
    pub share_id: ShareId,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub author: String,
    pub difficulty: Difficulty,
    pub visibility: Visibility,
    pub schedule: BTreeMap<WeekdayIndex, DailyWorkout>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SharedWorkoutPlan {
    pub fn new(title: impl Into<String>, author: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            share_id: ShareId::new(),
            title: title.into(),
            description: None,
            author: author.into(),
            difficulty: Difficulty::default(),
            visibility: Visibility::default(),
            schedule: BTreeMap::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_difficulty(mut self, difficulty: Difficulty) -> Self {
        self.difficulty = difficulty;
        self
    }

    pub fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }

    pub fn with_workout(mut self, weekday: WeekdayIndex, workout: DailyWorkout) -> Self {
        self.schedule.insert(weekday, workout);
        self
    }

    /// Schedules a workout on a weekday slot, replacing any existing one.
    pub fn set_workout(&mut self, weekday: WeekdayIndex, workout: DailyWorkout) {
        self.schedule.insert(weekday, workout);
        self.updated_at = Utc::now();
    }

    /// Clears a weekday slot. Returns false if nothing was scheduled there.
    pub fn clear_workout(&mut self, weekday: WeekdayIndex) -> bool {
        if self.schedule.remove(&weekday).is_some() {
            self.updated_at = Utc::now();
            true
        } else {
            false
        }
    }

    pub fn workout(&self, weekday: WeekdayIndex) -> Option<&DailyWorkout> {
        self.schedule.get(&weekday)
    }

    pub fn scheduled_days(&self) -> usize {
        self.schedule.len()
    }

    /// Applies a partial update and bumps `updated_at`.
    pub fn apply_update(&mut self, update: PlanUpdate) {
        if let Some(title) = update.title {
            self.title = title;
        }
        if let Some(description) = update.description {
            self.description = description;
        }
        if let Some(difficulty) = update.difficulty {
            self.difficulty = difficulty;
        }
        if let Some(visibility) = update.visibility {
            self.visibility = visibility;
        }
        for weekday in update.clear {
            self.schedule.remove(&weekday);
        }
        self.schedule.extend(update.workouts);
        self.updated_at = Utc::now();
    }
}

impl fmt::Display for SharedWorkoutPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.title)?;
        writeln!(f, "{}", "=".repeat(self.title.len()))?;
        writeln!(f, "Author: {}", self.author)?;
        writeln!(f, "Difficulty: {}", self.difficulty)?;
        writeln!(f, "Visibility: {}", self.visibility)?;
        writeln!(f, "Share: {}", self.share_id.to_link())?;

        if let Some(ref description) = self.description {
            writeln!(f, "\n{}", description)?;
        }

        if !self.schedule.is_empty() {
            writeln!(f, "\nSchedule:")?;
            for (weekday, workout) in &self.schedule {
                writeln!(f, "  day {}: {}", weekday, workout)?;
                for exercise in &workout.exercises {
                    writeln!(f, "    - {}", exercise)?;
                }
            }
        }

        Ok(())
    }
}

/// Partial update merged into an existing plan.
///
/// `description: Some(None)` clears the description. Slots in `clear` are
/// removed before `workouts` are applied.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlanUpdate {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub difficulty: Option<Difficulty>,
    pub visibility: Option<Visibility>,
    pub workouts: BTreeMap<WeekdayIndex, DailyWorkout>,
    pub clear: Vec<WeekdayIndex>,
}

impl PlanUpdate {
    pub fn visibility(visibility: Visibility) -> Self {
        Self {
            visibility: Some(visibility),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}
