use serde::{Deserialize, Serialize};
use std::fmt;

use super::exercise::Exercise;

/// A single day's workout.
///
/// Daily workouts carry no identity of their own: in a plan they are indexed by
/// weekday, in a calendar by date. The `modified` flag is the only field the
/// sync engine ever changes on an incoming workout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyWorkout {
    pub title: String,
    #[serde(default)]
    pub exercises: Vec<Exercise>,
    #[serde(default)]
    pub muscle_groups: Vec<String>,
    /// Estimated duration in minutes
    #[serde(default)]
    pub estimated_minutes: u32,
    #[serde(default)]
    pub modified: bool,
}

impl DailyWorkout {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            exercises: Vec::new(),
            muscle_groups: Vec::new(),
            estimated_minutes: 0,
            modified: false,
        }
    }

    pub fn with_exercises(mut self, exercises: Vec<Exercise>) -> Self {
        self.exercises = exercises;
        self
    }

    pub fn with_muscle_groups<I, S>(mut self, groups: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.muscle_groups = groups.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_estimated_minutes(mut self, minutes: u32) -> Self {
        self.estimated_minutes = minutes;
        self
    }

    /// Returns a copy flagged as modified by a plan merge.
    pub fn marked_modified(&self) -> Self {
        Self {
            modified: true,
            ..self.clone()
        }
    }
}

impl fmt::Display for DailyWorkout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.title)?;
        if self.estimated_minutes > 0 {
            write!(f, " ({} min)", self.estimated_minutes)?;
        }
        if !self.muscle_groups.is_empty() {
            write!(f, " [{}]", self.muscle_groups.join(", "))?;
        }
        if self.modified {
            write!(f, " *")?;
        }
        Ok(())
    }
}
