use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

use super::MAX_REPEAT_WEEKS;
use crate::models::{DailyWorkout, SharedWorkoutPlan, UserCalendar, WeekdayIndex};

/// A date where a plan slot would overwrite an existing calendar entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conflict {
    pub date: NaiveDate,
    pub weekday: WeekdayIndex,
    pub existing: DailyWorkout,
    pub incoming: DailyWorkout,
}

/// Calendar dates a plan occupies, paired with the slot that fills each one.
///
/// Weeks come first, then ascending weekday index, so dates are ascending.
/// `repeat_weeks` is clamped to `1..=MAX_REPEAT_WEEKS`. Slots past the last
/// representable date are dropped.
pub fn plan_dates(
    plan: &SharedWorkoutPlan,
    start_date: NaiveDate,
    repeat_weeks: u32,
) -> Vec<(NaiveDate, WeekdayIndex)> {
    let weeks = u64::from(repeat_weeks.clamp(1, MAX_REPEAT_WEEKS));
    let mut dates = Vec::new();

    for week in 0..weeks {
        for weekday in plan.schedule.keys() {
            let offset = Days::new(week * 7 + weekday.offset_days());
            let Some(date) = start_date.checked_add_days(offset) else {
                tracing::warn!(
                    "Dropping slots from week {} on: dates out of range",
                    week
                );
                return dates;
            };
            dates.push((date, *weekday));
        }
    }

    dates
}

/// Single-week conflict check.
pub fn detect_conflicts(
    plan: &SharedWorkoutPlan,
    start_date: NaiveDate,
    calendar: &UserCalendar,
) -> Vec<Conflict> {
    detect_conflicts_for_weeks(plan, start_date, 1, calendar)
}

pub fn detect_conflicts_for_weeks(
    plan: &SharedWorkoutPlan,
    start_date: NaiveDate,
    repeat_weeks: u32,
    calendar: &UserCalendar,
) -> Vec<Conflict> {
    conflicts_at(plan, &plan_dates(plan, start_date, repeat_weeks), calendar)
}

pub(super) fn conflicts_at(
    plan: &SharedWorkoutPlan,
    slots: &[(NaiveDate, WeekdayIndex)],
    calendar: &UserCalendar,
) -> Vec<Conflict> {
    slots
        .iter()
        .filter_map(|&(date, weekday)| {
            let existing = calendar.get(date)?;
            let incoming = plan.workout(weekday)?;
            Some(Conflict {
                date,
                weekday,
                existing: existing.clone(),
                incoming: incoming.clone(),
            })
        })
        .collect()
}
