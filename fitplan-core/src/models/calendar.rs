use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::daily_workout::DailyWorkout;

/// A user's date-indexed workout schedule.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserCalendar {
    entries: BTreeMap<NaiveDate, DailyWorkout>,
}

impl UserCalendar {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, date: NaiveDate) -> Option<&DailyWorkout> {
        self.entries.get(&date)
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.entries.contains_key(&date)
    }

    /// Inserts an entry, returning the one it replaced.
    pub fn insert(&mut self, date: NaiveDate, workout: DailyWorkout) -> Option<DailyWorkout> {
        self.entries.insert(date, workout)
    }

    pub fn remove(&mut self, date: NaiveDate) -> Option<DailyWorkout> {
        self.entries.remove(&date)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.entries.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (NaiveDate, &DailyWorkout)> {
        self.entries.iter().map(|(date, workout)| (*date, workout))
    }

    /// Entries between `from` and `to`, both inclusive.
    pub fn range(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> impl Iterator<Item = (NaiveDate, &DailyWorkout)> {
        let (from, to) = if from <= to { (from, to) } else { (to, from) };
        self.entries
            .range(from..=to)
            .map(|(date, workout)| (*date, workout))
    }
}

impl FromIterator<(NaiveDate, DailyWorkout)> for UserCalendar {
    fn from_iter<T: IntoIterator<Item = (NaiveDate, DailyWorkout)>>(iter: T) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    #[test]
    fn test_insert_returns_previous() {
        let mut calendar = UserCalendar::new();
        assert!(calendar.insert(date(1), DailyWorkout::new("A")).is_none());

        let previous = calendar.insert(date(1), DailyWorkout::new("B")).unwrap();
        assert_eq!(previous.title, "A");
        assert_eq!(calendar.get(date(1)).unwrap().title, "B");
        assert_eq!(calendar.len(), 1);
    }

    #[test]
    fn test_range_is_inclusive() {
        let calendar: UserCalendar = [1, 3, 5, 7]
            .into_iter()
            .map(|d| (date(d), DailyWorkout::new(format!("day {}", d))))
            .collect();

        let dates: Vec<NaiveDate> = calendar.range(date(3), date(5)).map(|(d, _)| d).collect();
        assert_eq!(dates, vec![date(3), date(5)]);

        let reversed: Vec<NaiveDate> = calendar.range(date(5), date(3)).map(|(d, _)| d).collect();
        assert_eq!(reversed, dates);
    }

    #[test]
    fn test_json_uses_iso_date_keys() {
        let mut calendar = UserCalendar::new();
        calendar.insert(date(3), DailyWorkout::new("Legs"));

        let json = serde_json::to_string(&calendar).unwrap();
        assert!(json.starts_with(r#"{"2024-01-03":"#));

        let parsed: UserCalendar = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, calendar);
    }
}
