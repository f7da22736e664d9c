//! Automerge encoding for user and plan documents.
//!
//! Every persisted document is an Automerge binary. Stores only see bytes;
//! this module owns the layout inside them (see [`writer`] for the schema).

pub mod reader;
pub mod writer;

use automerge::AutoCommit;
use thiserror::Error;

use crate::models::ModelError;

pub use reader::{read_calendar, read_ledger, read_plan, read_version, read_workout};
pub use writer::{
    delete_calendar_entry, delete_receipt, write_calendar_entry, write_plan, write_receipt,
    write_version, write_workout,
};

pub(crate) const VERSION_KEY: &str = "version";
pub(crate) const CALENDAR_KEY: &str = "calendar";
pub(crate) const RECEIPTS_KEY: &str = "receipts";

/// Errors raised while encoding or decoding a document.
#[derive(Error, Debug)]
pub enum CodecError {
    #[error("Automerge error: {0}")]
    Automerge(String),

    #[error("Invalid value for '{field}': {value}")]
    InvalidValue { field: &'static str, value: String },

    #[error(transparent)]
    Model(#[from] ModelError),
}

impl From<automerge::AutomergeError> for CodecError {
    fn from(e: automerge::AutomergeError) -> Self {
        CodecError::Automerge(e.to_string())
    }
}

/// Loads a document from stored bytes, or starts an empty one.
pub fn load_or_create(bytes: Option<&[u8]>) -> Result<AutoCommit, CodecError> {
    match bytes {
        Some(bytes) => Ok(AutoCommit::load(bytes)?),
        None => Ok(AutoCommit::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DailyWorkout, UserCalendar};
    use chrono::NaiveDate;

    #[test]
    fn test_load_or_create_empty() {
        let doc = load_or_create(None).unwrap();
        assert_eq!(read_calendar(&doc).unwrap(), UserCalendar::new());
    }

    #[test]
    fn test_saved_bytes_load_back() {
        let date = NaiveDate::from_ymd_opt(2024, 2, 29).unwrap();
        let mut doc = AutoCommit::new();
        write_calendar_entry(&mut doc, date, &DailyWorkout::new("Leap Day Run")).unwrap();
        let bytes = doc.save();

        let loaded = load_or_create(Some(&bytes)).unwrap();
        let calendar = read_calendar(&loaded).unwrap();
        assert_eq!(calendar.get(date).unwrap().title, "Leap Day Run");
    }

    #[test]
    fn test_garbage_bytes_fail_to_load() {
        let result = load_or_create(Some(b"definitely not automerge"));
        assert!(matches!(result, Err(CodecError::Automerge(_))));
    }
}
