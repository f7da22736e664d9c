//! Writers for serializing entities into Automerge documents.
//!
//! User documents hold the calendar and the sync ledger side by side so that a
//! sync commits both in one document save:
//!
//! ```text
//! root
//! ├── version: int
//! ├── calendar: { "YYYY-MM-DD": Workout }
//! └── receipts: { "<plan-uuid>": { last_sync, status, synced_dates: [..] } }
//! ```
//!
//! Plan documents store the plan's fields at the root with `schedule` keyed by
//! weekday slot (`"0"`..`"6"`).

use automerge::{transaction::Transactable, AutoCommit, ObjId, ObjType, ReadDoc, Value, ROOT};
use chrono::NaiveDate;
use uuid::Uuid;

use super::{CodecError, CALENDAR_KEY, RECEIPTS_KEY, VERSION_KEY};
use crate::models::{DailyWorkout, SharedWorkoutPlan, SyncReceipt};

/// Returns the map stored at `parent[key]`, creating it if missing.
pub(crate) fn ensure_map(
    doc: &mut AutoCommit,
    parent: &ObjId,
    key: &str,
) -> Result<ObjId, CodecError> {
    if let Some((Value::Object(ObjType::Map), obj_id)) = doc.get(parent, key)? {
        return Ok(obj_id);
    }
    Ok(doc.put_object(parent, key, ObjType::Map)?)
}

/// Writes a workout as a map at `parent[key]`, replacing whatever was there.
pub fn write_workout(
    doc: &mut AutoCommit,
    parent: &ObjId,
    key: &str,
    workout: &DailyWorkout,
) -> Result<(), CodecError> {
    let workout_id = doc.put_object(parent, key, ObjType::Map)?;

    doc.put(&workout_id, "title", workout.title.as_str())?;
    doc.put(
        &workout_id,
        "estimated_minutes",
        i64::from(workout.estimated_minutes),
    )?;
    doc.put(&workout_id, "modified", workout.modified)?;

    let groups_id = doc.put_object(&workout_id, "muscle_groups", ObjType::List)?;
    for (i, group) in workout.muscle_groups.iter().enumerate() {
        doc.insert(&groups_id, i, group.as_str())?;
    }

    let exercises_id = doc.put_object(&workout_id, "exercises", ObjType::List)?;
    for (i, exercise) in workout.exercises.iter().enumerate() {
        let ex_id = doc.insert_object(&exercises_id, i, ObjType::Map)?;
        doc.put(&ex_id, "name", exercise.name.as_str())?;
        doc.put(&ex_id, "sets", i64::from(exercise.sets))?;
        doc.put(&ex_id, "reps", i64::from(exercise.reps))?;
        if let Some(weight) = exercise.weight_kg {
            doc.put(&ex_id, "weight_kg", weight)?;
        }
        if let Some(rest) = exercise.rest_seconds {
            doc.put(&ex_id, "rest_seconds", i64::from(rest))?;
        }
        if let Some(ref notes) = exercise.notes {
            doc.put(&ex_id, "notes", notes.as_str())?;
        }
    }

    Ok(())
}

// =============================================================================
// User document
// =============================================================================

pub fn write_version(doc: &mut AutoCommit, version: u64) -> Result<(), CodecError> {
    let version = i64::try_from(version).map_err(|_| CodecError::InvalidValue {
        field: VERSION_KEY,
        value: version.to_string(),
    })?;
    doc.put(ROOT, VERSION_KEY, version)?;
    Ok(())
}

/// Writes a calendar entry at `calendar[date]`.
pub fn write_calendar_entry(
    doc: &mut AutoCommit,
    date: NaiveDate,
    workout: &DailyWorkout,
) -> Result<(), CodecError> {
    let calendar_id = ensure_map(doc, &ROOT, CALENDAR_KEY)?;
    write_workout(doc, &calendar_id, &date.to_string(), workout)
}

/// Deletes a calendar entry. Returns false if there was none.
pub fn delete_calendar_entry(doc: &mut AutoCommit, date: NaiveDate) -> Result<bool, CodecError> {
    delete_child(doc, CALENDAR_KEY, &date.to_string())
}

/// Writes a sync receipt at `receipts[plan_id]`.
pub fn write_receipt(doc: &mut AutoCommit, receipt: &SyncReceipt) -> Result<(), CodecError> {
    let receipts_id = ensure_map(doc, &ROOT, RECEIPTS_KEY)?;
    let receipt_id = doc.put_object(&receipts_id, receipt.plan_id.to_string(), ObjType::Map)?;

    doc.put(
        &receipt_id,
        "last_sync",
        receipt.last_sync.to_rfc3339().as_str(),
    )?;
    doc.put(&receipt_id, "status", receipt.status.to_string().as_str())?;

    let dates_id = doc.put_object(&receipt_id, "synced_dates", ObjType::List)?;
    for (i, date) in receipt.synced_dates.iter().enumerate() {
        doc.insert(&dates_id, i, date.to_string().as_str())?;
    }

    Ok(())
}

pub fn delete_receipt(doc: &mut AutoCommit, plan_id: Uuid) -> Result<bool, CodecError> {
    delete_child(doc, RECEIPTS_KEY, &plan_id.to_string())
}

fn delete_child(doc: &mut AutoCommit, map_key: &str, key: &str) -> Result<bool, CodecError> {
    let map_id = match doc.get(ROOT, map_key)? {
        Some((Value::Object(ObjType::Map), obj_id)) => obj_id,
        _ => return Ok(false),
    };
    if doc.get(&map_id, key)?.is_none() {
        return Ok(false);
    }
    doc.delete(&map_id, key)?;
    Ok(true)
}

// =============================================================================
// Plan document
// =============================================================================

/// Writes a plan's fields at the document root, replacing its schedule.
pub fn write_plan(doc: &mut AutoCommit, plan: &SharedWorkoutPlan) -> Result<(), CodecError> {
    doc.put(ROOT, "id", plan.id.to_string().as_str())?;
    doc.put(ROOT, "share_id", plan.share_id.to_bs58check().as_str())?;
    doc.put(ROOT, "title", plan.title.as_str())?;
    match plan.description {
        Some(ref description) => doc.put(ROOT, "description", description.as_str())?,
        None => {
            if doc.get(ROOT, "description")?.is_some() {
                doc.delete(ROOT, "description")?;
            }
        }
    }
    doc.put(ROOT, "author", plan.author.as_str())?;
    doc.put(ROOT, "difficulty", plan.difficulty.to_string().as_str())?;
    doc.put(ROOT, "visibility", plan.visibility.to_string().as_str())?;
    doc.put(ROOT, "created_at", plan.created_at.to_rfc3339().as_str())?;
    doc.put(ROOT, "updated_at", plan.updated_at.to_rfc3339().as_str())?;

    let schedule_id = doc.put_object(ROOT, "schedule", ObjType::Map)?;
    for (weekday, workout) in &plan.schedule {
        write_workout(doc, &schedule_id, &weekday.to_string(), workout)?;
    }

    Ok(())
}
