//! Readers that decode Automerge documents back into model types.
//!
//! Malformed entries (unparseable date keys, weekday slots outside 0-6,
//! entries without a title) are skipped with a warning rather than failing
//! the whole document. A receipt with an unknown status is read as synced.

use automerge::{AutoCommit, ObjId, ObjType, ReadDoc, ScalarValue, Value, ROOT};
use chrono::{DateTime, NaiveDate, Utc};
use std::collections::BTreeMap;
use uuid::Uuid;

use super::{CodecError, CALENDAR_KEY, RECEIPTS_KEY, VERSION_KEY};
use crate::models::{
    DailyWorkout, Exercise, SharedWorkoutPlan, SyncLedger, SyncReceipt, SyncStatus, UserCalendar,
    WeekdayIndex,
};
use crate::share_id::ShareId;

// =============================================================================
// User document
// =============================================================================

/// Reads the optimistic-concurrency version. Documents without one are version 0.
pub fn read_version(doc: &AutoCommit) -> Result<u64, CodecError> {
    Ok(get_i64(doc, &ROOT, VERSION_KEY)?
        .and_then(|v| u64::try_from(v).ok())
        .unwrap_or(0))
}

pub fn read_calendar(doc: &AutoCommit) -> Result<UserCalendar, CodecError> {
    let mut calendar = UserCalendar::new();

    let Some(calendar_id) = get_map(doc, &ROOT, CALENDAR_KEY)? else {
        return Ok(calendar);
    };

    for key in doc.keys(&calendar_id).collect::<Vec<_>>() {
        let Ok(date) = NaiveDate::parse_from_str(&key, "%Y-%m-%d") else {
            tracing::warn!("Skipping calendar entry with invalid date key '{}'", key);
            continue;
        };
        if let Some(entry_id) = get_map(doc, &calendar_id, &key)? {
            if let Some(workout) = read_workout(doc, &entry_id)? {
                calendar.insert(date, workout);
            }
        }
    }

    Ok(calendar)
}

pub fn read_ledger(doc: &AutoCommit) -> Result<SyncLedger, CodecError> {
    let mut ledger = SyncLedger::new();

    let Some(receipts_id) = get_map(doc, &ROOT, RECEIPTS_KEY)? else {
        return Ok(ledger);
    };

    for key in doc.keys(&receipts_id).collect::<Vec<_>>() {
        let Ok(plan_id) = Uuid::parse_str(&key) else {
            tracing::warn!("Skipping receipt with invalid plan id '{}'", key);
            continue;
        };
        if let Some(receipt_id) = get_map(doc, &receipts_id, &key)? {
            ledger.record(read_receipt(doc, &receipt_id, plan_id)?);
        }
    }

    Ok(ledger)
}

fn read_receipt(
    doc: &AutoCommit,
    obj_id: &ObjId,
    plan_id: Uuid,
) -> Result<SyncReceipt, CodecError> {
    let last_sync = get_timestamp(doc, obj_id, "last_sync")?.unwrap_or_else(Utc::now);

    // an unknown status keeps the receipt so its dates can still be removed
    let status = match get_string(doc, obj_id, "status")? {
        Some(s) => s.parse::<SyncStatus>().unwrap_or_else(|_| {
            tracing::warn!(
                "Receipt for plan {} has unknown status '{}', reading it as synced",
                plan_id,
                s
            );
            SyncStatus::Synced
        }),
        None => SyncStatus::Synced,
    };

    let mut synced_dates: Vec<NaiveDate> = read_string_list(doc, obj_id, "synced_dates")?
        .iter()
        .filter_map(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok())
        .collect();
    synced_dates.sort_unstable();
    synced_dates.dedup();

    Ok(SyncReceipt {
        plan_id,
        last_sync,
        synced_dates,
        status,
    })
}

// =============================================================================
// Plan document
// =============================================================================

/// Reads a plan stored at the document root. Returns `None` for an empty document.
pub fn read_plan(doc: &AutoCommit) -> Result<Option<SharedWorkoutPlan>, CodecError> {
    let id = match get_string(doc, &ROOT, "id")? {
        Some(id) => Uuid::parse_str(&id).map_err(|_| CodecError::InvalidValue {
            field: "id",
            value: id,
        })?,
        None => return Ok(None),
    };

    let share_id = match get_string(doc, &ROOT, "share_id")? {
        Some(s) => ShareId::from_bs58check(&s).map_err(|_| CodecError::InvalidValue {
            field: "share_id",
            value: s,
        })?,
        // plans written before share ids existed reuse their UUID bytes
        None => ShareId::from_uuid(id),
    };

    let title = get_string(doc, &ROOT, "title")?.unwrap_or_default();
    let description = get_string(doc, &ROOT, "description")?;
    let author = get_string(doc, &ROOT, "author")?.unwrap_or_default();

    let difficulty = match get_string(doc, &ROOT, "difficulty")? {
        Some(s) => s.parse()?,
        None => Default::default(),
    };
    let visibility = match get_string(doc, &ROOT, "visibility")? {
        Some(s) => s.parse()?,
        None => Default::default(),
    };

    let created_at = get_timestamp(doc, &ROOT, "created_at")?.unwrap_or_else(Utc::now);
    let updated_at = get_timestamp(doc, &ROOT, "updated_at")?.unwrap_or(created_at);

    let mut schedule = BTreeMap::new();
    if let Some(schedule_id) = get_map(doc, &ROOT, "schedule")? {
        for key in doc.keys(&schedule_id).collect::<Vec<_>>() {
            let Ok(weekday) = key.parse::<WeekdayIndex>() else {
                tracing::warn!("Skipping schedule slot '{}' in plan {}", key, id);
                continue;
            };
            if let Some(entry_id) = get_map(doc, &schedule_id, &key)? {
                if let Some(workout) = read_workout(doc, &entry_id)? {
                    schedule.insert(weekday, workout);
                }
            }
        }
    }

    Ok(Some(SharedWorkoutPlan {
        id,
        share_id,
        title,
        description,
        author,
        difficulty,
        visibility,
        schedule,
        created_at,
        updated_at,
    }))
}

// =============================================================================
// Workouts
// =============================================================================

pub fn read_workout(doc: &AutoCommit, obj_id: &ObjId) -> Result<Option<DailyWorkout>, CodecError> {
    let Some(title) = get_string(doc, obj_id, "title")? else {
        return Ok(None);
    };

    let estimated_minutes = get_i64(doc, obj_id, "estimated_minutes")?
        .and_then(|v| u32::try_from(v).ok())
        .unwrap_or(0);
    let modified = get_bool(doc, obj_id, "modified")?.unwrap_or(false);
    let muscle_groups = read_string_list(doc, obj_id, "muscle_groups")?;
    let exercises = read_exercises(doc, obj_id)?;

    Ok(Some(DailyWorkout {
        title,
        exercises,
        muscle_groups,
        estimated_minutes,
        modified,
    }))
}

fn read_exercises(doc: &AutoCommit, obj_id: &ObjId) -> Result<Vec<Exercise>, CodecError> {
    let mut exercises = Vec::new();

    let Some((_, list_id)) = doc.get(obj_id, "exercises")? else {
        return Ok(exercises);
    };

    for i in 0..doc.length(&list_id) {
        if let Some((_, ex_id)) = doc.get(&list_id, i)? {
            let Some(name) = get_string(doc, &ex_id, "name")? else {
                continue;
            };
            let as_u32 = |v: Option<i64>| v.and_then(|v| u32::try_from(v).ok());

            exercises.push(Exercise {
                name,
                sets: as_u32(get_i64(doc, &ex_id, "sets")?).unwrap_or(0),
                reps: as_u32(get_i64(doc, &ex_id, "reps")?).unwrap_or(0),
                weight_kg: get_f64(doc, &ex_id, "weight_kg")?,
                rest_seconds: as_u32(get_i64(doc, &ex_id, "rest_seconds")?),
                notes: get_string(doc, &ex_id, "notes")?,
            });
        }
    }

    Ok(exercises)
}

// =============================================================================
// Helpers
// =============================================================================

fn get_map(doc: &AutoCommit, obj_id: &ObjId, key: &str) -> Result<Option<ObjId>, CodecError> {
    match doc.get(obj_id, key)? {
        Some((Value::Object(ObjType::Map), map_id)) => Ok(Some(map_id)),
        _ => Ok(None),
    }
}

fn get_string(doc: &AutoCommit, obj_id: &ObjId, key: &str) -> Result<Option<String>, CodecError> {
    if let Some((value, _)) = doc.get(obj_id, key)? {
        Ok(value.into_string().ok())
    } else {
        Ok(None)
    }
}

fn get_i64(doc: &AutoCommit, obj_id: &ObjId, key: &str) -> Result<Option<i64>, CodecError> {
    if let Some((value, _)) = doc.get(obj_id, key)? {
        Ok(value.to_i64())
    } else {
        Ok(None)
    }
}

fn get_f64(doc: &AutoCommit, obj_id: &ObjId, key: &str) -> Result<Option<f64>, CodecError> {
    if let Some((value, _)) = doc.get(obj_id, key)? {
        Ok(value.to_f64())
    } else {
        Ok(None)
    }
}

fn get_bool(doc: &AutoCommit, obj_id: &ObjId, key: &str) -> Result<Option<bool>, CodecError> {
    match doc.get(obj_id, key)? {
        Some((Value::Scalar(scalar), _)) => match scalar.as_ref() {
            ScalarValue::Boolean(b) => Ok(Some(*b)),
            _ => Ok(None),
        },
        _ => Ok(None),
    }
}

fn get_timestamp(
    doc: &AutoCommit,
    obj_id: &ObjId,
    key: &str,
) -> Result<Option<DateTime<Utc>>, CodecError> {
    Ok(get_string(doc, obj_id, key)?
        .and_then(|s| DateTime::parse_from_rfc3339(&s).ok())
        .map(|dt| dt.with_timezone(&Utc)))
}

fn read_string_list(
    doc: &AutoCommit,
    obj_id: &ObjId,
    key: &str,
) -> Result<Vec<String>, CodecError> {
    let mut result = Vec::new();

    if let Some((_, list_id)) = doc.get(obj_id, key)? {
        for i in 0..doc.length(&list_id) {
            if let Some((value, _)) = doc.get(&list_id, i)? {
                if let Ok(s) = value.into_string() {
                    result.push(s);
                }
            }
        }
    }

    Ok(result)
}
