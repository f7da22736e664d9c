//! The user's calendar and sync ledger.
//!
//! Both live in one user document, so every change goes through a
//! checkout / commit cycle over the whole document. How concurrent cycles for
//! the same user interact is decided by [`ConcurrencyMode`].

use automerge::AutoCommit;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};
use uuid::Uuid;

use crate::automerge::{
    delete_calendar_entry, delete_receipt, load_or_create, read_calendar, read_ledger,
    read_version, write_calendar_entry, write_receipt, write_version, CodecError,
};
use crate::error::RepositoryError;
use crate::models::{DailyWorkout, SyncLedger, SyncReceipt, UserCalendar};
use crate::storage::{DocKey, DocumentStore, StoreError};

/// How overlapping read-modify-write cycles on one user document behave.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConcurrencyMode {
    /// Last writer wins; a commit may discard another session's changes.
    Unguarded,
    /// A per-user lock is held from checkout to commit.
    #[default]
    Locked,
    /// Commits fail if the document changed since checkout.
    Versioned,
}

impl fmt::Display for ConcurrencyMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ConcurrencyMode::Unguarded => "unguarded",
            ConcurrencyMode::Locked => "locked",
            ConcurrencyMode::Versioned => "versioned",
        };
        write!(f, "{}", s)
    }
}

impl FromStr for ConcurrencyMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "unguarded" => Ok(ConcurrencyMode::Unguarded),
            "locked" => Ok(ConcurrencyMode::Locked),
            "versioned" => Ok(ConcurrencyMode::Versioned),
            _ => Err(format!(
                "Invalid concurrency mode '{}'. Valid options: unguarded, locked, versioned",
                s
            )),
        }
    }
}

#[derive(Debug, Default)]
struct UserLock {
    /// Held from checkout to commit in locked mode
    session: Arc<Mutex<()>>,
    /// Held across the version check and write in versioned mode
    commit: Mutex<()>,
}

/// Registry of per-user locks shared by every session of a workspace.
///
/// Entries are created on first use and kept for the workspace's lifetime,
/// one per user id seen.
#[derive(Debug, Default)]
pub struct UserLocks {
    locks: RwLock<HashMap<String, Arc<UserLock>>>,
}

impl UserLocks {
    pub fn new() -> Self {
        Self::default()
    }

    async fn get(&self, user_id: &str) -> Arc<UserLock> {
        if let Some(lock) = self.locks.read().await.get(user_id) {
            return lock.clone();
        }

        let mut locks = self.locks.write().await;
        locks
            .entry(user_id.to_string())
            .or_default()
            .clone()
    }
}

/// A decoded user document, open for modification.
///
/// Changes made here are written to the store only by
/// [`CalendarStore::commit`]. Dropping a checkout discards them.
pub struct CalendarCheckout {
    doc: AutoCommit,
    calendar: UserCalendar,
    ledger: SyncLedger,
    version: u64,
    dirty: bool,
    _guard: Option<OwnedMutexGuard<()>>,
}

impl CalendarCheckout {
    pub fn calendar(&self) -> &UserCalendar {
        &self.calendar
    }

    pub fn ledger(&self) -> &SyncLedger {
        &self.ledger
    }

    /// Document version this checkout was taken at.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Adds or overwrites the entry at `date`, returning the previous one.
    pub fn put_entry(
        &mut self,
        date: NaiveDate,
        workout: DailyWorkout,
    ) -> Result<Option<DailyWorkout>, CodecError> {
        write_calendar_entry(&mut self.doc, date, &workout)?;
        self.dirty = true;
        Ok(self.calendar.insert(date, workout))
    }

    pub fn remove_entry(&mut self, date: NaiveDate) -> Result<Option<DailyWorkout>, CodecError> {
        if delete_calendar_entry(&mut self.doc, date)? {
            self.dirty = true;
        }
        Ok(self.calendar.remove(date))
    }

    pub fn record_receipt(
        &mut self,
        receipt: SyncReceipt,
    ) -> Result<Option<SyncReceipt>, CodecError> {
        write_receipt(&mut self.doc, &receipt)?;
        self.dirty = true;
        Ok(self.ledger.record(receipt))
    }

    pub fn remove_receipt(&mut self, plan_id: Uuid) -> Result<Option<SyncReceipt>, CodecError> {
        if delete_receipt(&mut self.doc, plan_id)? {
            self.dirty = true;
        }
        Ok(self.ledger.remove(plan_id))
    }
}

impl fmt::Debug for CalendarCheckout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CalendarCheckout")
            .field("version", &self.version)
            .field("entries", &self.calendar.len())
            .field("receipts", &self.ledger.len())
            .field("dirty", &self.dirty)
            .finish()
    }
}

/// Calendar and ledger access for one user.
#[derive(Clone)]
pub struct CalendarStore {
    store: Arc<dyn DocumentStore>,
    key: DocKey,
    mode: ConcurrencyMode,
    locks: Arc<UserLocks>,
}

impl CalendarStore {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        user_id: &str,
        mode: ConcurrencyMode,
        locks: Arc<UserLocks>,
    ) -> Self {
        Self {
            store,
            key: DocKey::user(user_id),
            mode,
            locks,
        }
    }

    pub fn user_id(&self) -> &str {
        &self.key.id
    }

    pub fn mode(&self) -> ConcurrencyMode {
        self.mode
    }

    /// Loads the user document for modification.
    ///
    /// In locked mode this waits until no other checkout for the same user is
    /// outstanding.
    pub async fn checkout(&self) -> Result<CalendarCheckout, RepositoryError> {
        let guard = match self.mode {
            ConcurrencyMode::Locked => {
                let lock = self.locks.get(&self.key.id).await;
                Some(lock.session.clone().lock_owned().await)
            }
            ConcurrencyMode::Unguarded | ConcurrencyMode::Versioned => None,
        };

        let checkout = self.load(guard).await?;
        tracing::debug!(
            user = %self.key.id,
            mode = %self.mode,
            version = checkout.version,
            "checked out calendar"
        );
        Ok(checkout)
    }

    /// Writes a checkout back as one document save. Returns the new version.
    ///
    /// A checkout with no changes is released without writing.
    pub async fn commit(&self, checkout: CalendarCheckout) -> Result<u64, RepositoryError> {
        let CalendarCheckout {
            mut doc,
            version,
            dirty,
            _guard,
            ..
        } = checkout;

        if !dirty {
            return Ok(version);
        }

        let new_version = version + 1;
        write_version(&mut doc, new_version)?;
        let bytes = doc.save();

        match self.mode {
            ConcurrencyMode::Versioned => {
                let lock = self.locks.get(&self.key.id).await;
                let _commit = lock.commit.lock().await;
                let stored = self.store.load(&self.key).await?;
                let found = read_version(&load_or_create(stored.as_deref())?)?;
                if found != version {
                    tracing::warn!(
                        user = %self.key.id,
                        expected = version,
                        found,
                        "calendar changed since checkout"
                    );
                    return Err(StoreError::VersionConflict {
                        key: self.key.clone(),
                        expected: version,
                        found,
                    }
                    .into());
                }
                self.store.save(&self.key, &bytes).await?;
            }
            ConcurrencyMode::Unguarded | ConcurrencyMode::Locked => {
                self.store.save(&self.key, &bytes).await?;
            }
        }

        tracing::debug!(user = %self.key.id, version = new_version, "committed calendar");
        Ok(new_version)
    }

    async fn load(
        &self,
        guard: Option<OwnedMutexGuard<()>>,
    ) -> Result<CalendarCheckout, RepositoryError> {
        let bytes = self.store.load(&self.key).await?;
        let doc = load_or_create(bytes.as_deref())?;
        let calendar = read_calendar(&doc)?;
        let ledger = read_ledger(&doc)?;
        let version = read_version(&doc)?;

        Ok(CalendarCheckout {
            doc,
            calendar,
            ledger,
            version,
            dirty: false,
            _guard: guard,
        })
    }

    // ==================== Reads ====================

    pub async fn calendar(&self) -> Result<UserCalendar, RepositoryError> {
        Ok(self.load(None).await?.calendar)
    }

    pub async fn ledger(&self) -> Result<SyncLedger, RepositoryError> {
        Ok(self.load(None).await?.ledger)
    }

    pub async fn get(&self, date: NaiveDate) -> Result<Option<DailyWorkout>, RepositoryError> {
        Ok(self.calendar().await?.get(date).cloned())
    }

    /// Entries between `from` and `to`, inclusive, in date order.
    pub async fn range(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<(NaiveDate, DailyWorkout)>, RepositoryError> {
        let calendar = self.calendar().await?;
        Ok(calendar
            .range(from, to)
            .map(|(date, workout)| (date, workout.clone()))
            .collect())
    }

    // ==================== Writes ====================

    /// Adds or overwrites the given dates in one commit. Other dates are left
    /// alone. Returns the number of entries written.
    pub async fn merge<I>(&self, entries: I) -> Result<usize, RepositoryError>
    where
        I: IntoIterator<Item = (NaiveDate, DailyWorkout)>,
    {
        let mut checkout = self.checkout().await?;
        let mut written = 0;
        for (date, workout) in entries {
            checkout.put_entry(date, workout)?;
            written += 1;
        }
        self.commit(checkout).await?;
        Ok(written)
    }

    pub async fn put(
        &self,
        date: NaiveDate,
        workout: DailyWorkout,
    ) -> Result<Option<DailyWorkout>, RepositoryError> {
        let mut checkout = self.checkout().await?;
        let previous = checkout.put_entry(date, workout)?;
        self.commit(checkout).await?;
        Ok(previous)
    }
}

impl fmt::Debug for CalendarStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CalendarStore")
            .field("key", &self.key)
            .field("mode", &self.mode)
            .finish()
    }
}
