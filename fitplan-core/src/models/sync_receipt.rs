use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use super::ModelError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncStatus {
    Synced,
    Conflict,
    Failed,
}

impl fmt::Display for SyncStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncStatus::Synced => write!(f, "synced"),
            SyncStatus::Conflict => write!(f, "conflict"),
            SyncStatus::Failed => write!(f, "failed"),
        }
    }
}

impl FromStr for SyncStatus {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "synced" => Ok(SyncStatus::Synced),
            "conflict" => Ok(SyncStatus::Conflict),
            "failed" => Ok(SyncStatus::Failed),
            _ => Err(ModelError::InvalidStatus(s.to_string())),
        }
    }
}

/// Record of the calendar dates a plan wrote, kept so they can be rolled back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncReceipt {
    pub plan_id: Uuid,
    pub last_sync: DateTime<Utc>,
    /// Ascending, no duplicates
    pub synced_dates: Vec<NaiveDate>,
    pub status: SyncStatus,
}

impl SyncReceipt {
    pub fn synced(plan_id: Uuid, mut synced_dates: Vec<NaiveDate>) -> Self {
        synced_dates.sort_unstable();
        synced_dates.dedup();
        Self {
            plan_id,
            last_sync: Utc::now(),
            synced_dates,
            status: SyncStatus::Synced,
        }
    }

    pub fn covers(&self, date: NaiveDate) -> bool {
        self.synced_dates.binary_search(&date).is_ok()
    }
}

impl fmt::Display for SyncReceipt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Plan: {}", self.plan_id)?;
        writeln!(f, "Status: {}", self.status)?;
        writeln!(f, "Last sync: {}", self.last_sync.to_rfc3339())?;
        match (self.synced_dates.first(), self.synced_dates.last()) {
            (Some(first), Some(last)) => writeln!(
                f,
                "Dates: {} ({} to {})",
                self.synced_dates.len(),
                first,
                last
            ),
            _ => writeln!(f, "Dates: none"),
        }
    }
}

/// Per-plan sync receipts for one user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SyncLedger {
    receipts: BTreeMap<Uuid, SyncReceipt>,
}

impl SyncLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, plan_id: Uuid) -> Option<&SyncReceipt> {
        self.receipts.get(&plan_id)
    }

    /// Stores a receipt, replacing any earlier receipt for the same plan.
    pub fn record(&mut self, receipt: SyncReceipt) -> Option<SyncReceipt> {
        self.receipts.insert(receipt.plan_id, receipt)
    }

    pub fn remove(&mut self, plan_id: Uuid) -> Option<SyncReceipt> {
        self.receipts.remove(&plan_id)
    }

    pub fn receipts(&self) -> impl Iterator<Item = &SyncReceipt> {
        self.receipts.values()
    }

    pub fn len(&self) -> usize {
        self.receipts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.receipts.is_empty()
    }
}
