//! Maintenance scheduling rule.

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

use stockflow_core::{DomainError, DomainResult};

use crate::asset::Asset;

/// Default "due soon" window in days.
pub const DEFAULT_DUE_SOON_DAYS: i64 = 7;

/// Maintenance status relative to a given day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetStatus {
    Good,
    Due,
    Overdue,
}

impl AssetStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            AssetStatus::Good => "good",
            AssetStatus::Due => "due",
            AssetStatus::Overdue => "overdue",
        }
    }
}

impl core::fmt::Display for AssetStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl core::str::FromStr for AssetStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "good" => Ok(AssetStatus::Good),
            "due" => Ok(AssetStatus::Due),
            "overdue" => Ok(AssetStatus::Overdue),
            other => Err(DomainError::validation(format!(
                "unknown asset status '{other}' (expected good, due or overdue)"
            ))),
        }
    }
}

/// Scheduling policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaintenancePolicy {
    due_soon_days: i64,
}

impl MaintenancePolicy {
    pub fn new(due_soon_days: i64) -> DomainResult<Self> {
        if due_soon_days < 0 {
            return Err(DomainError::validation("due_soon_days cannot be negative"));
        }
        Ok(Self { due_soon_days })
    }

    pub fn due_soon_days(&self) -> i64 {
        self.due_soon_days
    }

    pub fn classify(&self, days_until_due: i64) -> AssetStatus {
        if days_until_due < 0 {
            AssetStatus::Overdue
        } else if days_until_due <= self.due_soon_days {
            AssetStatus::Due
        } else {
            AssetStatus::Good
        }
    }
}

impl Default for MaintenancePolicy {
    fn default() -> Self {
        Self {
            due_soon_days: DEFAULT_DUE_SOON_DAYS,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleStatus {
    pub status: AssetStatus,
    /// Negative once the due date has passed.
    pub days_until_due: i64,
}

pub fn compute_status(asset: &Asset, today: NaiveDate, policy: &MaintenancePolicy) -> ScheduleStatus {
    let days_until_due = days_between(today, asset.next_maintenance_date());
    ScheduleStatus {
        status: policy.classify(days_until_due),
        days_until_due,
    }
}

pub fn days_between(from: NaiveDate, to: NaiveDate) -> i64 {
    (to - from).num_days()
}

pub(crate) fn add_interval(date: NaiveDate, interval_days: i64) -> DomainResult<NaiveDate> {
    if interval_days <= 0 {
        return Err(DomainError::validation(
            "maintenance_interval_days must be positive",
        ));
    }
    date.checked_add_days(Days::new(interval_days as u64))
        .ok_or_else(|| DomainError::validation("next maintenance date is out of range"))
}
