use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use stockflow_core::error::require_text;
use stockflow_core::{AggregateRoot, AssetId, DomainError, DomainResult, Entity, MaintenanceLogId};

use crate::schedule::{AssetStatus, MaintenancePolicy, add_interval, compute_status};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MaintenanceKind {
    #[default]
    Preventive,
    Repair,
    Inspection,
}

impl MaintenanceKind {
    pub fn as_str(self) -> &'static str {
        match self {
            MaintenanceKind::Preventive => "preventive",
            MaintenanceKind::Repair => "repair",
            MaintenanceKind::Inspection => "inspection",
        }
    }
}

/// Registration request for an asset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewAsset {
    pub name: String,
    pub serial_number: String,
    #[serde(default)]
    pub location: String,
    pub last_maintenance_date: NaiveDate,
    pub maintenance_interval_days: i64,
    #[serde(default)]
    pub warranty_expiry: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewMaintenanceLog {
    pub description: String,
    pub technician: String,
    #[serde(default)]
    pub cost: u64,
    #[serde(default, rename = "type")]
    pub kind: MaintenanceKind,
}

/// Immutable service record, owned by its asset's history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaintenanceLog {
    pub id: MaintenanceLogId,
    pub asset_id: AssetId,
    pub date: NaiveDate,
    pub description: String,
    pub technician: String,
    pub cost: u64,
    #[serde(rename = "type")]
    pub kind: MaintenanceKind,
    pub recorded_at: DateTime<Utc>,
}

impl Entity for MaintenanceLog {
    type Id = MaintenanceLogId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// Aggregate root: Asset.
///
/// `status` is a cache of [`compute_status`] as of the last refresh; it is
/// never set directly by callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Asset {
    id: AssetId,
    name: String,
    serial_number: String,
    location: String,
    last_maintenance_date: NaiveDate,
    maintenance_interval_days: i64,
    next_maintenance_date: NaiveDate,
    status: AssetStatus,
    warranty_expiry: Option<NaiveDate>,
    history: Vec<MaintenanceLog>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    version: u64,
}

impl Asset {
    pub fn register(
        id: AssetId,
        input: NewAsset,
        today: NaiveDate,
        policy: &MaintenancePolicy,
        now: DateTime<Utc>,
    ) -> DomainResult<Self> {
        require_text("name", &input.name)?;
        require_text("serial_number", &input.serial_number)?;
        let next_maintenance_date =
            add_interval(input.last_maintenance_date, input.maintenance_interval_days)?;

        let mut asset = Self {
            id,
            name: input.name.trim().to_string(),
            serial_number: input.serial_number.trim().to_string(),
            location: input.location.trim().to_string(),
            last_maintenance_date: input.last_maintenance_date,
            maintenance_interval_days: input.maintenance_interval_days,
            next_maintenance_date,
            status: AssetStatus::Good,
            warranty_expiry: input.warranty_expiry,
            history: Vec::new(),
            created_at: now,
            updated_at: now,
            version: 1,
        };
        asset.status = compute_status(&asset, today, policy).status;
        Ok(asset)
    }

    pub fn id_typed(&self) -> AssetId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn serial_number(&self) -> &str {
        &self.serial_number
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    pub fn last_maintenance_date(&self) -> NaiveDate {
        self.last_maintenance_date
    }

    pub fn maintenance_interval_days(&self) -> i64 {
        self.maintenance_interval_days
    }

    pub fn next_maintenance_date(&self) -> NaiveDate {
        self.next_maintenance_date
    }

    pub fn status(&self) -> AssetStatus {
        self.status
    }

    pub fn warranty_expiry(&self) -> Option<NaiveDate> {
        self.warranty_expiry
    }

    pub fn history(&self) -> &[MaintenanceLog] {
        &self.history
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Whether the warranty still covers `today` (inclusive of the expiry day).
    pub fn warranty_active(&self, today: NaiveDate) -> bool {
        self.warranty_expiry.is_some_and(|expiry| today <= expiry)
    }

    /// Recompute the cached status against `today`.
    ///
    /// A read-time view: the version is not bumped.
    pub fn refresh_status(&mut self, today: NaiveDate, policy: &MaintenancePolicy) {
        self.status = compute_status(self, today, policy).status;
    }

    /// Record a service performed on `performed_on` and move the schedule
    /// forward from that date.
    ///
    /// The date may not lie in the future or before the last recorded
    /// service; the schedule never moves backwards.
    ///
    /// Returns the next snapshot and the appended log entry; `self` is left
    /// untouched on error.
    pub fn log_maintenance(
        &self,
        input: NewMaintenanceLog,
        performed_on: NaiveDate,
        today: NaiveDate,
        now: DateTime<Utc>,
    ) -> DomainResult<(Self, MaintenanceLog)> {
        if performed_on > today {
            return Err(DomainError::validation(format!(
                "maintenance date {performed_on} is in the future"
            )));
        }
        if performed_on < self.last_maintenance_date {
            return Err(DomainError::validation(format!(
                "maintenance date {performed_on} is before the last service on {}",
                self.last_maintenance_date
            )));
        }
        require_text("description", &input.description)?;
        require_text("technician", &input.technician)?;

        let next_maintenance_date = add_interval(performed_on, self.maintenance_interval_days)?;
        let log = MaintenanceLog {
            id: MaintenanceLogId::new(),
            asset_id: self.id,
            date: performed_on,
            description: input.description.trim().to_string(),
            technician: input.technician.trim().to_string(),
            cost: input.cost,
            kind: input.kind,
            recorded_at: now,
        };

        let mut next = self.clone();
        next.last_maintenance_date = performed_on;
        next.next_maintenance_date = next_maintenance_date;
        next.status = AssetStatus::Good;
        next.history.push(log.clone());
        next.updated_at = now;
        next.version += 1;
        Ok((next, log))
    }
}

impl AggregateRoot for Asset {
    type Id = AssetId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use chrono::Days;

    pub(crate) fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    pub(crate) fn new_asset(last: NaiveDate, interval: i64) -> NewAsset {
        NewAsset {
            name: "Forklift".to_string(),
            serial_number: "FL-2024-001".to_string(),
            location: "Warehouse A".to_string(),
            last_maintenance_date: last,
            maintenance_interval_days: interval,
            warranty_expiry: Some(day(2026, 1, 1)),
        }
    }

    /// An asset with a 30 day interval whose next service falls on `due`.
    pub(crate) fn asset_due_on(due: NaiveDate) -> Asset {
        let last = due.checked_sub_days(Days::new(30)).unwrap();
        Asset::register(
            AssetId::new(),
            new_asset(last, 30),
            last,
            &MaintenancePolicy::default(),
            Utc::now(),
        )
        .unwrap()
    }

    fn service(description: &str, technician: &str) -> NewMaintenanceLog {
        NewMaintenanceLog {
            description: description.to_string(),
            technician: technician.to_string(),
            cost: 12_500,
            kind: MaintenanceKind::Preventive,
        }
    }

    #[test]
    fn register_computes_next_date_and_status() {
        let today = day(2024, 3, 10);
        let asset = Asset::register(
            AssetId::new(),
            new_asset(day(2024, 2, 15), 30),
            today,
            &MaintenancePolicy::default(),
            Utc::now(),
        )
        .unwrap();

        assert_eq!(asset.next_maintenance_date(), day(2024, 3, 16));
        assert_eq!(asset.status(), AssetStatus::Due);
        assert_eq!(asset.version(), 1);
        assert!(asset.history().is_empty());
    }

    #[test]
    fn register_rejects_bad_input() {
        let policy = MaintenancePolicy::default();
        let today = day(2024, 3, 10);

        let zero_interval = new_asset(today, 0);
        assert!(matches!(
            Asset::register(AssetId::new(), zero_interval, today, &policy, Utc::now()),
            Err(DomainError::Validation(_))
        ));

        let mut no_serial = new_asset(today, 30);
        no_serial.serial_number = " ".to_string();
        assert!(matches!(
            Asset::register(AssetId::new(), no_serial, today, &policy, Utc::now()),
            Err(DomainError::Validation(_))
        ));
    }

    #[test]
    fn logging_maintenance_moves_schedule_and_resets_status() {
        let today = day(2024, 3, 10);
        let mut asset = asset_due_on(day(2024, 3, 7));
        asset.refresh_status(today, &MaintenancePolicy::default());
        assert_eq!(asset.status(), AssetStatus::Overdue);

        let (next, log) = asset
            .log_maintenance(service("Oil change", "Sam"), today, today, Utc::now())
            .unwrap();

        assert_eq!(next.last_maintenance_date(), today);
        assert_eq!(next.next_maintenance_date(), day(2024, 4, 9));
        assert_eq!(next.status(), AssetStatus::Good);
        assert_eq!(next.history(), &[log.clone()]);
        assert_eq!(next.version(), asset.version() + 1);
        assert_eq!(log.asset_id, asset.id_typed());
        assert_eq!(log.cost, 12_500);
    }

    #[test]
    fn logging_rejects_future_dates_and_missing_fields() {
        let today = day(2024, 3, 10);
        let asset = asset_due_on(day(2024, 3, 20));

        let tomorrow = day(2024, 3, 11);
        assert!(matches!(
            asset.log_maintenance(service("Oil change", "Sam"), tomorrow, today, Utc::now()),
            Err(DomainError::Validation(_))
        ));
        assert!(matches!(
            asset.log_maintenance(service("", "Sam"), today, today, Utc::now()),
            Err(DomainError::Validation(_))
        ));
        assert!(matches!(
            asset.log_maintenance(service("Oil change", "  "), today, today, Utc::now()),
            Err(DomainError::Validation(_))
        ));
    }

    #[test]
    fn logging_before_the_last_service_is_rejected() {
        let today = day(2024, 3, 10);
        let asset = asset_due_on(day(2024, 3, 20));
        assert_eq!(asset.last_maintenance_date(), day(2024, 2, 19));

        let err = asset
            .log_maintenance(service("Oil change", "Sam"), day(2024, 2, 18), today, Utc::now())
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
        assert_eq!(asset.next_maintenance_date(), day(2024, 3, 20));

        // Same day as the last service is still accepted.
        let (next, _) = asset
            .log_maintenance(service("Belt check", "Sam"), day(2024, 2, 19), today, Utc::now())
            .unwrap();
        assert_eq!(next.next_maintenance_date(), day(2024, 3, 20));
        assert_eq!(next.history().len(), 1);
    }

    #[test]
    fn warranty_is_active_through_expiry_day() {
        let asset = asset_due_on(day(2024, 3, 20));
        assert!(asset.warranty_active(day(2026, 1, 1)));
        assert!(!asset.warranty_active(day(2026, 1, 2)));
    }
}
