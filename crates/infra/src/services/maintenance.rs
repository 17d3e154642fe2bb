use std::sync::{Arc, Mutex, PoisonError};

use chrono::NaiveDate;
use serde::Serialize;
use tracing::{info, warn};

use stockflow_core::{AggregateRoot, AssetId, ExpectedVersion};
use stockflow_maintenance::{
    Asset, AssetStatus, MaintenanceEvent, MaintenanceLog, MaintenancePolicy, NewAsset,
    NewMaintenanceLog, ScheduleStatus, compute_status,
};

use crate::clock::Clock;
use crate::error::{ServiceError, ServiceResult};
use crate::locks::KeyedLocks;
use crate::publisher::{ASSET_AGGREGATE, EventPublisher};
use crate::repository::{InMemoryRepository, Repository};

/// An asset that is due or overdue, with its schedule as of today.
#[derive(Debug, Clone, Serialize)]
pub struct UpcomingMaintenance {
    pub asset: Asset,
    pub schedule: ScheduleStatus,
}

/// Asset register and maintenance history.
pub struct MaintenanceService {
    assets: Arc<dyn Repository<AssetId, Asset>>,
    locks: KeyedLocks<AssetId>,
    /// Serializes serial-number uniqueness checks with registration.
    register: Mutex<()>,
    policy: MaintenancePolicy,
    publisher: EventPublisher,
    clock: Arc<dyn Clock>,
}

impl MaintenanceService {
    pub fn new(
        assets: Arc<dyn Repository<AssetId, Asset>>,
        policy: MaintenancePolicy,
        publisher: EventPublisher,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            assets,
            locks: KeyedLocks::new(),
            register: Mutex::new(()),
            policy,
            publisher,
            clock,
        }
    }

    pub fn in_memory(
        policy: MaintenancePolicy,
        publisher: EventPublisher,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self::new(Arc::new(InMemoryRepository::new()), policy, publisher, clock)
    }

    pub fn policy(&self) -> &MaintenancePolicy {
        &self.policy
    }

    pub fn register(&self, input: NewAsset) -> ServiceResult<Asset> {
        let _register = self.register.lock().unwrap_or_else(PoisonError::into_inner);

        let serial = input.serial_number.trim();
        let taken = self
            .assets
            .list()?
            .iter()
            .any(|a| a.serial_number().eq_ignore_ascii_case(serial));
        if taken {
            return Err(ServiceError::Duplicate(format!(
                "serial number {serial} already registered"
            )));
        }

        let asset = Asset::register(
            AssetId::new(),
            input,
            self.clock.today(),
            &self.policy,
            self.clock.now(),
        )?;
        self.assets.save(asset.clone(), ExpectedVersion::Exact(0))?;

        info!(
            asset_id = %asset.id_typed(),
            serial_number = asset.serial_number(),
            next_maintenance_date = %asset.next_maintenance_date(),
            "asset registered"
        );
        self.publisher.publish(
            ASSET_AGGREGATE,
            asset.id_typed(),
            asset.version(),
            &MaintenanceEvent::registered(&asset),
        );
        Ok(asset)
    }

    /// Asset with its status refreshed against today.
    pub fn get(&self, id: AssetId) -> ServiceResult<Asset> {
        let mut asset = self.load(id)?;
        asset.refresh_status(self.clock.today(), &self.policy);
        Ok(asset)
    }

    /// All assets, soonest service first, statuses refreshed.
    pub fn list(&self) -> ServiceResult<Vec<Asset>> {
        let today = self.clock.today();
        let mut assets = self.assets.list()?;
        for asset in &mut assets {
            asset.refresh_status(today, &self.policy);
        }
        assets.sort_by(|a, b| {
            a.next_maintenance_date()
                .cmp(&b.next_maintenance_date())
                .then_with(|| a.name().cmp(b.name()))
        });
        Ok(assets)
    }

    pub fn schedule(&self, id: AssetId) -> ServiceResult<ScheduleStatus> {
        let asset = self.load(id)?;
        Ok(compute_status(&asset, self.clock.today(), &self.policy))
    }

    /// Record a service; `performed_on` defaults to today.
    pub fn log_maintenance(
        &self,
        id: AssetId,
        input: NewMaintenanceLog,
        performed_on: Option<NaiveDate>,
    ) -> ServiceResult<(Asset, MaintenanceLog)> {
        self.locks.with_lock(&id, || {
            let current = self.load(id)?;
            let today = self.clock.today();
            let performed_on = performed_on.unwrap_or(today);

            let (next, log) =
                match current.log_maintenance(input, performed_on, today, self.clock.now()) {
                    Ok(outcome) => outcome,
                    Err(err) => {
                        warn!(asset_id = %id, error = %err, "maintenance log rejected");
                        return Err(err.into());
                    }
                };
            self.assets
                .save(next.clone(), ExpectedVersion::Exact(current.version()))?;

            info!(
                asset_id = %id,
                performed_on = %performed_on,
                next_maintenance_date = %next.next_maintenance_date(),
                cost = log.cost,
                "maintenance logged"
            );
            self.publisher.publish(
                ASSET_AGGREGATE,
                id,
                next.version(),
                &MaintenanceEvent::logged(&next, &log),
            );
            Ok((next, log))
        })
    }

    /// Service history, most recent first.
    pub fn history(&self, id: AssetId) -> ServiceResult<Vec<MaintenanceLog>> {
        let asset = self.load(id)?;
        let mut history = asset.history().to_vec();
        history.sort_by(|a, b| b.date.cmp(&a.date).then_with(|| b.recorded_at.cmp(&a.recorded_at)));
        Ok(history)
    }

    /// Due and overdue assets, most urgent first.
    pub fn upcoming(&self) -> ServiceResult<Vec<UpcomingMaintenance>> {
        let today = self.clock.today();
        let mut upcoming: Vec<UpcomingMaintenance> = self
            .assets
            .list()?
            .into_iter()
            .filter_map(|mut asset| {
                let schedule = compute_status(&asset, today, &self.policy);
                if schedule.status == AssetStatus::Good {
                    return None;
                }
                asset.refresh_status(today, &self.policy);
                Some(UpcomingMaintenance { asset, schedule })
            })
            .collect();
        upcoming.sort_by_key(|u| u.schedule.days_until_due);
        Ok(upcoming)
    }

    fn load(&self, id: AssetId) -> ServiceResult<Asset> {
        self.assets
            .get(&id)?
            .ok_or_else(|| ServiceError::not_found(format!("asset {id}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use stockflow_core::DomainError;
    use stockflow_events::InMemoryEventBus;
    use stockflow_maintenance::MaintenanceKind;

    use crate::clock::FixedClock;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn service() -> (MaintenanceService, Arc<FixedClock>) {
        let clock = Arc::new(FixedClock::new(Utc.with_ymd_and_hms(2024, 3, 10, 9, 0, 0).unwrap()));
        let svc = MaintenanceService::in_memory(
            MaintenancePolicy::default(),
            EventPublisher::new(Arc::new(InMemoryEventBus::new())),
            clock.clone(),
        );
        (svc, clock)
    }

    fn asset(serial: &str, last: NaiveDate, interval: i64) -> NewAsset {
        NewAsset {
            name: format!("Compressor {serial}"),
            serial_number: serial.to_string(),
            location: "Shop".to_string(),
            last_maintenance_date: last,
            maintenance_interval_days: interval,
            warranty_expiry: None,
        }
    }

    fn oil_change() -> NewMaintenanceLog {
        NewMaintenanceLog {
            description: "Oil change".to_string(),
            technician: "Sam".to_string(),
            cost: 4_000,
            kind: MaintenanceKind::Preventive,
        }
    }

    #[test]
    fn serial_numbers_are_unique() {
        let (svc, _clock) = service();
        svc.register(asset("SN-1", day(2024, 3, 1), 30)).unwrap();

        let err = svc.register(asset("sn-1", day(2024, 3, 1), 30)).unwrap_err();
        assert!(matches!(err, ServiceError::Duplicate(_)));
    }

    #[test]
    fn status_is_refreshed_as_time_passes() {
        let (svc, clock) = service();
        // Next service 2024-03-20: ten days out.
        let a = svc.register(asset("SN-1", day(2024, 2, 19), 30)).unwrap();
        assert_eq!(a.status(), AssetStatus::Good);

        clock.advance_days(5);
        assert_eq!(svc.get(a.id_typed()).unwrap().status(), AssetStatus::Due);

        clock.advance_days(8);
        let s = svc.schedule(a.id_typed()).unwrap();
        assert_eq!(s.status, AssetStatus::Overdue);
        assert_eq!(s.days_until_due, -3);
    }

    #[test]
    fn logging_resets_schedule_and_keeps_history() {
        let (svc, _clock) = service();
        let a = svc.register(asset("SN-1", day(2024, 1, 1), 60)).unwrap();

        let (updated, log) = svc.log_maintenance(a.id_typed(), oil_change(), None).unwrap();
        assert_eq!(updated.last_maintenance_date(), day(2024, 3, 10));
        assert_eq!(updated.next_maintenance_date(), day(2024, 5, 9));
        assert_eq!(updated.status(), AssetStatus::Good);

        let history = svc.history(a.id_typed()).unwrap();
        assert_eq!(history, vec![log]);
    }

    #[test]
    fn future_service_dates_are_rejected() {
        let (svc, _clock) = service();
        let a = svc.register(asset("SN-1", day(2024, 1, 1), 60)).unwrap();

        let err = svc
            .log_maintenance(a.id_typed(), oil_change(), Some(day(2024, 3, 11)))
            .unwrap_err();
        assert!(matches!(err, ServiceError::Domain(DomainError::Validation(_))));
        assert!(svc.history(a.id_typed()).unwrap().is_empty());
    }

    #[test]
    fn upcoming_lists_due_and_overdue_most_urgent_first() {
        let (svc, _clock) = service();
        svc.register(asset("GOOD", day(2024, 3, 1), 90)).unwrap();
        svc.register(asset("DUE", day(2024, 2, 14), 30)).unwrap();
        svc.register(asset("LATE", day(2024, 2, 1), 30)).unwrap();

        let upcoming = svc.upcoming().unwrap();
        let serials: Vec<&str> = upcoming.iter().map(|u| u.asset.serial_number()).collect();
        assert_eq!(serials, vec!["LATE", "DUE"]);
        assert_eq!(upcoming[0].schedule.days_until_due, -8);
        assert_eq!(upcoming[1].schedule.status, AssetStatus::Due);
    }
}
