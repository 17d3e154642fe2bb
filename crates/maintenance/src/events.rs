use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use stockflow_core::{AssetId, MaintenanceLogId};
use stockflow_events::Event;

use crate::asset::{Asset, MaintenanceKind, MaintenanceLog};

/// Event: AssetRegistered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetRegistered {
    pub asset_id: AssetId,
    pub name: String,
    pub serial_number: String,
    pub next_maintenance_date: NaiveDate,
    pub occurred_at: DateTime<Utc>,
}

/// Event: MaintenanceLogged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaintenanceLogged {
    pub asset_id: AssetId,
    pub log_id: MaintenanceLogId,
    pub kind: MaintenanceKind,
    pub performed_on: NaiveDate,
    pub next_maintenance_date: NaiveDate,
    pub cost: u64,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MaintenanceEvent {
    AssetRegistered(AssetRegistered),
    MaintenanceLogged(MaintenanceLogged),
}

impl MaintenanceEvent {
    pub fn registered(asset: &Asset) -> Self {
        MaintenanceEvent::AssetRegistered(AssetRegistered {
            asset_id: asset.id_typed(),
            name: asset.name().to_string(),
            serial_number: asset.serial_number().to_string(),
            next_maintenance_date: asset.next_maintenance_date(),
            occurred_at: asset.created_at(),
        })
    }

    pub fn logged(asset: &Asset, log: &MaintenanceLog) -> Self {
        MaintenanceEvent::MaintenanceLogged(MaintenanceLogged {
            asset_id: asset.id_typed(),
            log_id: log.id,
            kind: log.kind,
            performed_on: log.date,
            next_maintenance_date: asset.next_maintenance_date(),
            cost: log.cost,
            occurred_at: log.recorded_at,
        })
    }

    pub fn asset_id(&self) -> AssetId {
        match self {
            MaintenanceEvent::AssetRegistered(e) => e.asset_id,
            MaintenanceEvent::MaintenanceLogged(e) => e.asset_id,
        }
    }
}

impl Event for MaintenanceEvent {
    fn event_type(&self) -> &'static str {
        match self {
            MaintenanceEvent::AssetRegistered(_) => "maintenance.asset.registered",
            MaintenanceEvent::MaintenanceLogged(_) => "maintenance.service.logged",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            MaintenanceEvent::AssetRegistered(e) => e.occurred_at,
            MaintenanceEvent::MaintenanceLogged(e) => e.occurred_at,
        }
    }
}
