//! Asset maintenance domain module.
//!
//! Maintenance scheduling rules (next-due dates, good/due/overdue status)
//! and the per-asset service history. Deterministic, no IO.

pub mod asset;
pub mod events;
pub mod schedule;

pub use asset::{Asset, MaintenanceKind, MaintenanceLog, NewAsset, NewMaintenanceLog};
pub use events::{AssetRegistered, MaintenanceEvent, MaintenanceLogged};
pub use schedule::{AssetStatus, MaintenancePolicy, ScheduleStatus, compute_status};
