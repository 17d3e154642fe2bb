//! Application services: load, apply a domain rule, save, publish.
//!
//! Each mutating call holds the per-record lock for its whole
//! read-decide-write cycle and saves with `ExpectedVersion::Exact`.

pub mod dashboard;
pub mod inventory;
pub mod maintenance;
pub mod purchasing;

pub use dashboard::{DashboardService, DashboardSummary};
pub use inventory::{InventoryService, ItemQuery};
pub use maintenance::{MaintenanceService, UpcomingMaintenance};
pub use purchasing::{GoodsReceipt, PurchasingService};
