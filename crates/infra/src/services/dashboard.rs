use std::sync::Arc;

use serde::Serialize;

use stockflow_inventory::{StockLevel, Transaction, TransactionFilter};

use crate::error::ServiceResult;
use crate::services::inventory::{InventoryService, ItemQuery};
use crate::services::maintenance::{MaintenanceService, UpcomingMaintenance};
use crate::services::purchasing::PurchasingService;

/// Headline figures for the landing page.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardSummary {
    pub total_items: usize,
    pub total_units: i64,
    /// Stock valued at unit cost, smallest currency unit.
    pub total_value: u64,
    pub low_stock_count: usize,
    pub out_of_stock_count: usize,
    /// Orders still waiting for goods (sent or partial).
    pub open_purchase_orders: usize,
    pub recent_transactions: Vec<Transaction>,
    pub upcoming_maintenance: Vec<UpcomingMaintenance>,
}

pub struct DashboardService {
    inventory: Arc<InventoryService>,
    purchasing: Arc<PurchasingService>,
    maintenance: Arc<MaintenanceService>,
}

impl DashboardService {
    pub fn new(
        inventory: Arc<InventoryService>,
        purchasing: Arc<PurchasingService>,
        maintenance: Arc<MaintenanceService>,
    ) -> Self {
        Self {
            inventory,
            purchasing,
            maintenance,
        }
    }

    pub fn summary(&self, recent_limit: usize) -> ServiceResult<DashboardSummary> {
        let items = self.inventory.list_items(&ItemQuery::default())?;

        let mut recent_transactions = self.inventory.transactions(&TransactionFilter::default())?;
        recent_transactions.truncate(recent_limit);

        let open_purchase_orders = self
            .purchasing
            .list(None)?
            .iter()
            .filter(|o| o.status().can_receive())
            .count();

        Ok(DashboardSummary {
            total_items: items.len(),
            total_units: items.iter().map(|i| i.quantity()).sum(),
            total_value: items
                .iter()
                .fold(0u64, |acc, i| acc.saturating_add(i.stock_value())),
            low_stock_count: items
                .iter()
                .filter(|i| i.stock_level() == StockLevel::LowStock)
                .count(),
            out_of_stock_count: items
                .iter()
                .filter(|i| i.stock_level() == StockLevel::OutOfStock)
                .count(),
            open_purchase_orders,
            recent_transactions,
            upcoming_maintenance: self.maintenance.upcoming()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Days;
    use stockflow_events::InMemoryEventBus;
    use stockflow_inventory::{TransactionDraft, TransactionKind};
    use stockflow_maintenance::{MaintenancePolicy, NewAsset};

    use crate::clock::{Clock, SystemClock};
    use crate::publisher::EventPublisher;
    use crate::services::inventory::tests::new_item;

    #[test]
    fn summary_aggregates_all_three_areas() {
        let publisher = EventPublisher::new(Arc::new(InMemoryEventBus::new()));
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let inventory = Arc::new(InventoryService::in_memory(publisher.clone(), clock.clone()));
        let purchasing = Arc::new(PurchasingService::in_memory(
            inventory.clone(),
            "USD",
            publisher.clone(),
            clock.clone(),
        ));
        let maintenance = Arc::new(MaintenanceService::in_memory(
            MaintenancePolicy::default(),
            publisher,
            clock.clone(),
        ));

        let a = inventory.create_item(new_item("AAA-1", 10)).unwrap();
        inventory.create_item(new_item("BBB-2", 0)).unwrap();
        inventory.create_item(new_item("CCC-3", 3)).unwrap();
        inventory
            .record_transaction(a.id_typed(), TransactionDraft::new(TransactionKind::StockOut, 2, "sam"))
            .unwrap();

        let today = clock.today();
        maintenance
            .register(NewAsset {
                name: "Lift".to_string(),
                serial_number: "L-1".to_string(),
                location: "Bay 1".to_string(),
                last_maintenance_date: today.checked_sub_days(Days::new(40)).unwrap(),
                maintenance_interval_days: 30,
                warranty_expiry: None,
            })
            .unwrap();

        let summary = DashboardService::new(inventory, purchasing, maintenance)
            .summary(5)
            .unwrap();

        assert_eq!(summary.total_items, 3);
        assert_eq!(summary.total_units, 11);
        assert_eq!(summary.total_value, 11 * 1_000);
        assert_eq!(summary.low_stock_count, 1);
        assert_eq!(summary.out_of_stock_count, 1);
        assert_eq!(summary.open_purchase_orders, 0);
        assert_eq!(summary.recent_transactions.len(), 1);
        assert_eq!(summary.upcoming_maintenance.len(), 1);
    }
}
