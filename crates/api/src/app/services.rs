use std::sync::Arc;

use tracing::warn;

use stockflow_events::InMemoryEventBus;
use stockflow_infra::projections::ActivityFeed;
use stockflow_infra::services::{
    DashboardService, InventoryService, MaintenanceService, PurchasingService,
};
use stockflow_infra::workers::{ProjectionWorker, WorkerHandle};
use stockflow_infra::{Clock, EventPublisher, JsonEnvelope, SharedBus};

use crate::config::ApiConfig;

/// Everything the handlers need, shared behind one `Arc`.
pub struct AppServices {
    pub inventory: Arc<InventoryService>,
    pub purchasing: Arc<PurchasingService>,
    pub maintenance: Arc<MaintenanceService>,
    pub dashboard: DashboardService,
    pub activity: Arc<ActivityFeed>,
    pub clock: Arc<dyn Clock>,
    _activity_worker: Option<WorkerHandle>,
}

/// Wire the in-memory stores, the event bus and the activity projection.
pub fn build_services(config: &ApiConfig, clock: Arc<dyn Clock>) -> AppServices {
    let bus: SharedBus = Arc::new(InMemoryEventBus::<JsonEnvelope>::new());
    let publisher = EventPublisher::new(bus.clone());

    let inventory = Arc::new(InventoryService::in_memory(publisher.clone(), clock.clone()));
    let purchasing = Arc::new(PurchasingService::in_memory(
        inventory.clone(),
        config.currency.clone(),
        publisher.clone(),
        clock.clone(),
    ));
    let maintenance = Arc::new(MaintenanceService::in_memory(
        config.maintenance_policy,
        publisher,
        clock.clone(),
    ));
    let dashboard = DashboardService::new(inventory.clone(), purchasing.clone(), maintenance.clone());

    // Subscribe before any request can publish.
    let activity = Arc::new(ActivityFeed::new(config.activity_capacity));
    let feed = activity.clone();
    let activity_worker = match ProjectionWorker::spawn("activity-feed", bus.as_ref(), move |env| {
        feed.apply_envelope(env)
    }) {
        Ok(handle) => Some(handle),
        Err(err) => {
            warn!(error = %err, "failed to start activity feed worker; /activity will stay empty");
            None
        }
    };

    AppServices {
        inventory,
        purchasing,
        maintenance,
        dashboard,
        activity,
        clock,
        _activity_worker: activity_worker,
    }
}
