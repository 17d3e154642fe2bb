use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;
use serde_json::json;

use stockflow_core::{ItemId, LineId};
use stockflow_infra::JsonEnvelope;
use stockflow_infra::services::{DashboardSummary, ItemQuery, UpcomingMaintenance};
use stockflow_inventory::{Item, Transaction, TransactionDraft, TransactionFilter, TransactionKind};
use stockflow_maintenance::{Asset, MaintenanceKind, MaintenanceLog, NewMaintenanceLog, ScheduleStatus};
use stockflow_purchasing::{PurchaseOrder, PurchaseOrderLine};

use crate::app::errors;

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Deserialize)]
pub struct RecordTransactionRequest {
    pub item_id: String,
    pub kind: String,
    pub quantity: i64,
    #[serde(default)]
    pub reference: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub source_location: Option<String>,
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub user: String,
}

impl RecordTransactionRequest {
    pub fn into_draft(self) -> Result<(ItemId, TransactionDraft), axum::response::Response> {
        let item_id: ItemId = errors::parse(&self.item_id)?;
        let kind: TransactionKind = errors::parse(&self.kind)?;
        let draft = TransactionDraft {
            kind,
            quantity: self.quantity,
            reference: self.reference,
            location: self.location,
            source_location: self.source_location,
            reason: self.reason,
            user: self.user,
        };
        Ok((item_id, draft))
    }
}

#[derive(Debug, Deserialize)]
pub struct StatusChangeRequest {
    pub status: String,
}

fn default_receiver() -> String {
    "system".to_string()
}

/// Goods receipt: line id to quantity arriving now.
#[derive(Debug, Deserialize)]
pub struct ReceiveRequest {
    pub lines: HashMap<String, i64>,
    #[serde(default = "default_receiver")]
    pub user: String,
}

impl ReceiveRequest {
    pub fn parsed_lines(&self) -> Result<HashMap<LineId, i64>, axum::response::Response> {
        self.lines
            .iter()
            .map(|(raw, qty)| Ok((errors::parse::<LineId>(raw)?, *qty)))
            .collect()
    }
}

#[derive(Debug, Deserialize)]
pub struct LogMaintenanceRequest {
    /// Service date; today when omitted.
    #[serde(default)]
    pub date: Option<NaiveDate>,
    pub description: String,
    pub technician: String,
    #[serde(default)]
    pub cost: u64,
    #[serde(default, rename = "type")]
    pub kind: MaintenanceKind,
}

impl LogMaintenanceRequest {
    pub fn into_parts(self) -> (NewMaintenanceLog, Option<NaiveDate>) {
        let log = NewMaintenanceLog {
            description: self.description,
            technician: self.technician,
            cost: self.cost,
            kind: self.kind,
        };
        (log, self.date)
    }
}

// -------------------------
// Query DTOs
// -------------------------

#[derive(Debug, Default, Deserialize)]
pub struct ItemListQuery {
    pub q: Option<String>,
    /// `in-stock`, `low-stock` or `out-of-stock`.
    pub status: Option<String>,
    pub category: Option<String>,
}

impl ItemListQuery {
    pub fn into_query(self) -> Result<ItemQuery, axum::response::Response> {
        let level = self.status.as_deref().map(errors::parse).transpose()?;
        Ok(ItemQuery {
            search: self.q,
            level,
            category: self.category,
        })
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct SearchQuery {
    pub q: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct TransactionListQuery {
    pub kind: Option<String>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub q: Option<String>,
    pub item_id: Option<String>,
}

impl TransactionListQuery {
    pub fn into_filter(self) -> Result<TransactionFilter, axum::response::Response> {
        Ok(TransactionFilter {
            kind: self.kind.as_deref().map(errors::parse).transpose()?,
            from: self.from,
            to: self.to,
            search: self.q,
            item_id: self.item_id.as_deref().map(errors::parse).transpose()?,
        })
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct LimitQuery {
    pub limit: Option<usize>,
}

// -------------------------
// JSON mapping helpers
// -------------------------

pub fn item_to_json(item: &Item) -> serde_json::Value {
    json!({
        "id": item.id_typed().to_string(),
        "sku": item.sku().as_str(),
        "name": item.name(),
        "description": item.description(),
        "category": item.category(),
        "unit": item.unit(),
        "barcode": item.barcode(),
        "quantity": item.quantity(),
        "min_stock": item.min_stock(),
        "max_stock": item.max_stock(),
        "location": item.location(),
        "unit_cost": item.unit_cost(),
        "retail_price": item.retail_price(),
        "supplier": item.supplier(),
        "status": item.stock_level().as_str(),
        "needs_reorder": item.needs_reorder(),
        "stock_value": item.stock_value(),
        "created_at": item.created_at(),
        "updated_at": item.updated_at(),
    })
}

pub fn transaction_to_json(txn: &Transaction) -> serde_json::Value {
    json!({
        "id": txn.id.to_string(),
        "sequence": txn.sequence,
        "reference": txn.reference,
        "kind": txn.kind.as_str(),
        "item_id": txn.item_id.to_string(),
        "item_name": txn.item_name,
        "sku": txn.sku.as_str(),
        "quantity": txn.quantity,
        "resulting_quantity": txn.resulting_quantity,
        "location": txn.location,
        "source_location": txn.source_location,
        "reason": txn.reason,
        "user": txn.user,
        "timestamp": txn.timestamp,
    })
}

fn line_to_json(line: &PurchaseOrderLine) -> serde_json::Value {
    json!({
        "id": line.id_typed().to_string(),
        "item_name": line.item_name(),
        "sku": line.sku().as_str(),
        "quantity": line.quantity(),
        "unit_price": line.unit_price(),
        "received_quantity": line.received_quantity(),
        "remaining": line.remaining(),
        "line_total": line.line_total(),
    })
}

pub fn purchase_order_to_json(order: &PurchaseOrder) -> serde_json::Value {
    json!({
        "id": order.id_typed().to_string(),
        "po_number": order.po_number().as_str(),
        "supplier": order.supplier(),
        "status": order.status().as_str(),
        "order_date": order.order_date(),
        "expected_date": order.expected_date(),
        "currency": order.currency(),
        "total_amount": order.total_amount(),
        "ordered_units": order.ordered_units(),
        "received_units": order.received_units(),
        "lines": order.lines().iter().map(line_to_json).collect::<Vec<_>>(),
        "created_at": order.created_at(),
        "updated_at": order.updated_at(),
    })
}

/// Asset with its schedule as of `today`.
pub fn asset_to_json(asset: &Asset, schedule: &ScheduleStatus, today: NaiveDate) -> serde_json::Value {
    json!({
        "id": asset.id_typed().to_string(),
        "name": asset.name(),
        "serial_number": asset.serial_number(),
        "location": asset.location(),
        "last_maintenance_date": asset.last_maintenance_date(),
        "maintenance_interval_days": asset.maintenance_interval_days(),
        "next_maintenance_date": asset.next_maintenance_date(),
        "status": schedule.status.as_str(),
        "days_until_due": schedule.days_until_due,
        "warranty_expiry": asset.warranty_expiry(),
        "warranty_active": asset.warranty_active(today),
        "maintenance_count": asset.history().len(),
        "created_at": asset.created_at(),
        "updated_at": asset.updated_at(),
    })
}

pub fn upcoming_to_json(entry: &UpcomingMaintenance, today: NaiveDate) -> serde_json::Value {
    asset_to_json(&entry.asset, &entry.schedule, today)
}

pub fn maintenance_log_to_json(log: &MaintenanceLog) -> serde_json::Value {
    json!({
        "id": log.id.to_string(),
        "asset_id": log.asset_id.to_string(),
        "date": log.date,
        "description": log.description,
        "technician": log.technician,
        "cost": log.cost,
        "type": log.kind.as_str(),
        "recorded_at": log.recorded_at,
    })
}

pub fn envelope_to_json(env: &JsonEnvelope) -> serde_json::Value {
    json!({
        "event_id": env.event_id().to_string(),
        "event_type": env.event_type(),
        "aggregate_type": env.aggregate_type(),
        "aggregate_id": env.aggregate_id(),
        "sequence_number": env.sequence_number(),
        "occurred_at": env.occurred_at(),
        "payload": env.payload(),
    })
}

pub fn dashboard_to_json(summary: &DashboardSummary, today: NaiveDate) -> serde_json::Value {
    json!({
        "total_items": summary.total_items,
        "total_units": summary.total_units,
        "total_value": summary.total_value,
        "low_stock_count": summary.low_stock_count,
        "out_of_stock_count": summary.out_of_stock_count,
        "open_purchase_orders": summary.open_purchase_orders,
        "recent_transactions": summary
            .recent_transactions
            .iter()
            .map(transaction_to_json)
            .collect::<Vec<_>>(),
        "upcoming_maintenance": summary
            .upcoming_maintenance
            .iter()
            .map(|entry| upcoming_to_json(entry, today))
            .collect::<Vec<_>>(),
    })
}
