use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stockflow_core::PurchaseOrderId;
use stockflow_events::Event;

use crate::order::{PoNumber, PurchaseOrder, PurchaseOrderStatus, Receipt, ReceivedLine};

/// Event: PurchaseOrderCreated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseOrderCreated {
    pub order_id: PurchaseOrderId,
    pub po_number: PoNumber,
    pub supplier: String,
    pub total_amount: u64,
    pub occurred_at: DateTime<Utc>,
}

/// Event: PurchaseOrderSent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseOrderSent {
    pub order_id: PurchaseOrderId,
    pub po_number: PoNumber,
    pub occurred_at: DateTime<Utc>,
}

/// Event: GoodsReceived.
///
/// Carries the accepted per-line amounts; each one has already been posted
/// to the stock ledger as a stock-in when this event is published.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GoodsReceived {
    pub order_id: PurchaseOrderId,
    pub po_number: PoNumber,
    pub lines: Vec<ReceivedLine>,
    pub status: PurchaseOrderStatus,
    pub occurred_at: DateTime<Utc>,
}

/// Event: PurchaseOrderClosed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseOrderClosed {
    pub order_id: PurchaseOrderId,
    pub po_number: PoNumber,
    pub occurred_at: DateTime<Utc>,
}

/// Event: PurchaseOrderDeleted (drafts only).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseOrderDeleted {
    pub order_id: PurchaseOrderId,
    pub po_number: PoNumber,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PurchaseOrderEvent {
    PurchaseOrderCreated(PurchaseOrderCreated),
    PurchaseOrderSent(PurchaseOrderSent),
    GoodsReceived(GoodsReceived),
    PurchaseOrderClosed(PurchaseOrderClosed),
    PurchaseOrderDeleted(PurchaseOrderDeleted),
}

impl PurchaseOrderEvent {
    pub fn created(order: &PurchaseOrder) -> Self {
        PurchaseOrderEvent::PurchaseOrderCreated(PurchaseOrderCreated {
            order_id: order.id_typed(),
            po_number: order.po_number().clone(),
            supplier: order.supplier().to_string(),
            total_amount: order.total_amount(),
            occurred_at: order.updated_at(),
        })
    }

    /// Event for a status change produced by `send`/`close`, if any.
    pub fn status_changed(order: &PurchaseOrder) -> Option<Self> {
        let order_id = order.id_typed();
        let po_number = order.po_number().clone();
        let occurred_at = order.updated_at();
        match order.status() {
            PurchaseOrderStatus::Sent => Some(PurchaseOrderEvent::PurchaseOrderSent(PurchaseOrderSent {
                order_id,
                po_number,
                occurred_at,
            })),
            PurchaseOrderStatus::Closed => {
                Some(PurchaseOrderEvent::PurchaseOrderClosed(PurchaseOrderClosed {
                    order_id,
                    po_number,
                    occurred_at,
                }))
            }
            _ => None,
        }
    }

    pub fn received(receipt: &Receipt) -> Self {
        PurchaseOrderEvent::GoodsReceived(GoodsReceived {
            order_id: receipt.order.id_typed(),
            po_number: receipt.order.po_number().clone(),
            lines: receipt.received.clone(),
            status: receipt.order.status(),
            occurred_at: receipt.order.updated_at(),
        })
    }

    pub fn deleted(order: &PurchaseOrder, at: DateTime<Utc>) -> Self {
        PurchaseOrderEvent::PurchaseOrderDeleted(PurchaseOrderDeleted {
            order_id: order.id_typed(),
            po_number: order.po_number().clone(),
            occurred_at: at,
        })
    }

    pub fn order_id(&self) -> PurchaseOrderId {
        match self {
            PurchaseOrderEvent::PurchaseOrderCreated(e) => e.order_id,
            PurchaseOrderEvent::PurchaseOrderSent(e) => e.order_id,
            PurchaseOrderEvent::GoodsReceived(e) => e.order_id,
            PurchaseOrderEvent::PurchaseOrderClosed(e) => e.order_id,
            PurchaseOrderEvent::PurchaseOrderDeleted(e) => e.order_id,
        }
    }
}

impl Event for PurchaseOrderEvent {
    fn event_type(&self) -> &'static str {
        match self {
            PurchaseOrderEvent::PurchaseOrderCreated(_) => "purchasing.order.created",
            PurchaseOrderEvent::PurchaseOrderSent(_) => "purchasing.order.sent",
            PurchaseOrderEvent::GoodsReceived(_) => "purchasing.order.goods_received",
            PurchaseOrderEvent::PurchaseOrderClosed(_) => "purchasing.order.closed",
            PurchaseOrderEvent::PurchaseOrderDeleted(_) => "purchasing.order.deleted",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            PurchaseOrderEvent::PurchaseOrderCreated(e) => e.occurred_at,
            PurchaseOrderEvent::PurchaseOrderSent(e) => e.occurred_at,
            PurchaseOrderEvent::GoodsReceived(e) => e.occurred_at,
            PurchaseOrderEvent::PurchaseOrderClosed(e) => e.occurred_at,
            PurchaseOrderEvent::PurchaseOrderDeleted(e) => e.occurred_at,
        }
    }
}
