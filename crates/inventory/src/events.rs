use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stockflow_core::{ItemId, TransactionId};
use stockflow_events::Event;

use crate::item::{Item, Sku};
use crate::ledger::{Transaction, TransactionKind};

/// Event: ItemCreated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemCreated {
    pub item_id: ItemId,
    pub sku: Sku,
    pub name: String,
    pub quantity: i64,
    pub occurred_at: DateTime<Utc>,
}

/// Event: ItemUpdated (catalog fields only, never quantity).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemUpdated {
    pub item_id: ItemId,
    pub sku: Sku,
    pub occurred_at: DateTime<Utc>,
}

/// Event: StockMoved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockMoved {
    pub item_id: ItemId,
    pub transaction_id: TransactionId,
    pub reference: String,
    pub kind: TransactionKind,
    pub sku: Sku,
    pub delta: i64,
    pub new_quantity: i64,
    pub occurred_at: DateTime<Utc>,
}

/// Event: ItemRemoved. Ledger history for the SKU is kept.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemRemoved {
    pub item_id: ItemId,
    pub sku: Sku,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InventoryEvent {
    ItemCreated(ItemCreated),
    ItemUpdated(ItemUpdated),
    StockMoved(StockMoved),
    ItemRemoved(ItemRemoved),
}

impl InventoryEvent {
    pub fn created(item: &Item) -> Self {
        InventoryEvent::ItemCreated(ItemCreated {
            item_id: item.id_typed(),
            sku: item.sku().clone(),
            name: item.name().to_string(),
            quantity: item.quantity(),
            occurred_at: item.created_at(),
        })
    }

    pub fn updated(item: &Item) -> Self {
        InventoryEvent::ItemUpdated(ItemUpdated {
            item_id: item.id_typed(),
            sku: item.sku().clone(),
            occurred_at: item.updated_at(),
        })
    }

    pub fn moved(txn: &Transaction) -> Self {
        InventoryEvent::StockMoved(StockMoved {
            item_id: txn.item_id,
            transaction_id: txn.id,
            reference: txn.reference.clone(),
            kind: txn.kind,
            sku: txn.sku.clone(),
            delta: txn.quantity,
            new_quantity: txn.resulting_quantity,
            occurred_at: txn.timestamp,
        })
    }

    pub fn removed(item: &Item, at: DateTime<Utc>) -> Self {
        InventoryEvent::ItemRemoved(ItemRemoved {
            item_id: item.id_typed(),
            sku: item.sku().clone(),
            occurred_at: at,
        })
    }

    pub fn item_id(&self) -> ItemId {
        match self {
            InventoryEvent::ItemCreated(e) => e.item_id,
            InventoryEvent::ItemUpdated(e) => e.item_id,
            InventoryEvent::StockMoved(e) => e.item_id,
            InventoryEvent::ItemRemoved(e) => e.item_id,
        }
    }
}

impl Event for InventoryEvent {
    fn event_type(&self) -> &'static str {
        match self {
            InventoryEvent::ItemCreated(_) => "inventory.item.created",
            InventoryEvent::ItemUpdated(_) => "inventory.item.updated",
            InventoryEvent::StockMoved(_) => "inventory.stock.moved",
            InventoryEvent::ItemRemoved(_) => "inventory.item.removed",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            InventoryEvent::ItemCreated(e) => e.occurred_at,
            InventoryEvent::ItemUpdated(e) => e.occurred_at,
            InventoryEvent::StockMoved(e) => e.occurred_at,
            InventoryEvent::ItemRemoved(e) => e.occurred_at,
        }
    }
}
