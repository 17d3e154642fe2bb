//! Inventory domain module.
//!
//! Business rules for the item catalog and the stock ledger, implemented as
//! deterministic domain logic (no IO, no HTTP, no storage).

pub mod events;
pub mod item;
pub mod ledger;

pub use events::{InventoryEvent, ItemCreated, ItemRemoved, ItemUpdated, StockMoved};
pub use item::{Item, ItemPatch, NewItem, Sku, StockLevel};
pub use ledger::{
    LedgerOutcome, StockMovement, Transaction, TransactionDraft, TransactionFilter,
    TransactionKind,
};
