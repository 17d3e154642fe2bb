//! Purchasing domain module (purchase orders and goods receipt).
//!
//! Business rules for purchase orders, implemented purely as deterministic
//! domain logic (no IO, no HTTP, no storage).

pub mod events;
pub mod order;

pub use events::{
    GoodsReceived, PurchaseOrderClosed, PurchaseOrderCreated, PurchaseOrderDeleted,
    PurchaseOrderEvent, PurchaseOrderSent,
};
pub use order::{
    NewLine, NewPurchaseOrder, PoNumber, PurchaseOrder, PurchaseOrderLine, PurchaseOrderPatch,
    PurchaseOrderStatus, Receipt, ReceivedLine,
};
