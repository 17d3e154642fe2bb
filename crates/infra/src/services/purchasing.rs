use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;
use tracing::{error, info, warn};

use stockflow_core::{AggregateRoot, ExpectedVersion, ItemId, LineId, PurchaseOrderId};
use stockflow_inventory::{Transaction, TransactionDraft, TransactionKind};
use stockflow_purchasing::{
    NewPurchaseOrder, PoNumber, PurchaseOrder, PurchaseOrderEvent, PurchaseOrderPatch,
    PurchaseOrderStatus,
};

use crate::clock::Clock;
use crate::error::{ServiceError, ServiceResult};
use crate::locks::KeyedLocks;
use crate::publisher::{EventPublisher, ORDER_AGGREGATE};
use crate::repository::{InMemoryRepository, Repository};
use crate::services::inventory::InventoryService;

/// Result of a receive call: the saved order plus the stock-ins it produced.
#[derive(Debug, Clone, Serialize)]
pub struct GoodsReceipt {
    pub order: PurchaseOrder,
    pub transactions: Vec<Transaction>,
}

/// Purchase orders and goods receiving.
pub struct PurchasingService {
    orders: Arc<dyn Repository<PurchaseOrderId, PurchaseOrder>>,
    inventory: Arc<InventoryService>,
    locks: KeyedLocks<PurchaseOrderId>,
    numbering: AtomicU64,
    default_currency: String,
    publisher: EventPublisher,
    clock: Arc<dyn Clock>,
}

impl PurchasingService {
    pub fn new(
        orders: Arc<dyn Repository<PurchaseOrderId, PurchaseOrder>>,
        inventory: Arc<InventoryService>,
        default_currency: impl Into<String>,
        publisher: EventPublisher,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            orders,
            inventory,
            locks: KeyedLocks::new(),
            numbering: AtomicU64::new(0),
            default_currency: default_currency.into(),
            publisher,
            clock,
        }
    }

    pub fn in_memory(
        inventory: Arc<InventoryService>,
        default_currency: impl Into<String>,
        publisher: EventPublisher,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self::new(
            Arc::new(InMemoryRepository::new()),
            inventory,
            default_currency,
            publisher,
            clock,
        )
    }

    pub fn create(&self, input: NewPurchaseOrder) -> ServiceResult<PurchaseOrder> {
        let order = PurchaseOrder::create(
            PurchaseOrderId::new(),
            PoNumber::sequential(self.numbering.fetch_add(1, Ordering::SeqCst) + 1),
            input,
            &self.default_currency,
            self.clock.now(),
        )?;
        self.orders.save(order.clone(), ExpectedVersion::Exact(0))?;

        info!(
            order_id = %order.id_typed(),
            po_number = %order.po_number(),
            total_amount = order.total_amount(),
            "purchase order created"
        );
        self.publish(&order, &PurchaseOrderEvent::created(&order));
        Ok(order)
    }

    pub fn get(&self, id: PurchaseOrderId) -> ServiceResult<PurchaseOrder> {
        self.orders
            .get(&id)?
            .ok_or_else(|| ServiceError::not_found(format!("purchase order {id}")))
    }

    /// Orders in creation order, optionally restricted to one status.
    pub fn list(&self, status: Option<PurchaseOrderStatus>) -> ServiceResult<Vec<PurchaseOrder>> {
        let mut orders: Vec<PurchaseOrder> = self
            .orders
            .list()?
            .into_iter()
            .filter(|o| status.is_none_or(|s| o.status() == s))
            .collect();
        orders.sort_by_key(|o| o.created_at());
        Ok(orders)
    }

    pub fn update_details(
        &self,
        id: PurchaseOrderId,
        patch: PurchaseOrderPatch,
    ) -> ServiceResult<PurchaseOrder> {
        self.locks.with_lock(&id, || {
            let current = self.get(id)?;
            let updated = current.update_details(patch, self.clock.now())?;
            self.orders
                .save(updated.clone(), ExpectedVersion::Exact(current.version()))?;

            info!(order_id = %id, po_number = %updated.po_number(), "purchase order updated");
            Ok(updated)
        })
    }

    /// Manual lifecycle move (`sent` or `closed`).
    pub fn transition(
        &self,
        id: PurchaseOrderId,
        target: PurchaseOrderStatus,
    ) -> ServiceResult<PurchaseOrder> {
        self.locks.with_lock(&id, || {
            let current = self.get(id)?;
            let next = match current.transition_to(target, self.clock.now()) {
                Ok(next) => next,
                Err(err) => {
                    warn!(order_id = %id, from = %current.status(), to = %target, error = %err, "status change rejected");
                    return Err(err.into());
                }
            };
            self.orders
                .save(next.clone(), ExpectedVersion::Exact(current.version()))?;

            info!(order_id = %id, po_number = %next.po_number(), status = %next.status(), "purchase order status changed");
            if let Some(event) = PurchaseOrderEvent::status_changed(&next) {
                self.publish(&next, &event);
            }
            Ok(next)
        })
    }

    /// Delete a draft order.
    pub fn delete(&self, id: PurchaseOrderId) -> ServiceResult<PurchaseOrder> {
        let removed = self.locks.with_lock(&id, || {
            let current = self.get(id)?;
            current.ensure_draft("delete")?;
            self.orders
                .delete(&id)?
                .ok_or_else(|| ServiceError::not_found(format!("purchase order {id}")))
        })?;
        self.locks.forget(&id);

        info!(order_id = %id, po_number = %removed.po_number(), "purchase order deleted");
        self.publisher.publish(
            ORDER_AGGREGATE,
            id,
            removed.version() + 1,
            &PurchaseOrderEvent::deleted(&removed, self.clock.now()),
        );
        Ok(removed)
    }

    /// Receive goods against an order and post the accepted amounts to the
    /// stock ledger as stock-ins referencing the PO number.
    ///
    /// Every received SKU must resolve to a catalog item and every stock-in
    /// must be valid before anything is saved. If the order or the ledger
    /// cannot be written, items and order are restored. A request that
    /// accepts nothing returns the order unchanged.
    pub fn receive(
        &self,
        id: PurchaseOrderId,
        received_by_line: &HashMap<LineId, i64>,
        user: &str,
    ) -> ServiceResult<GoodsReceipt> {
        self.locks.with_lock(&id, || {
            let current = self.get(id)?;
            let receipt = match current.receive(received_by_line, self.clock.now()) {
                Ok(receipt) => receipt,
                Err(err) => {
                    warn!(order_id = %id, status = %current.status(), error = %err, "receive rejected");
                    return Err(err.into());
                }
            };

            if receipt.received.is_empty() {
                return Ok(GoodsReceipt {
                    order: receipt.order,
                    transactions: Vec::new(),
                });
            }

            let targets = receipt
                .received
                .iter()
                .map(|line| {
                    self.inventory
                        .find_by_sku(&line.sku)?
                        .map(|item| (item.id_typed(), line.quantity))
                        .ok_or_else(|| {
                            ServiceError::not_found(format!(
                                "item with SKU {} (line {})",
                                line.sku, line.line_id
                            ))
                        })
                })
                .collect::<ServiceResult<Vec<(ItemId, i64)>>>()?;

            let po_number = receipt.order.po_number().to_string();
            let reason = format!("Purchase Order #{po_number}");
            let entries = targets
                .into_iter()
                .map(|(item_id, quantity)| {
                    let draft = TransactionDraft::new(TransactionKind::StockIn, quantity, user)
                        .with_reference(po_number.clone())
                        .with_reason(reason.clone());
                    (item_id, draft)
                })
                .collect();

            // The order is saved inside the batch, after its stock-ins are validated.
            let saved = self.inventory.record_batch(entries, || {
                self.orders
                    .save(receipt.order.clone(), ExpectedVersion::Exact(current.version()))?;
                Ok(())
            });
            let transactions = match saved {
                Ok(transactions) => transactions,
                Err(err) => {
                    warn!(order_id = %id, po_number = %po_number, error = %err, "goods receipt rejected");
                    self.restore(&current, &receipt.order);
                    return Err(err);
                }
            };

            info!(
                order_id = %id,
                po_number = %po_number,
                units = receipt.total_units(),
                status = %receipt.order.status(),
                "goods received"
            );
            self.publish(&receipt.order, &PurchaseOrderEvent::received(&receipt));

            Ok(GoodsReceipt {
                order: receipt.order,
                transactions,
            })
        })
    }

    /// Put `current` back if `attempted` was saved before the receipt failed.
    fn restore(&self, current: &PurchaseOrder, attempted: &PurchaseOrder) {
        let id = current.id_typed();
        match self.orders.get(&id) {
            Ok(Some(stored)) if stored.version() == attempted.version() => {
                if let Err(err) = self
                    .orders
                    .save(current.clone(), ExpectedVersion::Exact(attempted.version()))
                {
                    error!(order_id = %id, error = %err, "failed to restore purchase order");
                }
            }
            Ok(_) => {}
            Err(err) => error!(order_id = %id, error = %err, "failed to read purchase order for restore"),
        }
    }

    fn publish(&self, order: &PurchaseOrder, event: &PurchaseOrderEvent) {
        self.publisher
            .publish(ORDER_AGGREGATE, order.id_typed(), order.version(), event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use stockflow_core::DomainError;
    use stockflow_events::InMemoryEventBus;
    use stockflow_inventory::TransactionFilter;
    use stockflow_purchasing::NewLine;

    use crate::clock::SystemClock;
    use crate::repository::{InMemoryTransactionLog, TransactionLog};
    use crate::services::inventory::tests::{UnavailableLedger, new_item};

    struct Fixture {
        inventory: Arc<InventoryService>,
        purchasing: PurchasingService,
    }

    fn fixture() -> Fixture {
        fixture_with_ledger(Arc::new(InMemoryTransactionLog::new()))
    }

    fn fixture_with_ledger(ledger: Arc<dyn TransactionLog>) -> Fixture {
        let publisher = EventPublisher::new(Arc::new(InMemoryEventBus::new()));
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let inventory = Arc::new(InventoryService::new(
            Arc::new(InMemoryRepository::new()),
            ledger,
            publisher.clone(),
            clock.clone(),
        ));
        let purchasing = PurchasingService::in_memory(inventory.clone(), "USD", publisher, clock);
        Fixture {
            inventory,
            purchasing,
        }
    }

    fn order(lines: &[(&str, i64)]) -> NewPurchaseOrder {
        NewPurchaseOrder {
            supplier: "Tool Supply Co".to_string(),
            order_date: Some(NaiveDate::from_ymd_opt(2024, 1, 10).unwrap()),
            expected_date: NaiveDate::from_ymd_opt(2024, 1, 20).unwrap(),
            currency: None,
            lines: lines
                .iter()
                .map(|(sku, qty)| NewLine {
                    item_name: format!("Item {sku}"),
                    sku: sku.to_string(),
                    quantity: *qty,
                    unit_price: 500,
                })
                .collect(),
        }
    }

    fn by_line(order: &PurchaseOrder, amounts: &[i64]) -> HashMap<LineId, i64> {
        order
            .lines()
            .iter()
            .zip(amounts)
            .map(|(l, a)| (l.id_typed(), *a))
            .collect()
    }

    #[test]
    fn numbers_are_sequential() {
        let f = fixture();
        let a = f.purchasing.create(order(&[("DW-100", 1)])).unwrap();
        let b = f.purchasing.create(order(&[("DW-100", 1)])).unwrap();

        assert_eq!(a.po_number().as_str(), "PO-001");
        assert_eq!(b.po_number().as_str(), "PO-002");
        assert_eq!(a.currency(), "USD");
    }

    #[test]
    fn receiving_clamps_and_posts_stock_ins() {
        let f = fixture();
        let item = f.inventory.create_item(new_item("DW-100", 2)).unwrap();
        let po = f.purchasing.create(order(&[("DW-100", 25)])).unwrap();
        let po = f.purchasing.transition(po.id_typed(), PurchaseOrderStatus::Sent).unwrap();

        let first = f
            .purchasing
            .receive(po.id_typed(), &by_line(&po, &[15]), "dock")
            .unwrap();
        assert_eq!(first.order.status(), PurchaseOrderStatus::Partial);
        assert_eq!(first.transactions.len(), 1);
        assert_eq!(first.transactions[0].reference, "PO-001");
        assert_eq!(first.transactions[0].reason, "Purchase Order #PO-001");

        // 20 requested, 10 remaining.
        let second = f
            .purchasing
            .receive(po.id_typed(), &by_line(&po, &[20]), "dock")
            .unwrap();
        assert_eq!(second.order.status(), PurchaseOrderStatus::Received);
        assert_eq!(second.transactions[0].quantity, 10);
        assert_eq!(second.order.lines()[0].received_quantity(), 25);

        assert_eq!(f.inventory.get_item(item.id_typed()).unwrap().quantity(), 27);

        let err = f
            .purchasing
            .receive(po.id_typed(), &by_line(&po, &[1]), "dock")
            .unwrap_err();
        assert!(matches!(err, ServiceError::Domain(DomainError::InvalidState(_))));
    }

    #[test]
    fn draft_orders_cannot_receive() {
        let f = fixture();
        f.inventory.create_item(new_item("DW-100", 0)).unwrap();
        let po = f.purchasing.create(order(&[("DW-100", 5)])).unwrap();

        let err = f
            .purchasing
            .receive(po.id_typed(), &by_line(&po, &[5]), "dock")
            .unwrap_err();
        assert!(matches!(err, ServiceError::Domain(DomainError::InvalidState(_))));
    }

    #[test]
    fn unknown_sku_aborts_before_anything_is_saved() {
        let f = fixture();
        f.inventory.create_item(new_item("DW-100", 0)).unwrap();
        let po = f.purchasing.create(order(&[("DW-100", 5), ("GHOST-1", 5)])).unwrap();
        let po = f.purchasing.transition(po.id_typed(), PurchaseOrderStatus::Sent).unwrap();

        let err = f
            .purchasing
            .receive(po.id_typed(), &by_line(&po, &[5, 5]), "dock")
            .unwrap_err();
        assert!(matches!(err, ServiceError::Domain(DomainError::NotFound(_))));

        let stored = f.purchasing.get(po.id_typed()).unwrap();
        assert_eq!(stored.status(), PurchaseOrderStatus::Sent);
        assert_eq!(stored.received_units(), 0);
        assert!(f
            .inventory
            .transactions(&TransactionFilter::default())
            .unwrap()
            .is_empty());
    }

    fn sent_order_for(f: &Fixture, sku: &str, quantity: i64) -> PurchaseOrder {
        let po = f.purchasing.create(order(&[(sku, quantity)])).unwrap();
        f.purchasing.transition(po.id_typed(), PurchaseOrderStatus::Sent).unwrap()
    }

    #[test]
    fn rejected_stock_in_leaves_order_and_stock_untouched() {
        let f = fixture();
        let item = f.inventory.create_item(new_item("DW-100", 2)).unwrap();
        let po = sent_order_for(&f, "DW-100", 10);

        let err = f
            .purchasing
            .receive(po.id_typed(), &by_line(&po, &[10]), "   ")
            .unwrap_err();
        assert!(matches!(err, ServiceError::Domain(DomainError::Validation(_))));

        let stored = f.purchasing.get(po.id_typed()).unwrap();
        assert_eq!(stored, po);
        assert_eq!(stored.status(), PurchaseOrderStatus::Sent);
        assert_eq!(stored.received_units(), 0);
        assert_eq!(f.inventory.get_item(item.id_typed()).unwrap().quantity(), 2);
        assert!(f
            .inventory
            .transactions(&TransactionFilter::default())
            .unwrap()
            .is_empty());

        // The same receipt goes through once a receiver is named.
        let receipt = f
            .purchasing
            .receive(po.id_typed(), &by_line(&po, &[10]), "dock")
            .unwrap();
        assert_eq!(receipt.order.status(), PurchaseOrderStatus::Received);
        assert_eq!(f.inventory.get_item(item.id_typed()).unwrap().quantity(), 12);
    }

    #[test]
    fn ledger_failure_restores_the_order() {
        let f = fixture_with_ledger(Arc::new(UnavailableLedger::default()));
        let item = f.inventory.create_item(new_item("DW-100", 2)).unwrap();
        let po = sent_order_for(&f, "DW-100", 10);

        let err = f
            .purchasing
            .receive(po.id_typed(), &by_line(&po, &[4]), "dock")
            .unwrap_err();
        assert!(matches!(err, ServiceError::Store(_)));

        let stored = f.purchasing.get(po.id_typed()).unwrap();
        assert_eq!(stored.status(), PurchaseOrderStatus::Sent);
        assert_eq!(stored.version(), po.version());
        assert_eq!(f.inventory.get_item(item.id_typed()).unwrap().quantity(), 2);
    }

    #[test]
    fn only_drafts_can_be_deleted() {
        let f = fixture();
        let draft = f.purchasing.create(order(&[("DW-100", 1)])).unwrap();
        let sent = f.purchasing.create(order(&[("DW-100", 1)])).unwrap();
        f.purchasing.transition(sent.id_typed(), PurchaseOrderStatus::Sent).unwrap();

        f.purchasing.delete(draft.id_typed()).unwrap();
        assert!(f.purchasing.get(draft.id_typed()).is_err());

        let err = f.purchasing.delete(sent.id_typed()).unwrap_err();
        assert!(matches!(err, ServiceError::Domain(DomainError::InvalidState(_))));
        assert_eq!(
            f.purchasing.list(Some(PurchaseOrderStatus::Sent)).unwrap().len(),
            1
        );
    }
}
