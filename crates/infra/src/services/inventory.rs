use std::sync::{Arc, Mutex, PoisonError};

use tracing::{debug, error, info, warn};

use stockflow_core::{AggregateRoot, ExpectedVersion, ItemId, TransactionId};
use stockflow_inventory::{
    InventoryEvent, Item, ItemPatch, NewItem, Sku, StockLevel, Transaction, TransactionDraft,
    TransactionFilter,
};

use crate::clock::Clock;
use crate::error::{ServiceError, ServiceResult};
use crate::locks::KeyedLocks;
use crate::publisher::{EventPublisher, ITEM_AGGREGATE};
use crate::repository::{InMemoryRepository, InMemoryTransactionLog, Repository, TransactionLog};

/// Catalog listing filter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemQuery {
    /// Case-insensitive substring of name or SKU.
    pub search: Option<String>,
    pub level: Option<StockLevel>,
    pub category: Option<String>,
}

impl ItemQuery {
    pub fn matches(&self, item: &Item) -> bool {
        if let Some(q) = &self.search {
            if !item.matches_search(q) {
                return false;
            }
        }
        if self.level.is_some_and(|l| l != item.stock_level()) {
            return false;
        }
        match self.category.as_deref().map(str::trim) {
            Some(c) if !c.is_empty() => item.category().eq_ignore_ascii_case(c),
            _ => true,
        }
    }
}

/// An item loaded for a ledger batch and its working copy.
struct StagedItem {
    current: Item,
    next: Item,
}

#[derive(Default)]
struct StagedBatch {
    items: Vec<StagedItem>,
    /// Entries with the item version they produced.
    transactions: Vec<(Transaction, u64)>,
}

/// Item catalog and stock ledger.
pub struct InventoryService {
    items: Arc<dyn Repository<ItemId, Item>>,
    ledger: Arc<dyn TransactionLog>,
    locks: KeyedLocks<ItemId>,
    /// Serializes SKU uniqueness checks with the writes they guard.
    catalog: Mutex<()>,
    publisher: EventPublisher,
    clock: Arc<dyn Clock>,
}

impl InventoryService {
    pub fn new(
        items: Arc<dyn Repository<ItemId, Item>>,
        ledger: Arc<dyn TransactionLog>,
        publisher: EventPublisher,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            items,
            ledger,
            locks: KeyedLocks::new(),
            catalog: Mutex::new(()),
            publisher,
            clock,
        }
    }

    pub fn in_memory(publisher: EventPublisher, clock: Arc<dyn Clock>) -> Self {
        Self::new(
            Arc::new(InMemoryRepository::new()),
            Arc::new(InMemoryTransactionLog::new()),
            publisher,
            clock,
        )
    }

    pub fn create_item(&self, input: NewItem) -> ServiceResult<Item> {
        let _catalog = self.catalog.lock().unwrap_or_else(PoisonError::into_inner);

        let sku = Sku::parse(&input.sku)?;
        self.ensure_sku_free(&sku, None)?;

        let item = Item::create(ItemId::new(), input, self.clock.now())?;
        self.items.save(item.clone(), ExpectedVersion::Exact(0))?;

        info!(item_id = %item.id_typed(), sku = %item.sku(), quantity = item.quantity(), "item created");
        self.publisher.publish(
            ITEM_AGGREGATE,
            item.id_typed(),
            item.version(),
            &InventoryEvent::created(&item),
        );
        Ok(item)
    }

    pub fn get_item(&self, id: ItemId) -> ServiceResult<Item> {
        self.items
            .get(&id)?
            .ok_or_else(|| ServiceError::not_found(format!("item {id}")))
    }

    /// Items matching `query`, ordered by name.
    pub fn list_items(&self, query: &ItemQuery) -> ServiceResult<Vec<Item>> {
        let mut items: Vec<Item> = self
            .items
            .list()?
            .into_iter()
            .filter(|i| query.matches(i))
            .collect();
        items.sort_by(|a, b| a.name().cmp(b.name()).then_with(|| a.sku().cmp(b.sku())));
        debug!(count = items.len(), "items listed");
        Ok(items)
    }

    pub fn search(&self, q: &str) -> ServiceResult<Vec<Item>> {
        self.list_items(&ItemQuery {
            search: Some(q.to_string()),
            ..ItemQuery::default()
        })
    }

    /// Low and out-of-stock items, emptiest first.
    pub fn low_stock(&self) -> ServiceResult<Vec<Item>> {
        let mut items: Vec<Item> = self
            .items
            .list()?
            .into_iter()
            .filter(Item::needs_reorder)
            .collect();
        items.sort_by(|a, b| a.quantity().cmp(&b.quantity()).then_with(|| a.name().cmp(b.name())));
        Ok(items)
    }

    /// Scanner lookup by barcode or SKU.
    pub fn lookup(&self, code: &str) -> ServiceResult<Item> {
        self.items
            .list()?
            .into_iter()
            .find(|i| i.matches_code(code))
            .ok_or_else(|| ServiceError::not_found(format!("item with code {}", code.trim())))
    }

    pub fn find_by_sku(&self, sku: &Sku) -> ServiceResult<Option<Item>> {
        Ok(self.items.list()?.into_iter().find(|i| i.sku() == sku))
    }

    pub fn update_item(&self, id: ItemId, patch: ItemPatch) -> ServiceResult<Item> {
        self.locks.with_lock(&id, || {
            let current = self.get_item(id)?;

            let new_sku = patch.sku.as_deref().map(Sku::parse).transpose()?;
            let _catalog = new_sku
                .as_ref()
                .map(|_| self.catalog.lock().unwrap_or_else(PoisonError::into_inner));
            if let Some(sku) = &new_sku {
                self.ensure_sku_free(sku, Some(id))?;
            }

            let updated = current.update(patch, self.clock.now())?;
            self.items
                .save(updated.clone(), ExpectedVersion::Exact(current.version()))?;

            info!(item_id = %id, sku = %updated.sku(), "item updated");
            self.publisher.publish(
                ITEM_AGGREGATE,
                id,
                updated.version(),
                &InventoryEvent::updated(&updated),
            );
            Ok(updated)
        })
    }

    /// Remove an item from the catalog. Its ledger history is kept.
    pub fn delete_item(&self, id: ItemId) -> ServiceResult<Item> {
        let removed = self.locks.with_lock(&id, || {
            self.items
                .delete(&id)?
                .ok_or_else(|| ServiceError::not_found(format!("item {id}")))
        })?;
        self.locks.forget(&id);

        info!(item_id = %id, sku = %removed.sku(), "item deleted");
        self.publisher.publish(
            ITEM_AGGREGATE,
            id,
            removed.version() + 1,
            &InventoryEvent::removed(&removed, self.clock.now()),
        );
        Ok(removed)
    }

    /// Apply one ledger entry to an item.
    ///
    /// On any error the item is unchanged and nothing is appended.
    pub fn record_transaction(
        &self,
        item_id: ItemId,
        draft: TransactionDraft,
    ) -> ServiceResult<Transaction> {
        self.record_batch(vec![(item_id, draft)], || Ok(()))?
            .into_iter()
            .next()
            .ok_or_else(|| {
                ServiceError::Store(format!("no ledger entry recorded for item {item_id}"))
            })
    }

    /// Apply several ledger entries as one unit.
    ///
    /// All items are locked, every entry is validated, then the items are saved,
    /// `commit` runs and the entries are appended. If any step fails the items
    /// are restored and nothing is appended. Entries for the same item apply in
    /// order.
    pub fn record_batch(
        &self,
        entries: Vec<(ItemId, TransactionDraft)>,
        commit: impl FnOnce() -> ServiceResult<()>,
    ) -> ServiceResult<Vec<Transaction>> {
        let keys: Vec<ItemId> = entries.iter().map(|(id, _)| *id).collect();
        self.locks.with_locks(&keys, || {
            let staged = self.stage(entries)?;

            let mut saved: Vec<&StagedItem> = Vec::with_capacity(staged.items.len());
            let mut written = staged.items.iter().try_for_each(|s| -> ServiceResult<()> {
                self.items
                    .save(s.next.clone(), ExpectedVersion::Exact(s.current.version()))?;
                saved.push(s);
                Ok(())
            });
            if written.is_ok() {
                written = commit();
            }
            if written.is_ok() {
                written = self
                    .ledger
                    .append_all(staged.transactions.iter().map(|(t, _)| t.clone()).collect())
                    .map_err(ServiceError::from);
            }
            if let Err(err) = written {
                warn!(items = saved.len(), error = %err, "ledger batch write failed, restoring items");
                self.restore(&saved);
                return Err(err);
            }

            for (txn, version) in &staged.transactions {
                info!(
                    item_id = %txn.item_id,
                    sku = %txn.sku,
                    reference = %txn.reference,
                    kind = %txn.kind,
                    delta = txn.quantity,
                    new_quantity = txn.resulting_quantity,
                    "stock moved"
                );
                self.publisher
                    .publish(ITEM_AGGREGATE, txn.item_id, *version, &InventoryEvent::moved(txn));
            }
            Ok(staged.transactions.into_iter().map(|(t, _)| t).collect())
        })
    }

    /// Validate every entry against a working copy of its item.
    fn stage(&self, entries: Vec<(ItemId, TransactionDraft)>) -> ServiceResult<StagedBatch> {
        let mut batch = StagedBatch::default();
        for (item_id, draft) in entries {
            let slot = match batch.items.iter().position(|s| s.next.id_typed() == item_id) {
                Some(slot) => slot,
                None => {
                    let current = self.get_item(item_id)?;
                    batch.items.push(StagedItem {
                        next: current.clone(),
                        current,
                    });
                    batch.items.len() - 1
                }
            };

            let kind = draft.kind;
            let next = &mut batch.items[slot].next;
            let sequence = self.ledger.next_sequence();
            match next.record_transaction(draft, sequence, self.clock.now()) {
                Ok(txn) => batch.transactions.push((txn, next.version())),
                Err(err) => {
                    warn!(item_id = %item_id, kind = %kind, error = %err, "transaction rejected");
                    return Err(err.into());
                }
            }
        }
        Ok(batch)
    }

    fn restore(&self, saved: &[&StagedItem]) {
        for s in saved {
            let id = s.current.id_typed();
            if let Err(err) = self
                .items
                .save(s.current.clone(), ExpectedVersion::Exact(s.next.version()))
            {
                error!(item_id = %id, error = %err, "failed to restore item after ledger failure");
            }
        }
    }

    /// Ledger entries matching `filter`, newest first.
    pub fn transactions(&self, filter: &TransactionFilter) -> ServiceResult<Vec<Transaction>> {
        Ok(self.ledger.query(filter)?)
    }

    pub fn transaction(&self, id: TransactionId) -> ServiceResult<Transaction> {
        self.ledger
            .get(id)?
            .ok_or_else(|| ServiceError::not_found(format!("transaction {id}")))
    }

    fn ensure_sku_free(&self, sku: &Sku, except: Option<ItemId>) -> ServiceResult<()> {
        let taken = self
            .items
            .list()?
            .iter()
            .any(|i| i.sku() == sku && Some(i.id_typed()) != except);
        if taken {
            return Err(ServiceError::Duplicate(format!("SKU {sku} already exists")));
        }
        Ok(())
    }
}
