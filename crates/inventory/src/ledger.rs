//! Stock ledger rule: how a transaction changes an item's quantity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stockflow_core::error::require_text;
use stockflow_core::{DomainError, DomainResult, ItemId, TransactionId};

use crate::item::{Item, Sku};

/// Kind of stock-affecting transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TransactionKind {
    StockIn,
    StockOut,
    Adjustment,
    /// Movement into the destination location. The source location is
    /// recorded for audit only; items carry a single stock figure.
    Transfer,
}

impl TransactionKind {
    pub const ALL: [TransactionKind; 4] = [
        TransactionKind::StockIn,
        TransactionKind::StockOut,
        TransactionKind::Adjustment,
        TransactionKind::Transfer,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            TransactionKind::StockIn => "stock-in",
            TransactionKind::StockOut => "stock-out",
            TransactionKind::Adjustment => "adjustment",
            TransactionKind::Transfer => "transfer",
        }
    }

    fn reference_prefix(self) -> &'static str {
        match self {
            TransactionKind::StockIn => "IN",
            TransactionKind::StockOut => "OUT",
            TransactionKind::Adjustment => "ADJ",
            TransactionKind::Transfer => "TRF",
        }
    }
}

impl core::fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl core::str::FromStr for TransactionKind {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TransactionKind::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| {
                DomainError::validation(format!(
                    "unknown transaction kind '{s}' (expected stock-in, stock-out, adjustment or transfer)"
                ))
            })
    }
}

/// A requested movement before it is checked against stock.
///
/// `quantity` is the caller's requested amount. For `stock-in`, `stock-out`
/// and `transfer` it must be positive and the kind decides the sign. For
/// `adjustment` it carries its own sign (a positive correction is allowed).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockMovement {
    pub kind: TransactionKind,
    pub quantity: i64,
}

impl StockMovement {
    pub fn new(kind: TransactionKind, quantity: i64) -> Self {
        Self { kind, quantity }
    }

    pub fn stock_in(quantity: i64) -> Self {
        Self::new(TransactionKind::StockIn, quantity)
    }

    pub fn stock_out(quantity: i64) -> Self {
        Self::new(TransactionKind::StockOut, quantity)
    }

    pub fn signed_delta(&self) -> DomainResult<i64> {
        match self.kind {
            TransactionKind::Adjustment => {
                if self.quantity == 0 {
                    return Err(DomainError::validation("adjustment quantity cannot be zero"));
                }
                Ok(self.quantity)
            }
            kind => {
                if self.quantity <= 0 {
                    return Err(DomainError::validation(format!(
                        "{kind} quantity must be a positive integer"
                    )));
                }
                match kind {
                    TransactionKind::StockOut => Ok(-self.quantity),
                    _ => Ok(self.quantity),
                }
            }
        }
    }
}

/// Result of checking a movement against an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerOutcome {
    pub new_quantity: i64,
    pub signed_delta: i64,
}

impl Item {
    /// Decide the outcome of a movement without mutating the item.
    pub fn apply_movement(&self, movement: &StockMovement) -> DomainResult<LedgerOutcome> {
        let signed_delta = movement.signed_delta()?;
        let new_quantity = self
            .quantity()
            .checked_add(signed_delta)
            .ok_or_else(|| DomainError::validation("quantity overflow"))?;

        if new_quantity < 0 {
            return Err(DomainError::negative_stock(
                signed_delta.abs(),
                self.quantity(),
            ));
        }

        Ok(LedgerOutcome {
            new_quantity,
            signed_delta,
        })
    }

    /// Check a draft against this item and, on success, commit the new
    /// quantity and return the immutable ledger record. On error the item is
    /// unchanged and nothing is recorded.
    pub fn record_transaction(
        &mut self,
        draft: TransactionDraft,
        sequence: u64,
        now: DateTime<Utc>,
    ) -> DomainResult<Transaction> {
        require_text("user", &draft.user)?;
        let outcome = self.apply_movement(&StockMovement::new(draft.kind, draft.quantity))?;

        let location = draft
            .location
            .map(|l| l.trim().to_string())
            .filter(|l| !l.is_empty())
            .unwrap_or_else(|| self.location().to_string());
        let source_location = match draft.kind {
            TransactionKind::Transfer => draft
                .source_location
                .map(|l| l.trim().to_string())
                .filter(|l| !l.is_empty()),
            _ => None,
        };
        let reference = draft
            .reference
            .map(|r| r.trim().to_string())
            .filter(|r| !r.is_empty())
            .unwrap_or_else(|| format!("{}-{sequence:06}", draft.kind.reference_prefix()));

        self.set_quantity(outcome.new_quantity, now);

        Ok(Transaction {
            id: TransactionId::new(),
            sequence,
            reference,
            kind: draft.kind,
            item_id: self.id_typed(),
            item_name: self.name().to_string(),
            sku: self.sku().clone(),
            quantity: outcome.signed_delta,
            resulting_quantity: outcome.new_quantity,
            location,
            source_location,
            reason: draft.reason.unwrap_or_default().trim().to_string(),
            user: draft.user.trim().to_string(),
            timestamp: now,
        })
    }
}

/// Caller input for a ledger entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionDraft {
    pub kind: TransactionKind,
    pub quantity: i64,
    #[serde(default)]
    pub reference: Option<String>,
    /// Defaults to the item's location.
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub source_location: Option<String>,
    #[serde(default)]
    pub reason: Option<String>,
    pub user: String,
}

impl TransactionDraft {
    pub fn new(kind: TransactionKind, quantity: i64, user: impl Into<String>) -> Self {
        Self {
            kind,
            quantity,
            reference: None,
            location: None,
            source_location: None,
            reason: None,
            user: user.into(),
        }
    }

    pub fn with_reference(mut self, reference: impl Into<String>) -> Self {
        self.reference = Some(reference.into());
        self
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }
}

/// Immutable ledger record.
///
/// References its item by id and SKU only; the record outlives the item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: TransactionId,
    pub sequence: u64,
    pub reference: String,
    pub kind: TransactionKind,
    pub item_id: ItemId,
    pub item_name: String,
    pub sku: Sku,
    /// Signed quantity actually applied.
    pub quantity: i64,
    pub resulting_quantity: i64,
    pub location: String,
    pub source_location: Option<String>,
    pub reason: String,
    pub user: String,
    pub timestamp: DateTime<Utc>,
}

/// Ledger query: every set field must match.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransactionFilter {
    pub kind: Option<TransactionKind>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    /// Case-insensitive substring of item name, SKU or reason.
    pub search: Option<String>,
    pub item_id: Option<ItemId>,
}

impl TransactionFilter {
    pub fn matches(&self, txn: &Transaction) -> bool {
        if self.kind.is_some_and(|k| k != txn.kind) {
            return false;
        }
        if self.item_id.is_some_and(|id| id != txn.item_id) {
            return false;
        }
        if self.from.is_some_and(|from| txn.timestamp < from) {
            return false;
        }
        if self.to.is_some_and(|to| txn.timestamp > to) {
            return false;
        }
        match self.search.as_deref().map(str::trim) {
            Some(q) if !q.is_empty() => {
                let q = q.to_lowercase();
                txn.item_name.to_lowercase().contains(&q)
                    || txn.sku.as_str().to_lowercase().contains(&q)
                    || txn.reason.to_lowercase().contains(&q)
            }
            _ => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::tests::item;
    use proptest::prelude::*;
    use stockflow_core::AggregateRoot;

    fn draft(kind: TransactionKind, quantity: i64) -> TransactionDraft {
        TransactionDraft::new(kind, quantity, "Jane Smith")
    }

    #[test]
    fn stock_out_beyond_available_fails_and_leaves_item_unchanged() {
        let mut it = item(5, 5);
        let before = it.clone();

        let err = it
            .record_transaction(draft(TransactionKind::StockOut, 6), 1, Utc::now())
            .unwrap_err();

        assert_eq!(err, DomainError::negative_stock(6, 5));
        assert_eq!(it, before);
        assert_eq!(it.quantity(), 5);
    }

    #[test]
    fn kinds_derive_their_sign() {
        let it = item(10, 2);
        let out = it.apply_movement(&StockMovement::stock_out(4)).unwrap();
        assert_eq!(out, LedgerOutcome { new_quantity: 6, signed_delta: -4 });

        let inn = it.apply_movement(&StockMovement::stock_in(20)).unwrap();
        assert_eq!(inn.signed_delta, 20);

        let trf = it
            .apply_movement(&StockMovement::new(TransactionKind::Transfer, 5))
            .unwrap();
        assert_eq!(trf.new_quantity, 15);
    }

    #[test]
    fn adjustment_keeps_caller_sign() {
        let it = item(10, 2);
        let down = it
            .apply_movement(&StockMovement::new(TransactionKind::Adjustment, -2))
            .unwrap();
        assert_eq!(down.new_quantity, 8);

        let up = it
            .apply_movement(&StockMovement::new(TransactionKind::Adjustment, 3))
            .unwrap();
        assert_eq!(up.new_quantity, 13);

        assert!(matches!(
            it.apply_movement(&StockMovement::new(TransactionKind::Adjustment, 0)),
            Err(DomainError::Validation(_))
        ));
    }

    #[test]
    fn non_positive_requested_quantity_is_rejected() {
        let it = item(10, 2);
        for kind in [TransactionKind::StockIn, TransactionKind::StockOut, TransactionKind::Transfer] {
            assert!(matches!(
                it.apply_movement(&StockMovement::new(kind, 0)),
                Err(DomainError::Validation(_))
            ));
            assert!(it.apply_movement(&StockMovement::new(kind, -3)).is_err());
        }
    }

    #[test]
    fn recorded_transaction_carries_generated_reference() {
        let mut it = item(10, 2);
        let txn = it
            .record_transaction(draft(TransactionKind::Adjustment, -2).with_reason("Damaged goods"), 7, Utc::now())
            .unwrap();

        assert_eq!(txn.reference, "ADJ-000007");
        assert_eq!(txn.quantity, -2);
        assert_eq!(txn.resulting_quantity, 8);
        assert_eq!(txn.location, "Main Warehouse");
        assert_eq!(txn.reason, "Damaged goods");
        assert_eq!(it.quantity(), 8);
        assert_eq!(it.version(), 2);
    }

    #[test]
    fn transfer_records_source_location() {
        let mut it = item(0, 3);
        let mut d = draft(TransactionKind::Transfer, 5);
        d.location = Some("Service Bay".to_string());
        d.source_location = Some("Main Warehouse".to_string());

        let txn = it.record_transaction(d, 1, Utc::now()).unwrap();
        assert_eq!(txn.location, "Service Bay");
        assert_eq!(txn.source_location.as_deref(), Some("Main Warehouse"));
        assert_eq!(it.quantity(), 5);
    }

    #[test]
    fn blank_user_is_rejected() {
        let mut it = item(10, 2);
        let err = it
            .record_transaction(TransactionDraft::new(TransactionKind::StockIn, 1, " "), 1, Utc::now())
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
        assert_eq!(it.quantity(), 10);
    }

    #[test]
    fn kind_parses_from_wire_names() {
        assert_eq!("stock-out".parse::<TransactionKind>().unwrap(), TransactionKind::StockOut);
        assert!("restock".parse::<TransactionKind>().is_err());
        assert_eq!(
            serde_json::to_value(TransactionKind::StockIn).unwrap(),
            serde_json::json!("stock-in")
        );
    }

    #[test]
    fn filter_matches_kind_and_search() {
        let mut it = item(10, 2);
        let txn = it
            .record_transaction(
                draft(TransactionKind::StockIn, 20).with_reason("Purchase Order #PO-001"),
                1,
                Utc::now(),
            )
            .unwrap();

        let by_kind = TransactionFilter {
            kind: Some(TransactionKind::StockIn),
            ..TransactionFilter::default()
        };
        assert!(by_kind.matches(&txn));

        let wrong_kind = TransactionFilter {
            kind: Some(TransactionKind::StockOut),
            ..TransactionFilter::default()
        };
        assert!(!wrong_kind.matches(&txn));

        let search = TransactionFilter {
            search: Some("po-001".to_string()),
            ..TransactionFilter::default()
        };
        assert!(search.matches(&txn));

        let future = TransactionFilter {
            from: Some(txn.timestamp + chrono::Duration::seconds(1)),
            ..TransactionFilter::default()
        };
        assert!(!future.matches(&txn));
    }

    fn arb_movement() -> impl Strategy<Value = StockMovement> {
        (0usize..4, 1i64..40, any::<bool>()).prop_map(|(k, qty, negative)| {
            let kind = TransactionKind::ALL[k];
            let quantity = if kind == TransactionKind::Adjustment && negative {
                -qty
            } else {
                qty
            };
            StockMovement::new(kind, quantity)
        })
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            ..ProptestConfig::default()
        })]

        /// Property: quantity equals the initial quantity plus every applied
        /// delta, and never drops below zero.
        #[test]
        fn quantity_is_initial_plus_applied_deltas(
            initial in 0i64..50,
            movements in prop::collection::vec(arb_movement(), 0..40)
        ) {
            let mut it = item(initial, 0);
            let mut applied = 0i64;

            for (seq, m) in movements.into_iter().enumerate() {
                let before = it.quantity();
                match it.record_transaction(draft(m.kind, m.quantity), seq as u64 + 1, Utc::now()) {
                    Ok(txn) => applied += txn.quantity,
                    Err(DomainError::NegativeStock { .. }) => prop_assert_eq!(it.quantity(), before),
                    Err(other) => return Err(TestCaseError::fail(format!("unexpected error {other:?}"))),
                }
                prop_assert!(it.quantity() >= 0);
            }

            prop_assert_eq!(it.quantity(), initial + applied);
        }
    }
}
