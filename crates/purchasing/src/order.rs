use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use stockflow_core::error::require_text;
use stockflow_core::{
    AggregateRoot, DomainError, DomainResult, Entity, LineId, PurchaseOrderId, ValueObject,
};
use stockflow_inventory::Sku;

/// Purchase order status lifecycle.
///
/// Moves forward only: draft → sent → {partial, received} → closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PurchaseOrderStatus {
    Draft,
    Sent,
    Partial,
    Received,
    Closed,
}

impl PurchaseOrderStatus {
    pub const ALL: [PurchaseOrderStatus; 5] = [
        PurchaseOrderStatus::Draft,
        PurchaseOrderStatus::Sent,
        PurchaseOrderStatus::Partial,
        PurchaseOrderStatus::Received,
        PurchaseOrderStatus::Closed,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            PurchaseOrderStatus::Draft => "draft",
            PurchaseOrderStatus::Sent => "sent",
            PurchaseOrderStatus::Partial => "partial",
            PurchaseOrderStatus::Received => "received",
            PurchaseOrderStatus::Closed => "closed",
        }
    }

    /// Only orders awaiting goods may receive stock.
    pub fn can_receive(self) -> bool {
        matches!(self, PurchaseOrderStatus::Sent | PurchaseOrderStatus::Partial)
    }
}

impl core::fmt::Display for PurchaseOrderStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl core::str::FromStr for PurchaseOrderStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PurchaseOrderStatus::ALL
            .into_iter()
            .find(|st| st.as_str() == s)
            .ok_or_else(|| {
                DomainError::validation(format!(
                    "unknown purchase order status '{s}' (expected draft, sent, partial, received or closed)"
                ))
            })
    }
}

/// Human-facing order number (`PO-001`), unique and sequential per store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PoNumber(String);

impl PoNumber {
    pub fn sequential(n: u64) -> Self {
        Self(format!("PO-{n:03}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl ValueObject for PoNumber {}

impl core::fmt::Display for PoNumber {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Requested line for a new order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewLine {
    pub item_name: String,
    pub sku: String,
    pub quantity: i64,
    /// Smallest currency unit.
    pub unit_price: u64,
}

/// Input for [`PurchaseOrder::create`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewPurchaseOrder {
    pub supplier: String,
    /// Defaults to the creation date.
    #[serde(default)]
    pub order_date: Option<NaiveDate>,
    pub expected_date: NaiveDate,
    #[serde(default)]
    pub currency: Option<String>,
    pub lines: Vec<NewLine>,
}

/// Header changes allowed while the order is still a draft.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseOrderPatch {
    pub supplier: Option<String>,
    pub expected_date: Option<NaiveDate>,
}

/// Purchase order line, owned by its order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PurchaseOrderLine {
    id: LineId,
    item_name: String,
    sku: Sku,
    quantity: i64,
    unit_price: u64,
    received_quantity: i64,
}

impl PurchaseOrderLine {
    fn from_request(line: NewLine) -> DomainResult<Self> {
        require_text("line item_name", &line.item_name)?;
        let sku = Sku::parse(&line.sku)?;
        if line.quantity <= 0 {
            return Err(DomainError::validation(format!(
                "line {sku}: quantity must be positive"
            )));
        }
        Ok(Self {
            id: LineId::new(),
            item_name: line.item_name.trim().to_string(),
            sku,
            quantity: line.quantity,
            unit_price: line.unit_price,
            received_quantity: 0,
        })
    }

    pub fn id_typed(&self) -> LineId {
        self.id
    }

    pub fn item_name(&self) -> &str {
        &self.item_name
    }

    pub fn sku(&self) -> &Sku {
        &self.sku
    }

    pub fn quantity(&self) -> i64 {
        self.quantity
    }

    pub fn unit_price(&self) -> u64 {
        self.unit_price
    }

    pub fn received_quantity(&self) -> i64 {
        self.received_quantity
    }

    pub fn remaining(&self) -> i64 {
        self.quantity - self.received_quantity
    }

    pub fn is_complete(&self) -> bool {
        self.received_quantity == self.quantity
    }

    pub fn line_total(&self) -> u64 {
        (self.quantity as u64).saturating_mul(self.unit_price)
    }

    /// Clamp an incoming amount into `[0, remaining]`.
    pub fn clamp_incoming(&self, requested: i64) -> i64 {
        requested.clamp(0, self.remaining())
    }
}

impl Entity for PurchaseOrderLine {
    type Id = LineId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// One line's share of a receipt, forwarded to the stock ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceivedLine {
    pub line_id: LineId,
    pub sku: Sku,
    pub item_name: String,
    pub quantity: i64,
}

/// Outcome of [`PurchaseOrder::receive`]: the next order snapshot plus the
/// amounts actually accepted (zero-amount lines omitted).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Receipt {
    pub order: PurchaseOrder,
    pub received: Vec<ReceivedLine>,
}

impl Receipt {
    pub fn total_units(&self) -> i64 {
        self.received.iter().map(|l| l.quantity).sum()
    }
}

/// Aggregate root: PurchaseOrder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PurchaseOrder {
    id: PurchaseOrderId,
    po_number: PoNumber,
    supplier: String,
    status: PurchaseOrderStatus,
    order_date: NaiveDate,
    expected_date: NaiveDate,
    currency: String,
    total_amount: u64,
    lines: Vec<PurchaseOrderLine>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    version: u64,
}

impl PurchaseOrder {
    pub fn create(
        id: PurchaseOrderId,
        po_number: PoNumber,
        input: NewPurchaseOrder,
        default_currency: &str,
        now: DateTime<Utc>,
    ) -> DomainResult<Self> {
        require_text("supplier", &input.supplier)?;
        if input.lines.is_empty() {
            return Err(DomainError::validation(
                "purchase order must have at least one line",
            ));
        }

        let order_date = input.order_date.unwrap_or_else(|| now.date_naive());
        if input.expected_date < order_date {
            return Err(DomainError::validation(
                "expected_date cannot be before order_date",
            ));
        }

        let lines = input
            .lines
            .into_iter()
            .map(PurchaseOrderLine::from_request)
            .collect::<DomainResult<Vec<_>>>()?;
        let total_amount = lines
            .iter()
            .fold(0u64, |acc, l| acc.saturating_add(l.line_total()));

        let currency = input
            .currency
            .map(|c| c.trim().to_uppercase())
            .filter(|c| !c.is_empty())
            .unwrap_or_else(|| default_currency.to_string());

        Ok(Self {
            id,
            po_number,
            supplier: input.supplier.trim().to_string(),
            status: PurchaseOrderStatus::Draft,
            order_date,
            expected_date: input.expected_date,
            currency,
            total_amount,
            lines,
            created_at: now,
            updated_at: now,
            version: 1,
        })
    }

    pub fn id_typed(&self) -> PurchaseOrderId {
        self.id
    }

    pub fn po_number(&self) -> &PoNumber {
        &self.po_number
    }

    pub fn supplier(&self) -> &str {
        &self.supplier
    }

    pub fn status(&self) -> PurchaseOrderStatus {
        self.status
    }

    pub fn order_date(&self) -> NaiveDate {
        self.order_date
    }

    pub fn expected_date(&self) -> NaiveDate {
        self.expected_date
    }

    pub fn currency(&self) -> &str {
        &self.currency
    }

    /// Fixed at creation; receiving does not change it.
    pub fn total_amount(&self) -> u64 {
        self.total_amount
    }

    pub fn lines(&self) -> &[PurchaseOrderLine] {
        &self.lines
    }

    pub fn line(&self, line_id: LineId) -> Option<&PurchaseOrderLine> {
        self.lines.iter().find(|l| l.id == line_id)
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn is_fully_received(&self) -> bool {
        self.lines.iter().all(PurchaseOrderLine::is_complete)
    }

    pub fn received_units(&self) -> i64 {
        self.lines.iter().map(|l| l.received_quantity).sum()
    }

    pub fn ordered_units(&self) -> i64 {
        self.lines.iter().map(|l| l.quantity).sum()
    }

    /// draft → sent.
    pub fn send(&self, now: DateTime<Utc>) -> DomainResult<Self> {
        if self.status != PurchaseOrderStatus::Draft {
            return Err(DomainError::invalid_state(format!(
                "only draft purchase orders can be sent (status is {})",
                self.status
            )));
        }
        Ok(self.with_status(PurchaseOrderStatus::Sent, now))
    }

    /// partial/received → closed.
    pub fn close(&self, now: DateTime<Utc>) -> DomainResult<Self> {
        match self.status {
            PurchaseOrderStatus::Partial | PurchaseOrderStatus::Received => {
                Ok(self.with_status(PurchaseOrderStatus::Closed, now))
            }
            other => Err(DomainError::invalid_state(format!(
                "cannot close a purchase order in status {other}"
            ))),
        }
    }

    /// Explicit status request. `partial` and `received` are reached only by
    /// receiving goods, never set directly.
    pub fn transition_to(&self, target: PurchaseOrderStatus, now: DateTime<Utc>) -> DomainResult<Self> {
        match target {
            PurchaseOrderStatus::Sent => self.send(now),
            PurchaseOrderStatus::Closed => self.close(now),
            PurchaseOrderStatus::Partial | PurchaseOrderStatus::Received => {
                Err(DomainError::invalid_state(format!(
                    "status {target} is derived from received quantities"
                )))
            }
            PurchaseOrderStatus::Draft => Err(DomainError::invalid_state(
                "purchase orders cannot move back to draft",
            )),
        }
    }

    pub fn update_details(&self, patch: PurchaseOrderPatch, now: DateTime<Utc>) -> DomainResult<Self> {
        self.ensure_draft("update")?;
        let mut next = self.clone();
        if let Some(supplier) = patch.supplier {
            require_text("supplier", &supplier)?;
            next.supplier = supplier.trim().to_string();
        }
        if let Some(expected) = patch.expected_date {
            if expected < next.order_date {
                return Err(DomainError::validation(
                    "expected_date cannot be before order_date",
                ));
            }
            next.expected_date = expected;
        }
        next.updated_at = now;
        next.version += 1;
        Ok(next)
    }

    pub fn ensure_draft(&self, action: &str) -> DomainResult<()> {
        if self.status != PurchaseOrderStatus::Draft {
            return Err(DomainError::invalid_state(format!(
                "cannot {action} purchase order {} in status {}",
                self.po_number, self.status
            )));
        }
        Ok(())
    }

    /// Reconcile incoming quantities against the ordered lines.
    ///
    /// Each amount is clamped into `[0, remaining]`. Status becomes
    /// `received` when every line is complete, `partial` when anything has
    /// been received, and is otherwise unchanged. Pure: `self` is untouched.
    pub fn receive(
        &self,
        received_by_line: &HashMap<LineId, i64>,
        now: DateTime<Utc>,
    ) -> DomainResult<Receipt> {
        if !self.status.can_receive() {
            return Err(DomainError::invalid_state(format!(
                "cannot receive goods for purchase order {} in status {}",
                self.po_number, self.status
            )));
        }

        if let Some(unknown) = received_by_line.keys().find(|id| self.line(**id).is_none()) {
            return Err(DomainError::validation(format!(
                "line {unknown} does not belong to purchase order {}",
                self.po_number
            )));
        }

        let mut next = self.clone();
        let mut received = Vec::new();

        for line in &mut next.lines {
            let requested = received_by_line.get(&line.id).copied().unwrap_or(0);
            let accepted = line.clamp_incoming(requested);
            if accepted == 0 {
                continue;
            }
            line.received_quantity += accepted;
            received.push(ReceivedLine {
                line_id: line.id,
                sku: line.sku.clone(),
                item_name: line.item_name.clone(),
                quantity: accepted,
            });
        }

        if received.is_empty() {
            return Ok(Receipt {
                order: self.clone(),
                received,
            });
        }

        next.status = if next.is_fully_received() {
            PurchaseOrderStatus::Received
        } else if next.lines.iter().any(|l| l.received_quantity > 0) {
            PurchaseOrderStatus::Partial
        } else {
            self.status
        };
        next.updated_at = now;
        next.version += 1;

        Ok(Receipt {
            order: next,
            received,
        })
    }

    fn with_status(&self, status: PurchaseOrderStatus, now: DateTime<Utc>) -> Self {
        let mut next = self.clone();
        next.status = status;
        next.updated_at = now;
        next.version += 1;
        next
    }
}

impl AggregateRoot for PurchaseOrder {
    type Id = PurchaseOrderId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}
