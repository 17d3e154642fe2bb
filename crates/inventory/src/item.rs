use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stockflow_core::error::require_text;
use stockflow_core::{AggregateRoot, DomainError, DomainResult, ItemId, ValueObject};

/// Stock-keeping unit: trimmed, upper-cased, no inner whitespace.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Sku(String);

impl Sku {
    pub fn parse(raw: &str) -> DomainResult<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(DomainError::validation("sku cannot be empty"));
        }
        if trimmed.chars().any(char::is_whitespace) {
            return Err(DomainError::validation("sku cannot contain whitespace"));
        }
        Ok(Self(trimmed.to_uppercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl ValueObject for Sku {}

impl core::fmt::Display for Sku {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Stock level relative to the item's reorder threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StockLevel {
    InStock,
    LowStock,
    OutOfStock,
}

impl StockLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            StockLevel::InStock => "in-stock",
            StockLevel::LowStock => "low-stock",
            StockLevel::OutOfStock => "out-of-stock",
        }
    }
}

impl core::str::FromStr for StockLevel {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "in-stock" => Ok(StockLevel::InStock),
            "low-stock" => Ok(StockLevel::LowStock),
            "out-of-stock" => Ok(StockLevel::OutOfStock),
            other => Err(DomainError::validation(format!(
                "unknown stock level '{other}' (expected in-stock, low-stock or out-of-stock)"
            ))),
        }
    }
}

/// Input for [`Item::create`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewItem {
    pub sku: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub unit: String,
    #[serde(default)]
    pub barcode: Option<String>,
    #[serde(default)]
    pub quantity: i64,
    #[serde(default)]
    pub min_stock: i64,
    pub max_stock: i64,
    pub location: String,
    /// Price in smallest currency unit (e.g. cents).
    #[serde(default)]
    pub unit_cost: u64,
    #[serde(default)]
    pub retail_price: u64,
    #[serde(default)]
    pub supplier: Option<String>,
}

/// Partial update for [`Item::update`]. Quantity is deliberately absent:
/// stock only changes through the ledger.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemPatch {
    pub sku: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub unit: Option<String>,
    pub barcode: Option<String>,
    pub min_stock: Option<i64>,
    pub max_stock: Option<i64>,
    pub location: Option<String>,
    pub unit_cost: Option<u64>,
    pub retail_price: Option<u64>,
    pub supplier: Option<String>,
}

/// Aggregate root: Item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Item {
    id: ItemId,
    sku: Sku,
    name: String,
    description: Option<String>,
    category: String,
    unit: String,
    barcode: Option<String>,
    quantity: i64,
    min_stock: i64,
    max_stock: i64,
    location: String,
    unit_cost: u64,
    retail_price: u64,
    supplier: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    version: u64,
}

impl Item {
    pub fn create(id: ItemId, input: NewItem, now: DateTime<Utc>) -> DomainResult<Self> {
        let sku = Sku::parse(&input.sku)?;
        require_text("name", &input.name)?;
        require_text("location", &input.location)?;
        if input.quantity < 0 {
            return Err(DomainError::validation("quantity cannot be negative"));
        }
        validate_thresholds(input.min_stock, input.max_stock)?;

        Ok(Self {
            id,
            sku,
            name: input.name.trim().to_string(),
            description: non_blank(input.description),
            category: input.category.trim().to_string(),
            unit: input.unit.trim().to_string(),
            barcode: non_blank(input.barcode),
            quantity: input.quantity,
            min_stock: input.min_stock,
            max_stock: input.max_stock,
            location: input.location.trim().to_string(),
            unit_cost: input.unit_cost,
            retail_price: input.retail_price,
            supplier: non_blank(input.supplier),
            created_at: now,
            updated_at: now,
            version: 1,
        })
    }

    /// Apply a partial update. The item is left untouched on error.
    pub fn update(&self, patch: ItemPatch, now: DateTime<Utc>) -> DomainResult<Self> {
        let mut next = self.clone();

        if let Some(sku) = patch.sku {
            next.sku = Sku::parse(&sku)?;
        }
        if let Some(name) = patch.name {
            require_text("name", &name)?;
            next.name = name.trim().to_string();
        }
        if let Some(location) = patch.location {
            require_text("location", &location)?;
            next.location = location.trim().to_string();
        }
        if patch.description.is_some() {
            next.description = non_blank(patch.description);
        }
        if let Some(category) = patch.category {
            next.category = category.trim().to_string();
        }
        if let Some(unit) = patch.unit {
            next.unit = unit.trim().to_string();
        }
        if patch.barcode.is_some() {
            next.barcode = non_blank(patch.barcode);
        }
        if patch.supplier.is_some() {
            next.supplier = non_blank(patch.supplier);
        }
        if let Some(min) = patch.min_stock {
            next.min_stock = min;
        }
        if let Some(max) = patch.max_stock {
            next.max_stock = max;
        }
        if let Some(cost) = patch.unit_cost {
            next.unit_cost = cost;
        }
        if let Some(price) = patch.retail_price {
            next.retail_price = price;
        }
        validate_thresholds(next.min_stock, next.max_stock)?;

        next.updated_at = now;
        next.version += 1;
        Ok(next)
    }

    pub fn id_typed(&self) -> ItemId {
        self.id
    }

    pub fn sku(&self) -> &Sku {
        &self.sku
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn unit(&self) -> &str {
        &self.unit
    }

    pub fn barcode(&self) -> Option<&str> {
        self.barcode.as_deref()
    }

    pub fn quantity(&self) -> i64 {
        self.quantity
    }

    pub fn min_stock(&self) -> i64 {
        self.min_stock
    }

    pub fn max_stock(&self) -> i64 {
        self.max_stock
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    pub fn unit_cost(&self) -> u64 {
        self.unit_cost
    }

    pub fn retail_price(&self) -> u64 {
        self.retail_price
    }

    pub fn supplier(&self) -> Option<&str> {
        self.supplier.as_deref()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn stock_level(&self) -> StockLevel {
        if self.quantity == 0 {
            StockLevel::OutOfStock
        } else if self.quantity <= self.min_stock {
            StockLevel::LowStock
        } else {
            StockLevel::InStock
        }
    }

    /// Low or out of stock.
    pub fn needs_reorder(&self) -> bool {
        self.stock_level() != StockLevel::InStock
    }

    /// Quantity valued at unit cost (smallest currency unit).
    pub fn stock_value(&self) -> u64 {
        (self.quantity.max(0) as u64).saturating_mul(self.unit_cost)
    }

    /// Case-insensitive substring match on name or SKU.
    pub fn matches_search(&self, query: &str) -> bool {
        let q = query.trim().to_lowercase();
        if q.is_empty() {
            return true;
        }
        self.name.to_lowercase().contains(&q) || self.sku.as_str().to_lowercase().contains(&q)
    }

    /// Scanner lookup: exact barcode or SKU (case-insensitive for SKU).
    pub fn matches_code(&self, code: &str) -> bool {
        let code = code.trim();
        self.barcode.as_deref() == Some(code) || self.sku.as_str().eq_ignore_ascii_case(code)
    }

    pub(crate) fn set_quantity(&mut self, quantity: i64, now: DateTime<Utc>) {
        self.quantity = quantity;
        self.updated_at = now;
        self.version += 1;
    }
}

impl AggregateRoot for Item {
    type Id = ItemId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

fn validate_thresholds(min_stock: i64, max_stock: i64) -> DomainResult<()> {
    if min_stock < 0 {
        return Err(DomainError::validation("min_stock cannot be negative"));
    }
    if max_stock < min_stock {
        return Err(DomainError::validation(
            "max_stock must be greater than or equal to min_stock",
        ));
    }
    Ok(())
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
