//! CSV export of the item catalog and the stock ledger.

use thiserror::Error;

use stockflow_inventory::{Item, Transaction};

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("csv write failed: {0}")]
    Csv(#[from] csv::Error),

    #[error("csv flush failed: {0}")]
    Flush(String),

    #[error("csv output is not utf-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

pub const ITEM_HEADERS: [&str; 10] = [
    "sku",
    "name",
    "category",
    "quantity",
    "min_stock",
    "max_stock",
    "location",
    "unit_cost",
    "retail_price",
    "status",
];

pub const TRANSACTION_HEADERS: [&str; 9] = [
    "reference",
    "timestamp",
    "kind",
    "sku",
    "item",
    "quantity",
    "location",
    "reason",
    "user",
];

/// Render minor currency units as a decimal amount (`1250` → `12.50`).
pub fn format_money(minor_units: u64) -> String {
    format!("{}.{:02}", minor_units / 100, minor_units % 100)
}

pub fn items_csv(items: &[Item]) -> Result<String, ExportError> {
    let mut wtr = csv::Writer::from_writer(Vec::new());
    wtr.write_record(ITEM_HEADERS)?;

    for item in items {
        wtr.write_record([
            item.sku().to_string(),
            item.name().to_string(),
            item.category().to_string(),
            item.quantity().to_string(),
            item.min_stock().to_string(),
            item.max_stock().to_string(),
            item.location().to_string(),
            format_money(item.unit_cost()),
            format_money(item.retail_price()),
            item.stock_level().as_str().to_string(),
        ])?;
    }

    finish(wtr)
}

pub fn transactions_csv(transactions: &[Transaction]) -> Result<String, ExportError> {
    let mut wtr = csv::Writer::from_writer(Vec::new());
    wtr.write_record(TRANSACTION_HEADERS)?;

    for txn in transactions {
        wtr.write_record([
            txn.reference.clone(),
            txn.timestamp.to_rfc3339(),
            txn.kind.as_str().to_string(),
            txn.sku.to_string(),
            txn.item_name.clone(),
            txn.quantity.to_string(),
            txn.location.clone(),
            txn.reason.clone(),
            txn.user.clone(),
        ])?;
    }

    finish(wtr)
}

fn finish(wtr: csv::Writer<Vec<u8>>) -> Result<String, ExportError> {
    let bytes = wtr
        .into_inner()
        .map_err(|e| ExportError::Flush(e.error().to_string()))?;
    Ok(String::from_utf8(bytes)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use stockflow_core::ItemId;
    use stockflow_inventory::{NewItem, TransactionDraft, TransactionKind};

    fn drill() -> Item {
        Item::create(
            ItemId::new(),
            NewItem {
                sku: "dw-100".to_string(),
                name: "Drill, cordless".to_string(),
                description: None,
                category: "Tools".to_string(),
                unit: "pcs".to_string(),
                barcode: None,
                quantity: 4,
                min_stock: 5,
                max_stock: 50,
                location: "A-1".to_string(),
                unit_cost: 1_250,
                retail_price: 2_999,
                supplier: None,
            },
            Utc::now(),
        )
        .unwrap()
    }

    #[test]
    fn item_rows_follow_header_order_and_quote_commas() {
        let out = items_csv(&[drill()]).unwrap();
        let mut lines = out.lines();

        assert_eq!(
            lines.next().unwrap(),
            "sku,name,category,quantity,min_stock,max_stock,location,unit_cost,retail_price,status"
        );
        assert_eq!(
            lines.next().unwrap(),
            "DW-100,\"Drill, cordless\",Tools,4,5,50,A-1,12.50,29.99,low-stock"
        );
        assert!(lines.next().is_none());
    }

    #[test]
    fn transaction_rows_carry_signed_quantities() {
        let mut item = drill();
        let txn = item
            .record_transaction(
                TransactionDraft::new(TransactionKind::StockOut, 3, "sam").with_reason("job 42"),
                1,
                Utc::now(),
            )
            .unwrap();

        let out = transactions_csv(&[txn]).unwrap();
        let row = out.lines().nth(1).unwrap();
        let fields: Vec<&str> = row.split(',').collect();

        assert_eq!(fields[0], "OUT-000001");
        assert_eq!(fields[2], "stock-out");
        assert_eq!(fields[5], "-3");
        assert_eq!(fields[7], "job 42");
        assert_eq!(fields[8], "sam");
    }

    #[test]
    fn money_is_rendered_with_two_decimals() {
        assert_eq!(format_money(0), "0.00");
        assert_eq!(format_money(5), "0.05");
        assert_eq!(format_money(123_456), "1234.56");
    }
}
