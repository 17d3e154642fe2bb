//! HTTP surface for StockFlow: items, the stock ledger, purchase orders,
//! maintained assets and the dashboard.

pub mod app;
pub mod config;
