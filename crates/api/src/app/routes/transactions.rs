use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use serde_json::json;

use stockflow_core::TransactionId;
use stockflow_infra::export;
use stockflow_inventory::{TransactionFilter, TransactionKind};

use crate::app::routes::csv_response;
use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_transactions).post(record_transaction))
        .route("/type/:kind", get(list_by_kind))
        .route("/export", get(export_transactions))
        .route("/:id", get(get_transaction))
}

pub async fn record_transaction(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::RecordTransactionRequest>,
) -> axum::response::Response {
    let (item_id, draft) = match body.into_draft() {
        Ok(v) => v,
        Err(res) => return res,
    };

    match services.inventory.record_transaction(item_id, draft) {
        Ok(txn) => (StatusCode::CREATED, Json(dto::transaction_to_json(&txn))).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

/// Ledger entries, newest first.
pub async fn list_transactions(
    Extension(services): Extension<Arc<AppServices>>,
    Query(query): Query<dto::TransactionListQuery>,
) -> axum::response::Response {
    let filter = match query.into_filter() {
        Ok(f) => f,
        Err(res) => return res,
    };
    respond_with_transactions(&services, &filter)
}

pub async fn list_by_kind(
    Extension(services): Extension<Arc<AppServices>>,
    Path(kind): Path<String>,
) -> axum::response::Response {
    let kind: TransactionKind = match errors::parse(&kind) {
        Ok(v) => v,
        Err(res) => return res,
    };
    let filter = TransactionFilter {
        kind: Some(kind),
        ..TransactionFilter::default()
    };
    respond_with_transactions(&services, &filter)
}

fn respond_with_transactions(services: &AppServices, filter: &TransactionFilter) -> axum::response::Response {
    match services.inventory.transactions(filter) {
        Ok(txns) => {
            let txns: Vec<_> = txns.iter().map(dto::transaction_to_json).collect();
            (StatusCode::OK, Json(json!(txns))).into_response()
        }
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn export_transactions(
    Extension(services): Extension<Arc<AppServices>>,
    Query(query): Query<dto::TransactionListQuery>,
) -> axum::response::Response {
    let filter = match query.into_filter() {
        Ok(f) => f,
        Err(res) => return res,
    };

    let txns = match services.inventory.transactions(&filter) {
        Ok(txns) => txns,
        Err(e) => return errors::service_error_to_response(e),
    };

    match export::transactions_csv(&txns) {
        Ok(body) => csv_response("transactions.csv", body),
        Err(e) => errors::service_error_to_response(e.into()),
    }
}

pub async fn get_transaction(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: TransactionId = match errors::parse(&id) {
        Ok(v) => v,
        Err(res) => return res,
    };

    match services.inventory.transaction(id) {
        Ok(txn) => (StatusCode::OK, Json(dto::transaction_to_json(&txn))).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}
