use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post, put},
};
use serde_json::json;

use stockflow_core::PurchaseOrderId;
use stockflow_purchasing::{NewPurchaseOrder, PurchaseOrderPatch, PurchaseOrderStatus};

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_orders).post(create_order))
        .route("/status/:status", get(list_orders_by_status))
        .route("/:id", get(get_order).put(update_order).delete(delete_order))
        .route("/:id/status", put(change_status))
        .route("/:id/receive", post(receive_goods))
}

pub async fn create_order(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<NewPurchaseOrder>,
) -> axum::response::Response {
    match services.purchasing.create(body) {
        Ok(order) => (StatusCode::CREATED, Json(dto::purchase_order_to_json(&order))).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn list_orders(Extension(services): Extension<Arc<AppServices>>) -> axum::response::Response {
    respond_with_orders(&services, None)
}

pub async fn list_orders_by_status(
    Extension(services): Extension<Arc<AppServices>>,
    Path(status): Path<String>,
) -> axum::response::Response {
    let status: PurchaseOrderStatus = match errors::parse(&status) {
        Ok(v) => v,
        Err(res) => return res,
    };
    respond_with_orders(&services, Some(status))
}

fn respond_with_orders(
    services: &AppServices,
    status: Option<PurchaseOrderStatus>,
) -> axum::response::Response {
    match services.purchasing.list(status) {
        Ok(orders) => {
            let orders: Vec<_> = orders.iter().map(dto::purchase_order_to_json).collect();
            (StatusCode::OK, Json(json!(orders))).into_response()
        }
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn get_order(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: PurchaseOrderId = match errors::parse(&id) {
        Ok(v) => v,
        Err(res) => return res,
    };

    match services.purchasing.get(id) {
        Ok(order) => (StatusCode::OK, Json(dto::purchase_order_to_json(&order))).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn update_order(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    Json(body): Json<PurchaseOrderPatch>,
) -> axum::response::Response {
    let id: PurchaseOrderId = match errors::parse(&id) {
        Ok(v) => v,
        Err(res) => return res,
    };

    match services.purchasing.update_details(id, body) {
        Ok(order) => (StatusCode::OK, Json(dto::purchase_order_to_json(&order))).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

/// Only drafts can be deleted.
pub async fn delete_order(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: PurchaseOrderId = match errors::parse(&id) {
        Ok(v) => v,
        Err(res) => return res,
    };

    match services.purchasing.delete(id) {
        Ok(_) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn change_status(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    Json(body): Json<dto::StatusChangeRequest>,
) -> axum::response::Response {
    let id: PurchaseOrderId = match errors::parse(&id) {
        Ok(v) => v,
        Err(res) => return res,
    };
    let target: PurchaseOrderStatus = match errors::parse(&body.status) {
        Ok(v) => v,
        Err(res) => return res,
    };

    match services.purchasing.transition(id, target) {
        Ok(order) => (StatusCode::OK, Json(dto::purchase_order_to_json(&order))).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn receive_goods(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    Json(body): Json<dto::ReceiveRequest>,
) -> axum::response::Response {
    let id: PurchaseOrderId = match errors::parse(&id) {
        Ok(v) => v,
        Err(res) => return res,
    };
    let lines = match body.parsed_lines() {
        Ok(v) => v,
        Err(res) => return res,
    };

    match services.purchasing.receive(id, &lines, &body.user) {
        Ok(receipt) => (
            StatusCode::OK,
            Json(json!({
                "order": dto::purchase_order_to_json(&receipt.order),
                "transactions": receipt
                    .transactions
                    .iter()
                    .map(dto::transaction_to_json)
                    .collect::<Vec<_>>(),
            })),
        )
            .into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}
