use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use serde_json::json;

use stockflow_core::ItemId;
use stockflow_infra::export;
use stockflow_inventory::{ItemPatch, NewItem};

use crate::app::routes::csv_response;
use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_items).post(create_item))
        .route("/search", get(search_items))
        .route("/low-stock", get(low_stock))
        .route("/lookup/:code", get(lookup_item))
        .route("/export", get(export_items))
        .route("/:id", get(get_item).put(update_item).delete(delete_item))
}

pub async fn create_item(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<NewItem>,
) -> axum::response::Response {
    match services.inventory.create_item(body) {
        Ok(item) => (StatusCode::CREATED, Json(dto::item_to_json(&item))).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn list_items(
    Extension(services): Extension<Arc<AppServices>>,
    Query(query): Query<dto::ItemListQuery>,
) -> axum::response::Response {
    let query = match query.into_query() {
        Ok(q) => q,
        Err(res) => return res,
    };

    match services.inventory.list_items(&query) {
        Ok(items) => {
            let items: Vec<_> = items.iter().map(dto::item_to_json).collect();
            (StatusCode::OK, Json(json!(items))).into_response()
        }
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn search_items(
    Extension(services): Extension<Arc<AppServices>>,
    Query(query): Query<dto::SearchQuery>,
) -> axum::response::Response {
    let q = query.q.unwrap_or_default();
    match services.inventory.search(&q) {
        Ok(items) => {
            let items: Vec<_> = items.iter().map(dto::item_to_json).collect();
            (StatusCode::OK, Json(json!(items))).into_response()
        }
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn low_stock(Extension(services): Extension<Arc<AppServices>>) -> axum::response::Response {
    match services.inventory.low_stock() {
        Ok(items) => {
            let items: Vec<_> = items.iter().map(dto::item_to_json).collect();
            (StatusCode::OK, Json(json!(items))).into_response()
        }
        Err(e) => errors::service_error_to_response(e),
    }
}

/// Barcode scanner entry point: matches barcode or SKU.
pub async fn lookup_item(
    Extension(services): Extension<Arc<AppServices>>,
    Path(code): Path<String>,
) -> axum::response::Response {
    match services.inventory.lookup(&code) {
        Ok(item) => (StatusCode::OK, Json(dto::item_to_json(&item))).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn export_items(
    Extension(services): Extension<Arc<AppServices>>,
    Query(query): Query<dto::ItemListQuery>,
) -> axum::response::Response {
    let query = match query.into_query() {
        Ok(q) => q,
        Err(res) => return res,
    };

    let items = match services.inventory.list_items(&query) {
        Ok(items) => items,
        Err(e) => return errors::service_error_to_response(e),
    };

    match export::items_csv(&items) {
        Ok(body) => csv_response("inventory.csv", body),
        Err(e) => errors::service_error_to_response(e.into()),
    }
}

pub async fn get_item(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: ItemId = match errors::parse(&id) {
        Ok(v) => v,
        Err(res) => return res,
    };

    match services.inventory.get_item(id) {
        Ok(item) => (StatusCode::OK, Json(dto::item_to_json(&item))).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn update_item(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    Json(body): Json<ItemPatch>,
) -> axum::response::Response {
    let id: ItemId = match errors::parse(&id) {
        Ok(v) => v,
        Err(res) => return res,
    };

    match services.inventory.update_item(id, body) {
        Ok(item) => (StatusCode::OK, Json(dto::item_to_json(&item))).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn delete_item(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: ItemId = match errors::parse(&id) {
        Ok(v) => v,
        Err(res) => return res,
    };

    match services.inventory.delete_item(id) {
        Ok(_) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}
