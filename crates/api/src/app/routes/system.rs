use std::sync::Arc;

use axum::{
    Json,
    extract::{Extension, Query},
    http::StatusCode,
    response::IntoResponse,
};
use serde_json::json;

use crate::app::dto;
use crate::app::services::AppServices;

pub async fn health() -> StatusCode {
    StatusCode::OK
}

/// Recent domain events across items, orders and assets, newest first.
pub async fn activity(
    Extension(services): Extension<Arc<AppServices>>,
    Query(query): Query<dto::LimitQuery>,
) -> axum::response::Response {
    let limit = query.limit.unwrap_or(services.activity.capacity());
    let events: Vec<_> = services
        .activity
        .recent(limit)
        .iter()
        .map(dto::envelope_to_json)
        .collect();
    (StatusCode::OK, Json(json!(events))).into_response()
}
