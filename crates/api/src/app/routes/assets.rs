use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use serde_json::json;

use stockflow_core::AssetId;
use stockflow_maintenance::{Asset, NewAsset, compute_status};

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_assets).post(register_asset))
        .route("/upcoming", get(upcoming_maintenance))
        .route("/:id", get(get_asset))
        .route("/:id/maintenance", get(maintenance_history).post(log_maintenance))
}

fn render(services: &AppServices, asset: &Asset) -> serde_json::Value {
    let today = services.clock.today();
    let schedule = compute_status(asset, today, services.maintenance.policy());
    dto::asset_to_json(asset, &schedule, today)
}

pub async fn register_asset(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<NewAsset>,
) -> axum::response::Response {
    match services.maintenance.register(body) {
        Ok(asset) => (StatusCode::CREATED, Json(render(&services, &asset))).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn list_assets(Extension(services): Extension<Arc<AppServices>>) -> axum::response::Response {
    match services.maintenance.list() {
        Ok(assets) => {
            let assets: Vec<_> = assets.iter().map(|a| render(&services, a)).collect();
            (StatusCode::OK, Json(json!(assets))).into_response()
        }
        Err(e) => errors::service_error_to_response(e),
    }
}

/// Due and overdue assets, most urgent first.
pub async fn upcoming_maintenance(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    let today = services.clock.today();
    match services.maintenance.upcoming() {
        Ok(entries) => {
            let entries: Vec<_> = entries
                .iter()
                .map(|entry| dto::upcoming_to_json(entry, today))
                .collect();
            (StatusCode::OK, Json(json!(entries))).into_response()
        }
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn get_asset(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: AssetId = match errors::parse(&id) {
        Ok(v) => v,
        Err(res) => return res,
    };

    match services.maintenance.get(id) {
        Ok(asset) => (StatusCode::OK, Json(render(&services, &asset))).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn maintenance_history(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: AssetId = match errors::parse(&id) {
        Ok(v) => v,
        Err(res) => return res,
    };

    match services.maintenance.history(id) {
        Ok(logs) => {
            let logs: Vec<_> = logs.iter().map(dto::maintenance_log_to_json).collect();
            (StatusCode::OK, Json(json!(logs))).into_response()
        }
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn log_maintenance(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    Json(body): Json<dto::LogMaintenanceRequest>,
) -> axum::response::Response {
    let id: AssetId = match errors::parse(&id) {
        Ok(v) => v,
        Err(res) => return res,
    };
    let (input, performed_on) = body.into_parts();

    match services.maintenance.log_maintenance(id, input, performed_on) {
        Ok((asset, log)) => (
            StatusCode::CREATED,
            Json(json!({
                "asset": render(&services, &asset),
                "log": dto::maintenance_log_to_json(&log),
            })),
        )
            .into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}
