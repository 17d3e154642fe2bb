use std::sync::Arc;

use axum::{
    Json,
    extract::{Extension, Query},
    http::StatusCode,
    response::IntoResponse,
};

use crate::app::services::AppServices;
use crate::app::{dto, errors};

const DEFAULT_RECENT: usize = 5;

pub async fn get_dashboard(
    Extension(services): Extension<Arc<AppServices>>,
    Query(query): Query<dto::LimitQuery>,
) -> axum::response::Response {
    let recent = query.limit.unwrap_or(DEFAULT_RECENT);
    match services.dashboard.summary(recent) {
        Ok(summary) => {
            let body = dto::dashboard_to_json(&summary, services.clock.today());
            (StatusCode::OK, Json(body)).into_response()
        }
        Err(e) => errors::service_error_to_response(e),
    }
}
