use axum::http::{StatusCode, header};
use axum::response::IntoResponse;
use axum::{Router, routing::get};

pub mod assets;
pub mod dashboard;
pub mod items;
pub mod purchase_orders;
pub mod system;
pub mod transactions;

/// Router for all resource endpoints.
pub fn router() -> Router {
    Router::new()
        .route("/dashboard", get(dashboard::get_dashboard))
        .route("/activity", get(system::activity))
        .nest("/items", items::router())
        .nest("/transactions", transactions::router())
        .nest("/purchase-orders", purchase_orders::router())
        .nest("/assets", assets::router())
}

/// CSV download response.
pub(crate) fn csv_response(filename: &str, body: String) -> axum::response::Response {
    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        body,
    )
        .into_response()
}
