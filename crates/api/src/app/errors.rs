use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;
use tracing::error;

use stockflow_core::DomainError;
use stockflow_infra::ServiceError;

pub fn service_error_to_response(err: ServiceError) -> axum::response::Response {
    match err {
        ServiceError::Domain(e) => domain_error_to_response(e),
        ServiceError::Duplicate(msg) => json_error(StatusCode::CONFLICT, "duplicate", msg),
        ServiceError::Store(msg) => {
            error!(error = %msg, "store failure");
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "store_error", msg)
        }
    }
}

pub fn domain_error_to_response(err: DomainError) -> axum::response::Response {
    let status = match &err {
        DomainError::Validation(_) | DomainError::InvalidId(_) => StatusCode::BAD_REQUEST,
        DomainError::NotFound(_) => StatusCode::NOT_FOUND,
        DomainError::NegativeStock { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        DomainError::InvalidState(_) | DomainError::Conflict(_) => StatusCode::CONFLICT,
    };
    json_error(status, err.code(), err.to_string())
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}

/// Parse a path or body value, mapping failures to a 400 response.
pub fn parse<T>(raw: &str) -> Result<T, axum::response::Response>
where
    T: core::str::FromStr<Err = DomainError>,
{
    raw.trim().parse::<T>().map_err(domain_error_to_response)
}

#[cfg(test)]
mod tests {
    use super::*;
    use stockflow_core::ItemId;

    #[test]
    fn statuses_follow_error_kind() {
        let cases = [
            (DomainError::validation("x"), StatusCode::BAD_REQUEST),
            (DomainError::invalid_id("x"), StatusCode::BAD_REQUEST),
            (DomainError::not_found("x"), StatusCode::NOT_FOUND),
            (DomainError::negative_stock(6, 5), StatusCode::UNPROCESSABLE_ENTITY),
            (DomainError::invalid_state("x"), StatusCode::CONFLICT),
            (DomainError::conflict("x"), StatusCode::CONFLICT),
        ];
        for (err, status) in cases {
            assert_eq!(domain_error_to_response(err).status(), status);
        }

        assert_eq!(
            service_error_to_response(ServiceError::Duplicate("sku".into())).status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            service_error_to_response(ServiceError::Store("boom".into())).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn parse_rejects_malformed_ids() {
        let res = parse::<ItemId>("nope").unwrap_err();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        assert!(parse::<ItemId>(&ItemId::new().to_string()).is_ok());
    }
}
