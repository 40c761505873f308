use core::str::FromStr;

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use stockyard_auth::AuthzError;
use stockyard_core::DomainError;
use stockyard_infra::StoreError;

pub fn json_error(status: StatusCode, code: &'static str, message: impl Into<String>) -> Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}

fn json_field_error(
    status: StatusCode,
    code: &'static str,
    field: &'static str,
    message: impl Into<String>,
) -> Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
            "field": field,
        })),
    )
        .into_response()
}

pub fn domain_error_to_response(err: DomainError) -> Response {
    let message = err.to_string();
    match err {
        DomainError::Validation { field, .. } => {
            json_field_error(StatusCode::BAD_REQUEST, "validation_error", field, message)
        }
        DomainError::InvalidQuantity(_) => {
            json_field_error(StatusCode::BAD_REQUEST, "invalid_quantity", "quantity", message)
        }
        DomainError::InvalidId(_) => json_error(StatusCode::BAD_REQUEST, "invalid_id", message),
        DomainError::NotFound { .. } => json_error(StatusCode::NOT_FOUND, "not_found", message),
        DomainError::Conflict(_) => json_error(StatusCode::CONFLICT, "conflict", message),
        DomainError::InsufficientStock { .. } => {
            json_error(StatusCode::UNPROCESSABLE_ENTITY, "insufficient_stock", message)
        }
    }
}

pub fn store_error_to_response(err: StoreError) -> Response {
    match err {
        StoreError::Domain(e) => domain_error_to_response(e),
        StoreError::StorageUnavailable(detail) => {
            tracing::error!(error = %detail, "storage failure");
            json_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "storage_unavailable",
                "storage is temporarily unavailable",
            )
        }
    }
}

pub fn forbidden(err: AuthzError) -> Response {
    json_error(StatusCode::FORBIDDEN, "forbidden", err.to_string())
}

pub fn json_rejection(rejection: JsonRejection) -> Response {
    json_error(StatusCode::BAD_REQUEST, "invalid_body", rejection.body_text())
}

pub fn query_rejection(rejection: QueryRejection) -> Response {
    json_error(StatusCode::BAD_REQUEST, "invalid_query", rejection.body_text())
}

/// Parse a path/query identifier, answering 400 on failure.
pub fn parse_id<T>(raw: &str) -> Result<T, Response>
where
    T: FromStr<Err = DomainError>,
{
    raw.trim().parse::<T>().map_err(domain_error_to_response)
}

#[cfg(test)]
mod tests {
    use super::*;
    use stockyard_core::ProductId;

    #[test]
    fn domain_errors_map_to_statuses() {
        let cases = [
            (DomainError::validation("name", "cannot be empty"), StatusCode::BAD_REQUEST),
            (DomainError::InvalidQuantity(0), StatusCode::BAD_REQUEST),
            (DomainError::not_found("product", "x"), StatusCode::NOT_FOUND),
            (DomainError::conflict("dup"), StatusCode::CONFLICT),
            (
                DomainError::InsufficientStock {
                    available: 1,
                    requested: 2,
                },
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(domain_error_to_response(err).status(), status);
        }
    }

    #[test]
    fn storage_failures_are_500() {
        let res = store_error_to_response(StoreError::StorageUnavailable("pool timed out".into()));
        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn bad_ids_are_400() {
        let res = parse_id::<ProductId>("not-a-uuid").unwrap_err();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        assert!(parse_id::<ProductId>(&ProductId::new().to_string()).is_ok());
    }
}
