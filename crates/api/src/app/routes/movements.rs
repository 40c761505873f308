use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Query, rejection::QueryRejection},
    response::{IntoResponse, Response},
    routing::get,
};

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new().route("/", get(list_movements))
}

/// Newest first, optionally scoped to one product.
pub async fn list_movements(
    Extension(services): Extension<Arc<AppServices>>,
    params: Result<Query<dto::MovementListParams>, QueryRejection>,
) -> Response {
    let Query(params) = match params {
        Ok(p) => p,
        Err(rej) => return errors::query_rejection(rej),
    };
    let query = match params.into_query() {
        Ok(q) => q,
        Err(e) => return errors::domain_error_to_response(e),
    };

    match services.metrics.list_movements(query).await {
        Ok(entries) => Json(entries).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}
