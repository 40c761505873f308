use std::sync::Arc;

use axum::{
    Json, Router,
    extract::Extension,
    response::{IntoResponse, Response},
    routing::get,
};

use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::context::PrincipalContext;

pub fn router() -> Router {
    Router::new().route("/metrics", get(dashboard_metrics))
}

pub async fn dashboard_metrics(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
) -> Response {
    let settings = match services.store.get_settings(principal.user_id()).await {
        Ok(s) => s,
        Err(e) => return errors::store_error_to_response(e),
    };

    match services.metrics.dashboard_metrics().await {
        Ok(metrics) => Json(dto::DashboardView::new(metrics, &settings)).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}
