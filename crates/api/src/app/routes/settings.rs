use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, rejection::JsonRejection},
    response::{IntoResponse, Response},
    routing::get,
};

use stockyard_inventory::SettingsUpdate;

use crate::app::errors;
use crate::app::services::AppServices;
use crate::context::PrincipalContext;

pub fn router() -> Router {
    Router::new().route("/", get(get_settings).put(update_settings))
}

/// The caller's own display preferences.
pub async fn get_settings(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
) -> Response {
    match services.store.get_settings(principal.user_id()).await {
        Ok(settings) => Json(settings).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn update_settings(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    body: Result<Json<SettingsUpdate>, JsonRejection>,
) -> Response {
    let Json(update) = match body {
        Ok(b) => b,
        Err(rej) => return errors::json_rejection(rej),
    };

    match services
        .store
        .update_settings(principal.user_id(), update)
        .await
    {
        Ok(settings) => Json(settings).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}
