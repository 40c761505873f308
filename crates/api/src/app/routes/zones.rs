use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};

use stockyard_auth::Permission;
use stockyard_core::ZoneId;
use stockyard_inventory::{NewZone, ZonePatch};

use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::authz::authorize_request;
use crate::context::PrincipalContext;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_zones).post(create_zone))
        .route("/:id", get(get_zone).put(update_zone).delete(delete_zone))
}

pub async fn list_zones(Extension(services): Extension<Arc<AppServices>>) -> Response {
    match services.store.list_zones().await {
        Ok(zones) => {
            let body: Vec<_> = zones.iter().map(dto::zone_to_json).collect();
            Json(body).into_response()
        }
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn create_zone(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    body: Result<Json<NewZone>, JsonRejection>,
) -> Response {
    if let Err(e) = authorize_request(&principal, &Permission::ZONES_MANAGE) {
        return errors::forbidden(e);
    }
    let Json(body) = match body {
        Ok(b) => b,
        Err(rej) => return errors::json_rejection(rej),
    };

    match services.store.create_zone(body).await {
        Ok(zone) => (StatusCode::CREATED, Json(dto::zone_to_json(&zone))).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn get_zone(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> Response {
    let id: ZoneId = match errors::parse_id(&id) {
        Ok(v) => v,
        Err(res) => return res,
    };
    match services.store.get_zone(id).await {
        Ok(zone) => Json(dto::zone_to_json(&zone)).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn update_zone(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    body: Result<Json<ZonePatch>, JsonRejection>,
) -> Response {
    if let Err(e) = authorize_request(&principal, &Permission::ZONES_MANAGE) {
        return errors::forbidden(e);
    }
    let id: ZoneId = match errors::parse_id(&id) {
        Ok(v) => v,
        Err(res) => return res,
    };
    let Json(patch) = match body {
        Ok(b) => b,
        Err(rej) => return errors::json_rejection(rej),
    };

    match services.store.update_zone(id, patch).await {
        Ok(zone) => Json(dto::zone_to_json(&zone)).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn delete_zone(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> Response {
    if let Err(e) = authorize_request(&principal, &Permission::ZONES_MANAGE) {
        return errors::forbidden(e);
    }
    let id: ZoneId = match errors::parse_id(&id) {
        Ok(v) => v,
        Err(res) => return res,
    };

    match services.store.delete_zone(id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}
