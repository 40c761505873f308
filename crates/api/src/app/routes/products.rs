use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{
        Extension, Path, Query,
        rejection::{JsonRejection, QueryRejection},
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};

use stockyard_auth::Permission;
use stockyard_core::ProductId;
use stockyard_inventory::{NewProduct, ProductPatch, StockMovementRequest};

use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::authz::authorize_request;
use crate::context::PrincipalContext;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_products).post(create_product))
        .route(
            "/:id",
            get(get_product).put(update_product).delete(delete_product),
        )
        .route("/:id/stock", post(apply_movement))
}

pub async fn list_products(
    Extension(services): Extension<Arc<AppServices>>,
    params: Result<Query<dto::ProductListParams>, QueryRejection>,
) -> Response {
    let Query(params) = match params {
        Ok(p) => p,
        Err(rej) => return errors::query_rejection(rej),
    };
    let filter = match params.into_filter() {
        Ok(f) => f,
        Err(e) => return errors::domain_error_to_response(e),
    };

    match services.metrics.filter_products(filter).await {
        Ok(products) => {
            let body: Vec<_> = products.iter().map(dto::product_to_json).collect();
            Json(body).into_response()
        }
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn create_product(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    body: Result<Json<NewProduct>, JsonRejection>,
) -> Response {
    if let Err(e) = authorize_request(&principal, &Permission::PRODUCTS_CREATE) {
        return errors::forbidden(e);
    }
    let Json(body) = match body {
        Ok(b) => b,
        Err(rej) => return errors::json_rejection(rej),
    };

    match services
        .ledger
        .create_product(body, Some(principal.user_id()))
        .await
    {
        Ok(created) => (
            StatusCode::CREATED,
            Json(serde_json::json!({
                "product": dto::product_to_json(&created.product),
                "initial_movement": created.initial_movement,
            })),
        )
            .into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn get_product(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> Response {
    let id: ProductId = match errors::parse_id(&id) {
        Ok(v) => v,
        Err(res) => return res,
    };

    match services.store.get_product(id).await {
        Ok(p) => Json(dto::product_to_json(&p)).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn update_product(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    body: Result<Json<ProductPatch>, JsonRejection>,
) -> Response {
    if let Err(e) = authorize_request(&principal, &Permission::PRODUCTS_UPDATE) {
        return errors::forbidden(e);
    }
    let id: ProductId = match errors::parse_id(&id) {
        Ok(v) => v,
        Err(res) => return res,
    };
    let Json(patch) = match body {
        Ok(b) => b,
        Err(rej) => return errors::json_rejection(rej),
    };

    match services.store.update_product(id, patch).await {
        Ok(p) => Json(dto::product_to_json(&p)).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn delete_product(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> Response {
    if let Err(e) = authorize_request(&principal, &Permission::PRODUCTS_DELETE) {
        return errors::forbidden(e);
    }
    let id: ProductId = match errors::parse_id(&id) {
        Ok(v) => v,
        Err(res) => return res,
    };

    match services.store.deactivate_product(id).await {
        Ok(p) => {
            tracing::info!(product_id = %p.id, "product deactivated");
            Json(dto::product_to_json(&p)).into_response()
        }
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn apply_movement(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    body: Result<Json<dto::StockMovementBody>, JsonRejection>,
) -> Response {
    if let Err(e) = authorize_request(&principal, &Permission::STOCK_ADJUST) {
        return errors::forbidden(e);
    }
    let product_id: ProductId = match errors::parse_id(&id) {
        Ok(v) => v,
        Err(res) => return res,
    };
    let Json(body) = match body {
        Ok(b) => b,
        Err(rej) => return errors::json_rejection(rej),
    };
    let kind = match body.kind() {
        Ok(k) => k,
        Err(e) => return errors::domain_error_to_response(e),
    };

    let request = StockMovementRequest {
        product_id,
        quantity: body.quantity,
        kind,
        reason: body.reason,
        user_id: Some(principal.user_id()),
    };

    match services.ledger.apply_movement(request).await {
        Ok(applied) => Json(serde_json::json!({
            "product": dto::product_to_json(&applied.product),
            "movement": applied.movement,
        }))
        .into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}
