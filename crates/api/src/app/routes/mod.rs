use axum::{Router, routing::get};

pub mod dashboard;
pub mod movements;
pub mod products;
pub mod settings;
pub mod system;
pub mod zones;

/// Router for all authenticated endpoints.
pub fn router() -> Router {
    Router::new()
        .route("/whoami", get(system::whoami))
        .nest("/products", products::router())
        .nest("/movements", movements::router())
        .nest("/dashboard", dashboard::router())
        .nest("/zones", zones::router())
        .nest("/settings", settings::router())
}
