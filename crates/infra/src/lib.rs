//! Infrastructure layer: inventory persistence, database wiring and the
//! application services built on top of it.

pub mod config;
pub mod ledger;
pub mod metrics;
pub mod store;

pub use config::DatabaseConfig;
pub use ledger::StockLedger;
pub use metrics::MetricsAggregator;
pub use store::{
    AppliedMovement, CreatedProduct, InMemoryInventoryStore, InventoryStore,
    PostgresInventoryStore, StoreError, StoreResult,
};
