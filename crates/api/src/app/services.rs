//! Service wiring: one inventory store shared by the ledger and the
//! aggregator.

use std::sync::Arc;

use stockyard_infra::{
    InMemoryInventoryStore, InventoryStore, MetricsAggregator, PostgresInventoryStore, StockLedger,
};

use crate::config::StoreBackend;

#[derive(Clone)]
pub struct AppServices {
    pub store: Arc<dyn InventoryStore>,
    pub ledger: StockLedger,
    pub metrics: MetricsAggregator,
}

impl AppServices {
    pub fn new(store: Arc<dyn InventoryStore>) -> Self {
        Self {
            ledger: StockLedger::new(store.clone()),
            metrics: MetricsAggregator::new(store.clone()),
            store,
        }
    }
}

pub async fn build_services(backend: &StoreBackend) -> anyhow::Result<AppServices> {
    let store: Arc<dyn InventoryStore> = match backend {
        StoreBackend::InMemory => {
            tracing::info!("using in-memory inventory store");
            Arc::new(InMemoryInventoryStore::new())
        }
        StoreBackend::Postgres(db) => {
            let pool = db.connect().await?;
            let store = PostgresInventoryStore::new(pool);
            store.migrate().await?;
            tracing::info!(max_connections = db.max_connections, "using postgres inventory store");
            Arc::new(store)
        }
    };
    Ok(AppServices::new(store))
}
