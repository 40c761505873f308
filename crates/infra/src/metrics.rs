//! Read-side aggregation for the dashboard and list views.

use std::sync::Arc;

use tracing::instrument;

use stockyard_inventory::{
    DashboardMetrics, MovementEntry, MovementQuery, Product, ProductFilter, RECENT_ACTIVITY_LIMIT,
};

use crate::store::{InventoryStore, StoreResult};

#[derive(Clone)]
pub struct MetricsAggregator {
    store: Arc<dyn InventoryStore>,
}

impl MetricsAggregator {
    pub fn new(store: Arc<dyn InventoryStore>) -> Self {
        Self { store }
    }

    /// Totals over active products, per-zone utilisation and the newest
    /// movements.
    #[instrument(skip(self), err)]
    pub async fn dashboard_metrics(&self) -> StoreResult<DashboardMetrics> {
        let products = self.store.find_products(&ProductFilter::default()).await?;
        let zones = self.store.list_zones().await?;
        let recent = self
            .store
            .list_movements(&MovementQuery::recent(RECENT_ACTIVITY_LIMIT))
            .await?;
        Ok(DashboardMetrics::compute(&products, &zones, recent))
    }

    pub async fn filter_products(&self, filter: ProductFilter) -> StoreResult<Vec<Product>> {
        self.store.find_products(&filter.normalized()).await
    }

    pub async fn list_movements(&self, query: MovementQuery) -> StoreResult<Vec<MovementEntry>> {
        self.store.list_movements(&query).await
    }
}
