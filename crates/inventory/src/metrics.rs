//! Dashboard metric computation over a product/zone scan.

use std::collections::HashMap;

use serde::Serialize;
use stockyard_core::ZoneId;

use crate::movement::MovementEntry;
use crate::product::Product;
use crate::status::StockStatus;
use crate::zone::Zone;

/// Number of movements shown as recent activity on the dashboard.
pub const RECENT_ACTIVITY_LIMIT: usize = 10;

/// Point-in-time dashboard statistics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DashboardMetrics {
    pub total_items: usize,
    pub low_stock_items: usize,
    pub out_of_stock_items: usize,
    /// Σ current_stock × unit_price over active products, in minor units.
    pub total_value: i64,
    pub recent_activities: Vec<MovementEntry>,
    pub zone_status: Vec<ZoneStatus>,
}

/// Per-zone utilisation row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ZoneStatus {
    pub zone_id: ZoneId,
    pub name: String,
    pub capacity: i64,
    pub item_count: usize,
    pub total_stock: i64,
    /// `floor(total_stock * 100 / capacity)`; `None` when capacity is 0.
    pub utilization_percent: Option<i64>,
}

#[derive(Default)]
struct ZoneTally {
    items: usize,
    stock: i64,
}

impl DashboardMetrics {
    /// Compute metrics from a product scan. Inactive products are ignored even
    /// if the caller passes them in; every zone gets a row.
    pub fn compute(
        products: &[Product],
        zones: &[Zone],
        recent_activities: Vec<MovementEntry>,
    ) -> Self {
        let mut total_items = 0;
        let mut low_stock_items = 0;
        let mut out_of_stock_items = 0;
        let mut total_value: i64 = 0;
        let mut tallies: HashMap<ZoneId, ZoneTally> = HashMap::new();

        for product in products.iter().filter(|p| p.is_active) {
            total_items += 1;
            match product.status() {
                StockStatus::LowStock => low_stock_items += 1,
                StockStatus::OutOfStock => out_of_stock_items += 1,
                StockStatus::InStock => {}
            }
            total_value = total_value.saturating_add(product.stock_value());

            if let Some(zone_id) = product.zone_id {
                let tally = tallies.entry(zone_id).or_default();
                tally.items += 1;
                tally.stock = tally.stock.saturating_add(product.current_stock);
            }
        }

        let mut zone_status: Vec<ZoneStatus> = zones
            .iter()
            .map(|zone| {
                let tally = tallies.remove(&zone.id).unwrap_or_default();
                ZoneStatus {
                    zone_id: zone.id,
                    name: zone.name.clone(),
                    capacity: zone.capacity,
                    item_count: tally.items,
                    total_stock: tally.stock,
                    utilization_percent: utilization(tally.stock, zone.capacity),
                }
            })
            .collect();
        zone_status.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.zone_id.cmp(&b.zone_id)));

        Self {
            total_items,
            low_stock_items,
            out_of_stock_items,
            total_value,
            recent_activities,
            zone_status,
        }
    }
}

fn utilization(stock: i64, capacity: i64) -> Option<i64> {
    if capacity <= 0 {
        return None;
    }
    Some(stock.saturating_mul(100) / capacity)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::product::NewProduct;
    use crate::zone::NewZone;
    use chrono::Utc;

    fn zone(name: &str, capacity: i64) -> Zone {
        Zone::create(
            NewZone {
                name: name.to_string(),
                description: None,
                capacity,
            },
            Utc::now(),
        )
        .unwrap()
    }

    fn product(zone_id: Option<ZoneId>, stock: i64, min: i64, price: i64) -> Product {
        let (p, _) = Product::create(
            NewProduct {
                product_code: format!("P-{stock}-{min}-{price}"),
                name: "Item".to_string(),
                description: None,
                category: "General".to_string(),
                zone_id,
                initial_stock: stock,
                min_stock: min,
                unit_price: price,
            },
            None,
            Utc::now(),
        )
        .unwrap();
        p
    }

    #[test]
    fn counts_and_value_cover_active_products_only() {
        let mut retired = product(None, 1000, 0, 1000);
        retired.deactivate(Utc::now());

        let products = vec![
            product(None, 20, 5, 250),
            product(None, 5, 5, 100),
            product(None, 0, 3, 999),
            retired,
        ];
        let m = DashboardMetrics::compute(&products, &[], Vec::new());

        assert_eq!(m.total_items, 3);
        assert_eq!(m.low_stock_items, 1);
        assert_eq!(m.out_of_stock_items, 1);
        assert_eq!(m.total_value, 20 * 250 + 5 * 100);
    }

    #[test]
    fn empty_zone_reports_zero_items() {
        let busy = zone("Bulk", 200);
        let empty = zone("Annex", 0);
        let products = vec![product(Some(busy.id), 30, 0, 1), product(Some(busy.id), 20, 0, 1)];

        let m = DashboardMetrics::compute(&products, &[busy.clone(), empty.clone()], Vec::new());

        assert_eq!(m.zone_status.len(), 2);
        let annex = &m.zone_status[0];
        assert_eq!(annex.zone_id, empty.id);
        assert_eq!(annex.item_count, 0);
        assert_eq!(annex.utilization_percent, None);

        let bulk = &m.zone_status[1];
        assert_eq!(bulk.item_count, 2);
        assert_eq!(bulk.total_stock, 50);
        assert_eq!(bulk.utilization_percent, Some(25));
    }

    #[test]
    fn inactive_products_do_not_count_towards_zones() {
        let z = zone("Mezzanine", 10);
        let mut gone = product(Some(z.id), 4, 0, 1);
        gone.deactivate(Utc::now());

        let m = DashboardMetrics::compute(&[gone], &[z], Vec::new());
        assert_eq!(m.zone_status[0].item_count, 0);
        assert_eq!(m.zone_status[0].total_stock, 0);
    }
}
