//! Typed product filter.

use core::cmp::Ordering;

use serde::{Deserialize, Serialize};
use stockyard_core::ZoneId;

use crate::product::Product;
use crate::status::StockStatus;

/// The recognised product list filters. All set fields must match (AND);
/// inactive products are always excluded.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductFilter {
    /// Exact category match.
    pub category: Option<String>,
    /// Exact zone match.
    pub zone_id: Option<ZoneId>,
    /// Stock classification match.
    pub status: Option<StockStatus>,
    /// Case-insensitive substring over name, product code or category.
    pub search: Option<String>,
}

impl ProductFilter {
    /// Drop blank text criteria so `?search=` behaves like no search at all.
    pub fn normalized(mut self) -> Self {
        self.category = self
            .category
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty());
        self.search = self
            .search
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());
        self
    }

    pub fn matches(&self, product: &Product) -> bool {
        if !product.is_active {
            return false;
        }
        if let Some(category) = &self.category {
            if &product.category != category {
                return false;
            }
        }
        if let Some(zone_id) = self.zone_id {
            if product.zone_id != Some(zone_id) {
                return false;
            }
        }
        if let Some(status) = self.status {
            if product.status() != status {
                return false;
            }
        }
        if let Some(search) = &self.search {
            let needle = search.to_lowercase();
            let hit = [&product.name, &product.product_code, &product.category]
                .iter()
                .any(|field| field.to_lowercase().contains(&needle));
            if !hit {
                return false;
            }
        }
        true
    }

    /// Filter and order a product scan (name ascending, product code breaks ties).
    pub fn apply<'a>(&self, products: impl IntoIterator<Item = &'a Product>) -> Vec<Product> {
        let mut out: Vec<Product> = products
            .into_iter()
            .filter(|p| self.matches(p))
            .cloned()
            .collect();
        out.sort_by(by_name);
        out
    }
}

pub fn by_name(a: &Product, b: &Product) -> Ordering {
    a.name
        .cmp(&b.name)
        .then_with(|| a.product_code.cmp(&b.product_code))
}
