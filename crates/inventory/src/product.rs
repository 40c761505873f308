//! Product catalogue entries and their lifecycle.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stockyard_core::{DomainResult, ProductId, UserId, ZoneId};

use crate::movement::{INITIAL_STOCK_REASON, Movement, StockChange};
use crate::status::StockStatus;
use crate::text;

/// A stocked product.
///
/// `current_stock` is owned by the ledger: nothing in this type changes it
/// except [`Product::create`] (initial stock) and
/// [`Product::apply_stock_change`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    /// Human-assigned external identifier (unique).
    pub product_code: String,
    pub name: String,
    pub description: Option<String>,
    pub category: String,
    pub zone_id: Option<ZoneId>,
    pub current_stock: i64,
    pub min_stock: i64,
    /// Price in the smallest currency unit (e.g. cents).
    pub unit_price: i64,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Request to create a product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewProduct {
    pub product_code: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub category: String,
    #[serde(default)]
    pub zone_id: Option<ZoneId>,
    #[serde(default)]
    pub initial_stock: i64,
    #[serde(default)]
    pub min_stock: i64,
    #[serde(default)]
    pub unit_price: i64,
}

/// Partial update of a product's descriptive fields.
///
/// `zone_id` and `description` distinguish "leave unchanged" (absent) from
/// "clear" (`null`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductPatch {
    #[serde(default)]
    pub product_code: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "text::double_option")]
    pub description: Option<Option<String>>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default, deserialize_with = "text::double_option")]
    pub zone_id: Option<Option<ZoneId>>,
    #[serde(default)]
    pub min_stock: Option<i64>,
    #[serde(default)]
    pub unit_price: Option<i64>,
}

/// Compact product view embedded in movement entries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductSummary {
    pub id: ProductId,
    pub product_code: String,
    pub name: String,
}

impl Product {
    /// Validate a creation request and build the product plus its implicit
    /// initial IN movement (only when `initial_stock > 0`).
    ///
    /// Callers must persist both in one transaction.
    pub fn create(
        new: NewProduct,
        created_by: Option<UserId>,
        now: DateTime<Utc>,
    ) -> DomainResult<(Product, Option<Movement>)> {
        let product_code = text::required("product_code", &new.product_code)?;
        let name = text::required("name", &new.name)?;
        let category = text::required("category", &new.category)?;
        let initial_stock = text::non_negative("initial_stock", new.initial_stock)?;
        let min_stock = text::non_negative("min_stock", new.min_stock)?;
        let unit_price = text::non_negative("unit_price", new.unit_price)?;

        let product = Product {
            id: ProductId::new(),
            product_code,
            name,
            description: text::optional(new.description),
            category,
            zone_id: new.zone_id,
            current_stock: initial_stock,
            min_stock,
            unit_price,
            is_active: true,
            created_at: now,
            updated_at: now,
        };

        let initial = if initial_stock > 0 {
            let change = StockChange::initial(initial_stock)?;
            Some(Movement::record(
                product.id,
                change,
                Some(INITIAL_STOCK_REASON.to_string()),
                created_by,
                now,
            ))
        } else {
            None
        };

        Ok((product, initial))
    }

    /// Apply a descriptive update. Stock is never touched here.
    pub fn apply_patch(&mut self, patch: ProductPatch, now: DateTime<Utc>) -> DomainResult<()> {
        // Validate everything before mutating so a rejected patch leaves `self` intact.
        let product_code = patch
            .product_code
            .as_deref()
            .map(|v| text::required("product_code", v))
            .transpose()?;
        let name = patch
            .name
            .as_deref()
            .map(|v| text::required("name", v))
            .transpose()?;
        let category = patch
            .category
            .as_deref()
            .map(|v| text::required("category", v))
            .transpose()?;
        let min_stock = patch
            .min_stock
            .map(|v| text::non_negative("min_stock", v))
            .transpose()?;
        let unit_price = patch
            .unit_price
            .map(|v| text::non_negative("unit_price", v))
            .transpose()?;

        if let Some(v) = product_code {
            self.product_code = v;
        }
        if let Some(v) = name {
            self.name = v;
        }
        if let Some(description) = patch.description {
            self.description = text::optional(description);
        }
        if let Some(v) = category {
            self.category = v;
        }
        if let Some(zone_id) = patch.zone_id {
            self.zone_id = zone_id;
        }
        if let Some(v) = min_stock {
            self.min_stock = v;
        }
        if let Some(v) = unit_price {
            self.unit_price = v;
        }
        self.updated_at = now;
        Ok(())
    }

    /// Record a ledger-approved change. The change must have been planned from
    /// this product's current stock.
    pub fn apply_stock_change(&mut self, change: &StockChange, now: DateTime<Utc>) {
        debug_assert_eq!(change.previous_stock, self.current_stock);
        self.current_stock = change.new_stock;
        self.updated_at = now;
    }

    /// Soft delete.
    pub fn deactivate(&mut self, now: DateTime<Utc>) {
        self.is_active = false;
        self.updated_at = now;
    }

    pub fn status(&self) -> StockStatus {
        StockStatus::classify(self.current_stock, self.min_stock)
    }

    /// `current_stock × unit_price` in minor units, saturating on overflow.
    pub fn stock_value(&self) -> i64 {
        self.current_stock.saturating_mul(self.unit_price)
    }

    pub fn summary(&self) -> ProductSummary {
        ProductSummary {
            id: self.id,
            product_code: self.product_code.clone(),
            name: self.name.clone(),
        }
    }
}
