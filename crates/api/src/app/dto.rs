//! Request/response DTOs and JSON mapping helpers.

use serde::{Deserialize, Serialize};
use serde_json::json;

use stockyard_core::{DomainError, DomainResult, ProductId, ZoneId};
use stockyard_inventory::{
    DashboardMetrics, MovementQuery, MovementType, Product, ProductFilter, StockStatus,
    UserSettings, Zone,
};

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Deserialize)]
pub struct StockMovementBody {
    pub quantity: i64,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub reason: Option<String>,
}

impl StockMovementBody {
    pub fn kind(&self) -> DomainResult<MovementType> {
        self.kind.parse()
    }
}

/// `GET /products` query string. Everything arrives as text so bad values
/// produce field-level validation errors instead of a generic rejection.
#[derive(Debug, Default, Deserialize)]
pub struct ProductListParams {
    pub category: Option<String>,
    #[serde(alias = "zoneId")]
    pub zone_id: Option<String>,
    pub status: Option<String>,
    pub search: Option<String>,
}

impl ProductListParams {
    pub fn into_filter(self) -> DomainResult<ProductFilter> {
        let zone_id = non_blank(self.zone_id)
            .map(|raw| {
                raw.parse::<ZoneId>()
                    .map_err(|_| DomainError::validation("zone_id", "must be a zone id"))
            })
            .transpose()?;
        let status = non_blank(self.status)
            .map(|raw| raw.parse::<StockStatus>())
            .transpose()?;

        Ok(ProductFilter {
            category: self.category,
            zone_id,
            status,
            search: self.search,
        }
        .normalized())
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct MovementListParams {
    #[serde(alias = "productId")]
    pub product_id: Option<String>,
    pub limit: Option<i64>,
}

impl MovementListParams {
    pub fn into_query(self) -> DomainResult<MovementQuery> {
        let product_id = non_blank(self.product_id)
            .map(|raw| {
                raw.parse::<ProductId>()
                    .map_err(|_| DomainError::validation("product_id", "must be a product id"))
            })
            .transpose()?;
        MovementQuery::new(product_id, self.limit)
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

// -------------------------
// Response mapping
// -------------------------

pub fn product_to_json(p: &Product) -> serde_json::Value {
    json!({
        "id": p.id,
        "product_code": p.product_code,
        "name": p.name,
        "description": p.description,
        "category": p.category,
        "zone_id": p.zone_id,
        "current_stock": p.current_stock,
        "min_stock": p.min_stock,
        "unit_price": p.unit_price,
        "stock_value": p.stock_value(),
        "status": p.status(),
        "is_active": p.is_active,
        "created_at": p.created_at,
        "updated_at": p.updated_at,
    })
}

pub fn zone_to_json(z: &Zone) -> serde_json::Value {
    json!({
        "id": z.id,
        "name": z.name,
        "description": z.description,
        "capacity": z.capacity,
        "created_at": z.created_at,
        "updated_at": z.updated_at,
    })
}

/// Dashboard payload: the metrics plus the caller's display preferences.
#[derive(Debug, Serialize)]
pub struct DashboardView {
    #[serde(flatten)]
    pub metrics: DashboardMetrics,
    pub currency: String,
    pub locale: String,
}

impl DashboardView {
    pub fn new(metrics: DashboardMetrics, settings: &UserSettings) -> Self {
        Self {
            metrics,
            currency: settings.currency.clone(),
            locale: settings.locale.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn product_params_parse_into_typed_filter() {
        let zone = ZoneId::new();
        let filter = ProductListParams {
            category: Some(" Tools ".to_string()),
            zone_id: Some(zone.to_string()),
            status: Some("LOW_STOCK".to_string()),
            search: Some(String::new()),
        }
        .into_filter()
        .unwrap();

        assert_eq!(filter.category.as_deref(), Some("Tools"));
        assert_eq!(filter.zone_id, Some(zone));
        assert_eq!(filter.status, Some(StockStatus::LowStock));
        assert_eq!(filter.search, None);
    }

    #[test]
    fn camel_case_query_keys_are_accepted() {
        let zone = ZoneId::new();
        let params: ProductListParams =
            serde_json::from_value(serde_json::json!({ "zoneId": zone.to_string() })).unwrap();
        assert_eq!(params.into_filter().unwrap().zone_id, Some(zone));

        let product = ProductId::new();
        let params: MovementListParams =
            serde_json::from_value(serde_json::json!({ "productId": product.to_string() })).unwrap();
        assert_eq!(params.into_query().unwrap().product_id, Some(product));
    }

    #[test]
    fn unknown_status_is_a_field_error() {
        let err = ProductListParams {
            status: Some("plenty".to_string()),
            ..ProductListParams::default()
        }
        .into_filter()
        .unwrap_err();
        assert_eq!(err.field(), Some("status"));
    }

    #[test]
    fn movement_params_enforce_limit_range() {
        let query = MovementListParams::default().into_query().unwrap();
        assert_eq!(query.limit, MovementQuery::DEFAULT_LIMIT);

        let err = MovementListParams {
            product_id: None,
            limit: Some(0),
        }
        .into_query()
        .unwrap_err();
        assert_eq!(err.field(), Some("limit"));

        let err = MovementListParams {
            product_id: Some("nope".to_string()),
            limit: None,
        }
        .into_query()
        .unwrap_err();
        assert_eq!(err.field(), Some("product_id"));
    }
}
