//! Stock movements: the append-only ledger entries and the rule that produces them.

use core::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stockyard_core::{DomainError, DomainResult, MovementId, ProductId, UserId};

use crate::product::ProductSummary;
use crate::text;
use crate::user::UserSummary;

/// Reason recorded on the implicit first movement of a product created with stock.
pub const INITIAL_STOCK_REASON: &str = "Initial stock";

/// Direction of a stock movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MovementType {
    In,
    Out,
}

impl MovementType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MovementType::In => "IN",
            MovementType::Out => "OUT",
        }
    }
}

impl core::fmt::Display for MovementType {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MovementType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "IN" => Ok(MovementType::In),
            "OUT" => Ok(MovementType::Out),
            _ => Err(DomainError::validation("type", "must be IN or OUT")),
        }
    }
}

/// Reject zero and negative movement quantities.
pub fn ensure_positive_quantity(quantity: i64) -> DomainResult<()> {
    if quantity <= 0 {
        return Err(DomainError::InvalidQuantity(quantity));
    }
    Ok(())
}

/// A validated stock transition for one product.
///
/// This is the ledger rule: every backend computes the new stock level through
/// [`StockChange::plan`] while holding the product row, and only persists the
/// result when planning succeeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StockChange {
    pub kind: MovementType,
    pub quantity: i64,
    pub previous_stock: i64,
    pub new_stock: i64,
}

impl StockChange {
    pub fn plan(previous_stock: i64, quantity: i64, kind: MovementType) -> DomainResult<Self> {
        ensure_positive_quantity(quantity)?;

        let new_stock = match kind {
            MovementType::In => previous_stock
                .checked_add(quantity)
                .ok_or_else(|| DomainError::validation("quantity", "stock level would overflow"))?,
            MovementType::Out => previous_stock - quantity,
        };

        if new_stock < 0 {
            return Err(DomainError::InsufficientStock {
                available: previous_stock,
                requested: quantity,
            });
        }

        Ok(Self {
            kind,
            quantity,
            previous_stock,
            new_stock,
        })
    }

    /// Implicit first IN movement for a product created with stock.
    pub fn initial(quantity: i64) -> DomainResult<Self> {
        Self::plan(0, quantity, MovementType::In)
    }
}

/// Immutable ledger entry recording one stock change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Movement {
    pub id: MovementId,
    pub product_id: ProductId,
    #[serde(rename = "type")]
    pub kind: MovementType,
    pub quantity: i64,
    pub previous_stock: i64,
    pub new_stock: i64,
    pub reason: Option<String>,
    pub user_id: Option<UserId>,
    pub created_at: DateTime<Utc>,
}

impl Movement {
    pub fn record(
        product_id: ProductId,
        change: StockChange,
        reason: Option<String>,
        user_id: Option<UserId>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: MovementId::new(),
            product_id,
            kind: change.kind,
            quantity: change.quantity,
            previous_stock: change.previous_stock,
            new_stock: change.new_stock,
            reason: text::optional(reason),
            user_id,
            created_at: now,
        }
    }

    /// Quantity with the sign of the movement direction.
    pub fn signed_quantity(&self) -> i64 {
        match self.kind {
            MovementType::In => self.quantity,
            MovementType::Out => -self.quantity,
        }
    }
}

/// Input to the stock ledger: apply one movement to one product.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StockMovementRequest {
    pub product_id: ProductId,
    pub quantity: i64,
    pub kind: MovementType,
    pub reason: Option<String>,
    /// Request-scoped acting user, if any.
    pub user_id: Option<UserId>,
}

/// A movement joined with its product and (nullable) acting user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MovementEntry {
    #[serde(flatten)]
    pub movement: Movement,
    pub product: ProductSummary,
    pub user: Option<UserSummary>,
}

/// Typed query for the movement log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MovementQuery {
    pub product_id: Option<ProductId>,
    pub limit: usize,
}

impl MovementQuery {
    pub const DEFAULT_LIMIT: usize = 50;
    pub const MAX_LIMIT: usize = 500;

    /// Build a query from optional caller input, applying the default limit.
    pub fn new(product_id: Option<ProductId>, limit: Option<i64>) -> DomainResult<Self> {
        let limit = match limit {
            None => Self::DEFAULT_LIMIT,
            Some(l) if l >= 1 && l <= Self::MAX_LIMIT as i64 => l as usize,
            Some(_) => {
                return Err(DomainError::validation(
                    "limit",
                    format!("must be between 1 and {}", Self::MAX_LIMIT),
                ));
            }
        };
        Ok(Self { product_id, limit })
    }

    /// The newest `limit` movements across all products.
    pub fn recent(limit: usize) -> Self {
        Self {
            product_id: None,
            limit,
        }
    }
}

impl Default for MovementQuery {
    fn default() -> Self {
        Self::recent(Self::DEFAULT_LIMIT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn out_beyond_available_is_insufficient() {
        let err = StockChange::plan(3, 5, MovementType::Out).unwrap_err();
        assert_eq!(
            err,
            DomainError::InsufficientStock {
                available: 3,
                requested: 5
            }
        );
    }

    #[test]
    fn out_to_exactly_zero_is_allowed() {
        let change = StockChange::plan(5, 5, MovementType::Out).unwrap();
        assert_eq!(change.previous_stock, 5);
        assert_eq!(change.new_stock, 0);
    }

    #[test]
    fn in_adds_quantity() {
        let change = StockChange::plan(7, 3, MovementType::In).unwrap();
        assert_eq!(change.new_stock, 10);
        assert_eq!(change.kind, MovementType::In);
    }

    #[test]
    fn zero_and_negative_quantities_are_rejected() {
        assert_eq!(
            StockChange::plan(10, 0, MovementType::In).unwrap_err(),
            DomainError::InvalidQuantity(0)
        );
        assert_eq!(
            StockChange::plan(10, -4, MovementType::Out).unwrap_err(),
            DomainError::InvalidQuantity(-4)
        );
    }

    #[test]
    fn in_overflow_is_a_validation_error() {
        let err = StockChange::plan(i64::MAX, 1, MovementType::In).unwrap_err();
        assert_eq!(err.field(), Some("quantity"));
    }

    #[test]
    fn record_normalises_blank_reason() {
        let change = StockChange::plan(0, 2, MovementType::In).unwrap();
        let m = Movement::record(ProductId::new(), change, Some("   ".into()), None, Utc::now());
        assert_eq!(m.reason, None);
        assert_eq!(m.signed_quantity(), 2);
    }

    #[test]
    fn movement_type_serializes_uppercase() {
        assert_eq!(serde_json::to_string(&MovementType::Out).unwrap(), "\"OUT\"");
        assert_eq!("in".parse::<MovementType>().unwrap(), MovementType::In);
        assert!("sideways".parse::<MovementType>().is_err());
    }

    #[test]
    fn query_limit_defaults_and_bounds() {
        assert_eq!(MovementQuery::new(None, None).unwrap().limit, 50);
        assert_eq!(MovementQuery::new(None, Some(500)).unwrap().limit, 500);
        assert!(MovementQuery::new(None, Some(0)).is_err());
        assert!(MovementQuery::new(None, Some(501)).is_err());
    }

    #[cfg(test)]
    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        fn op() -> impl Strategy<Value = (bool, i64)> {
            (any::<bool>(), 1i64..50)
        }

        proptest! {
            #![proptest_config(ProptestConfig {
                cases: 500,
                ..ProptestConfig::default()
            })]

            /// Property: stock always equals initial + Σ IN − Σ OUT of accepted movements,
            /// and every accepted movement chains from the previous snapshot.
            #[test]
            fn stock_equals_sum_of_accepted_movements(
                initial in 0i64..100,
                ops in proptest::collection::vec(op(), 0..60)
            ) {
                let mut stock = initial;
                let mut history: Vec<StockChange> = Vec::new();
                if initial > 0 {
                    history.push(StockChange::initial(initial).unwrap());
                }

                for (is_in, qty) in ops {
                    let kind = if is_in { MovementType::In } else { MovementType::Out };
                    match StockChange::plan(stock, qty, kind) {
                        Ok(change) => {
                            prop_assert_eq!(change.previous_stock, stock);
                            stock = change.new_stock;
                            history.push(change);
                        }
                        Err(DomainError::InsufficientStock { available, requested }) => {
                            prop_assert_eq!(available, stock);
                            prop_assert!(requested > stock);
                        }
                        Err(other) => prop_assert!(false, "unexpected error {:?}", other),
                    }
                    prop_assert!(stock >= 0);
                }

                let net: i64 = history
                    .iter()
                    .map(|c| match c.kind {
                        MovementType::In => c.quantity,
                        MovementType::Out => -c.quantity,
                    })
                    .sum();
                prop_assert_eq!(net, stock);
                if let Some(last) = history.last() {
                    prop_assert_eq!(last.new_stock, stock);
                }
            }
        }
    }
}
