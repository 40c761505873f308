//! Stock ledger service.
//!
//! The only path through which stock levels change after creation. Quantity is
//! checked before storage is touched; the arithmetic and the atomic write
//! happen inside the store.

use std::sync::Arc;

use tracing::{info, instrument, warn};

use stockyard_core::{DomainError, UserId};
use stockyard_inventory::{NewProduct, StockMovementRequest, movement::ensure_positive_quantity};

use crate::store::{AppliedMovement, CreatedProduct, InventoryStore, StoreError, StoreResult};

#[derive(Clone)]
pub struct StockLedger {
    store: Arc<dyn InventoryStore>,
}

impl StockLedger {
    pub fn new(store: Arc<dyn InventoryStore>) -> Self {
        Self { store }
    }

    /// Apply one IN/OUT movement.
    ///
    /// On success the product's `current_stock` equals the movement's
    /// `new_stock` and the movement is in the log. On any error nothing changed.
    #[instrument(
        skip(self, request),
        fields(product_id = %request.product_id, kind = %request.kind, quantity = request.quantity),
        err
    )]
    pub async fn apply_movement(&self, request: StockMovementRequest) -> StoreResult<AppliedMovement> {
        ensure_positive_quantity(request.quantity)?;

        match self.store.apply_movement(&request).await {
            Ok(applied) => {
                info!(
                    movement_id = %applied.movement.id,
                    previous_stock = applied.movement.previous_stock,
                    new_stock = applied.movement.new_stock,
                    "stock movement recorded"
                );
                Ok(applied)
            }
            Err(StoreError::Domain(DomainError::InsufficientStock {
                available,
                requested,
            })) => {
                warn!(available, requested, "stock movement rejected");
                Err(DomainError::InsufficientStock {
                    available,
                    requested,
                }
                .into())
            }
            Err(e) => Err(e),
        }
    }

    /// Create a product; a positive `initial_stock` is recorded as an IN
    /// movement in the same transaction.
    #[instrument(skip(self, new), fields(product_code = %new.product_code), err)]
    pub async fn create_product(
        &self,
        new: NewProduct,
        created_by: Option<UserId>,
    ) -> StoreResult<CreatedProduct> {
        let created = self.store.create_product(new, created_by).await?;
        info!(
            product_id = %created.product.id,
            initial_stock = created.product.current_stock,
            "product created"
        );
        Ok(created)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryInventoryStore;
    use stockyard_core::ProductId;
    use stockyard_inventory::{MovementQuery, MovementType};

    fn ledger() -> (StockLedger, Arc<InMemoryInventoryStore>) {
        let store = Arc::new(InMemoryInventoryStore::new());
        (StockLedger::new(store.clone()), store)
    }

    fn new_product(initial_stock: i64) -> NewProduct {
        NewProduct {
            product_code: "PAL-01".to_string(),
            name: "Euro pallet".to_string(),
            description: None,
            category: "Pallets".to_string(),
            zone_id: None,
            initial_stock,
            min_stock: 0,
            unit_price: 900,
        }
    }

    fn request(product_id: ProductId, kind: MovementType, quantity: i64) -> StockMovementRequest {
        StockMovementRequest {
            product_id,
            quantity,
            kind,
            reason: Some("cycle count".to_string()),
            user_id: None,
        }
    }

    #[tokio::test]
    async fn in_then_out_round_trips() {
        let (ledger, store) = ledger();
        let p = ledger.create_product(new_product(0), None).await.unwrap().product;

        let applied = ledger
            .apply_movement(request(p.id, MovementType::In, 10))
            .await
            .unwrap();
        assert_eq!(applied.product.current_stock, 10);
        assert_eq!(applied.movement.reason.as_deref(), Some("cycle count"));

        let applied = ledger
            .apply_movement(request(p.id, MovementType::Out, 10))
            .await
            .unwrap();
        assert_eq!(applied.movement.previous_stock, 10);
        assert_eq!(applied.product.current_stock, 0);
        assert_eq!(store.get_product(p.id).await.unwrap().current_stock, 0);
    }

    #[tokio::test]
    async fn non_positive_quantity_rejected_before_lookup() {
        let (ledger, _) = ledger();
        // The product does not exist: the quantity check must win.
        let err = ledger
            .apply_movement(request(ProductId::new(), MovementType::In, 0))
            .await
            .unwrap_err();
        assert_eq!(err.domain(), Some(&DomainError::InvalidQuantity(0)));
    }

    #[tokio::test]
    async fn failed_out_writes_nothing() {
        let (ledger, store) = ledger();
        let p = ledger.create_product(new_product(2), None).await.unwrap().product;

        let err = ledger
            .apply_movement(request(p.id, MovementType::Out, 3))
            .await
            .unwrap_err();
        assert!(matches!(
            err.domain(),
            Some(DomainError::InsufficientStock {
                available: 2,
                requested: 3
            })
        ));

        let log = store.list_movements(&MovementQuery::default()).await.unwrap();
        assert_eq!(log.len(), 1);
        assert_eq!(store.get_product(p.id).await.unwrap().current_stock, 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_outs_never_oversell() {
        let (ledger, store) = ledger();
        let p = ledger.create_product(new_product(5), None).await.unwrap().product;
        let product_id = p.id;

        let tasks: Vec<_> = (0..10)
            .map(|_| {
                let ledger = ledger.clone();
                tokio::spawn(async move {
                    ledger.apply_movement(request(product_id, MovementType::Out, 1)).await
                })
            })
            .collect();

        let mut succeeded = 0;
        for task in tasks {
            if task.await.unwrap().is_ok() {
                succeeded += 1;
            }
        }

        assert_eq!(succeeded, 5);
        assert_eq!(store.get_product(product_id).await.unwrap().current_stock, 0);
    }
}
