//! Inventory persistence.
//!
//! [`InventoryStore`] is the single seam between the HTTP layer and storage.
//! Two backends implement it:
//! - [`InMemoryInventoryStore`] for tests and local runs
//! - [`PostgresInventoryStore`] for production
//!
//! Both delegate stock arithmetic to [`stockyard_inventory::StockChange::plan`]
//! while holding their write guard (in-memory) or a row lock (Postgres), so a
//! stock update and its movement record are always written together or not at
//! all.

use async_trait::async_trait;

use stockyard_core::{DomainError, ProductId, UserId, ZoneId};
use stockyard_inventory::{
    Movement, MovementEntry, MovementQuery, NewProduct, NewZone, Product, ProductFilter,
    ProductPatch, SettingsUpdate, StockMovementRequest, UserAccount, UserSettings, Zone,
    ZonePatch,
};

pub mod in_memory;
pub mod postgres;

pub use in_memory::InMemoryInventoryStore;
pub use postgres::PostgresInventoryStore;

/// Errors surfaced by inventory stores.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A business rule rejected the operation; nothing was written.
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// The backend failed (connection, lock poisoning, unexpected SQL error).
    #[error("storage unavailable: {0}")]
    StorageUnavailable(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

impl StoreError {
    pub fn domain(&self) -> Option<&DomainError> {
        match self {
            StoreError::Domain(e) => Some(e),
            StoreError::StorageUnavailable(_) => None,
        }
    }
}

/// A product created together with its optional initial IN movement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedProduct {
    pub product: Product,
    pub initial_movement: Option<Movement>,
}

/// Result of a committed ledger transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedMovement {
    pub product: Product,
    pub movement: Movement,
}

#[async_trait]
pub trait InventoryStore: Send + Sync {
    // --- users -----------------------------------------------------------

    /// Insert the user if unknown; refresh the username otherwise.
    async fn ensure_user(&self, user_id: UserId, username: &str) -> StoreResult<UserAccount>;

    /// Stored settings, or defaults when the user never saved any.
    async fn get_settings(&self, user_id: UserId) -> StoreResult<UserSettings>;

    async fn update_settings(
        &self,
        user_id: UserId,
        update: SettingsUpdate,
    ) -> StoreResult<UserSettings>;

    // --- zones -----------------------------------------------------------

    /// All zones, ordered by name.
    async fn list_zones(&self) -> StoreResult<Vec<Zone>>;

    async fn get_zone(&self, id: ZoneId) -> StoreResult<Zone>;

    async fn create_zone(&self, new: NewZone) -> StoreResult<Zone>;

    async fn update_zone(&self, id: ZoneId, patch: ZonePatch) -> StoreResult<Zone>;

    /// Fails with `Conflict` while active products reference the zone.
    /// Inactive products referencing it are unassigned.
    async fn delete_zone(&self, id: ZoneId) -> StoreResult<()>;

    // --- products --------------------------------------------------------

    /// Fetch a product (active or not).
    async fn get_product(&self, id: ProductId) -> StoreResult<Product>;

    /// Active products matching `filter`, ordered by name then code.
    async fn find_products(&self, filter: &ProductFilter) -> StoreResult<Vec<Product>>;

    /// Create a product and, when `initial_stock > 0`, its initial IN movement
    /// in one transaction.
    async fn create_product(
        &self,
        new: NewProduct,
        created_by: Option<UserId>,
    ) -> StoreResult<CreatedProduct>;

    /// Update descriptive fields. Never changes `current_stock`.
    async fn update_product(&self, id: ProductId, patch: ProductPatch) -> StoreResult<Product>;

    /// Soft delete. Movements are kept.
    async fn deactivate_product(&self, id: ProductId) -> StoreResult<Product>;

    // --- ledger ----------------------------------------------------------

    /// Atomically apply one stock movement: validate against the current
    /// stock, update the product and append the movement.
    async fn apply_movement(&self, request: &StockMovementRequest) -> StoreResult<AppliedMovement>;

    /// Movement history, newest first, joined with product and user summaries.
    async fn list_movements(&self, query: &MovementQuery) -> StoreResult<Vec<MovementEntry>>;
}

pub(crate) fn product_code_taken(code: &str) -> DomainError {
    DomainError::conflict(format!("product code '{code}' already exists"))
}

pub(crate) fn unknown_zone() -> DomainError {
    DomainError::validation("zone_id", "zone does not exist")
}

pub(crate) fn unknown_user() -> DomainError {
    DomainError::validation("user_id", "user does not exist")
}

pub(crate) fn zone_in_use(active_products: i64) -> DomainError {
    DomainError::conflict(format!(
        "zone is still assigned to {active_products} active product(s)"
    ))
}
