//! In-memory inventory store.
//!
//! All tables sit behind one `RwLock`, so every write operation (including a
//! ledger movement) is serialized and observes a consistent snapshot. Intended
//! for tests and local runs; nothing survives a restart.

use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use chrono::Utc;

use stockyard_core::{DomainError, ProductId, UserId, ZoneId};
use stockyard_inventory::{
    Movement, MovementEntry, MovementQuery, NewProduct, NewZone, Product, ProductFilter,
    ProductPatch, SettingsUpdate, StockChange, StockMovementRequest, UserAccount, UserSettings,
    Zone, ZonePatch,
};

use super::{
    AppliedMovement, CreatedProduct, InventoryStore, StoreError, StoreResult, product_code_taken,
    unknown_user, unknown_zone, zone_in_use,
};

#[derive(Debug, Default)]
struct Tables {
    users: HashMap<UserId, UserAccount>,
    settings: HashMap<UserId, UserSettings>,
    zones: HashMap<ZoneId, Zone>,
    products: HashMap<ProductId, Product>,
    /// Append order; the last element is the newest movement.
    movements: Vec<Movement>,
}

impl Tables {
    fn product_code_in_use(&self, code: &str, except: Option<ProductId>) -> bool {
        self.products
            .values()
            .any(|p| p.product_code == code && Some(p.id) != except)
    }

    fn check_zone(&self, zone_id: Option<ZoneId>) -> StoreResult<()> {
        match zone_id {
            Some(id) if !self.zones.contains_key(&id) => Err(unknown_zone().into()),
            _ => Ok(()),
        }
    }

    fn check_user(&self, user_id: Option<UserId>) -> StoreResult<()> {
        match user_id {
            Some(id) if !self.users.contains_key(&id) => Err(unknown_user().into()),
            _ => Ok(()),
        }
    }

    fn entry(&self, movement: &Movement) -> Option<MovementEntry> {
        let product = self.products.get(&movement.product_id)?;
        Some(MovementEntry {
            movement: movement.clone(),
            product: product.summary(),
            user: movement
                .user_id
                .and_then(|id| self.users.get(&id))
                .map(UserAccount::summary),
        })
    }
}

#[derive(Debug, Default)]
pub struct InMemoryInventoryStore {
    tables: RwLock<Tables>,
}

impl InMemoryInventoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> StoreResult<RwLockReadGuard<'_, Tables>> {
        self.tables
            .read()
            .map_err(|_| StoreError::StorageUnavailable("inventory lock poisoned".to_string()))
    }

    fn write(&self) -> StoreResult<RwLockWriteGuard<'_, Tables>> {
        self.tables
            .write()
            .map_err(|_| StoreError::StorageUnavailable("inventory lock poisoned".to_string()))
    }
}

fn product_not_found(id: ProductId) -> StoreError {
    DomainError::not_found("product", id).into()
}

fn zone_not_found(id: ZoneId) -> StoreError {
    DomainError::not_found("zone", id).into()
}

#[async_trait]
impl InventoryStore for InMemoryInventoryStore {
    async fn ensure_user(&self, user_id: UserId, username: &str) -> StoreResult<UserAccount> {
        let mut tables = self.write()?;
        let account = tables
            .users
            .entry(user_id)
            .and_modify(|u| u.username = username.to_string())
            .or_insert_with(|| UserAccount {
                id: user_id,
                username: username.to_string(),
                created_at: Utc::now(),
            });
        Ok(account.clone())
    }

    async fn get_settings(&self, user_id: UserId) -> StoreResult<UserSettings> {
        let tables = self.read()?;
        Ok(tables.settings.get(&user_id).cloned().unwrap_or_default())
    }

    async fn update_settings(
        &self,
        user_id: UserId,
        update: SettingsUpdate,
    ) -> StoreResult<UserSettings> {
        let mut tables = self.write()?;
        tables.check_user(Some(user_id))?;
        let mut settings = tables.settings.get(&user_id).cloned().unwrap_or_default();
        settings.apply(update, Utc::now())?;
        tables.settings.insert(user_id, settings.clone());
        Ok(settings)
    }

    async fn list_zones(&self) -> StoreResult<Vec<Zone>> {
        let tables = self.read()?;
        let mut zones: Vec<Zone> = tables.zones.values().cloned().collect();
        zones.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
        Ok(zones)
    }

    async fn get_zone(&self, id: ZoneId) -> StoreResult<Zone> {
        let tables = self.read()?;
        tables.zones.get(&id).cloned().ok_or_else(|| zone_not_found(id))
    }

    async fn create_zone(&self, new: NewZone) -> StoreResult<Zone> {
        let zone = Zone::create(new, Utc::now())?;
        let mut tables = self.write()?;
        tables.zones.insert(zone.id, zone.clone());
        Ok(zone)
    }

    async fn update_zone(&self, id: ZoneId, patch: ZonePatch) -> StoreResult<Zone> {
        let mut tables = self.write()?;
        let zone = tables.zones.get_mut(&id).ok_or_else(|| zone_not_found(id))?;
        zone.apply_patch(patch, Utc::now())?;
        Ok(zone.clone())
    }

    async fn delete_zone(&self, id: ZoneId) -> StoreResult<()> {
        let mut tables = self.write()?;
        if !tables.zones.contains_key(&id) {
            return Err(zone_not_found(id));
        }
        let active = tables
            .products
            .values()
            .filter(|p| p.is_active && p.zone_id == Some(id))
            .count();
        if active > 0 {
            return Err(zone_in_use(active as i64).into());
        }

        let now = Utc::now();
        for product in tables.products.values_mut() {
            if product.zone_id == Some(id) {
                product.zone_id = None;
                product.updated_at = now;
            }
        }
        tables.zones.remove(&id);
        Ok(())
    }

    async fn get_product(&self, id: ProductId) -> StoreResult<Product> {
        let tables = self.read()?;
        tables
            .products
            .get(&id)
            .cloned()
            .ok_or_else(|| product_not_found(id))
    }

    async fn find_products(&self, filter: &ProductFilter) -> StoreResult<Vec<Product>> {
        let tables = self.read()?;
        Ok(filter.apply(tables.products.values()))
    }

    async fn create_product(
        &self,
        new: NewProduct,
        created_by: Option<UserId>,
    ) -> StoreResult<CreatedProduct> {
        let (product, initial_movement) = Product::create(new, created_by, Utc::now())?;

        let mut tables = self.write()?;
        if tables.product_code_in_use(&product.product_code, None) {
            return Err(product_code_taken(&product.product_code).into());
        }
        tables.check_zone(product.zone_id)?;
        tables.check_user(created_by)?;

        tables.products.insert(product.id, product.clone());
        if let Some(movement) = &initial_movement {
            tables.movements.push(movement.clone());
        }
        Ok(CreatedProduct {
            product,
            initial_movement,
        })
    }

    async fn update_product(&self, id: ProductId, patch: ProductPatch) -> StoreResult<Product> {
        let mut tables = self.write()?;
        let mut updated = tables
            .products
            .get(&id)
            .cloned()
            .ok_or_else(|| product_not_found(id))?;
        updated.apply_patch(patch, Utc::now())?;

        if tables.product_code_in_use(&updated.product_code, Some(id)) {
            return Err(product_code_taken(&updated.product_code).into());
        }
        tables.check_zone(updated.zone_id)?;

        tables.products.insert(id, updated.clone());
        Ok(updated)
    }

    async fn deactivate_product(&self, id: ProductId) -> StoreResult<Product> {
        let mut tables = self.write()?;
        let product = tables
            .products
            .get_mut(&id)
            .ok_or_else(|| product_not_found(id))?;
        product.deactivate(Utc::now());
        Ok(product.clone())
    }

    async fn apply_movement(&self, request: &StockMovementRequest) -> StoreResult<AppliedMovement> {
        let mut tables = self.write()?;
        let current_stock = tables
            .products
            .get(&request.product_id)
            .map(|p| p.current_stock)
            .ok_or_else(|| product_not_found(request.product_id))?;
        let change = StockChange::plan(current_stock, request.quantity, request.kind)?;
        tables.check_user(request.user_id)?;

        let product = tables
            .products
            .get_mut(&request.product_id)
            .ok_or_else(|| product_not_found(request.product_id))?;

        let now = Utc::now();
        product.apply_stock_change(&change, now);
        let product = product.clone();

        let movement = Movement::record(
            product.id,
            change,
            request.reason.clone(),
            request.user_id,
            now,
        );
        tables.movements.push(movement.clone());

        Ok(AppliedMovement { product, movement })
    }

    async fn list_movements(&self, query: &MovementQuery) -> StoreResult<Vec<MovementEntry>> {
        let tables = self.read()?;
        Ok(tables
            .movements
            .iter()
            .rev()
            .filter(|m| query.product_id.is_none_or(|id| m.product_id == id))
            .take(query.limit)
            .filter_map(|m| tables.entry(m))
            .collect())
    }
}
