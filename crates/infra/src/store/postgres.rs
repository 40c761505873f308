//! Postgres-backed inventory store.
//!
//! ## Ledger atomicity
//!
//! `apply_movement` runs in one transaction:
//! 1. `SELECT ... FOR UPDATE` on the product row
//! 2. plan the change with [`StockChange::plan`]
//! 3. update `current_stock` and insert the movement
//!
//! Concurrent movements on the same product queue on the row lock, so each one
//! plans against the stock committed by its predecessor. The `CHECK
//! (current_stock >= 0)` constraint backs this up at the database level.
//!
//! ## Error mapping
//!
//! | Postgres code | StoreError |
//! |---------------|------------|
//! | `23505` unique violation | `Domain(Conflict)` |
//! | `23503` foreign key violation | `Domain(Validation)` |
//! | `23514` check violation | `Domain(Validation)` |
//! | anything else | `StorageUnavailable` |

use async_trait::async_trait;
use chrono::{DateTime, SubsecRound, Utc};
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder, Transaction};
use tracing::instrument;
use uuid::Uuid;

use stockyard_core::{DomainError, MovementId, ProductId, UserId, ZoneId};
use stockyard_inventory::{
    Movement, MovementEntry, MovementQuery, MovementType, NewProduct, NewZone, Product,
    ProductFilter, ProductPatch, ProductSummary, SettingsUpdate, StockChange, StockStatus,
    StockMovementRequest, UserAccount, UserSettings, UserSummary, Zone, ZonePatch,
};

use super::{
    AppliedMovement, CreatedProduct, InventoryStore, StoreError, StoreResult, product_code_taken,
    unknown_user, unknown_zone, zone_in_use,
};

const SCHEMA: &str = include_str!("schema.sql");

macro_rules! product_columns {
    () => {
        "id, product_code, name, description, category, zone_id, current_stock, min_stock, \
         unit_price, is_active, created_at, updated_at"
    };
}

macro_rules! zone_columns {
    () => {
        "id, name, description, capacity, created_at, updated_at"
    };
}

#[derive(Debug, Clone)]
pub struct PostgresInventoryStore {
    pool: PgPool,
}

impl PostgresInventoryStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create tables and indexes if they do not exist yet.
    #[instrument(skip(self), err)]
    pub async fn migrate(&self) -> StoreResult<()> {
        sqlx::raw_sql(SCHEMA)
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("migrate", e))?;
        Ok(())
    }

    async fn begin(&self) -> StoreResult<Transaction<'static, Postgres>> {
        self.pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin_transaction", e))
    }
}

/// Postgres keeps microseconds; truncate up front so returned values match
/// what a later read sees.
fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

async fn abort<T>(tx: Transaction<'_, Postgres>, err: impl Into<StoreError>) -> StoreResult<T> {
    tx.rollback()
        .await
        .map_err(|e| map_sqlx_error("rollback", e))?;
    Err(err.into())
}

async fn commit(tx: Transaction<'_, Postgres>) -> StoreResult<()> {
    tx.commit()
        .await
        .map_err(|e| map_sqlx_error("commit", e))
}

fn sqlstate(err: &sqlx::Error) -> Option<String> {
    match err {
        sqlx::Error::Database(db_err) => db_err.code().map(|c| c.into_owned()),
        _ => None,
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    sqlstate(err).as_deref() == Some("23505")
}

fn is_foreign_key_violation(err: &sqlx::Error) -> bool {
    sqlstate(err).as_deref() == Some("23503")
}

/// Map SQLx errors into store errors, keeping rule violations distinguishable
/// from backend failures.
pub(crate) fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) => {
            let msg = format!("database error in {}: {}", operation, db_err.message());
            match db_err.code().as_deref() {
                Some("23505") => DomainError::conflict(msg).into(),
                Some("23503") => DomainError::validation("reference", msg).into(),
                Some("23514") => DomainError::validation("value", msg).into(),
                _ => StoreError::StorageUnavailable(msg),
            }
        }
        other => StoreError::StorageUnavailable(format!("{operation}: {other}")),
    }
}

fn like_pattern(needle: &str) -> String {
    let escaped = needle
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}

// ---------------------------------------------------------------------------
// Rows
// ---------------------------------------------------------------------------

#[derive(Debug, FromRow)]
struct UserRow {
    id: Uuid,
    username: String,
    created_at: DateTime<Utc>,
}

impl From<UserRow> for UserAccount {
    fn from(row: UserRow) -> Self {
        UserAccount {
            id: UserId::from_uuid(row.id),
            username: row.username,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, FromRow)]
struct SettingsRow {
    currency: String,
    locale: String,
    low_stock_alerts: bool,
    updated_at: Option<DateTime<Utc>>,
}

impl From<SettingsRow> for UserSettings {
    fn from(row: SettingsRow) -> Self {
        UserSettings {
            currency: row.currency,
            locale: row.locale,
            low_stock_alerts: row.low_stock_alerts,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, FromRow)]
struct ZoneRow {
    id: Uuid,
    name: String,
    description: Option<String>,
    capacity: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<ZoneRow> for Zone {
    fn from(row: ZoneRow) -> Self {
        Zone {
            id: ZoneId::from_uuid(row.id),
            name: row.name,
            description: row.description,
            capacity: row.capacity,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, FromRow)]
struct ProductRow {
    id: Uuid,
    product_code: String,
    name: String,
    description: Option<String>,
    category: String,
    zone_id: Option<Uuid>,
    current_stock: i64,
    min_stock: i64,
    unit_price: i64,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Product {
            id: ProductId::from_uuid(row.id),
            product_code: row.product_code,
            name: row.name,
            description: row.description,
            category: row.category,
            zone_id: row.zone_id.map(ZoneId::from_uuid),
            current_stock: row.current_stock,
            min_stock: row.min_stock,
            unit_price: row.unit_price,
            is_active: row.is_active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, FromRow)]
struct MovementRow {
    id: Uuid,
    product_id: Uuid,
    movement_type: String,
    quantity: i64,
    previous_stock: i64,
    new_stock: i64,
    reason: Option<String>,
    user_id: Option<Uuid>,
    created_at: DateTime<Utc>,
    product_code: String,
    product_name: String,
    username: Option<String>,
}

impl TryFrom<MovementRow> for MovementEntry {
    type Error = StoreError;

    fn try_from(row: MovementRow) -> Result<Self, Self::Error> {
        let kind: MovementType = row.movement_type.parse().map_err(|_| {
            StoreError::StorageUnavailable(format!(
                "movement {} has unknown type '{}'",
                row.id, row.movement_type
            ))
        })?;
        let product_id = ProductId::from_uuid(row.product_id);
        let user_id = row.user_id.map(UserId::from_uuid);

        Ok(MovementEntry {
            movement: Movement {
                id: MovementId::from_uuid(row.id),
                product_id,
                kind,
                quantity: row.quantity,
                previous_stock: row.previous_stock,
                new_stock: row.new_stock,
                reason: row.reason,
                user_id,
                created_at: row.created_at,
            },
            product: ProductSummary {
                id: product_id,
                product_code: row.product_code,
                name: row.product_name,
            },
            user: user_id
                .zip(row.username)
                .map(|(id, username)| UserSummary { id, username }),
        })
    }
}

// ---------------------------------------------------------------------------
// Statements shared between operations
// ---------------------------------------------------------------------------

async fn lock_product(
    tx: &mut Transaction<'_, Postgres>,
    id: ProductId,
) -> StoreResult<Option<Product>> {
    let row = sqlx::query_as::<_, ProductRow>(concat!(
        "SELECT ",
        product_columns!(),
        " FROM products WHERE id = $1 FOR UPDATE"
    ))
    .bind(id.as_uuid())
    .fetch_optional(&mut **tx)
    .await
    .map_err(|e| map_sqlx_error("lock_product", e))?;
    Ok(row.map(Product::from))
}

async fn zone_exists(tx: &mut Transaction<'_, Postgres>, id: ZoneId) -> StoreResult<bool> {
    sqlx::query_scalar::<_, bool>("SELECT EXISTS (SELECT 1 FROM zones WHERE id = $1)")
        .bind(id.as_uuid())
        .fetch_one(&mut **tx)
        .await
        .map_err(|e| map_sqlx_error("zone_exists", e))
}

async fn insert_movement(
    tx: &mut Transaction<'_, Postgres>,
    movement: &Movement,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO movements (
            id, product_id, movement_type, quantity, previous_stock, new_stock,
            reason, user_id, created_at
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        "#,
    )
    .bind(movement.id.as_uuid())
    .bind(movement.product_id.as_uuid())
    .bind(movement.kind.as_str())
    .bind(movement.quantity)
    .bind(movement.previous_stock)
    .bind(movement.new_stock)
    .bind(movement.reason.as_deref())
    .bind(movement.user_id.map(Uuid::from))
    .bind(movement.created_at)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

fn push_status_condition(qb: &mut QueryBuilder<'_, Postgres>, status: StockStatus) {
    qb.push(match status {
        StockStatus::OutOfStock => " AND current_stock = 0",
        StockStatus::LowStock => " AND current_stock > 0 AND current_stock <= min_stock",
        StockStatus::InStock => " AND current_stock > 0 AND current_stock > min_stock",
    });
}

#[async_trait]
impl InventoryStore for PostgresInventoryStore {
    #[instrument(skip(self), err)]
    async fn ensure_user(&self, user_id: UserId, username: &str) -> StoreResult<UserAccount> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            INSERT INTO users (id, username, created_at)
            VALUES ($1, $2, $3)
            ON CONFLICT (id) DO UPDATE SET username = EXCLUDED.username
            RETURNING id, username, created_at
            "#,
        )
        .bind(user_id.as_uuid())
        .bind(username)
        .bind(now())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("ensure_user", e))?;
        Ok(row.into())
    }

    async fn get_settings(&self, user_id: UserId) -> StoreResult<UserSettings> {
        let row = sqlx::query_as::<_, SettingsRow>(
            "SELECT currency, locale, low_stock_alerts, updated_at FROM user_settings WHERE user_id = $1",
        )
        .bind(user_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("get_settings", e))?;
        Ok(row.map(UserSettings::from).unwrap_or_default())
    }

    #[instrument(skip(self, update), fields(user_id = %user_id), err)]
    async fn update_settings(
        &self,
        user_id: UserId,
        update: SettingsUpdate,
    ) -> StoreResult<UserSettings> {
        let mut tx = self.begin().await?;

        let current = sqlx::query_as::<_, SettingsRow>(
            "SELECT currency, locale, low_stock_alerts, updated_at FROM user_settings WHERE user_id = $1 FOR UPDATE",
        )
        .bind(user_id.as_uuid())
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("load_settings", e))?;

        let mut settings = current.map(UserSettings::from).unwrap_or_default();
        if let Err(e) = settings.apply(update, now()) {
            return abort(tx, e).await;
        }

        let saved = sqlx::query(
            r#"
            INSERT INTO user_settings (user_id, currency, locale, low_stock_alerts, updated_at)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (user_id) DO UPDATE SET
                currency = EXCLUDED.currency,
                locale = EXCLUDED.locale,
                low_stock_alerts = EXCLUDED.low_stock_alerts,
                updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(user_id.as_uuid())
        .bind(&settings.currency)
        .bind(&settings.locale)
        .bind(settings.low_stock_alerts)
        .bind(settings.updated_at)
        .execute(&mut *tx)
        .await;

        match saved {
            Ok(_) => {}
            Err(e) if is_foreign_key_violation(&e) => return abort(tx, unknown_user()).await,
            Err(e) => return Err(map_sqlx_error("save_settings", e)),
        }

        commit(tx).await?;
        Ok(settings)
    }

    async fn list_zones(&self) -> StoreResult<Vec<Zone>> {
        let rows = sqlx::query_as::<_, ZoneRow>(concat!(
            "SELECT ",
            zone_columns!(),
            r#" FROM zones ORDER BY name COLLATE "C", id"#
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_zones", e))?;
        Ok(rows.into_iter().map(Zone::from).collect())
    }

    async fn get_zone(&self, id: ZoneId) -> StoreResult<Zone> {
        let row = sqlx::query_as::<_, ZoneRow>(concat!(
            "SELECT ",
            zone_columns!(),
            " FROM zones WHERE id = $1"
        ))
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("get_zone", e))?;
        row.map(Zone::from)
            .ok_or_else(|| DomainError::not_found("zone", id).into())
    }

    #[instrument(skip(self, new), err)]
    async fn create_zone(&self, new: NewZone) -> StoreResult<Zone> {
        let zone = Zone::create(new, now())?;
        sqlx::query(
            r#"
            INSERT INTO zones (id, name, description, capacity, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(zone.id.as_uuid())
        .bind(&zone.name)
        .bind(zone.description.as_deref())
        .bind(zone.capacity)
        .bind(zone.created_at)
        .bind(zone.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("create_zone", e))?;
        Ok(zone)
    }

    #[instrument(skip(self, patch), fields(zone_id = %id), err)]
    async fn update_zone(&self, id: ZoneId, patch: ZonePatch) -> StoreResult<Zone> {
        let mut tx = self.begin().await?;
        let row = sqlx::query_as::<_, ZoneRow>(concat!(
            "SELECT ",
            zone_columns!(),
            " FROM zones WHERE id = $1 FOR UPDATE"
        ))
        .bind(id.as_uuid())
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("lock_zone", e))?;

        let Some(row) = row else {
            return abort(tx, DomainError::not_found("zone", id)).await;
        };
        let mut zone = Zone::from(row);
        if let Err(e) = zone.apply_patch(patch, now()) {
            return abort(tx, e).await;
        }

        sqlx::query(
            "UPDATE zones SET name = $2, description = $3, capacity = $4, updated_at = $5 WHERE id = $1",
        )
        .bind(zone.id.as_uuid())
        .bind(&zone.name)
        .bind(zone.description.as_deref())
        .bind(zone.capacity)
        .bind(zone.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("update_zone", e))?;

        commit(tx).await?;
        Ok(zone)
    }

    #[instrument(skip(self), fields(zone_id = %id), err)]
    async fn delete_zone(&self, id: ZoneId) -> StoreResult<()> {
        let mut tx = self.begin().await?;

        // Locking the zone row blocks concurrent product inserts/updates that
        // reference it until this transaction ends.
        let locked = sqlx::query_scalar::<_, Uuid>("SELECT id FROM zones WHERE id = $1 FOR UPDATE")
            .bind(id.as_uuid())
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("lock_zone", e))?;
        if locked.is_none() {
            return abort(tx, DomainError::not_found("zone", id)).await;
        }

        let active = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM products WHERE zone_id = $1 AND is_active",
        )
        .bind(id.as_uuid())
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("count_zone_products", e))?;
        if active > 0 {
            return abort(tx, zone_in_use(active)).await;
        }

        sqlx::query("UPDATE products SET zone_id = NULL, updated_at = $2 WHERE zone_id = $1")
            .bind(id.as_uuid())
            .bind(now())
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("unassign_zone", e))?;

        sqlx::query("DELETE FROM zones WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("delete_zone", e))?;

        commit(tx).await
    }

    async fn get_product(&self, id: ProductId) -> StoreResult<Product> {
        let row = sqlx::query_as::<_, ProductRow>(concat!(
            "SELECT ",
            product_columns!(),
            " FROM products WHERE id = $1"
        ))
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("get_product", e))?;
        row.map(Product::from)
            .ok_or_else(|| DomainError::not_found("product", id).into())
    }

    #[instrument(skip(self), err)]
    async fn find_products(&self, filter: &ProductFilter) -> StoreResult<Vec<Product>> {
        let mut qb: QueryBuilder<'_, Postgres> = QueryBuilder::new(concat!(
            "SELECT ",
            product_columns!(),
            " FROM products WHERE is_active"
        ));

        if let Some(category) = &filter.category {
            qb.push(" AND category = ").push_bind(category.clone());
        }
        if let Some(zone_id) = filter.zone_id {
            qb.push(" AND zone_id = ").push_bind(Uuid::from(zone_id));
        }
        if let Some(status) = filter.status {
            push_status_condition(&mut qb, status);
        }
        if let Some(search) = &filter.search {
            let pattern = like_pattern(search);
            qb.push(" AND (name ILIKE ")
                .push_bind(pattern.clone())
                .push(" OR product_code ILIKE ")
                .push_bind(pattern.clone())
                .push(" OR category ILIKE ")
                .push_bind(pattern)
                .push(")");
        }
        qb.push(r#" ORDER BY name COLLATE "C", product_code COLLATE "C""#);

        let rows = qb
            .build_query_as::<ProductRow>()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("find_products", e))?;
        Ok(rows.into_iter().map(Product::from).collect())
    }

    #[instrument(skip(self, new), fields(product_code = %new.product_code), err)]
    async fn create_product(
        &self,
        new: NewProduct,
        created_by: Option<UserId>,
    ) -> StoreResult<CreatedProduct> {
        let (product, initial_movement) = Product::create(new, created_by, now())?;

        let mut tx = self.begin().await?;
        if let Some(zone_id) = product.zone_id {
            if !zone_exists(&mut tx, zone_id).await? {
                return abort(tx, unknown_zone()).await;
            }
        }

        let inserted = sqlx::query(
            r#"
            INSERT INTO products (
                id, product_code, name, description, category, zone_id,
                current_stock, min_stock, unit_price, is_active, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            "#,
        )
        .bind(product.id.as_uuid())
        .bind(&product.product_code)
        .bind(&product.name)
        .bind(product.description.as_deref())
        .bind(&product.category)
        .bind(product.zone_id.map(Uuid::from))
        .bind(product.current_stock)
        .bind(product.min_stock)
        .bind(product.unit_price)
        .bind(product.is_active)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&mut *tx)
        .await;

        match inserted {
            Ok(_) => {}
            Err(e) if is_unique_violation(&e) => {
                return abort(tx, product_code_taken(&product.product_code)).await;
            }
            Err(e) if is_foreign_key_violation(&e) => return abort(tx, unknown_zone()).await,
            Err(e) => return Err(map_sqlx_error("insert_product", e)),
        }

        if let Some(movement) = &initial_movement {
            match insert_movement(&mut tx, movement).await {
                Ok(()) => {}
                Err(e) if is_foreign_key_violation(&e) => return abort(tx, unknown_user()).await,
                Err(e) => return Err(map_sqlx_error("insert_initial_movement", e)),
            }
        }

        commit(tx).await?;
        Ok(CreatedProduct {
            product,
            initial_movement,
        })
    }

    #[instrument(skip(self, patch), fields(product_id = %id), err)]
    async fn update_product(&self, id: ProductId, patch: ProductPatch) -> StoreResult<Product> {
        let mut tx = self.begin().await?;
        let Some(mut product) = lock_product(&mut tx, id).await? else {
            return abort(tx, DomainError::not_found("product", id)).await;
        };

        let previous_zone = product.zone_id;
        if let Err(e) = product.apply_patch(patch, now()) {
            return abort(tx, e).await;
        }
        if let Some(zone_id) = product.zone_id.filter(|z| Some(*z) != previous_zone) {
            if !zone_exists(&mut tx, zone_id).await? {
                return abort(tx, unknown_zone()).await;
            }
        }

        let updated = sqlx::query(
            r#"
            UPDATE products SET
                product_code = $2, name = $3, description = $4, category = $5,
                zone_id = $6, min_stock = $7, unit_price = $8, updated_at = $9
            WHERE id = $1
            "#,
        )
        .bind(product.id.as_uuid())
        .bind(&product.product_code)
        .bind(&product.name)
        .bind(product.description.as_deref())
        .bind(&product.category)
        .bind(product.zone_id.map(Uuid::from))
        .bind(product.min_stock)
        .bind(product.unit_price)
        .bind(product.updated_at)
        .execute(&mut *tx)
        .await;

        match updated {
            Ok(_) => {}
            Err(e) if is_unique_violation(&e) => {
                return abort(tx, product_code_taken(&product.product_code)).await;
            }
            Err(e) if is_foreign_key_violation(&e) => return abort(tx, unknown_zone()).await,
            Err(e) => return Err(map_sqlx_error("update_product", e)),
        }

        commit(tx).await?;
        Ok(product)
    }

    #[instrument(skip(self), fields(product_id = %id), err)]
    async fn deactivate_product(&self, id: ProductId) -> StoreResult<Product> {
        let row = sqlx::query_as::<_, ProductRow>(concat!(
            "UPDATE products SET is_active = FALSE, updated_at = $2 WHERE id = $1 RETURNING ",
            product_columns!()
        ))
        .bind(id.as_uuid())
        .bind(now())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("deactivate_product", e))?;
        row.map(Product::from)
            .ok_or_else(|| DomainError::not_found("product", id).into())
    }

    #[instrument(
        skip(self, request),
        fields(product_id = %request.product_id, kind = %request.kind, quantity = request.quantity),
        err
    )]
    async fn apply_movement(&self, request: &StockMovementRequest) -> StoreResult<AppliedMovement> {
        let mut tx = self.begin().await?;

        let Some(mut product) = lock_product(&mut tx, request.product_id).await? else {
            return abort(tx, DomainError::not_found("product", request.product_id)).await;
        };

        let change = match StockChange::plan(product.current_stock, request.quantity, request.kind)
        {
            Ok(change) => change,
            Err(e) => return abort(tx, e).await,
        };

        let at = now();
        product.apply_stock_change(&change, at);

        sqlx::query("UPDATE products SET current_stock = $2, updated_at = $3 WHERE id = $1")
            .bind(product.id.as_uuid())
            .bind(product.current_stock)
            .bind(product.updated_at)
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("update_stock", e))?;

        let movement = Movement::record(product.id, change, request.reason.clone(), request.user_id, at);
        match insert_movement(&mut tx, &movement).await {
            Ok(()) => {}
            Err(e) if is_foreign_key_violation(&e) => return abort(tx, unknown_user()).await,
            Err(e) => return Err(map_sqlx_error("insert_movement", e)),
        }

        commit(tx).await?;
        Ok(AppliedMovement { product, movement })
    }

    #[instrument(skip(self), err)]
    async fn list_movements(&self, query: &MovementQuery) -> StoreResult<Vec<MovementEntry>> {
        let rows = sqlx::query_as::<_, MovementRow>(
            r#"
            SELECT
                m.id, m.product_id, m.movement_type, m.quantity, m.previous_stock,
                m.new_stock, m.reason, m.user_id, m.created_at,
                p.product_code, p.name AS product_name, u.username
            FROM movements m
            JOIN products p ON p.id = m.product_id
            LEFT JOIN users u ON u.id = m.user_id
            WHERE ($1::uuid IS NULL OR m.product_id = $1)
            ORDER BY m.created_at DESC, m.id DESC
            LIMIT $2
            "#,
        )
        .bind(query.product_id.map(Uuid::from))
        .bind(query.limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_movements", e))?;

        rows.into_iter().map(MovementEntry::try_from).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("bolt"), "%bolt%");
        assert_eq!(like_pattern("50%_off"), "%50\\%\\_off%");
        assert_eq!(like_pattern("a\\b"), "%a\\\\b%");
    }

    #[test]
    fn non_database_errors_are_storage_failures() {
        let err = map_sqlx_error("get_product", sqlx::Error::PoolTimedOut);
        assert!(matches!(err, StoreError::StorageUnavailable(ref msg) if msg.starts_with("get_product")));
    }
}
