//! Inventory domain module.
//!
//! This crate contains business rules for the warehouse, implemented purely as
//! deterministic domain logic (no IO, no HTTP, no storage): the stock ledger
//! rule, stock classification, product filtering and dashboard metric
//! computation. Store backends call into it so every backend enforces the same
//! arithmetic.

pub mod filter;
pub mod metrics;
pub mod movement;
pub mod product;
pub mod status;
pub mod user;
pub mod zone;

mod text;

pub use filter::ProductFilter;
pub use metrics::{DashboardMetrics, RECENT_ACTIVITY_LIMIT, ZoneStatus};
pub use movement::{
    INITIAL_STOCK_REASON, Movement, MovementEntry, MovementQuery, MovementType, StockChange,
    StockMovementRequest,
};
pub use product::{NewProduct, Product, ProductPatch, ProductSummary};
pub use status::StockStatus;
pub use user::{SettingsUpdate, UserAccount, UserSettings, UserSummary};
pub use zone::{NewZone, Zone, ZonePatch};
