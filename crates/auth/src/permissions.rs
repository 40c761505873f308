use std::borrow::Cow;

use serde::{Deserialize, Serialize};

/// Permission identifier (e.g. `"stock.adjust"`).
///
/// The wildcard `"*"` grants everything and is only handed out to admins.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Permission(Cow<'static, str>);

impl Permission {
    pub const WILDCARD: Permission = Permission(Cow::Borrowed("*"));
    pub const PRODUCTS_CREATE: Permission = Permission(Cow::Borrowed("products.create"));
    pub const PRODUCTS_UPDATE: Permission = Permission(Cow::Borrowed("products.update"));
    pub const PRODUCTS_DELETE: Permission = Permission(Cow::Borrowed("products.delete"));
    pub const STOCK_ADJUST: Permission = Permission(Cow::Borrowed("stock.adjust"));
    pub const ZONES_MANAGE: Permission = Permission(Cow::Borrowed("zones.manage"));

    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_wildcard(&self) -> bool {
        self.as_str() == "*"
    }
}

impl core::fmt::Display for Permission {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}
