//! Three-way stock classification.

use core::str::FromStr;

use serde::{Deserialize, Serialize};
use stockyard_core::DomainError;

/// Stock status derived from `current_stock` and `min_stock`.
///
/// The same classification backs filtering, dashboard counts and product
/// responses, so it must only ever be computed through [`StockStatus::classify`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StockStatus {
    InStock,
    LowStock,
    OutOfStock,
}

impl StockStatus {
    /// `out_of_stock` at zero, `low_stock` up to and including `min_stock`.
    pub fn classify(current_stock: i64, min_stock: i64) -> Self {
        if current_stock <= 0 {
            StockStatus::OutOfStock
        } else if current_stock <= min_stock {
            StockStatus::LowStock
        } else {
            StockStatus::InStock
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StockStatus::InStock => "in_stock",
            StockStatus::LowStock => "low_stock",
            StockStatus::OutOfStock => "out_of_stock",
        }
    }
}

impl core::fmt::Display for StockStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StockStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "in_stock" => Ok(StockStatus::InStock),
            "low_stock" => Ok(StockStatus::LowStock),
            "out_of_stock" => Ok(StockStatus::OutOfStock),
            _ => Err(DomainError::validation(
                "status",
                "must be one of: in_stock, low_stock, out_of_stock",
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equality_with_min_stock_counts_as_low() {
        assert_eq!(StockStatus::classify(10, 10), StockStatus::LowStock);
    }

    #[test]
    fn above_min_stock_is_in_stock() {
        assert_eq!(StockStatus::classify(11, 10), StockStatus::InStock);
    }

    #[test]
    fn zero_is_out_of_stock_regardless_of_min() {
        assert_eq!(StockStatus::classify(0, 0), StockStatus::OutOfStock);
        assert_eq!(StockStatus::classify(0, 50), StockStatus::OutOfStock);
    }

    #[test]
    fn zero_min_stock_never_reports_low() {
        assert_eq!(StockStatus::classify(1, 0), StockStatus::InStock);
    }

    #[test]
    fn parses_query_spellings() {
        assert_eq!("low_stock".parse::<StockStatus>().unwrap(), StockStatus::LowStock);
        assert_eq!("Out-Of-Stock".parse::<StockStatus>().unwrap(), StockStatus::OutOfStock);
        assert!("plenty".parse::<StockStatus>().is_err());
    }
}
