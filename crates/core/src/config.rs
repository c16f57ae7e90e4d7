//! Index configuration via TOML
//!
//! Reading the file is the caller's business; this module only parses and
//! validates the content.

use crate::error::{IndexError, IndexResult};
use serde::{Deserialize, Serialize};

/// Upper bound for `indexed_price_places`; 10^9 still fits an `i32` multiplier.
pub const MAX_INDEXED_PRICE_PLACES: u32 = 9;

/// Tunables of the indexing layer.
///
/// # Example
///
/// ```toml
/// # Decimal places kept when a price is converted to its fixed-point form
/// indexed_price_places = 2
///
/// # First internal price id handed out by a new super price index
/// first_internal_price_id = 1
///
/// # Fail commits that leave overlay layers behind (otherwise only warn)
/// fail_on_unconsumed_layers = true
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexConfig {
    /// Decimal places preserved in fixed-point prices
    #[serde(default = "default_indexed_price_places")]
    pub indexed_price_places: u32,
    /// First value drawn from a fresh internal price id sequence
    #[serde(default = "default_first_internal_price_id")]
    pub first_internal_price_id: u32,
    /// Whether leftover overlay layers make commit fail
    #[serde(default = "default_fail_on_unconsumed_layers")]
    pub fail_on_unconsumed_layers: bool,
}

fn default_indexed_price_places() -> u32 {
    2
}

fn default_first_internal_price_id() -> u32 {
    1
}

fn default_fail_on_unconsumed_layers() -> bool {
    true
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            indexed_price_places: default_indexed_price_places(),
            first_internal_price_id: default_first_internal_price_id(),
            fail_on_unconsumed_layers: default_fail_on_unconsumed_layers(),
        }
    }
}

impl IndexConfig {
    /// Parse and validate a TOML document
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` for malformed TOML or out-of-range values.
    pub fn from_toml_str(content: &str) -> IndexResult<Self> {
        let config: IndexConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Check value ranges
    pub fn validate(&self) -> IndexResult<()> {
        if self.indexed_price_places > MAX_INDEXED_PRICE_PLACES {
            return Err(IndexError::InvalidConfig(format!(
                "indexed_price_places must be at most {}, got {}",
                MAX_INDEXED_PRICE_PLACES, self.indexed_price_places
            )));
        }
        Ok(())
    }

    /// Convert a decimal price to the fixed-point integer stored in price records
    ///
    /// # Errors
    ///
    /// `PriceOutOfRange` when the scaled price is not finite or doesn't fit an `i32`.
    pub fn to_indexed_price(&self, price: f64) -> IndexResult<i32> {
        let places = i32::try_from(self.indexed_price_places)
            .map_err(|_| IndexError::PriceOutOfRange(price))?;
        let scaled = (price * 10f64.powi(places)).round();
        if !scaled.is_finite() || scaled < f64::from(i32::MIN) || scaled > f64::from(i32::MAX) {
            return Err(IndexError::PriceOutOfRange(price));
        }
        Ok(scaled as i32)
    }
}
