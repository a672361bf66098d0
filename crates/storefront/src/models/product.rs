//! Product domain types.

use rust_decimal::Decimal;
use serde::Serialize;

use vastra_core::{ProductId, discounted_unit_price};

/// A catalog product.
///
/// Pricing has two sources: an explicit `selling_price` set by
/// merchandising, or a derived price from `mrp` minus `discount_percent`.
/// [`Product::unit_price`] applies the precedence rule used everywhere a
/// price is charged or displayed.
#[derive(Debug, Clone, Serialize)]
pub struct Product {
    /// Unique product ID.
    pub id: ProductId,
    /// Product title.
    pub title: String,
    /// Maximum retail price.
    pub mrp: Option<Decimal>,
    /// Discount in percent (0-100).
    pub discount_percent: Option<Decimal>,
    /// Explicit selling price; overrides the mrp/discount derivation.
    pub selling_price: Option<Decimal>,
    /// Longer description.
    pub description: Option<String>,
    /// Category label.
    pub category: String,
}

impl Product {
    /// The price one unit sells for.
    ///
    /// Uses the explicit selling price when present, otherwise
    /// `round(mrp - mrp * discount_percent / 100)` with absent inputs
    /// treated as zero.
    #[must_use]
    pub fn unit_price(&self) -> Decimal {
        self.selling_price
            .unwrap_or_else(|| discounted_unit_price(self.mrp, self.discount_percent))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn product(
        mrp: Option<Decimal>,
        discount: Option<Decimal>,
        selling: Option<Decimal>,
    ) -> Product {
        Product {
            id: ProductId::new(1),
            title: "Silk Kurti".to_string(),
            mrp,
            discount_percent: discount,
            selling_price: selling,
            description: None,
            category: "Kurtis".to_string(),
        }
    }

    #[test]
    fn test_unit_price_prefers_selling_price() {
        let p = product(Some(dec!(999)), Some(dec!(20)), Some(dec!(850)));
        assert_eq!(p.unit_price(), dec!(850));
    }

    #[test]
    fn test_unit_price_derives_from_mrp() {
        let p = product(Some(dec!(999)), Some(dec!(20)), None);
        assert_eq!(p.unit_price(), dec!(799));
    }

    #[test]
    fn test_unit_price_missing_inputs_clamp_to_zero() {
        let p = product(None, None, None);
        assert_eq!(p.unit_price(), Decimal::ZERO);
    }
}
