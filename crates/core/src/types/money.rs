//! Currency codes and the catalog pricing rule.
//!
//! All monetary arithmetic uses [`rust_decimal::Decimal`]; floats never
//! touch a price.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// ISO 4217 currency codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CurrencyCode {
    #[default]
    INR,
    USD,
    EUR,
    GBP,
}

impl CurrencyCode {
    /// The ISO 4217 code as a string.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::INR => "INR",
            Self::USD => "USD",
            Self::EUR => "EUR",
            Self::GBP => "GBP",
        }
    }
}

impl std::fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for CurrencyCode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "INR" => Ok(Self::INR),
            "USD" => Ok(Self::USD),
            "EUR" => Ok(Self::EUR),
            "GBP" => Ok(Self::GBP),
            _ => Err(format!("invalid currency code: {s}")),
        }
    }
}

/// Derive a unit selling price from MRP and a percentage discount.
///
/// The rule is `round(mrp - mrp * discount_percent / 100)` with rounding
/// half away from zero (matching how the catalog has always derived
/// displayed prices). Absent inputs are passed as `None` and treated as
/// zero; the result is clamped to zero so a corrupt discount can never
/// produce a negative price.
#[must_use]
pub fn discounted_unit_price(mrp: Option<Decimal>, discount_percent: Option<Decimal>) -> Decimal {
    let mrp = mrp.unwrap_or(Decimal::ZERO);
    let discount = discount_percent.unwrap_or(Decimal::ZERO);

    let price = (mrp - mrp * discount / Decimal::ONE_HUNDRED)
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);

    price.max(Decimal::ZERO)
}
