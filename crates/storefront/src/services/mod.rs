//! Business services for the storefront.

pub mod checkout;

pub use checkout::{CheckoutService, PlacedOrder};
