//! Order domain types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use vastra_core::{CurrencyCode, OrderId, OrderStatus, ProductId, TxnId, UserId};

use super::address::AddressSnapshot;

/// A persisted order.
///
/// Exactly one order may exist per gateway transaction id; the storage
/// layer enforces this with a unique constraint on `payu_txn_id`.
#[derive(Debug, Clone, Serialize)]
pub struct Order {
    /// Unique order ID.
    pub id: OrderId,
    /// Owning user.
    pub user_id: UserId,
    /// Line items with prices captured at purchase time.
    pub items: Vec<OrderItem>,
    /// Order total (sum of unit price x quantity over all items).
    pub amount: Decimal,
    /// Currency of `amount`.
    pub currency: CurrencyCode,
    /// Payment status; `paid` on the success path.
    pub status: OrderStatus,
    /// Gateway transaction id (unique key for idempotence).
    pub payu_txn_id: TxnId,
    /// Gateway payment reference (`mihpayid` or bank reference), if sent.
    pub payu_payment_id: Option<String>,
    /// The verified callback digest, captured for audit.
    pub payu_hash: Option<String>,
    /// Shipping address snapshot, copied by value at creation time.
    pub shipping_address: Option<AddressSnapshot>,
    /// When the order was created.
    pub created_at: DateTime<Utc>,
}

/// One order line with the unit price at purchase time.
///
/// `unit_price` is captured, not referenced: later catalog repricing must
/// not change what the buyer was charged.
#[derive(Debug, Clone, Serialize)]
pub struct OrderItem {
    /// The purchased product.
    pub product_id: ProductId,
    /// How many units.
    pub quantity: i32,
    /// Price per unit at purchase time.
    pub unit_price: Decimal,
}
