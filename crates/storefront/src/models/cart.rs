//! Cart domain types.

use vastra_core::{CartId, ProductId, UserId};

use super::product::Product;

/// A user's cart: an ordered list of product/quantity lines.
///
/// A cart is never assumed stable between payment initiation and the
/// gateway callback - the buyer can keep editing it. Reconciliation prices
/// whatever the cart holds at order-creation time.
#[derive(Debug, Clone)]
pub struct Cart {
    /// Unique cart ID.
    pub id: CartId,
    /// Owning user.
    pub user_id: UserId,
    /// Line items in insertion order.
    pub items: Vec<CartItem>,
}

impl Cart {
    /// Whether the cart has no line items.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// One cart line: a product and how many of it.
#[derive(Debug, Clone)]
pub struct CartItem {
    /// The product, loaded with its pricing fields.
    pub product: Product,
    /// How many units.
    pub quantity: i32,
}

impl CartItem {
    /// The product this line refers to.
    #[must_use]
    pub const fn product_id(&self) -> ProductId {
        self.product.id
    }
}
