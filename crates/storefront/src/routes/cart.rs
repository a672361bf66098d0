//! Cart route handlers.
//!
//! All cart endpoints require an authenticated session; the cart is keyed
//! by user, one per user.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use vastra_core::ProductId;

use crate::db::{CartRepository, ProductRepository};
use crate::error::{AppError, Result};
use crate::middleware::RequireAuth;
use crate::models::Cart;
use crate::routes::products::ProductView;
use crate::services::CheckoutService;
use crate::state::AppState;

/// One cart line as served to clients.
#[derive(Debug, Serialize)]
pub struct CartLineView {
    pub product: ProductView,
    pub quantity: i32,
    pub line_total: Decimal,
}

/// Cart as served to clients.
#[derive(Debug, Serialize)]
pub struct CartView {
    pub items: Vec<CartLineView>,
    pub total: Decimal,
}

impl CartView {
    fn empty() -> Self {
        Self {
            items: Vec::new(),
            total: Decimal::ZERO,
        }
    }
}

impl From<Cart> for CartView {
    fn from(cart: Cart) -> Self {
        let priced = CheckoutService::price_items(&cart);
        let total = CheckoutService::order_total(&priced);
        let items = cart
            .items
            .into_iter()
            .zip(priced)
            .map(|(line, priced_line)| CartLineView {
                line_total: priced_line.unit_price * Decimal::from(priced_line.quantity),
                quantity: line.quantity,
                product: ProductView::from(line.product),
            })
            .collect();
        Self { items, total }
    }
}

/// `GET /api/cart` - current user's cart with priced lines.
pub async fn show(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<CartView>> {
    let cart = CartRepository::new(state.pool()).get_by_user(user.id).await?;
    Ok(Json(cart.map_or_else(CartView::empty, CartView::from)))
}

/// Request body for adding a cart line.
#[derive(Debug, Deserialize)]
pub struct AddItemRequest {
    pub product_id: i32,
    #[serde(default = "default_quantity")]
    pub quantity: i32,
}

const fn default_quantity() -> i32 {
    1
}

/// `POST /api/cart/items` - add or merge a line.
pub async fn add_item(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Json(req): Json<AddItemRequest>,
) -> Result<(StatusCode, Json<CartView>)> {
    if req.quantity <= 0 {
        return Err(AppError::Validation(
            "Quantity must be a positive integer".to_string(),
        ));
    }

    let product_id = ProductId::new(req.product_id);

    // Reject unknown products up front instead of bubbling a FK violation
    ProductRepository::new(state.pool())
        .get_by_id(product_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("product {}", req.product_id)))?;

    let carts = CartRepository::new(state.pool());
    carts.add_item(user.id, product_id, req.quantity).await?;

    let cart = carts
        .get_by_user(user.id)
        .await?
        .ok_or_else(|| AppError::Internal("cart missing after insert".to_string()))?;
    Ok((StatusCode::CREATED, Json(CartView::from(cart))))
}

/// `DELETE /api/cart/items/{product_id}` - remove a line. No-op when the
/// line is absent.
pub async fn remove_item(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(product_id): Path<i32>,
) -> Result<Json<CartView>> {
    let carts = CartRepository::new(state.pool());
    carts.remove_item(user.id, ProductId::new(product_id)).await?;

    let cart = carts.get_by_user(user.id).await?;
    Ok(Json(cart.map_or_else(CartView::empty, CartView::from)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use vastra_core::{CartId, UserId};

    use crate::models::{CartItem, Product};

    #[test]
    fn test_cart_view_totals() {
        let cart = Cart {
            id: CartId::new(1),
            user_id: UserId::new(1),
            items: vec![
                CartItem {
                    product: Product {
                        id: ProductId::new(1),
                        title: "Saree".to_string(),
                        mrp: Some(dec!(999)),
                        discount_percent: Some(dec!(20)),
                        selling_price: None,
                        description: None,
                        category: "Sarees".to_string(),
                    },
                    quantity: 2,
                },
                CartItem {
                    product: Product {
                        id: ProductId::new(2),
                        title: "Kurta".to_string(),
                        mrp: None,
                        discount_percent: None,
                        selling_price: Some(dec!(450)),
                        description: None,
                        category: "Kurtas".to_string(),
                    },
                    quantity: 1,
                },
            ],
        };

        let view = CartView::from(cart);
        assert_eq!(view.items.len(), 2);
        assert_eq!(view.items[0].line_total, dec!(1598));
        assert_eq!(view.items[1].line_total, dec!(450));
        assert_eq!(view.total, dec!(2048));
    }

    #[test]
    fn test_empty_cart_view() {
        let view = CartView::empty();
        assert!(view.items.is_empty());
        assert_eq!(view.total, Decimal::ZERO);
    }
}
