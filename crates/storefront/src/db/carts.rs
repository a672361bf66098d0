//! Cart repository for database operations.
//!
//! One cart per user. Line items join their product so callers get pricing
//! fields without a second round trip.

use rust_decimal::Decimal;
use sqlx::PgPool;

use vastra_core::{CartId, ProductId, UserId};

use super::RepositoryError;
use crate::models::{Cart, CartItem, Product};

#[derive(sqlx::FromRow)]
struct CartItemRow {
    product_id: i32,
    quantity: i32,
    title: String,
    mrp: Option<Decimal>,
    discount_percent: Option<Decimal>,
    selling_price: Option<Decimal>,
    description: Option<String>,
    category: String,
}

impl From<CartItemRow> for CartItem {
    fn from(row: CartItemRow) -> Self {
        Self {
            product: Product {
                id: ProductId::new(row.product_id),
                title: row.title,
                mrp: row.mrp,
                discount_percent: row.discount_percent,
                selling_price: row.selling_price,
                description: row.description,
                category: row.category,
            },
            quantity: row.quantity,
        }
    }
}

/// Repository for cart database operations.
pub struct CartRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CartRepository<'a> {
    /// Create a new cart repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get a user's cart with priced line items, if one exists.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_user(&self, user_id: UserId) -> Result<Option<Cart>, RepositoryError> {
        let cart_id: Option<(i32,)> =
            sqlx::query_as("SELECT id FROM carts WHERE user_id = $1")
                .bind(user_id.as_i32())
                .fetch_optional(self.pool)
                .await?;

        let Some((cart_id,)) = cart_id else {
            return Ok(None);
        };

        let rows = sqlx::query_as::<_, CartItemRow>(
            r"
            SELECT ci.product_id, ci.quantity,
                   p.title, p.mrp, p.discount_percent, p.selling_price,
                   p.description, p.category
            FROM cart_items ci
            JOIN products p ON p.id = ci.product_id
            WHERE ci.cart_id = $1
            ORDER BY ci.id
            ",
        )
        .bind(cart_id)
        .fetch_all(self.pool)
        .await?;

        Ok(Some(Cart {
            id: CartId::new(cart_id),
            user_id,
            items: rows.into_iter().map(CartItem::from).collect(),
        }))
    }

    /// Add a line to a user's cart, creating the cart if absent and
    /// merging quantity into an existing line for the same product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if any statement fails.
    pub async fn add_item(
        &self,
        user_id: UserId,
        product_id: ProductId,
        quantity: i32,
    ) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let (cart_id,): (i32,) = sqlx::query_as(
            r"
            INSERT INTO carts (user_id)
            VALUES ($1)
            ON CONFLICT (user_id) DO UPDATE SET user_id = EXCLUDED.user_id
            RETURNING id
            ",
        )
        .bind(user_id.as_i32())
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query(
            r"
            INSERT INTO cart_items (cart_id, product_id, quantity)
            VALUES ($1, $2, $3)
            ON CONFLICT (cart_id, product_id)
            DO UPDATE SET quantity = cart_items.quantity + EXCLUDED.quantity
            ",
        )
        .bind(cart_id)
        .bind(product_id.as_i32())
        .bind(quantity)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    /// Remove a product's line from a user's cart. No-op if absent.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the statement fails.
    pub async fn remove_item(
        &self,
        user_id: UserId,
        product_id: ProductId,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            r"
            DELETE FROM cart_items
            WHERE product_id = $2
              AND cart_id IN (SELECT id FROM carts WHERE user_id = $1)
            ",
        )
        .bind(user_id.as_i32())
        .bind(product_id.as_i32())
        .execute(self.pool)
        .await?;

        Ok(())
    }

    /// Empty a cart after its contents have been converted into an order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the statement fails.
    pub async fn clear(&self, cart_id: CartId) -> Result<(), RepositoryError> {
        sqlx::query("DELETE FROM cart_items WHERE cart_id = $1")
            .bind(cart_id.as_i32())
            .execute(self.pool)
            .await?;

        Ok(())
    }
}
