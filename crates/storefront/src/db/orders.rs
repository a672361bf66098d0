//! Order repository for database operations.
//!
//! `orders.payu_txn_id` carries a UNIQUE constraint. The resulting
//! duplicate-key error on insert is the authoritative "already processed"
//! signal for gateway callback retries and callback/fallback races; any
//! application-level existence check is an optimization only.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;

use vastra_core::{CurrencyCode, OrderId, OrderStatus, ProductId, TxnId, UserId};

use super::RepositoryError;
use crate::models::{AddressSnapshot, Order, OrderItem};

/// Fields for a new order insert.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub user_id: UserId,
    pub items: Vec<OrderItem>,
    pub amount: Decimal,
    pub currency: CurrencyCode,
    pub status: OrderStatus,
    pub payu_txn_id: TxnId,
    pub payu_payment_id: Option<String>,
    pub payu_hash: Option<String>,
    pub shipping_address: Option<AddressSnapshot>,
}

#[derive(sqlx::FromRow)]
struct OrderRow {
    id: i32,
    user_id: i32,
    amount: Decimal,
    currency: String,
    status: String,
    payu_txn_id: String,
    payu_payment_id: Option<String>,
    payu_hash: Option<String>,
    shipping_address: Option<String>,
    created_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow)]
struct OrderItemRow {
    product_id: i32,
    quantity: i32,
    unit_price: Decimal,
}

impl From<OrderItemRow> for OrderItem {
    fn from(row: OrderItemRow) -> Self {
        Self {
            product_id: ProductId::new(row.product_id),
            quantity: row.quantity,
            unit_price: row.unit_price,
        }
    }
}

impl OrderRow {
    fn into_order(self, items: Vec<OrderItem>) -> Result<Order, RepositoryError> {
        let currency = self.currency.parse::<CurrencyCode>().map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid currency in database: {e}"))
        })?;
        let status = self.status.parse::<OrderStatus>().map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid order status in database: {e}"))
        })?;
        let shipping_address = self
            .shipping_address
            .as_deref()
            .map(serde_json::from_str::<AddressSnapshot>)
            .transpose()
            .map_err(|e| {
                RepositoryError::DataCorruption(format!("invalid address snapshot in database: {e}"))
            })?;

        Ok(Order {
            id: OrderId::new(self.id),
            user_id: UserId::new(self.user_id),
            items,
            amount: self.amount,
            currency,
            status,
            payu_txn_id: TxnId::new(self.payu_txn_id),
            payu_payment_id: self.payu_payment_id,
            payu_hash: self.payu_hash,
            shipping_address,
            created_at: self.created_at,
        })
    }
}

/// Repository for order database operations.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Insert an order and its line items in one transaction.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if an order already exists for
    /// this transaction id (the idempotence signal).
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create(&self, new: NewOrder) -> Result<Order, RepositoryError> {
        let shipping_json = new
            .shipping_address
            .as_ref()
            .map(serde_json::to_string)
            .transpose()
            .map_err(|e| {
                RepositoryError::DataCorruption(format!("unserializable address snapshot: {e}"))
            })?;

        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<_, OrderRow>(
            r"
            INSERT INTO orders
                (user_id, amount, currency, status, payu_txn_id,
                 payu_payment_id, payu_hash, shipping_address)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id, user_id, amount, currency, status, payu_txn_id,
                      payu_payment_id, payu_hash, shipping_address, created_at
            ",
        )
        .bind(new.user_id.as_i32())
        .bind(new.amount)
        .bind(new.currency.as_str())
        .bind(new.status.as_str())
        .bind(new.payu_txn_id.as_str())
        .bind(&new.payu_payment_id)
        .bind(&new.payu_hash)
        .bind(&shipping_json)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.is_unique_violation()
            {
                return RepositoryError::Conflict(format!(
                    "order already exists for txn {}",
                    new.payu_txn_id
                ));
            }
            RepositoryError::Database(e)
        })?;

        for item in &new.items {
            sqlx::query(
                r"
                INSERT INTO order_items (order_id, product_id, quantity, unit_price)
                VALUES ($1, $2, $3, $4)
                ",
            )
            .bind(row.id)
            .bind(item.product_id.as_i32())
            .bind(item.quantity)
            .bind(item.unit_price)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        row.into_order(new.items)
    }

    /// Get the order for a transaction id, if one exists.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_txn_id(&self, txn_id: &TxnId) -> Result<Option<Order>, RepositoryError> {
        let row = sqlx::query_as::<_, OrderRow>(
            r"
            SELECT id, user_id, amount, currency, status, payu_txn_id,
                   payu_payment_id, payu_hash, shipping_address, created_at
            FROM orders
            WHERE payu_txn_id = $1
            ",
        )
        .bind(txn_id.as_str())
        .fetch_optional(self.pool)
        .await?;

        self.hydrate(row).await
    }

    /// Get the order for a (transaction id, user) pair, if one exists.
    ///
    /// The fallback verification path scopes by user so one buyer cannot
    /// read another's order by guessing transaction ids.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_txn_id_for_user(
        &self,
        txn_id: &TxnId,
        user_id: UserId,
    ) -> Result<Option<Order>, RepositoryError> {
        let row = sqlx::query_as::<_, OrderRow>(
            r"
            SELECT id, user_id, amount, currency, status, payu_txn_id,
                   payu_payment_id, payu_hash, shipping_address, created_at
            FROM orders
            WHERE payu_txn_id = $1 AND user_id = $2
            ",
        )
        .bind(txn_id.as_str())
        .bind(user_id.as_i32())
        .fetch_optional(self.pool)
        .await?;

        self.hydrate(row).await
    }

    /// Load line items for a fetched order row.
    async fn hydrate(&self, row: Option<OrderRow>) -> Result<Option<Order>, RepositoryError> {
        let Some(row) = row else {
            return Ok(None);
        };

        let items = sqlx::query_as::<_, OrderItemRow>(
            r"
            SELECT product_id, quantity, unit_price
            FROM order_items
            WHERE order_id = $1
            ORDER BY id
            ",
        )
        .bind(row.id)
        .fetch_all(self.pool)
        .await?
        .into_iter()
        .map(OrderItem::from)
        .collect();

        row.into_order(items).map(Some)
    }
}
