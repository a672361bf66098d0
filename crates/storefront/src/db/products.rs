//! Product repository for catalog reads.

use rust_decimal::Decimal;
use sqlx::PgPool;

use vastra_core::ProductId;

use super::RepositoryError;
use crate::models::Product;

#[derive(sqlx::FromRow)]
pub(crate) struct ProductRow {
    pub id: i32,
    pub title: String,
    pub mrp: Option<Decimal>,
    pub discount_percent: Option<Decimal>,
    pub selling_price: Option<Decimal>,
    pub description: Option<String>,
    pub category: String,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Self {
            id: ProductId::new(row.id),
            title: row.title,
            mrp: row.mrp,
            discount_percent: row.discount_percent,
            selling_price: row.selling_price,
            description: row.description,
            category: row.category,
        }
    }
}

/// Repository for product database operations.
pub struct ProductRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProductRepository<'a> {
    /// Create a new product repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List all products, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self) -> Result<Vec<Product>, RepositoryError> {
        let rows = sqlx::query_as::<_, ProductRow>(
            r"
            SELECT id, title, mrp, discount_percent, selling_price, description, category
            FROM products
            ORDER BY id DESC
            ",
        )
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Product::from).collect())
    }

    /// Get a product by its ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_id(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(
            r"
            SELECT id, title, mrp, discount_percent, selling_price, description, category
            FROM products
            WHERE id = $1
            ",
        )
        .bind(id.as_i32())
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Product::from))
    }
}
