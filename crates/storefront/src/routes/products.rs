//! Product route handlers.

use axum::{
    Json,
    extract::{Path, State},
};
use rust_decimal::Decimal;
use serde::Serialize;

use vastra_core::ProductId;

use crate::db::ProductRepository;
use crate::error::{AppError, Result};
use crate::models::Product;
use crate::state::AppState;

/// Product as served to clients, with the effective unit price computed.
#[derive(Debug, Serialize)]
pub struct ProductView {
    pub id: ProductId,
    pub title: String,
    pub mrp: Option<Decimal>,
    pub discount_percent: Option<Decimal>,
    pub price: Decimal,
    pub description: Option<String>,
    pub category: String,
}

impl From<Product> for ProductView {
    fn from(product: Product) -> Self {
        let price = product.unit_price();
        Self {
            id: product.id,
            title: product.title,
            mrp: product.mrp,
            discount_percent: product.discount_percent,
            price,
            description: product.description,
            category: product.category,
        }
    }
}

/// `GET /api/products` - list all products.
pub async fn index(State(state): State<AppState>) -> Result<Json<Vec<ProductView>>> {
    let products = ProductRepository::new(state.pool()).list().await?;
    Ok(Json(products.into_iter().map(ProductView::from).collect()))
}

/// `GET /api/products/{id}` - product detail.
pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<ProductView>> {
    let product = ProductRepository::new(state.pool())
        .get_by_id(ProductId::new(id))
        .await?
        .ok_or_else(|| AppError::NotFound(format!("product {id}")))?;

    Ok(Json(ProductView::from(product)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_product_view_computes_price() {
        let view = ProductView::from(Product {
            id: ProductId::new(7),
            title: "Silk Saree".to_string(),
            mrp: Some(dec!(999)),
            discount_percent: Some(dec!(20)),
            selling_price: None,
            description: None,
            category: "Sarees".to_string(),
        });
        assert_eq!(view.price, dec!(799));
    }

    #[test]
    fn test_product_view_prefers_selling_price() {
        let view = ProductView::from(Product {
            id: ProductId::new(7),
            title: "Silk Saree".to_string(),
            mrp: Some(dec!(999)),
            discount_percent: Some(dec!(20)),
            selling_price: Some(dec!(850)),
            description: None,
            category: "Sarees".to_string(),
        });
        assert_eq!(view.price, dec!(850));
    }
}
