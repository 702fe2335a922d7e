use axum::extract::{Path, State};
use axum::Json;
use bigdecimal::BigDecimal;
use common_http_errors::ApiError;
use common_money::to_f64_lossy;
use serde::ser::{SerializeStruct, Serializer};
use serde::Serialize;
use sqlx::query_as;
use uuid::Uuid;

use crate::app::AppState;

pub(crate) const LIST_PRODUCTS_SQL: &str =
    "SELECT id, name, price, stock, barcode FROM products ORDER BY name";
pub(crate) const PRODUCT_BY_BARCODE_SQL: &str =
    "SELECT id, name, price, stock, barcode FROM products WHERE barcode = $1";

#[derive(Debug, sqlx::FromRow)]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub price: BigDecimal,
    pub stock: i32,
    pub barcode: Option<String>,
}

// Clients consume price as a plain JSON number, not bigdecimal's string form.
impl Serialize for Product {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut state = serializer.serialize_struct("Product", 5)?;
        state.serialize_field("id", &self.id)?;
        state.serialize_field("name", &self.name)?;
        state.serialize_field("price", &to_f64_lossy(&self.price))?;
        state.serialize_field("stock", &self.stock)?;
        state.serialize_field("barcode", &self.barcode)?;
        state.end()
    }
}

pub async fn list_products(
    State(state): State<AppState>,
) -> Result<Json<Vec<Product>>, ApiError> {
    let products = query_as::<_, Product>(LIST_PRODUCTS_SQL)
        .fetch_all(&state.db)
        .await
        .map_err(ApiError::internal)?;
    Ok(Json(products))
}

pub async fn get_product_by_barcode(
    State(state): State<AppState>,
    Path(barcode): Path<String>,
) -> Result<Json<Product>, ApiError> {
    let product = query_as::<_, Product>(PRODUCT_BY_BARCODE_SQL)
        .bind(&barcode)
        .fetch_optional(&state.db)
        .await
        .map_err(ApiError::internal)?;
    match product {
        Some(product) => Ok(Json(product)),
        None => Err(ApiError::not_found(
            "barcode_not_found",
            format!("No product with barcode {barcode}"),
        )),
    }
}
