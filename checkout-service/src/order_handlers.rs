use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::Json;
use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use common_http_errors::ApiError;
use common_money::{display_2dp, round_half_up_2dp, to_f64_lossy};
use once_cell::sync::Lazy;
use rand::Rng;
use serde::{Deserialize, Serialize};
use sqlx::{query, query_as};
use uuid::Uuid;

use crate::app::AppState;

/// Fixed 8% sales tax applied to every order subtotal.
static TAX_MULTIPLIER: Lazy<BigDecimal> =
    Lazy::new(|| BigDecimal::parse_bytes(b"1.08", 10).unwrap());

pub(crate) const LOCK_PRODUCT_SQL: &str =
    "SELECT id, name, price, stock FROM products WHERE id = $1 FOR UPDATE";
pub(crate) const DECREMENT_STOCK_SQL: &str =
    "UPDATE products SET stock = stock - $1 WHERE id = $2";
pub(crate) const INSERT_ORDER_SQL: &str =
    "INSERT INTO orders (id, total, pickup_code) VALUES ($1, $2, $3)";
pub(crate) const INSERT_ORDER_ITEM_SQL: &str =
    "INSERT INTO order_items (id, order_id, product_id, quantity) VALUES ($1, $2, $3, $4)";
pub(crate) const GET_ORDER_SQL: &str =
    "SELECT id, total, pickup_code, created_at FROM orders WHERE id = $1";
pub(crate) const ORDER_ITEMS_SQL: &str = "SELECT p.name, oi.quantity FROM order_items oi \
     JOIN products p ON p.id = oi.product_id WHERE oi.order_id = $1";

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct NewOrderItem {
    pub product_id: Uuid,
    pub quantity: i32,
}

#[derive(Deserialize, Debug)]
pub struct NewOrder {
    // An absent items field is treated the same as an empty list.
    #[serde(default)]
    pub items: Vec<NewOrderItem>,
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct OrderLine {
    pub product_id: Uuid,
    pub name: String,
    pub quantity: i32,
    pub price: f64,
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct OrderResponse {
    pub order_id: Uuid,
    pub total: String,
    pub pickup_code: String,
    pub items: Vec<OrderLine>,
}

#[derive(sqlx::FromRow)]
struct LockedProduct {
    id: Uuid,
    name: String,
    price: BigDecimal,
    stock: i32,
}

/// Display code shown to the customer to claim the order. Not a primary key;
/// collisions across orders are acceptable.
pub(crate) fn generate_pickup_code() -> String {
    let mut rng = rand::thread_rng();
    format!("{:06}", rng.gen_range(0..1_000_000))
}

pub async fn create_order(
    State(state): State<AppState>,
    payload: Result<Json<NewOrder>, JsonRejection>,
) -> Result<Json<OrderResponse>, ApiError> {
    // Malformed bodies (items not a list, bad JSON) share the error contract
    // of every other failure: 400 with a JSON body, not axum's plain-text 422.
    let Json(new_order) =
        payload.map_err(|rejection| ApiError::bad_request("invalid_request", rejection.body_text()))?;
    if new_order.items.is_empty() {
        return Err(ApiError::bad_request(
            "empty_order",
            "Order must include at least one item",
        ));
    }
    for item in &new_order.items {
        if item.quantity <= 0 {
            return Err(ApiError::bad_request(
                "invalid_quantity",
                format!("Quantity for product {} must be positive", item.product_id),
            ));
        }
    }

    let mut tx = state.db.begin().await.map_err(ApiError::internal)?;

    let mut subtotal = BigDecimal::from(0);
    let mut lines = Vec::with_capacity(new_order.items.len());

    // Items are processed in client order; the first failure returns early,
    // dropping the transaction so every prior decrement rolls back.
    for item in &new_order.items {
        // Exclusive row lock serializes concurrent decrements of this product.
        let product = query_as::<_, LockedProduct>(LOCK_PRODUCT_SQL)
            .bind(item.product_id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(ApiError::internal)?;
        let product = match product {
            Some(product) => product,
            None => {
                return Err(ApiError::not_found(
                    "product_not_found",
                    format!("No product with id {}", item.product_id),
                ))
            }
        };
        if item.quantity > product.stock {
            return Err(ApiError::bad_request(
                "insufficient_stock",
                format!(
                    "Insufficient stock for {} (requested {}, available {})",
                    product.name, item.quantity, product.stock
                ),
            ));
        }
        query(DECREMENT_STOCK_SQL)
            .bind(item.quantity)
            .bind(item.product_id)
            .execute(&mut *tx)
            .await
            .map_err(ApiError::internal)?;
        subtotal += product.price.clone() * BigDecimal::from(item.quantity);
        lines.push(OrderLine {
            product_id: product.id,
            name: product.name,
            quantity: item.quantity,
            price: to_f64_lossy(&product.price),
        });
    }

    let total = round_half_up_2dp(&(subtotal * TAX_MULTIPLIER.clone()));
    let pickup_code = generate_pickup_code();
    let order_id = Uuid::new_v4();

    query(INSERT_ORDER_SQL)
        .bind(order_id)
        .bind(&total)
        .bind(&pickup_code)
        .execute(&mut *tx)
        .await
        .map_err(ApiError::internal)?;
    for line in &lines {
        query(INSERT_ORDER_ITEM_SQL)
            .bind(Uuid::new_v4())
            .bind(order_id)
            .bind(line.product_id)
            .bind(line.quantity)
            .execute(&mut *tx)
            .await
            .map_err(ApiError::internal)?;
    }

    tx.commit().await.map_err(ApiError::internal)?;

    tracing::info!(order_id = %order_id, total = %total, items = lines.len(), "Order placed");

    Ok(Json(OrderResponse {
        order_id,
        total: display_2dp(&total),
        pickup_code,
        items: lines,
    }))
}

#[derive(sqlx::FromRow)]
struct OrderRow {
    id: Uuid,
    total: BigDecimal,
    pickup_code: String,
    created_at: DateTime<Utc>,
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct OrderSummary {
    pub id: Uuid,
    pub total: String,
    pub pickup_code: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Serialize, Debug, sqlx::FromRow)]
pub struct OrderItemView {
    pub name: String,
    pub quantity: i32,
}

#[derive(Serialize, Debug)]
pub struct OrderDetail {
    pub order: OrderSummary,
    pub items: Vec<OrderItemView>,
}

pub async fn get_order(
    State(state): State<AppState>,
    Path(order_id): Path<Uuid>,
) -> Result<Json<OrderDetail>, ApiError> {
    let row = query_as::<_, OrderRow>(GET_ORDER_SQL)
        .bind(order_id)
        .fetch_optional(&state.db)
        .await
        .map_err(ApiError::internal)?;
    let row = match row {
        Some(row) => row,
        None => {
            return Err(ApiError::not_found(
                "order_not_found",
                format!("No order with id {order_id}"),
            ))
        }
    };
    let items = query_as::<_, OrderItemView>(ORDER_ITEMS_SQL)
        .bind(order_id)
        .fetch_all(&state.db)
        .await
        .map_err(ApiError::internal)?;

    Ok(Json(OrderDetail {
        order: OrderSummary {
            id: row.id,
            total: display_2dp(&row.total),
            pickup_code: row.pickup_code,
            created_at: row.created_at,
        },
        items,
    }))
}
