use bigdecimal::BigDecimal;
use sqlx::PgPool;
use uuid::Uuid;

pub(crate) const SEED_STOCK: i32 = 50;

/// Sample catalog carried over from the original deployment; prices in dollars.
pub const SEED_PRODUCTS: &[(&str, &str, &str)] = &[
    ("Milk", "3.00", "1234567890"),
    ("Bread", "2.00", "1111222233"),
    ("Eggs", "3.50", "6677889900"),
    ("Cheese", "4.50", "4444555566"),
    ("Butter", "2.75", "7777888899"),
    ("Yogurt", "1.25", "3333444455"),
    ("Apple", "0.75", "8888999900"),
    ("Banana", "0.50", "2222333344"),
    ("Orange", "0.85", "5555666677"),
];

pub(crate) const UPSERT_PRODUCT_SQL: &str = "INSERT INTO products (id, name, price, stock, barcode) VALUES ($1, $2, $3, $4, $5) \
     ON CONFLICT (name) DO UPDATE SET price = EXCLUDED.price, stock = EXCLUDED.stock, barcode = EXCLUDED.barcode";

/// Upsert the sample catalog by unique product name. Idempotent; runs on every
/// startup after migrations, so a restart refreshes price/stock/barcode without
/// duplicating rows.
pub async fn seed_catalog(db: &PgPool) -> Result<(), sqlx::Error> {
    for (name, price, barcode) in SEED_PRODUCTS {
        let price = BigDecimal::parse_bytes(price.as_bytes(), 10)
            .expect("seed price literals are valid decimals");
        sqlx::query(UPSERT_PRODUCT_SQL)
            .bind(Uuid::new_v4())
            .bind(name)
            .bind(price)
            .bind(SEED_STOCK)
            .bind(barcode)
            .execute(db)
            .await?;
    }
    tracing::info!(products = SEED_PRODUCTS.len(), "Catalog seeded");
    Ok(())
}
