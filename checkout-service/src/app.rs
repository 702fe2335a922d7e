use axum::extract::State;
use axum::http::StatusCode;
use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use once_cell::sync::Lazy;
use prometheus::{Encoder, IntCounterVec, Opts, Registry, TextEncoder};
use sqlx::PgPool;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::{ServeDir, ServeFile};

use crate::order_handlers::{create_order, get_order};
use crate::product_handlers::{get_product_by_barcode, list_products};

pub static CHECKOUT_REGISTRY: Lazy<Registry> = Lazy::new(Registry::new);

static HTTP_ERRORS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    let v = IntCounterVec::new(
        Opts::new(
            "http_errors_total",
            "Count of HTTP error responses emitted (status >= 400)",
        ),
        &["service", "code", "status"],
    )
    .unwrap();
    CHECKOUT_REGISTRY.register(Box::new(v.clone())).ok();
    v
});

pub async fn http_error_metrics(
    req: axum::http::Request<axum::body::Body>,
    next: middleware::Next,
) -> axum::response::Response {
    let resp = next.run(req).await;
    let status = resp.status();
    if status.as_u16() >= 400 {
        let code = resp
            .headers()
            .get("X-Error-Code")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("unknown");
        HTTP_ERRORS_TOTAL
            .with_label_values(&["checkout-service", code, status.as_str()])
            .inc();
    }
    resp
}

pub async fn health() -> &'static str {
    "ok"
}

async fn metrics(State(_state): State<AppState>) -> (StatusCode, String) {
    let encoder = TextEncoder::new();
    let families = CHECKOUT_REGISTRY.gather();
    let mut buf = Vec::new();
    if let Err(e) = encoder.encode(&families, &mut buf) {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("metrics encode error: {e}"),
        );
    }
    (StatusCode::OK, String::from_utf8_lossy(&buf).to_string())
}

/// Shared application state passed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
}

pub fn build_router(state: AppState, static_dir: &str) -> Router {
    // The front end is served from other hosts during development; allow all.
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Single-page front end: unknown paths fall through to index.html.
    let spa = ServeDir::new(static_dir)
        .not_found_service(ServeFile::new(format!("{static_dir}/index.html")));

    Router::new()
        .route("/healthz", get(health))
        .route("/metrics", get(metrics))
        .route("/api/products", get(list_products))
        .route("/api/products/barcode/:barcode", get(get_product_by_barcode))
        .route("/api/orders", post(create_order))
        .route("/api/orders/:order_id", get(get_order))
        .fallback_service(spa)
        .with_state(state)
        .layer(middleware::from_fn(http_error_metrics))
        .layer(cors)
}
