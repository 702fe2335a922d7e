use std::env;
use std::net::SocketAddr;
use tokio::net::TcpListener;

use checkout_service::app::AppState;
use checkout_service::build_router;
use checkout_service::catalog::seed_catalog;
use checkout_service::db::connect_with_retry;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_env_filter("info").init();

    let database_url = env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let db = connect_with_retry(&database_url).await?;
    // Ensure database schema is up to date before serving traffic
    sqlx::migrate!("./migrations").run(&db).await?;
    seed_catalog(&db).await?;

    let state = AppState { db };
    let static_dir = env::var("STATIC_DIR").unwrap_or_else(|_| "./static".to_string());
    let app = build_router(state, &static_dir);

    let host = env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
    let port: u16 = env::var("PORT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(8080);
    let ip: std::net::IpAddr = host.parse()?;
    let addr = SocketAddr::from((ip, port));
    println!("starting checkout-service on {addr}");
    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
