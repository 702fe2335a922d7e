use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::time::Duration;

pub(crate) const MAX_CONNECT_ATTEMPTS: u32 = 10;
pub(crate) const CONNECT_RETRY_DELAY: Duration = Duration::from_secs(2);

/// Connect to Postgres with bounded retries so the service can start while the
/// database container is still coming up. Exhausting the attempts is fatal.
pub async fn connect_with_retry(database_url: &str) -> Result<PgPool, sqlx::Error> {
    let mut attempts = 0;
    loop {
        attempts += 1;
        match PgPoolOptions::new().connect(database_url).await {
            Ok(pool) => {
                tracing::info!(attempts, "Connected to database");
                return Ok(pool);
            }
            Err(err) if attempts < MAX_CONNECT_ATTEMPTS => {
                tracing::warn!(?err, attempts, "Database not ready; retrying");
                tokio::time::sleep(CONNECT_RETRY_DELAY).await;
            }
            Err(err) => return Err(err),
        }
    }
}
