use sqlx::{postgres::PgPoolOptions, PgPool};
use std::time::Duration;

/// Pool sized for a small staff-facing service; acquisition fails fast so a
/// stuck database surfaces as request errors instead of piled-up waiters.
pub async fn create_pool(database_url: &str) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(1)
        .acquire_timeout(Duration::from_secs(5))
        .idle_timeout(Duration::from_secs(300))
        .connect(database_url)
        .await
}
