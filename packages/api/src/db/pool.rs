//! Database connection pool using the OnceCell pattern.

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tokio::sync::OnceCell;

use crate::settings::Database;

static POOL: OnceCell<PgPool> = OnceCell::const_new();

/// Get or initialize the process-wide connection pool.
/// The settings of the first caller win.
pub async fn get_pool(database: &Database) -> Result<&'static PgPool, sqlx::Error> {
    POOL.get_or_try_init(|| async {
        PgPoolOptions::new()
            .max_connections(database.max_connections)
            .connect(&database.url)
            .await
    })
    .await
}

/// Apply the migrations in `packages/api/migrations`.
pub async fn migrate(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}
