pub mod migrations;
pub mod queries;
pub mod settings;

use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use std::str::FromStr;

pub async fn create_pool(database_url: &str) -> Result<SqlitePool, sqlx::Error> {
    let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);

    // Every connection to an in-memory database opens a fresh one, so keep
    // exactly one connection alive for the pool's lifetime.
    let in_memory = database_url.contains(":memory:");
    let pool = if in_memory {
        SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?
    } else {
        SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?
    };

    // Run migrations
    migrations::run_migrations(&pool).await?;

    Ok(pool)
}
