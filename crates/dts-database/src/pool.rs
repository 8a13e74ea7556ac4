//! Connection pool construction.

use dts_core::config::StoreConfig;
use dts_core::error::{Error, Result};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

/// Builds the shared `PgPool`, honoring `StoreConfig`'s pool size and
/// connect timeout (spec §6.3).
pub async fn connect(config: &StoreConfig) -> Result<PgPool> {
    PgPoolOptions::new()
        .max_connections(config.pool_max)
        .acquire_timeout(config.connect_timeout())
        .connect(&config.database_url())
        .await
        .map_err(|e| Error::database_with_source("failed to connect to store", e))
}
