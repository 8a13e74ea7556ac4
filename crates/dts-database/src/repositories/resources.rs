//! Repository for the `available_resources` singleton row (spec §3.4).

use crate::models::ResourcesRow;
use dts_core::error::{Error, Result};
use sqlx::PgPool;

const GLOBAL_ID: &str = "global";

#[derive(Debug, Clone)]
pub struct ResourcesRepository {
    pool: PgPool,
}

impl ResourcesRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn get(&self) -> Result<ResourcesRow> {
        sqlx::query_as::<_, ResourcesRow>("SELECT * FROM available_resources WHERE id = $1")
            .bind(GLOBAL_ID)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| Error::database_with_source("failed to read available resources", e))?
            .ok_or_else(|| Error::not_found("Resources", GLOBAL_ID))
    }

    /// Atomically subtracts `cpu/memory/storage` from the global counter,
    /// failing `RESOURCE_EXHAUSTED` if any dimension would go negative.
    pub async fn allocate(&self, cpu: i32, memory: i32, storage: i32) -> Result<ResourcesRow> {
        let row = sqlx::query_as::<_, ResourcesRow>(
            r#"
            UPDATE available_resources
            SET cpu = cpu - $1, memory = memory - $2, storage = storage - $3
            WHERE id = $4 AND cpu >= $1 AND memory >= $2 AND storage >= $3
            RETURNING id, cpu, memory, storage
            "#,
        )
        .bind(cpu)
        .bind(memory)
        .bind(storage)
        .bind(GLOBAL_ID)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| Error::database_with_source("failed to allocate resources", e))?;

        row.ok_or_else(|| {
            Error::resource_exhausted(format!(
                "insufficient resources for cpu={cpu} memory={memory} storage={storage}"
            ))
        })
    }

    pub async fn release(&self, cpu: i32, memory: i32, storage: i32) -> Result<ResourcesRow> {
        sqlx::query_as::<_, ResourcesRow>(
            r#"
            UPDATE available_resources
            SET cpu = cpu + $1, memory = memory + $2, storage = storage + $3
            WHERE id = $4
            RETURNING id, cpu, memory, storage
            "#,
        )
        .bind(cpu)
        .bind(memory)
        .bind(storage)
        .bind(GLOBAL_ID)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| Error::database_with_source("failed to release resources", e))?
        .ok_or_else(|| Error::not_found("Resources", GLOBAL_ID))
    }
}
