//! Embedded-SQL migration runner.
//!
//! Migration files live under `migrations/*.cql`, are applied in lexical
//! file-order, and are recorded by filename in the `migrations` table.
//! Already-applied files are skipped; statements whose failure message
//! contains "already exists" are swallowed so re-running a partially
//! applied file is harmless (spec §6.4).

use dts_core::error::{Error, Result};
use sqlx::PgPool;

/// A single migration: its filename (the lexical sort key and the id
/// recorded in the `migrations` table) and its SQL body.
#[derive(Debug, Clone)]
pub struct Migration {
    pub id: String,
    pub sql: String,
}

impl Migration {
    pub fn new(id: impl Into<String>, sql: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            sql: sql.into(),
        }
    }
}

/// Returns the embedded migration set, already sorted in lexical file
/// order (the on-disk filenames are zero-padded for exactly this reason).
pub fn embedded_migrations() -> Vec<Migration> {
    let mut migrations = vec![
        Migration::new(
            "0001_create_jobs.cql",
            include_str!("../migrations/0001_create_jobs.cql"),
        ),
        Migration::new(
            "0002_create_job_executions.cql",
            include_str!("../migrations/0002_create_job_executions.cql"),
        ),
        Migration::new(
            "0003_create_scheduled_jobs.cql",
            include_str!("../migrations/0003_create_scheduled_jobs.cql"),
        ),
        Migration::new(
            "0004_create_available_resources.cql",
            include_str!("../migrations/0004_create_available_resources.cql"),
        ),
        Migration::new(
            "0005_create_migrations_table.cql",
            include_str!("../migrations/0005_create_migrations_table.cql"),
        ),
    ];
    migrations.sort_by(|a, b| a.id.cmp(&b.id));
    migrations
}

pub struct Migrator {
    migrations: Vec<Migration>,
}

impl Migrator {
    pub fn new(migrations: Vec<Migration>) -> Self {
        let mut migrations = migrations;
        migrations.sort_by(|a, b| a.id.cmp(&b.id));
        Self { migrations }
    }

    /// Applies every migration not yet recorded, in lexical order.
    pub async fn run(&self, pool: &PgPool) -> Result<Vec<String>> {
        self.ensure_migrations_table(pool).await?;
        let applied = self.applied_ids(pool).await?;

        let mut newly_applied = Vec::new();
        for migration in &self.migrations {
            if applied.contains(&migration.id) {
                continue;
            }
            self.apply(pool, migration).await?;
            newly_applied.push(migration.id.clone());
        }

        if newly_applied.is_empty() {
            tracing::info!("no pending migrations");
        } else {
            tracing::info!(count = newly_applied.len(), "applied migrations");
        }

        Ok(newly_applied)
    }

    async fn ensure_migrations_table(&self, pool: &PgPool) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS migrations (
                id VARCHAR(255) PRIMARY KEY,
                applied_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            )
            "#,
        )
        .execute(pool)
        .await
        .map_err(|e| Error::database_with_source("failed to create migrations table", e))?;

        Ok(())
    }

    async fn applied_ids(&self, pool: &PgPool) -> Result<Vec<String>> {
        let rows: Vec<(String,)> = sqlx::query_as("SELECT id FROM migrations ORDER BY id")
            .fetch_all(pool)
            .await
            .map_err(|e| Error::database_with_source("failed to read migrations table", e))?;

        Ok(rows.into_iter().map(|(id,)| id).collect())
    }

    async fn apply(&self, pool: &PgPool, migration: &Migration) -> Result<()> {
        tracing::info!(id = %migration.id, "applying migration");

        for statement in migration.sql.split(';').map(str::trim).filter(|s| !s.is_empty()) {
            if let Err(e) = sqlx::query(statement).execute(pool).await {
                if e.to_string().to_lowercase().contains("already exists") {
                    tracing::warn!(id = %migration.id, "swallowed already-exists error");
                    continue;
                }
                return Err(Error::database_with_source(
                    format!("migration {} failed", migration.id),
                    e,
                ));
            }
        }

        sqlx::query("INSERT INTO migrations (id) VALUES ($1) ON CONFLICT (id) DO NOTHING")
            .bind(&migration.id)
            .execute(pool)
            .await
            .map_err(|e| Error::database_with_source("failed to record migration", e))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedded_migrations_are_sorted_lexically() {
        let migrations = embedded_migrations();
        for i in 1..migrations.len() {
            assert!(migrations[i].id > migrations[i - 1].id);
        }
    }

    #[test]
    fn migrator_sorts_out_of_order_input() {
        let migrator = Migrator::new(vec![
            Migration::new("0002_b.cql", "SELECT 1"),
            Migration::new("0001_a.cql", "SELECT 1"),
        ]);
        assert_eq!(migrator.migrations[0].id, "0001_a.cql");
        assert_eq!(migrator.migrations[1].id, "0002_b.cql");
    }
}
