//! Integration tests against a live Postgres instance.
//!
//! Ignored by default; run with `DATABASE_URL=... cargo test -- --ignored`
//! once migrations have been applied.

use chrono::Utc;
use dts_database::models::{ExecutionRow, JobRow, ScheduledJobRow};
use dts_database::repositories::{ExecutionRepository, JobRepository, ScheduledJobRepository};
use dts_database::{embedded_migrations, Migrator};
use sqlx::postgres::PgPoolOptions;
use uuid::Uuid;

async fn test_pool() -> sqlx::PgPool {
    let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set for this test");
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&url)
        .await
        .expect("failed to connect to test database");
    Migrator::new(embedded_migrations())
        .run(&pool)
        .await
        .expect("failed to run migrations");
    pool
}

#[tokio::test]
#[ignore]
async fn job_round_trips_through_create_and_find() {
    let pool = test_pool().await;
    let repo = JobRepository::new(pool);

    let now = Utc::now();
    let job = JobRow {
        id: Uuid::now_v1(&[1, 2, 3, 4, 5, 6]),
        name: "nightly-export".to_string(),
        description: None,
        cron_expression: "*/5 * * * *".to_string(),
        status: "PENDING".to_string(),
        created_at: now,
        updated_at: now,
        last_run: None,
        next_run: now,
        metadata: serde_json::json!({}),
    };

    let created = repo.create(job.clone()).await.unwrap();
    assert_eq!(created.name, job.name);

    let found = repo.find_by_id(created.id).await.unwrap().unwrap();
    assert_eq!(found.status, "PENDING");
}

#[tokio::test]
#[ignore]
async fn execution_freezes_after_terminal_transition() {
    let pool = test_pool().await;
    let jobs = JobRepository::new(pool.clone());
    let executions = ExecutionRepository::new(pool);

    let now = Utc::now();
    let job = jobs
        .create(JobRow {
            id: Uuid::now_v1(&[1, 2, 3, 4, 5, 6]),
            name: "job-for-execution".to_string(),
            description: None,
            cron_expression: "0 * * * *".to_string(),
            status: "PENDING".to_string(),
            created_at: now,
            updated_at: now,
            last_run: None,
            next_run: now,
            metadata: serde_json::json!({}),
        })
        .await
        .unwrap();

    let execution = executions
        .create(ExecutionRow {
            id: Uuid::now_v1(&[1, 2, 3, 4, 5, 6]),
            job_id: job.id,
            status: "RUNNING".to_string(),
            start_time: now,
            end_time: None,
            result: None,
            error: None,
        })
        .await
        .unwrap();

    let completed = executions
        .complete(execution.id, "COMPLETED", Utc::now(), Some("ok"), None)
        .await
        .unwrap();
    assert_eq!(completed.status, "COMPLETED");
    assert!(completed.end_time.is_some());

    // A second completion attempt finds no RUNNING row left to transition.
    let retry = executions
        .complete(execution.id, "FAILED", Utc::now(), None, Some("late"))
        .await;
    assert!(retry.is_err());
}

#[tokio::test]
#[ignore]
async fn scheduled_jobs_page_by_id_cursor() {
    let pool = test_pool().await;
    let repo = ScheduledJobRepository::new(pool);

    let mut ids = Vec::new();
    for _ in 0..3 {
        let row = repo
            .create(ScheduledJobRow {
                id: Uuid::now_v1(&[1, 2, 3, 4, 5, 6]),
                job_data: b"{}".to_vec(),
                cpu: 1,
                memory: 1,
                storage: 1,
                start_time: Utc::now(),
            })
            .await
            .unwrap();
        ids.push(row.id);
    }

    let first_page = repo.list_page(None, 2).await.unwrap();
    assert_eq!(first_page.items.len(), 2);
    assert_eq!(first_page.next_cursor, Some(first_page.items[1].id));

    let second_page = repo.list_page(first_page.next_cursor, 2).await.unwrap();
    assert_eq!(second_page.items.len(), 1);
    assert_eq!(second_page.items[0].id, ids[2]);
}
