//! Process entry point for the distributed task scheduler.
//!
//! Loads configuration once, initializes tracing, constructs the
//! database pool and queue clients, wires the job/scheduler/execution
//! services together, runs migrations, and serves a thin JSON surface
//! over the three RPC-shaped services (spec §1/§10).

mod error;
mod routes;
mod state;

use clap::Parser;
use dts_core::config::AppConfig;
use dts_database::repositories::{ExecutionRepository, JobRepository, ResourcesRepository, ScheduledJobRepository};
use dts_database::{embedded_migrations, Migrator};
use dts_execution::{ExecutionService, Processor, StaleSweep, TaskExecutor, TaskManager};
use dts_jobs::{InProcessJobServiceClient, JobService, JobServiceClient};
use dts_queue::{Consumer, KafkaConsumer, KafkaProducer, Producer};
use dts_scheduler::{PeriodicScheduler, ReadinessGate, ResourceManager, SchedulerService};
use state::AppState;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "dts-server")]
#[command(about = "Distributed task scheduler: periodic scheduling, execution, and the thin JSON control surface")]
struct Cli {
    /// HTTP bind address, overriding the host/port derived from config.
    #[arg(long)]
    addr: Option<SocketAddr>,
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            "dts_server=info,dts_scheduler=info,dts_execution=info,dts_jobs=info,sqlx=warn".into()
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();

    // Configuration is loaded exactly once here and handed down by
    // reference/Arc to every constructor below — never re-loaded inside
    // a retry path (spec §9).
    let config = Arc::new(AppConfig::from_env());
    tracing::info!("distributed task scheduler starting");

    let pool = dts_database::connect(&config.store).await?;
    Migrator::new(embedded_migrations()).run(&pool).await?;
    tracing::info!("migrations applied");

    let job_repo = JobRepository::new(pool.clone());
    let execution_repo = ExecutionRepository::new(pool.clone());
    let scheduled_job_repo = ScheduledJobRepository::new(pool.clone());
    let resources_repo = ResourcesRepository::new(pool.clone());

    let job_service = JobService::new(job_repo.clone());
    let job_service_client: Arc<dyn JobServiceClient> =
        Arc::new(InProcessJobServiceClient::new(job_service.clone()));

    let brokers = config.kafka.brokers_csv();
    let producer: Arc<dyn Producer> = Arc::new(KafkaProducer::new(&brokers)?);

    let readiness = ReadinessGate::new();
    let root_cancel = CancellationToken::new();
    dts_scheduler::spawn_reconnect(readiness.clone(), root_cancel.clone(), {
        let client = job_service_client.clone();
        move || {
            let client = client.clone();
            async move {
                // A lightweight reachability probe: looking up a random
                // id always returns NOT_FOUND once the service (and its
                // store connection) answers at all.
                match client.get_job(uuid::Uuid::nil()).await {
                    Ok(_) => Ok(()),
                    Err(e) if e.status_code() == "NOT_FOUND" => Ok(()),
                    Err(e) => Err(e),
                }
            }
        }
    });

    let periodic_scheduler = Arc::new(PeriodicScheduler::new(
        job_repo.clone(),
        job_service_client.clone(),
        producer.clone(),
        config.kafka.task_topic.clone(),
        readiness.clone(),
    ));
    let scheduler_loop = {
        let scheduler = periodic_scheduler.clone();
        let cancel = root_cancel.child_token();
        tokio::spawn(async move { scheduler.run(cancel).await })
    };

    let resource_manager = ResourceManager::new(resources_repo);
    let scheduler_service = Arc::new(SchedulerService::new(
        scheduled_job_repo,
        resource_manager,
        producer.clone(),
        config.kafka.task_topic.clone(),
    ));

    let executor = Arc::new(
        TaskExecutor::new(
            execution_repo.clone(),
            job_service_client.clone(),
            producer.clone(),
            config.kafka.task_retry_topic.clone(),
        )
        .with_max_retries(dts_execution::DEFAULT_MAX_RETRIES),
    );

    let task_manager = Arc::new(TaskManager::new());
    let primary_consumer: Arc<dyn Consumer> = Arc::new(KafkaConsumer::new(
        &brokers,
        dts_queue::topics::PRIMARY_GROUP,
        &config.kafka.task_topic,
    )?);
    let retry_consumer: Arc<dyn Consumer> = Arc::new(KafkaConsumer::new(
        &brokers,
        dts_queue::topics::RETRY_GROUP,
        &config.kafka.task_retry_topic,
    )?);

    {
        let executor = executor.clone();
        task_manager.add_processor(Processor::new(
            "primary",
            primary_consumer,
            Arc::new(move |payload| {
                let executor = executor.clone();
                Box::pin(async move { executor.handle_primary(&payload).await })
            }),
        ));
    }
    {
        let executor = executor.clone();
        task_manager.add_processor(Processor::new(
            "retry",
            retry_consumer,
            Arc::new(move |payload| {
                let executor = executor.clone();
                Box::pin(async move { executor.handle_retry(&payload).await })
            }),
        ));
    }
    task_manager.start_all().await;

    let stale_sweep = Arc::new(StaleSweep::new(execution_repo.clone(), job_service_client.clone()));
    let sweep_loop = {
        let sweep = stale_sweep.clone();
        let cancel = root_cancel.child_token();
        tokio::spawn(async move { sweep.run(cancel).await })
    };

    let execution_service = Arc::new(ExecutionService::new(execution_repo));

    let state = AppState {
        jobs: Arc::new(job_service),
        scheduler: scheduler_service,
        executions: execution_service,
    };

    let addr = cli
        .addr
        .unwrap_or_else(|| format!("0.0.0.0:{}", config.services.job_service.http_port).parse().unwrap());

    let app = routes::router(state);
    tracing::info!(%addr, "serving JSON control surface");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("shutdown signal received, stopping background tasks");
    root_cancel.cancel();
    scheduler_loop.abort();
    sweep_loop.abort();
    if let Err(e) = task_manager.stop_all().await {
        tracing::error!(error = %e, "errors while stopping task manager");
    }

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c().await.expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
