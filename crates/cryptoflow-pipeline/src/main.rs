//! Pipeline CLI: one subcommand per job, each run under audit
//! tracking. Designed to be driven by cron.

use clap::{Parser, Subcommand};
use cryptoflow_core::logging::{LogConfig, LogFormat};
use cryptoflow_pipeline::{jobs, JobStats, PipelineConfig, RunTracker};
use sqlx::PgPool;
use std::future::Future;

#[derive(Parser)]
#[command(name = "cryptoflow-pipeline")]
#[command(about = "CryptoFlow batch pipeline", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Poll the market source and append snapshots
    Ingest,

    /// Fold snapshots into daily OHLCV bars
    Aggregate,

    /// Compute the correlation matrix and risk metrics
    Analytics,

    /// Run the data quality check battery
    Quality,

    /// Full sequence: ingest, aggregate, analytics, quality
    RunAll,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let log_config = LogConfig {
        level: cli.log_level.clone(),
        format: std::env::var("LOG_FORMAT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(LogFormat::Compact),
    };
    cryptoflow_core::logging::init_logging(log_config)?;

    let config = PipelineConfig::from_env()?;
    let pool = PgPool::connect(&config.database_url).await?;
    tracing::info!("database connected");

    match cli.command {
        Commands::Ingest => {
            run_tracked(
                &pool,
                jobs::INGEST_JOB_ID,
                "market ingest",
                jobs::ingest::run(&pool, &config),
            )
            .await?;
        }
        Commands::Aggregate => {
            run_tracked(
                &pool,
                jobs::AGGREGATE_JOB_ID,
                "daily aggregation",
                jobs::aggregate::run(&pool, &config),
            )
            .await?;
        }
        Commands::Analytics => {
            run_tracked(
                &pool,
                jobs::ANALYTICS_JOB_ID,
                "analytics",
                jobs::analytics::run(&pool, &config),
            )
            .await?;
        }
        Commands::Quality => {
            run_tracked(
                &pool,
                jobs::QUALITY_JOB_ID,
                "quality checks",
                jobs::quality::run(&pool, &config),
            )
            .await?;
        }
        Commands::RunAll => {
            tracing::info!("=== full pipeline started ===");

            run_tracked(
                &pool,
                jobs::INGEST_JOB_ID,
                "market ingest",
                jobs::ingest::run(&pool, &config),
            )
            .await?;
            run_tracked(
                &pool,
                jobs::AGGREGATE_JOB_ID,
                "daily aggregation",
                jobs::aggregate::run(&pool, &config),
            )
            .await?;
            run_tracked(
                &pool,
                jobs::ANALYTICS_JOB_ID,
                "analytics",
                jobs::analytics::run(&pool, &config),
            )
            .await?;
            run_tracked(
                &pool,
                jobs::QUALITY_JOB_ID,
                "quality checks",
                jobs::quality::run(&pool, &config),
            )
            .await?;

            tracing::info!("=== full pipeline finished ===");
        }
    }

    pool.close().await;
    Ok(())
}

/// Bracket one job with a pipeline run row.
async fn run_tracked<F>(
    pool: &PgPool,
    job_id: &str,
    label: &str,
    job: F,
) -> Result<(), Box<dyn std::error::Error>>
where
    F: Future<Output = cryptoflow_pipeline::Result<JobStats>>,
{
    let tracker = RunTracker::start(pool, job_id).await?;

    match job.await {
        Ok(stats) => {
            stats.log_summary(label);
            tracker.complete(stats.records()).await?;
            Ok(())
        }
        Err(e) => {
            tracker.fail(&e.to_string()).await?;
            Err(e.into())
        }
    }
}
