pub mod aggregator;
pub mod config;
pub mod dashboard;
pub mod errors;
pub mod janitor;
pub mod models;
pub mod normalizer;
pub mod notifier;
pub mod pipeline;
pub mod policy;
pub mod render;
pub mod source;

use crate::config::AppConfig;
use crate::errors::{AppError, AppResult};
use crate::models::{DeliveryOutcome, RunReport};
use crate::notifier::SmtpMailer;
use crate::pipeline::Pipeline;
use crate::render::PlottersCanvas;
use crate::source::CsvSource;
use chrono::{Local, NaiveDateTime};
use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;

static LOG_GUARD: std::sync::OnceLock<WorkerGuard> = std::sync::OnceLock::new();

pub fn run() -> AppResult<RunReport> {
    let config = AppConfig::from_env()?;
    run_with_config(&config, Local::now().naive_local())
}

pub fn run_with_config(config: &AppConfig, run_at: NaiveDateTime) -> AppResult<RunReport> {
    let source = CsvSource::new(&config.habits_path);
    let canvas = PlottersCanvas::default();
    let mailer = SmtpMailer::new(config.mail.clone());
    let pipeline = Pipeline::new(config, &source, &canvas, &mailer);

    // Stale input stops the run before the log directory is touched.
    pipeline.check_fresh(run_at)?;
    init_tracing(&config.log_dir)?;

    tracing::info!(
        source = %source.path().display(),
        output = %config.output_dir.display(),
        run_at = %run_at,
        "starting habit digest run"
    );
    let report = pipeline.run(run_at)?;

    match &report.delivery {
        DeliveryOutcome::Sent { attachments } => {
            tracing::info!(week = %report.week_start, attachments = *attachments, "habit digest delivered");
        }
        DeliveryOutcome::Failed { stage, cause } => {
            tracing::warn!(week = %report.week_start, stage = stage.as_str(), cause = %cause, "habit digest not delivered");
        }
    }
    Ok(report)
}

fn init_tracing(log_dir: &Path) -> AppResult<()> {
    std::fs::create_dir_all(log_dir)?;
    let file_appender = tracing_appender::rolling::daily(log_dir, "digest.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
    let _ = LOG_GUARD.set(guard);

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .json()
        .with_writer(non_blocking)
        .try_init()
        .map_err(|error| AppError::Internal(error.to_string()))
}
