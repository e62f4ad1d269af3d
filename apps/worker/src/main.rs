//! Staffguard maintenance worker.

#![forbid(unsafe_code)]

use std::env;
use std::sync::Arc;
use std::time::Duration;

use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use staffguard_application::RbacRepository;
use staffguard_core::{AppError, AppResult};
use staffguard_infrastructure::PostgresRbacRepository;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, PartialEq, Eq)]
struct WorkerConfig {
    database_url: String,
    sweep_interval: Duration,
    run_once: bool,
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    init_tracing();

    let mut config = WorkerConfig::from_lookup(|name| env::var(name).ok())?;
    config.run_once = config.run_once || env::args().nth(1).as_deref() == Some("once");

    let pool = connect_pool(config.database_url.as_str()).await?;
    let repository: Arc<dyn RbacRepository> = Arc::new(PostgresRbacRepository::new(pool));

    info!(
        sweep_interval_seconds = config.sweep_interval.as_secs(),
        run_once = config.run_once,
        "staffguard-worker started"
    );

    if config.run_once {
        return sweep_expired_assignments(repository.as_ref()).await.map(|_| ());
    }

    let mut interval = tokio::time::interval(config.sweep_interval);
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        interval.tick().await;
        if let Err(error) = sweep_expired_assignments(repository.as_ref()).await {
            warn!(error = %error, "expired assignment sweep failed");
        }
    }
}

/// Marks expired assignments inactive so they stop showing up as active in listings.
async fn sweep_expired_assignments(repository: &dyn RbacRepository) -> AppResult<u64> {
    let deactivated = repository.deactivate_expired_assignments().await?;
    if deactivated > 0 {
        info!(deactivated, "deactivated expired role assignments");
    }

    Ok(deactivated)
}

async fn connect_pool(database_url: &str) -> AppResult<PgPool> {
    PgPoolOptions::new()
        .max_connections(2)
        .connect(database_url)
        .await
        .map_err(|error| AppError::Internal(format!("failed to connect to database: {error}")))
}

impl WorkerConfig {
    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> AppResult<Self> {
        let lookup = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        let database_url = lookup("DATABASE_URL")
            .ok_or_else(|| AppError::Validation("DATABASE_URL is required".to_owned()))?;
        let sweep_interval_seconds = match lookup("EXPIRED_ASSIGNMENT_SWEEP_INTERVAL_SECONDS") {
            Some(value) => value.trim().parse::<u64>().map_err(|error| {
                AppError::Validation(format!(
                    "invalid EXPIRED_ASSIGNMENT_SWEEP_INTERVAL_SECONDS value '{value}': {error}"
                ))
            })?,
            None => 300,
        };

        if sweep_interval_seconds == 0 {
            return Err(AppError::Validation(
                "EXPIRED_ASSIGNMENT_SWEEP_INTERVAL_SECONDS must be greater than zero".to_owned(),
            ));
        }

        Ok(Self {
            database_url,
            sweep_interval: Duration::from_secs(sweep_interval_seconds),
            run_once: lookup("WORKER_RUN_ONCE")
                .is_some_and(|value| value.trim().eq_ignore_ascii_case("true")),
        })
    }
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .init();
}
