//! Maintenance entry-point: applies migrations, then sweeps expired
//! idempotency records on a fixed period.

use std::sync::Arc;

use color_eyre::eyre::{Context, Result, eyre};
use mockable::DefaultClock;
use ortho_config::OrthoConfig;
use tracing::{debug, error, info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use reservations::config::ReservationSettings;
use reservations::domain::IdempotencyJanitor;
use reservations::outbound::persistence::{DbPool, DieselIdempotencyRepository, run_pending_migrations};

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let settings = ReservationSettings::load()
        .map_err(|err| eyre!("failed to load configuration: {err}"))?;
    let pool_config = settings
        .pool_config()
        .ok_or_else(|| eyre!("RESERVATIONS_DATABASE_URL is not set"))?;

    let database_url = pool_config.database_url().to_owned();
    let applied = tokio::task::spawn_blocking(move || run_pending_migrations(&database_url))
        .await
        .wrap_err("migration task panicked")?
        .wrap_err("failed to apply migrations")?;
    info!(applied = ?applied, "database schema is current");

    let pool = DbPool::new(pool_config)
        .await
        .wrap_err("failed to build connection pool")?;
    let janitor = IdempotencyJanitor::new(
        Arc::new(DieselIdempotencyRepository::new(pool.clone())),
        Arc::new(DefaultClock),
    );

    let period = settings.sweep_interval();
    info!(period_secs = period.as_secs(), "starting idempotency sweep");
    let mut ticker = tokio::time::interval(period);
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                if let Err(err) = janitor.purge().await {
                    error!(error = %err, "idempotency sweep failed");
                }
                let status = pool.status();
                debug!(
                    connections = status.connections,
                    in_use = status.in_use(),
                    "connection pool status"
                );
            }
            signal = tokio::signal::ctrl_c() => {
                if let Err(err) = signal {
                    warn!(error = %err, "failed to listen for shutdown signal");
                }
                info!("shutting down");
                return Ok(());
            }
        }
    }
}
