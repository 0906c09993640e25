//! Feed server entry point: loads configuration, wires storage and serves
//! the REST API.

mod server;

use actix_web::cookie::SameSite;
use actix_web::web;
#[cfg(feature = "metrics")]
use actix_web_prom::PrometheusMetricsBuilder;
use color_eyre::eyre::{Context, Report, Result};
use mockable::DefaultEnv;
use ortho_config::OrthoConfig;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use feed_backend::inbound::http::health::HealthState;
use feed_backend::inbound::http::session_config::{BuildMode, session_settings_from_env};
use feed_backend::outbound::persistence::{DbPool, run_pending_migrations};
use feed_backend::settings::FeedSettings;
use server::{ServerConfig, create_server};

/// Application bootstrap.
#[actix_web::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let settings = FeedSettings::load()
        .map_err(|err| Report::msg(err.to_string()).wrap_err("failed to load feed settings"))?;
    let session = session_settings_from_env(&DefaultEnv::new(), BuildMode::from_debug_assertions())
        .wrap_err("invalid session configuration")?;

    let bind_addr = settings.bind_addr()?;
    let mut config = ServerConfig::new(session.key, session.cookie_secure, SameSite::Lax, bind_addr)
        .with_cooldowns(settings.cooldowns()?)
        .with_default_limit(settings.default_page_limit()?);

    if let Some(pool_config) = settings.pool_config()? {
        run_pending_migrations(pool_config.database_url())
            .await
            .wrap_err("failed to apply database migrations")?;
        let pool = DbPool::new(pool_config)
            .await
            .wrap_err("failed to build database pool")?;
        info!("using PostgreSQL feed store");
        config = config.with_db_pool(pool);
    } else {
        warn!("no database configured; using in-memory feed store");
    }

    #[cfg(feature = "metrics")]
    let config = config.with_metrics(Some(make_metrics()?));

    let health_state = web::Data::new(HealthState::new());
    info!(%bind_addr, "starting feed server");
    let server = create_server(health_state.clone(), config)?;
    let result = server.await;
    health_state.mark_unhealthy();
    result.wrap_err("server terminated with an error")
}

#[cfg(feature = "metrics")]
fn make_metrics() -> Result<actix_web_prom::PrometheusMetrics> {
    PrometheusMetricsBuilder::new("feed")
        .endpoint("/metrics")
        .build()
        .map_err(|err| Report::msg(err.to_string()).wrap_err("configure Prometheus metrics"))
}
