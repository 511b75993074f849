//! Guideforge entry-point: loads settings, wires adapters and serves the API.

mod server;

use std::io;

use actix_web::web;
use ortho_config::OrthoConfig;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use guideforge::inbound::http::health::HealthState;
use guideforge::outbound::persistence::{DbPool, PoolConfig, run_pending_migrations};
use guideforge::outbound::storage::UploadDirectory;
use guideforge::settings::AppSettings;

use server::{ServerConfig, create_server, load_session_key};

/// Application bootstrap.
#[actix_web::main]
async fn main() -> io::Result<()> {
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let settings = AppSettings::load().map_err(|e| io::Error::other(e.to_string()))?;
    let bind_addr = settings.bind_addr().map_err(io::Error::other)?;
    let policy = settings.content_policy().map_err(io::Error::other)?;
    let key = load_session_key(&settings.session_key_file(), settings.session_allow_ephemeral)?;
    let uploads = UploadDirectory::open(settings.upload_dir())?;

    let mut config =
        ServerConfig::new(key, settings.cookie_secure, bind_addr, uploads).with_policy(policy);

    if let Some(database_url) = settings.database_url.as_deref() {
        if settings.run_migrations {
            run_pending_migrations(database_url)
                .await
                .map_err(io::Error::other)?;
        }
        let pool = DbPool::new(
            PoolConfig::new(database_url).with_max_size(settings.database_max_connections()),
        )
        .await
        .map_err(io::Error::other)?;
        config = config.with_db_pool(pool);
    }

    #[cfg(feature = "metrics")]
    {
        config = config.with_metrics(Some(server::make_metrics()?));
    }

    info!(%bind_addr, "starting guideforge");
    let health_state = web::Data::new(HealthState::new());
    let server = create_server(health_state.clone(), config)?;
    let result = server.await;
    health_state.mark_unhealthy();
    result
}
