//! Embedded schema migrations applied at start-up.

use diesel::{Connection as _, PgConnection};
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};
use tracing::info;

use super::pool::PoolError;

/// Every migration under `backend/migrations`, compiled into the binary.
pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// Apply all pending migrations to the database at `database_url`.
///
/// Diesel's migration harness is synchronous, so the work runs on the
/// blocking thread pool.
///
/// # Errors
/// Returns [`PoolError::Build`] when the connection cannot be opened or a
/// migration fails.
pub async fn run_pending_migrations(database_url: &str) -> Result<(), PoolError> {
    let url = database_url.to_owned();
    let applied = tokio::task::spawn_blocking(move || -> Result<usize, PoolError> {
        let mut conn = PgConnection::establish(&url)
            .map_err(|err| PoolError::build(format!("migration connection: {err}")))?;
        let versions = conn
            .run_pending_migrations(MIGRATIONS)
            .map_err(|err| PoolError::build(format!("migration: {err}")))?;
        Ok(versions.len())
    })
    .await
    .map_err(|err| PoolError::build(format!("migration task: {err}")))??;
    info!(applied, "database migrations up to date");
    Ok(())
}
