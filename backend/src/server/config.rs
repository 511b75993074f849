//! HTTP server configuration object and helpers.

use std::io;
use std::net::SocketAddr;
use std::path::Path;

use actix_web::cookie::{Key, SameSite};
use tracing::warn;
use zeroize::Zeroize;

use guideforge::domain::ContentPolicy;
use guideforge::outbound::persistence::DbPool;
use guideforge::outbound::storage::UploadDirectory;

#[cfg(feature = "metrics")]
use actix_web_prom::PrometheusMetrics;

/// Shortest key file accepted for deriving the cookie key.
pub const SESSION_KEY_MIN_LEN: usize = 64;

/// Builder-style configuration for creating the HTTP server.
pub struct ServerConfig {
    pub(crate) key: Key,
    pub(crate) cookie_secure: bool,
    pub(crate) same_site: SameSite,
    pub(crate) bind_addr: SocketAddr,
    pub(crate) uploads: UploadDirectory,
    pub(crate) policy: ContentPolicy,
    pub(crate) db_pool: Option<DbPool>,
    #[cfg(feature = "metrics")]
    pub(crate) prometheus: Option<PrometheusMetrics>,
}

impl ServerConfig {
    /// Construct a server configuration using application preferences.
    #[must_use]
    pub fn new(
        key: Key,
        cookie_secure: bool,
        bind_addr: SocketAddr,
        uploads: UploadDirectory,
    ) -> Self {
        Self {
            key,
            cookie_secure,
            same_site: SameSite::Lax,
            bind_addr,
            uploads,
            policy: ContentPolicy::default(),
            db_pool: None,
            #[cfg(feature = "metrics")]
            prometheus: None,
        }
    }

    /// Attach a database connection pool.
    ///
    /// With a pool every repository is Diesel-backed; without one the
    /// server keeps its data in process memory.
    #[must_use]
    pub fn with_db_pool(mut self, pool: DbPool) -> Self {
        self.db_pool = Some(pool);
        self
    }

    /// Replace the default content limits.
    #[must_use]
    pub fn with_policy(mut self, policy: ContentPolicy) -> Self {
        self.policy = policy;
        self
    }

    #[cfg(feature = "metrics")]
    /// Attach Prometheus middleware to the configuration.
    #[must_use]
    pub fn with_metrics(mut self, prometheus: Option<PrometheusMetrics>) -> Self {
        self.prometheus = prometheus;
        self
    }
}

/// Derive the cookie key from `path`, zeroising the raw bytes afterwards.
///
/// When the file is unreadable or too short, debug builds and
/// `allow_ephemeral` fall back to a random per-process key; otherwise start
/// up fails.
///
/// # Errors
/// Returns an [`io::Error`] when no usable key is available.
pub fn load_session_key(path: &Path, allow_ephemeral: bool) -> io::Result<Key> {
    let fallback_allowed = cfg!(debug_assertions) || allow_ephemeral;
    let problem = match std::fs::read(path) {
        Ok(mut bytes) => {
            let length = bytes.len();
            if length >= SESSION_KEY_MIN_LEN {
                let key = Key::derive_from(&bytes);
                bytes.zeroize();
                return Ok(key);
            }
            bytes.zeroize();
            format!("session key is {length} bytes; at least {SESSION_KEY_MIN_LEN} required")
        }
        Err(error) => format!("failed to read session key: {error}"),
    };

    if fallback_allowed {
        warn!(
            path = %path.display(),
            reason = %problem,
            "using temporary session key (dev only)"
        );
        Ok(Key::generate())
    } else {
        Err(io::Error::other(format!("{}: {problem}", path.display())))
    }
}
