//! Application settings loaded via OrthoConfig.
//!
//! Values merge from `GUIDEFORGE_*` environment variables, command-line
//! flags and configuration files. Optional values fall back to the defaults
//! exposed by the accessor methods.

use std::net::SocketAddr;
use std::path::PathBuf;

use ortho_config::OrthoConfig;
use serde::Deserialize;

use crate::domain::ContentPolicy;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_MAX_CONNECTIONS: u32 = 10;
const DEFAULT_UPLOAD_DIR: &str = "./uploads";
const DEFAULT_SESSION_KEY_FILE: &str = "/var/run/secrets/session_key";

/// Errors raised while interpreting loaded settings.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SettingsError {
    /// `bind_addr` is not a socket address.
    #[error("invalid bind address '{value}': {message}")]
    InvalidBindAddr { value: String, message: String },
    /// A size or length limit is zero.
    #[error("{name} must be greater than zero")]
    ZeroLimit { name: &'static str },
}

/// Runtime configuration for the guideforge server.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "GUIDEFORGE")]
pub struct AppSettings {
    /// Socket address the HTTP server binds to.
    pub bind_addr: Option<String>,
    /// PostgreSQL connection URL. When absent the in-memory adapters are used.
    pub database_url: Option<String>,
    /// Upper bound on pooled database connections.
    pub database_max_connections: Option<u32>,
    /// Directory holding uploaded image files.
    pub upload_dir: Option<PathBuf>,
    /// Largest accepted image, in bytes.
    pub max_upload_size: Option<i64>,
    /// Longest accepted manual or step title, in characters.
    pub max_title_length: Option<usize>,
    /// Comma-separated MIME allow-list for images.
    pub allowed_mime_types: Option<String>,
    /// File holding the cookie session key material.
    pub session_key_file: Option<PathBuf>,
    /// Permit a generated session key when the key file is unreadable.
    #[ortho_config(default = false)]
    pub session_allow_ephemeral: bool,
    /// Mark session cookies `Secure`.
    #[ortho_config(default = true)]
    pub cookie_secure: bool,
    /// Apply embedded migrations at start-up.
    #[ortho_config(default = true)]
    pub run_migrations: bool,
}

impl AppSettings {
    /// Parsed bind address.
    ///
    /// # Errors
    /// Returns [`SettingsError::InvalidBindAddr`] when the value does not
    /// parse as a socket address.
    pub fn bind_addr(&self) -> Result<SocketAddr, SettingsError> {
        let raw = self.bind_addr.as_deref().unwrap_or(DEFAULT_BIND_ADDR);
        raw.parse().map_err(|err: std::net::AddrParseError| {
            SettingsError::InvalidBindAddr {
                value: raw.to_owned(),
                message: err.to_string(),
            }
        })
    }

    pub fn database_max_connections(&self) -> u32 {
        self.database_max_connections
            .unwrap_or(DEFAULT_MAX_CONNECTIONS)
    }

    pub fn upload_dir(&self) -> PathBuf {
        self.upload_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_UPLOAD_DIR))
    }

    pub fn session_key_file(&self) -> PathBuf {
        self.session_key_file
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_SESSION_KEY_FILE))
    }

    /// Content limits applied by the manual service.
    ///
    /// # Errors
    /// Returns [`SettingsError::ZeroLimit`] when a configured limit is zero.
    pub fn content_policy(&self) -> Result<ContentPolicy, SettingsError> {
        let mut policy = ContentPolicy::default();
        if let Some(length) = self.max_title_length {
            if length == 0 {
                return Err(SettingsError::ZeroLimit {
                    name: "max_title_length",
                });
            }
            policy = policy.with_max_title_length(length);
        }
        if let Some(bytes) = self.max_upload_size {
            if bytes <= 0 {
                return Err(SettingsError::ZeroLimit {
                    name: "max_upload_size",
                });
            }
            policy = policy.with_max_image_bytes(bytes);
        }
        if let Some(list) = &self.allowed_mime_types {
            let types: Vec<String> = list
                .split(',')
                .map(str::trim)
                .filter(|value| !value.is_empty())
                .map(str::to_ascii_lowercase)
                .collect();
            if !types.is_empty() {
                policy = policy.with_allowed_mime_types(types);
            }
        }
        Ok(policy)
    }
}
