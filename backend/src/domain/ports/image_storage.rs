//! Port for the file store that holds uploaded image bytes.
//!
//! Uploads happen before the domain sees them; the domain only ever removes
//! files once their metadata has been deleted.

use async_trait::async_trait;

use super::define_port_error;

define_port_error! {
    /// Errors raised by image storage adapters.
    pub enum ImageStorageError {
        /// The path escapes the storage root or is otherwise unusable.
        InvalidPath { path: String } => "invalid storage path: {path}",
        /// The underlying store failed.
        Io { message: String } => "image storage failed: {message}",
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ImageStorage: Send + Sync {
    /// Remove the file at `file_path`. Missing files are not an error.
    async fn remove(&self, file_path: &str) -> Result<(), ImageStorageError>;
}

/// Storage that keeps nothing, for wiring without an upload directory.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureImageStorage;

#[async_trait]
impl ImageStorage for FixtureImageStorage {
    async fn remove(&self, _file_path: &str) -> Result<(), ImageStorageError> {
        Ok(())
    }
}
