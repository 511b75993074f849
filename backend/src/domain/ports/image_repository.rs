//! Port for image metadata persistence.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{Image, ImageId, ImageUpload, StepId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by image repository adapters.
    pub enum ImageRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } => "image repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "image repository query failed: {message}",
        /// The step or image does not exist.
        NotFound { message: String } => "{message}",
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ImageRepository: Send + Sync {
    /// Record an uploaded file against `step_id`.
    async fn attach(
        &self,
        step_id: StepId,
        upload: &ImageUpload,
        created_at: DateTime<Utc>,
    ) -> Result<Image, ImageRepositoryError>;

    async fn find_by_id(&self, id: ImageId) -> Result<Option<Image>, ImageRepositoryError>;

    /// Remove the metadata row. The stored file is the caller's concern.
    async fn delete(&self, id: ImageId) -> Result<(), ImageRepositoryError>;

    /// Images for every step in `step_ids`, ordered by id.
    async fn list_for_steps(&self, step_ids: &[StepId]) -> Result<Vec<Image>, ImageRepositoryError>;
}
