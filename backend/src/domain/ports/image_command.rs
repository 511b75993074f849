//! Driving port for attaching and removing step images.

use async_trait::async_trait;

use crate::domain::{Error, Image, ImageId, ImageUpload, StepId, UserId};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ImageCommand: Send + Sync {
    /// Record a completed upload against a step.
    async fn attach_image(
        &self,
        actor: UserId,
        step_id: StepId,
        upload: ImageUpload,
    ) -> Result<Image, Error>;

    /// Delete image metadata, then the stored file.
    async fn delete_image(&self, actor: UserId, image_id: ImageId) -> Result<(), Error>;
}
