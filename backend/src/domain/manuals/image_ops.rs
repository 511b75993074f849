//! Attaching and removing step images.

use async_trait::async_trait;
use tracing::debug;

use super::{ManualService, map_image_error};
use crate::domain::ports::{
    ImageCommand, ImageRepository, ImageStorage, ManualRepository, StepRepository,
};
use crate::domain::{Error, Image, ImageId, ImageUpload, StepId, UserId, validate_image};

#[async_trait]
impl<M, S, I, B> ImageCommand for ManualService<M, S, I, B>
where
    M: ManualRepository,
    S: StepRepository,
    I: ImageRepository,
    B: ImageStorage,
{
    async fn attach_image(
        &self,
        actor: UserId,
        step_id: StepId,
        upload: ImageUpload,
    ) -> Result<Image, Error> {
        validate_image(&upload, &self.policy)?;
        let step = self.find_step(step_id).await?;
        self.owned_manual(actor, step.manual_id).await?;
        let image = self
            .images
            .attach(step_id, &upload, self.clock.utc())
            .await
            .map_err(map_image_error)?;
        debug!(step_id = %step_id, image_id = %image.id, "image attached");
        Ok(image)
    }

    async fn delete_image(&self, actor: UserId, image_id: ImageId) -> Result<(), Error> {
        let image = self
            .images
            .find_by_id(image_id)
            .await
            .map_err(map_image_error)?
            .ok_or_else(|| Error::not_found(format!("image {image_id} not found")))?;
        let step = self.find_step(image.step_id).await?;
        self.owned_manual(actor, step.manual_id).await?;
        self.images
            .delete(image_id)
            .await
            .map_err(map_image_error)?;
        debug!(image_id = %image_id, "image deleted");
        self.remove_files(std::slice::from_ref(&image)).await;
        Ok(())
    }
}
