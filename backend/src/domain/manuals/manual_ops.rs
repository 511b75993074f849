//! Manual header commands and reads.

use async_trait::async_trait;
use pagination::Page;
use tracing::debug;

use super::{ManualService, map_manual_error, map_step_error};
use crate::domain::manual::non_blank;
use crate::domain::ports::{
    ImageRepository, ImageStorage, ManualCommand, ManualQuery, ManualRepository, NewManual,
    StepRepository,
};
use crate::domain::{
    Error, Manual, ManualChanges, ManualDraft, ManualId, ManualSearch, OrderedSequence,
    SearchScope, UserId, validate_manual, validate_manual_changes,
};

#[async_trait]
impl<M, S, I, B> ManualCommand for ManualService<M, S, I, B>
where
    M: ManualRepository,
    S: StepRepository,
    I: ImageRepository,
    B: ImageStorage,
{
    async fn create_manual(&self, owner: UserId, draft: ManualDraft) -> Result<Manual, Error> {
        validate_manual(&draft, &self.policy)?;
        let record = NewManual {
            owner_id: owner,
            title: draft.title.trim().to_owned(),
            description: draft.description.as_deref().and_then(non_blank),
            category: draft.category.as_deref().and_then(non_blank),
            visibility: draft.visibility,
            created_at: self.clock.utc(),
        };
        let manual = self
            .manuals
            .create(&record)
            .await
            .map_err(map_manual_error)?;
        debug!(manual_id = %manual.id, owner_id = %owner, "manual created");
        Ok(manual.with_steps(Vec::new()))
    }

    async fn update_manual(
        &self,
        actor: UserId,
        id: ManualId,
        changes: ManualChanges,
    ) -> Result<Manual, Error> {
        validate_manual_changes(&changes, &self.policy)?;
        let mut manual = self.owned_manual(actor, id).await?;
        if changes.is_empty() {
            return Ok(manual);
        }
        changes.apply_to(&mut manual, self.clock.utc());
        self.manuals
            .update(&manual)
            .await
            .map_err(map_manual_error)?;
        debug!(manual_id = %id, "manual updated");
        Ok(manual)
    }

    async fn delete_manual(&self, actor: UserId, id: ManualId) -> Result<(), Error> {
        self.owned_manual(actor, id).await?;
        let removed = self
            .manuals
            .delete_cascade(id)
            .await
            .map_err(map_manual_error)?;
        debug!(manual_id = %id, images = removed.len(), "manual deleted");
        self.remove_files(&removed).await;
        Ok(())
    }
}

#[async_trait]
impl<M, S, I, B> ManualQuery for ManualService<M, S, I, B>
where
    M: ManualRepository,
    S: StepRepository,
    I: ImageRepository,
    B: ImageStorage,
{
    async fn get_manual(&self, viewer: Option<UserId>, id: ManualId) -> Result<Manual, Error> {
        let manual = self.readable_manual(viewer, id).await?;
        let set = self
            .steps
            .load_sequence(id)
            .await
            .map_err(map_step_error)?;
        let steps = OrderedSequence::load(set.steps).into_items();
        let steps = self.expand_images(steps).await?;
        Ok(manual.with_steps(steps))
    }

    async fn search_manuals(
        &self,
        query: ManualSearch,
        scope: SearchScope,
    ) -> Result<Page<Manual>, Error> {
        self.manuals
            .search(&query, &scope)
            .await
            .map_err(map_manual_error)
    }
}
