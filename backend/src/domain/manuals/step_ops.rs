//! Step commands. Positional changes go through the ordering engine.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::debug;

use super::{AttemptError, ManualService, map_step_error, retry_on_stale};
use crate::domain::manual::non_blank;
use crate::domain::ports::{
    ImageRepository, ImageStorage, ManualRepository, NewStep, StepCommand, StepRepository,
};
use crate::domain::{
    Error, Image, ManualId, OrderedSequence, OrderingError, Step, StepChanges, StepDraft, StepId,
    StepOrderUpdate, UserId, validate_step, validate_step_changes,
};

impl<M, S, I, B> ManualService<M, S, I, B>
where
    M: ManualRepository,
    S: StepRepository,
    I: ImageRepository,
    B: ImageStorage,
{
    async fn load_ordered(
        &self,
        manual_id: ManualId,
    ) -> Result<(u64, OrderedSequence<Step>), AttemptError> {
        let set = self.steps.load_sequence(manual_id).await?;
        Ok((set.revision, OrderedSequence::load(set.steps)))
    }

    async fn try_insert(
        &self,
        manual_id: ManualId,
        draft: &StepDraft,
        now: DateTime<Utc>,
    ) -> Result<Step, AttemptError> {
        let (revision, mut sequence) = self.load_ordered(manual_id).await?;
        let (position, shifts) = sequence.open_slot(draft.requested_position())?;
        let record = NewStep {
            manual_id,
            title: draft.title.trim().to_owned(),
            content: draft.content.as_deref().and_then(non_blank),
            order_number: position,
            created_at: now,
        };
        Ok(self.steps.insert_step(revision, &record, &shifts).await?)
    }

    /// Move and rewrite a step in one revision-checked write.
    async fn try_update(
        &self,
        manual_id: ManualId,
        step_id: StepId,
        changes: &StepChanges,
        now: DateTime<Utc>,
    ) -> Result<Step, AttemptError> {
        let (revision, mut sequence) = self.load_ordered(manual_id).await?;
        let shifts = match changes.requested_position() {
            Some(position) => sequence.reorder(step_id, position)?,
            None => Vec::new(),
        };
        let mut step = sequence
            .items()
            .iter()
            .find(|step| step.id == step_id)
            .cloned()
            .ok_or(OrderingError::NotFound { id: step_id })?;
        if changes.touches_content() {
            if let Some(title) = &changes.title {
                step.title = title.trim().to_owned();
            }
            if let Some(content) = &changes.content {
                step.content = non_blank(content);
            }
            step.updated_at = now;
        }
        if changes.touches_content() || !shifts.is_empty() {
            self.steps
                .update_step(manual_id, revision, &step, &shifts)
                .await?;
        }
        Ok(step)
    }

    async fn try_remove(
        &self,
        manual_id: ManualId,
        step_id: StepId,
    ) -> Result<Vec<Image>, AttemptError> {
        let (revision, mut sequence) = self.load_ordered(manual_id).await?;
        let (_, shifts) = sequence.remove(step_id)?;
        Ok(self
            .steps
            .delete_step(manual_id, revision, step_id, &shifts)
            .await?)
    }

    async fn try_bulk_order(
        &self,
        manual_id: ManualId,
        updates: &[(StepId, i64)],
    ) -> Result<Vec<Step>, AttemptError> {
        let (revision, mut sequence) = self.load_ordered(manual_id).await?;
        let changes = sequence.apply_bulk(updates)?;
        if !changes.is_empty() {
            self.steps
                .apply_order(manual_id, revision, &changes)
                .await?;
        }
        Ok(sequence.into_items())
    }
}

#[async_trait]
impl<M, S, I, B> StepCommand for ManualService<M, S, I, B>
where
    M: ManualRepository,
    S: StepRepository,
    I: ImageRepository,
    B: ImageStorage,
{
    async fn list_steps(
        &self,
        viewer: Option<UserId>,
        manual_id: ManualId,
    ) -> Result<Vec<Step>, Error> {
        self.readable_manual(viewer, manual_id).await?;
        let set = self
            .steps
            .load_sequence(manual_id)
            .await
            .map_err(map_step_error)?;
        self.expand_images(OrderedSequence::load(set.steps).into_items())
            .await
    }

    async fn create_step(
        &self,
        actor: UserId,
        manual_id: ManualId,
        draft: StepDraft,
    ) -> Result<Step, Error> {
        validate_step(&draft, &self.policy)?;
        self.owned_manual(actor, manual_id).await?;
        let now = self.clock.utc();
        let step = retry_on_stale(manual_id, || self.try_insert(manual_id, &draft, now)).await?;
        debug!(
            manual_id = %manual_id,
            step_id = %step.id,
            order_number = step.order_number,
            "step created",
        );
        Ok(step.with_images(Vec::new()))
    }

    async fn update_step(
        &self,
        actor: UserId,
        step_id: StepId,
        changes: StepChanges,
    ) -> Result<Step, Error> {
        validate_step_changes(&changes, &self.policy)?;
        let manual_id = self.find_step(step_id).await?.manual_id;
        self.owned_manual(actor, manual_id).await?;
        let now = self.clock.utc();
        let step =
            retry_on_stale(manual_id, || self.try_update(manual_id, step_id, &changes, now)).await?;
        debug!(
            manual_id = %manual_id,
            step_id = %step_id,
            order_number = step.order_number,
            "step updated",
        );

        let mut expanded = self.expand_images(vec![step]).await?;
        expanded
            .pop()
            .ok_or_else(|| Error::internal("step vanished while loading images"))
    }

    async fn delete_step(&self, actor: UserId, step_id: StepId) -> Result<(), Error> {
        let step = self.find_step(step_id).await?;
        let manual_id = step.manual_id;
        self.owned_manual(actor, manual_id).await?;
        let removed = retry_on_stale(manual_id, || self.try_remove(manual_id, step_id)).await?;
        debug!(manual_id = %manual_id, step_id = %step_id, "step deleted");
        self.remove_files(&removed).await;
        Ok(())
    }

    async fn reorder_steps(
        &self,
        actor: UserId,
        manual_id: ManualId,
        updates: Vec<StepOrderUpdate>,
    ) -> Result<Vec<Step>, Error> {
        self.owned_manual(actor, manual_id).await?;
        let pairs: Vec<(StepId, i64)> = updates
            .iter()
            .map(|update| (update.id, update.order_number))
            .collect();
        let steps = retry_on_stale(manual_id, || self.try_bulk_order(manual_id, &pairs)).await?;
        debug!(manual_id = %manual_id, steps = steps.len(), "steps reordered");
        self.expand_images(steps).await
    }
}
