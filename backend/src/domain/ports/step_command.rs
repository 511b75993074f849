//! Driving port for step reads and positional mutations.
//!
//! Every mutation runs as one atomic unit scoped to the owning manual's
//! step set.

use async_trait::async_trait;

use crate::domain::{Error, ManualId, Step, StepChanges, StepDraft, StepId, StepOrderUpdate, UserId};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait StepCommand: Send + Sync {
    /// Steps of a readable manual in order, images expanded.
    async fn list_steps(&self, viewer: Option<UserId>, manual_id: ManualId)
    -> Result<Vec<Step>, Error>;

    /// Insert a step at the requested position or append it.
    async fn create_step(
        &self,
        actor: UserId,
        manual_id: ManualId,
        draft: StepDraft,
    ) -> Result<Step, Error>;

    /// Update title/content and, when requested, move the step.
    async fn update_step(
        &self,
        actor: UserId,
        step_id: StepId,
        changes: StepChanges,
    ) -> Result<Step, Error>;

    /// Delete a step and its images, closing the gap behind it.
    async fn delete_step(&self, actor: UserId, step_id: StepId) -> Result<(), Error>;

    /// Replace every position of a manual's steps at once.
    async fn reorder_steps(
        &self,
        actor: UserId,
        manual_id: ManualId,
        updates: Vec<StepOrderUpdate>,
    ) -> Result<Vec<Step>, Error>;
}
