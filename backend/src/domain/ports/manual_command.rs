//! Driving port for manual mutations.

use async_trait::async_trait;

use crate::domain::{Error, Manual, ManualChanges, ManualDraft, ManualId, UserId};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ManualCommand: Send + Sync {
    /// Create a manual owned by `owner` with no steps.
    async fn create_manual(&self, owner: UserId, draft: ManualDraft) -> Result<Manual, Error>;

    /// Apply a partial update. Only the owner may update.
    async fn update_manual(
        &self,
        actor: UserId,
        id: ManualId,
        changes: ManualChanges,
    ) -> Result<Manual, Error>;

    /// Delete a manual with every step and image it owns.
    async fn delete_manual(&self, actor: UserId, id: ManualId) -> Result<(), Error>;
}
