//! Port for step persistence with optimistic concurrency.
//!
//! Each manual carries a step revision. Readers get the revision together
//! with the sequence; writers pass it back and the adapter rejects the write
//! with [`StepRepositoryError::RevisionMismatch`] when another mutation has
//! committed in between. A successful write increments the revision.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{Image, ManualId, OrderChange, Step, StepId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by step repository adapters.
    pub enum StepRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } => "step repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "step repository query failed: {message}",
        /// Another mutation committed since the sequence was read.
        RevisionMismatch { expected: u64, actual: u64 } =>
            "step revision mismatch: expected {expected}, found {actual}",
        /// The manual or step does not exist.
        NotFound { message: String } => "{message}",
    }
}

/// Snapshot of one manual's steps, sorted by stored order number.
#[derive(Debug, Clone, PartialEq)]
pub struct StepSet {
    pub revision: u64,
    pub steps: Vec<Step>,
}

/// Record handed to the repository when inserting a step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewStep {
    pub manual_id: ManualId,
    pub title: String,
    pub content: Option<String>,
    pub order_number: u32,
    pub created_at: DateTime<Utc>,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait StepRepository: Send + Sync {
    /// Read the current revision and every step of `manual_id`.
    async fn load_sequence(&self, manual_id: ManualId) -> Result<StepSet, StepRepositoryError>;

    /// Fetch a single step. Images are not loaded.
    async fn find_step(&self, id: StepId) -> Result<Option<Step>, StepRepositoryError>;

    /// Apply `shifts`, insert `step`, and bump the revision atomically.
    async fn insert_step(
        &self,
        expected_revision: u64,
        step: &NewStep,
        shifts: &[OrderChange<StepId>],
    ) -> Result<Step, StepRepositoryError>;

    /// Delete `step_id` with its images, apply `shifts`, and bump the
    /// revision atomically. Returns the removed images.
    async fn delete_step(
        &self,
        manual_id: ManualId,
        expected_revision: u64,
        step_id: StepId,
        shifts: &[OrderChange<StepId>],
    ) -> Result<Vec<Image>, StepRepositoryError>;

    /// Write changed order numbers and bump the revision atomically.
    async fn apply_order(
        &self,
        manual_id: ManualId,
        expected_revision: u64,
        changes: &[OrderChange<StepId>],
    ) -> Result<(), StepRepositoryError>;

    /// Apply `shifts`, persist the title, content and `updated_at` of
    /// `step`, and bump the revision atomically.
    async fn update_step(
        &self,
        manual_id: ManualId,
        expected_revision: u64,
        step: &Step,
        shifts: &[OrderChange<StepId>],
    ) -> Result<(), StepRepositoryError>;
}
