//! Step entity: one instruction unit within a manual.

use chrono::{DateTime, Utc};

use super::{Image, ManualId, Relation, StepId};

/// Persisted step.
///
/// `order_number` is the 1-based display position within the owning manual.
#[derive(Debug, Clone, PartialEq)]
pub struct Step {
    pub id: StepId,
    pub manual_id: ManualId,
    pub order_number: u32,
    pub title: String,
    pub content: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub images: Relation<Image>,
}

impl Step {
    /// Attach the step's loaded images.
    #[must_use]
    pub fn with_images(mut self, images: Vec<Image>) -> Self {
        self.images = Relation::Loaded(images);
        self
    }
}

/// Input for creating a step (`StepCreate`).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StepDraft {
    pub title: String,
    pub content: Option<String>,
    /// Requested 1-based position. `None` or `Some(0)` appends.
    pub order_number: Option<i64>,
}

impl StepDraft {
    /// Position to insert at, or `None` to append.
    ///
    /// Values beyond `u32` saturate so the ordering engine reports them as
    /// out of range. Negative values are rejected earlier by validation.
    pub fn requested_position(&self) -> Option<u32> {
        match self.order_number {
            None | Some(0) => None,
            Some(raw) => Some(u32::try_from(raw).unwrap_or(u32::MAX)),
        }
    }
}

/// Partial update for a step (`StepUpdate`).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StepChanges {
    pub title: Option<String>,
    /// A blank string clears the content.
    pub content: Option<String>,
    /// New 1-based position; triggers a reorder.
    pub order_number: Option<i64>,
}

impl StepChanges {
    /// Whether title or content change.
    pub fn touches_content(&self) -> bool {
        self.title.is_some() || self.content.is_some()
    }

    /// Target position for a reorder, saturating like [`StepDraft`].
    pub fn requested_position(&self) -> Option<u32> {
        self.order_number
            .map(|raw| u32::try_from(raw).unwrap_or(if raw < 0 { 0 } else { u32::MAX }))
    }
}

/// One entry of a bulk reorder payload (`StepOrderUpdate`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepOrderUpdate {
    pub id: StepId,
    pub order_number: i64,
}
