//! Image entity: a stored file attached to exactly one step.

use chrono::{DateTime, Utc};

use super::{ImageId, StepId};

/// Persisted image metadata. The bytes live in external storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Image {
    pub id: ImageId,
    pub step_id: StepId,
    /// Path relative to the upload root.
    pub file_path: String,
    pub file_name: String,
    pub file_size: i64,
    pub mime_type: String,
    pub created_at: DateTime<Utc>,
}

/// Result of a completed upload, ready to be attached to a step.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ImageUpload {
    pub file_path: String,
    pub file_name: String,
    pub file_size: i64,
    pub mime_type: String,
}
