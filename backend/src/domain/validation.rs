//! Content validation for manuals, steps and images.
//!
//! Rules are parameterised by a [`ContentPolicy`] built from settings so
//! limits can change per deployment without touching the domain. Every
//! validator collects all field-level problems instead of stopping at the
//! first one.

use std::collections::BTreeSet;
use std::fmt;

use super::{Error, FieldErrors, ImageUpload, ManualChanges, ManualDraft, StepChanges, StepDraft};

/// Default maximum title length in characters.
pub const DEFAULT_MAX_TITLE_LENGTH: usize = 255;
/// Default maximum image size in bytes (5 MiB).
pub const DEFAULT_MAX_IMAGE_BYTES: i64 = 5 * 1024 * 1024;
/// MIME types accepted when no explicit list is configured.
pub const DEFAULT_ALLOWED_MIME_TYPES: [&str; 4] =
    ["image/png", "image/jpeg", "image/gif", "image/webp"];

/// Tunable content limits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentPolicy {
    max_title_length: usize,
    allowed_mime_types: BTreeSet<String>,
    max_image_bytes: i64,
}

impl Default for ContentPolicy {
    fn default() -> Self {
        Self {
            max_title_length: DEFAULT_MAX_TITLE_LENGTH,
            allowed_mime_types: DEFAULT_ALLOWED_MIME_TYPES
                .iter()
                .map(|mime| (*mime).to_owned())
                .collect(),
            max_image_bytes: DEFAULT_MAX_IMAGE_BYTES,
        }
    }
}

impl ContentPolicy {
    /// Override the title limit.
    #[must_use]
    pub fn with_max_title_length(mut self, max: usize) -> Self {
        self.max_title_length = max;
        self
    }

    /// Replace the MIME allow-list. Entries are trimmed and lower-cased;
    /// blanks are dropped.
    #[must_use]
    pub fn with_allowed_mime_types<I, S>(mut self, types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.allowed_mime_types = types
            .into_iter()
            .map(|mime| mime.as_ref().trim().to_ascii_lowercase())
            .filter(|mime| !mime.is_empty())
            .collect();
        self
    }

    /// Override the image size limit.
    #[must_use]
    pub fn with_max_image_bytes(mut self, max: i64) -> Self {
        self.max_image_bytes = max;
        self
    }

    pub fn max_title_length(&self) -> usize {
        self.max_title_length
    }

    pub fn max_image_bytes(&self) -> i64 {
        self.max_image_bytes
    }

    /// Whether `mime` is on the allow-list (case-insensitive).
    pub fn allows_mime(&self, mime: &str) -> bool {
        self.allowed_mime_types
            .contains(&mime.trim().to_ascii_lowercase())
    }
}

/// Field-level validation failure.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ValidationError {
    errors: FieldErrors,
}

impl ValidationError {
    /// Error carrying a single field message.
    pub fn single(field: &str, message: impl Into<String>) -> Self {
        let mut error = Self::default();
        error.push(field, message);
        error
    }

    fn push(&mut self, field: &str, message: impl Into<String>) {
        self.errors
            .entry(field.to_owned())
            .or_default()
            .push(message.into());
    }

    fn into_result(self) -> Result<(), Self> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }

    /// Messages keyed by wire field name.
    pub fn field_errors(&self) -> &FieldErrors {
        &self.errors
    }

    pub fn into_field_errors(self) -> FieldErrors {
        self.errors
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, messages) in &self.errors {
            for message in messages {
                if !first {
                    f.write_str("; ")?;
                }
                write!(f, "{field}: {message}")?;
                first = false;
            }
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

impl From<ValidationError> for Error {
    fn from(value: ValidationError) -> Self {
        Error::invalid_request("validation failed").with_field_errors(value.into_field_errors())
    }
}

fn check_title(errors: &mut ValidationError, title: &str, policy: &ContentPolicy) {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        errors.push("title", "title is required");
    } else if trimmed.chars().count() > policy.max_title_length {
        errors.push(
            "title",
            format!(
                "title must be at most {} characters",
                policy.max_title_length
            ),
        );
    }
}

/// Validate a manual before creation.
pub fn validate_manual(draft: &ManualDraft, policy: &ContentPolicy) -> Result<(), ValidationError> {
    let mut errors = ValidationError::default();
    check_title(&mut errors, &draft.title, policy);
    errors.into_result()
}

/// Validate the supplied fields of a manual update.
pub fn validate_manual_changes(
    changes: &ManualChanges,
    policy: &ContentPolicy,
) -> Result<(), ValidationError> {
    let mut errors = ValidationError::default();
    if let Some(title) = &changes.title {
        check_title(&mut errors, title, policy);
    }
    errors.into_result()
}

/// Validate a step before insertion.
pub fn validate_step(draft: &StepDraft, policy: &ContentPolicy) -> Result<(), ValidationError> {
    let mut errors = ValidationError::default();
    check_title(&mut errors, &draft.title, policy);
    if draft.order_number.is_some_and(|position| position < 0) {
        errors.push("orderNumber", "orderNumber must not be negative");
    }
    errors.into_result()
}

/// Validate the supplied fields of a step update.
///
/// The position itself is range-checked by the ordering engine.
pub fn validate_step_changes(
    changes: &StepChanges,
    policy: &ContentPolicy,
) -> Result<(), ValidationError> {
    let mut errors = ValidationError::default();
    if let Some(title) = &changes.title {
        check_title(&mut errors, title, policy);
    }
    errors.into_result()
}

/// Validate upload metadata before attaching it to a step.
pub fn validate_image(upload: &ImageUpload, policy: &ContentPolicy) -> Result<(), ValidationError> {
    let mut errors = ValidationError::default();
    if upload.file_path.trim().is_empty() {
        errors.push("filePath", "filePath is required");
    }
    if upload.file_name.trim().is_empty() {
        errors.push("fileName", "fileName is required");
    }
    if upload.file_size <= 0 {
        errors.push("fileSize", "fileSize must be positive");
    } else if upload.file_size > policy.max_image_bytes {
        errors.push(
            "fileSize",
            format!("fileSize must be at most {} bytes", policy.max_image_bytes),
        );
    }
    if !policy.allows_mime(&upload.mime_type) {
        errors.push(
            "mimeType",
            format!("mimeType '{}' is not allowed", upload.mime_type),
        );
    }
    errors.into_result()
}
