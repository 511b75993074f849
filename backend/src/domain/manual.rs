//! Manual aggregate: a titled, ordered collection of steps owned by one user.

use chrono::{DateTime, Utc};

use super::{ManualId, Relation, Step, UserId};

/// Who may read a manual besides its owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Visibility {
    /// Anyone, including anonymous readers.
    Public,
    /// Only the owner.
    #[default]
    Private,
}

impl Visibility {
    /// Map the boundary `isPublic` flag onto the enum.
    #[must_use]
    pub const fn from_is_public(is_public: bool) -> Self {
        if is_public { Self::Public } else { Self::Private }
    }

    /// Boundary representation.
    #[must_use]
    pub const fn is_public(self) -> bool {
        matches!(self, Self::Public)
    }
}

/// Persisted manual.
///
/// ## Invariants
/// - When `steps` is loaded it is sorted by order number with no duplicates.
#[derive(Debug, Clone, PartialEq)]
pub struct Manual {
    pub id: ManualId,
    pub owner_id: UserId,
    pub title: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub visibility: Visibility,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub steps: Relation<Step>,
}

impl Manual {
    /// Whether `user` owns this manual.
    pub fn is_owned_by(&self, user: &UserId) -> bool {
        self.owner_id == *user
    }

    /// Whether `viewer` (possibly anonymous) may read this manual.
    pub fn is_readable_by(&self, viewer: Option<&UserId>) -> bool {
        self.visibility.is_public() || viewer.is_some_and(|user| self.is_owned_by(user))
    }

    /// Attach a loaded step sequence.
    #[must_use]
    pub fn with_steps(mut self, steps: Vec<Step>) -> Self {
        self.steps = Relation::Loaded(steps);
        self
    }
}

/// Input for creating a manual (`ManualCreate`).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ManualDraft {
    pub title: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub visibility: Visibility,
}

/// Partial update for a manual (`ManualUpdate`).
///
/// `None` leaves a field untouched. For `description` and `category`, a
/// blank string clears the value.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ManualChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub visibility: Option<Visibility>,
}

impl ManualChanges {
    /// Whether the update carries no changes at all.
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.category.is_none()
            && self.visibility.is_none()
    }

    /// Apply the supplied fields to `manual`, stamping `updated_at`.
    pub fn apply_to(&self, manual: &mut Manual, now: DateTime<Utc>) {
        if let Some(title) = &self.title {
            manual.title = title.trim().to_owned();
        }
        if let Some(description) = &self.description {
            manual.description = non_blank(description);
        }
        if let Some(category) = &self.category {
            manual.category = non_blank(category);
        }
        if let Some(visibility) = self.visibility {
            manual.visibility = visibility;
        }
        manual.updated_at = now;
    }
}

/// Normalise optional free text: trimmed, with blanks treated as absent.
pub(crate) fn non_blank(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_owned())
}
