//! Port for manual persistence.
//!
//! Adapters store manual headers and evaluate the search contract. Step
//! sequences are handled by [`super::StepRepository`].

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use pagination::Page;

use crate::domain::{Image, Manual, ManualId, ManualSearch, SearchScope, UserId, Visibility};

use super::define_port_error;

define_port_error! {
    /// Errors raised by manual repository adapters.
    pub enum ManualRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } => "manual repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "manual repository query failed: {message}",
        /// The manual does not exist.
        NotFound { id: i64 } => "manual {id} not found",
    }
}

/// Record handed to the repository on creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewManual {
    pub owner_id: UserId,
    pub title: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub visibility: Visibility,
    pub created_at: DateTime<Utc>,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ManualRepository: Send + Sync {
    /// Insert a manual with an empty step sequence.
    async fn create(&self, manual: &NewManual) -> Result<Manual, ManualRepositoryError>;

    /// Fetch a manual header. Steps are not loaded.
    async fn find_by_id(&self, id: ManualId) -> Result<Option<Manual>, ManualRepositoryError>;

    /// Persist the mutable header fields and `updated_at`.
    async fn update(&self, manual: &Manual) -> Result<(), ManualRepositoryError>;

    /// Delete the manual with all of its steps and images in one unit.
    ///
    /// Returns the removed images so their stored files can be cleaned up.
    async fn delete_cascade(&self, id: ManualId) -> Result<Vec<Image>, ManualRepositoryError>;

    /// Filter, sort and paginate manuals visible in `scope`.
    async fn search(
        &self,
        query: &ManualSearch,
        scope: &SearchScope,
    ) -> Result<Page<Manual>, ManualRepositoryError>;
}
