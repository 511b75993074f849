//! Driving port for manual reads.

use async_trait::async_trait;
use pagination::Page;

use crate::domain::{Error, Manual, ManualId, ManualSearch, SearchScope, UserId};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ManualQuery: Send + Sync {
    /// Load a manual with its steps and their images expanded.
    ///
    /// Private manuals are only readable by their owner; `viewer` is `None`
    /// for anonymous callers.
    async fn get_manual(&self, viewer: Option<UserId>, id: ManualId) -> Result<Manual, Error>;

    /// Run the search contract within `scope`. Steps are not loaded.
    async fn search_manuals(
        &self,
        query: ManualSearch,
        scope: SearchScope,
    ) -> Result<Page<Manual>, Error>;
}
