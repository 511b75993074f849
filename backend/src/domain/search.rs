//! Manual search contract: filtering, sorting and pagination.
//!
//! Adapters that can push the query down (SQL) follow the same rules as
//! [`run`], which is the reference evaluation used by the in-memory store.

use std::cmp::Ordering;
use std::str::FromStr;

use pagination::{Page, PageRequest};

use super::{Manual, UserId, ValidationError, Visibility};

/// Column a manual listing is ordered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortField {
    Title,
    CreatedAt,
    #[default]
    UpdatedAt,
}

impl SortField {
    /// Wire name accepted in `sortBy`.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Title => "title",
            Self::CreatedAt => "createdAt",
            Self::UpdatedAt => "updatedAt",
        }
    }
}

impl FromStr for SortField {
    type Err = ValidationError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim() {
            "title" => Ok(Self::Title),
            "createdAt" => Ok(Self::CreatedAt),
            "updatedAt" => Ok(Self::UpdatedAt),
            other => Err(ValidationError::single(
                "sortBy",
                format!("sortBy must be one of title, createdAt, updatedAt; got '{other}'"),
            )),
        }
    }
}

/// Direction of a sort.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

impl FromStr for SortOrder {
    type Err = ValidationError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "asc" => Ok(Self::Asc),
            "desc" => Ok(Self::Desc),
            other => Err(ValidationError::single(
                "sortOrder",
                format!("sortOrder must be asc or desc; got '{other}'"),
            )),
        }
    }
}

/// Which manuals a caller may see at all, before any filter applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchScope {
    /// Anonymous catalogue: public manuals only.
    Public,
    /// The given user's own manuals, public or private.
    Owner(UserId),
    /// Public manuals plus the given user's private ones.
    Visible(UserId),
}

impl SearchScope {
    fn admits(&self, manual: &Manual) -> bool {
        match self {
            Self::Public => manual.visibility == Visibility::Public,
            Self::Owner(user) => manual.is_owned_by(user),
            Self::Visible(user) => manual.is_readable_by(Some(user)),
        }
    }
}

/// Validated search parameters.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ManualSearch {
    /// Case-insensitive substring matched against title or description.
    pub search: Option<String>,
    /// Exact category match.
    pub category: Option<String>,
    pub visibility: Option<Visibility>,
    pub page: PageRequest,
    pub sort_by: SortField,
    pub sort_order: SortOrder,
}

impl ManualSearch {
    /// Search term lower-cased for matching; blank terms count as absent.
    pub fn normalised_term(&self) -> Option<String> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|term| !term.is_empty())
            .map(str::to_lowercase)
    }
}

/// Whether `manual` satisfies both `scope` and every supplied filter.
pub fn matches(manual: &Manual, query: &ManualSearch, scope: &SearchScope) -> bool {
    if !scope.admits(manual) {
        return false;
    }
    if let Some(term) = query.normalised_term() {
        let in_title = manual.title.to_lowercase().contains(&term);
        let in_description = manual
            .description
            .as_deref()
            .is_some_and(|text| text.to_lowercase().contains(&term));
        if !in_title && !in_description {
            return false;
        }
    }
    if let Some(category) = &query.category
        && manual.category.as_deref() != Some(category.as_str())
    {
        return false;
    }
    query
        .visibility
        .is_none_or(|visibility| manual.visibility == visibility)
}

/// Ordering for `query`, ties broken by ascending id.
///
/// Titles compare by UTF-8 bytes, so `"Zebra"` sorts before `"apple"`. This
/// is the reference order; the SQL adapter sorts titles with `COLLATE "C"`
/// to agree with it regardless of the database's default collation.
pub fn compare(left: &Manual, right: &Manual, query: &ManualSearch) -> Ordering {
    let primary = match query.sort_by {
        SortField::Title => left.title.cmp(&right.title),
        SortField::CreatedAt => left.created_at.cmp(&right.created_at),
        SortField::UpdatedAt => left.updated_at.cmp(&right.updated_at),
    };
    let primary = match query.sort_order {
        SortOrder::Asc => primary,
        SortOrder::Desc => primary.reverse(),
    };
    primary.then_with(|| left.id.cmp(&right.id))
}

/// Filter, sort and paginate an in-memory collection.
pub fn run(manuals: impl IntoIterator<Item = Manual>, query: &ManualSearch, scope: &SearchScope) -> Page<Manual> {
    let mut selected: Vec<Manual> = manuals
        .into_iter()
        .filter(|manual| matches(manual, query, scope))
        .collect();
    selected.sort_by(|left, right| compare(left, right, query));
    Page::from_ordered(selected, query.page)
}
