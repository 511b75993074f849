//! Page-number pagination primitives shared by Guideforge endpoints.
//!
//! A [`PageRequest`] carries a validated 1-based page and a bounded page
//! size. [`Page`] is the collection envelope returned to clients; it reports
//! the total number of matching records and derives `totalPages` with
//! integer arithmetic so the result never depends on float rounding.
//!
//! Requesting a page beyond the last one is not an error: the envelope simply
//! carries no items.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Page served when the caller omits `page`.
pub const DEFAULT_PAGE: u32 = 1;
/// Page size used when the caller omits `limit`.
pub const DEFAULT_LIMIT: u32 = 10;
/// Largest page size a caller may request.
pub const MAX_LIMIT: u32 = 100;

/// Errors raised while validating raw pagination input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PageRequestError {
    /// `page` was zero, negative, or larger than the supported range.
    #[error("page must be at least 1, got {page}")]
    PageOutOfBounds {
        /// Raw value supplied by the caller.
        page: i64,
    },
    /// `limit` fell outside `1..=MAX_LIMIT`.
    #[error("limit must be between 1 and {max}, got {limit}")]
    LimitOutOfBounds {
        /// Raw value supplied by the caller.
        limit: i64,
        /// Inclusive upper bound.
        max: u32,
    },
}

impl PageRequestError {
    /// Wire name of the offending query parameter.
    #[must_use]
    pub const fn field(&self) -> &'static str {
        match self {
            Self::PageOutOfBounds { .. } => "page",
            Self::LimitOutOfBounds { .. } => "limit",
        }
    }
}

/// Validated pagination request.
///
/// ## Invariants
/// - `page >= 1`
/// - `1 <= limit <= MAX_LIMIT`
///
/// # Examples
/// ```
/// use pagination::PageRequest;
///
/// let request = PageRequest::new(Some(3), Some(10)).expect("valid request");
/// assert_eq!(request.offset(), 20);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    page: u32,
    limit: u32,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            limit: DEFAULT_LIMIT,
        }
    }
}

impl PageRequest {
    /// Validate raw `page`/`limit` values, applying defaults for omissions.
    ///
    /// # Errors
    /// Returns [`PageRequestError`] when either value is out of bounds.
    pub fn new(page: Option<i64>, limit: Option<i64>) -> Result<Self, PageRequestError> {
        let page = match page {
            None => DEFAULT_PAGE,
            Some(raw) => u32::try_from(raw)
                .ok()
                .filter(|value| *value >= 1)
                .ok_or(PageRequestError::PageOutOfBounds { page: raw })?,
        };
        let limit = match limit {
            None => DEFAULT_LIMIT,
            Some(raw) => u32::try_from(raw)
                .ok()
                .filter(|value| (1..=MAX_LIMIT).contains(value))
                .ok_or(PageRequestError::LimitOutOfBounds {
                    limit: raw,
                    max: MAX_LIMIT,
                })?,
        };
        Ok(Self { page, limit })
    }

    /// 1-based page number.
    #[must_use]
    pub const fn page(self) -> u32 {
        self.page
    }

    /// Maximum number of items on the page.
    #[must_use]
    pub const fn limit(self) -> u32 {
        self.limit
    }

    /// Number of records preceding the first item of this page.
    #[must_use]
    pub fn offset(self) -> u64 {
        u64::from(self.page.saturating_sub(1)) * u64::from(self.limit)
    }
}

/// Number of pages needed to hold `total` records at `limit` per page.
///
/// # Examples
/// ```
/// assert_eq!(pagination::total_pages(25, 10), 3);
/// assert_eq!(pagination::total_pages(0, 10), 0);
/// ```
#[must_use]
pub fn total_pages(total: u64, limit: u32) -> u64 {
    if limit == 0 {
        return 0;
    }
    total.div_ceil(u64::from(limit))
}

/// Collection envelope: one page of items plus totals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    /// Items on this page, in the requested order.
    pub items: Vec<T>,
    /// Number of records matching the query across all pages.
    pub total: u64,
    /// 1-based page number that was served.
    pub page: u32,
    /// Page size that was applied.
    pub limit: u32,
    /// `ceil(total / limit)`.
    pub total_pages: u64,
}

impl<T> Page<T> {
    /// Assemble a page from already-sliced items.
    #[must_use]
    pub fn new(items: Vec<T>, total: u64, request: PageRequest) -> Self {
        Self {
            items,
            total,
            page: request.page(),
            limit: request.limit(),
            total_pages: total_pages(total, request.limit()),
        }
    }

    /// Slice a fully materialised, already ordered collection.
    ///
    /// # Examples
    /// ```
    /// use pagination::{Page, PageRequest};
    ///
    /// let all: Vec<u32> = (1..=25).collect();
    /// let page = Page::from_ordered(all, PageRequest::new(Some(3), Some(10)).expect("valid"));
    /// assert_eq!(page.items, vec![21, 22, 23, 24, 25]);
    /// assert_eq!(page.total_pages, 3);
    /// ```
    #[must_use]
    pub fn from_ordered(all: Vec<T>, request: PageRequest) -> Self {
        let total = u64::try_from(all.len()).unwrap_or(u64::MAX);
        let skip = usize::try_from(request.offset()).unwrap_or(usize::MAX);
        let take = usize::try_from(request.limit()).unwrap_or(usize::MAX);
        let items = all.into_iter().skip(skip).take(take).collect();
        Self::new(items, total, request)
    }

    /// Convert every item while keeping the totals.
    #[must_use]
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            page: self.page,
            limit: self.limit,
            total_pages: self.total_pages,
        }
    }

    /// Whether the served page lies beyond the last populated page.
    #[must_use]
    pub fn is_past_end(&self) -> bool {
        u64::from(self.page) > self.total_pages
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use rstest::rstest;
    use serde_json::{Value, json};

    #[rstest]
    fn omitted_values_use_defaults() {
        let request = PageRequest::new(None, None).expect("defaults are valid");
        assert_eq!(request, PageRequest::default());
        assert_eq!(request.page(), 1);
        assert_eq!(request.limit(), 10);
        assert_eq!(request.offset(), 0);
    }

    #[rstest]
    #[case(Some(0), None, "page")]
    #[case(Some(-4), None, "page")]
    #[case(None, Some(0), "limit")]
    #[case(None, Some(101), "limit")]
    #[case(None, Some(-1), "limit")]
    fn out_of_bounds_values_are_rejected(
        #[case] page: Option<i64>,
        #[case] limit: Option<i64>,
        #[case] field: &str,
    ) {
        let err = PageRequest::new(page, limit).expect_err("out of bounds");
        assert_eq!(err.field(), field);
    }

    #[rstest]
    #[case(0, 10, 0)]
    #[case(1, 10, 1)]
    #[case(10, 10, 1)]
    #[case(11, 10, 2)]
    #[case(25, 10, 3)]
    #[case(25, 100, 1)]
    fn total_pages_rounds_up(#[case] total: u64, #[case] limit: u32, #[case] expected: u64) {
        assert_eq!(total_pages(total, limit), expected);
    }

    #[rstest]
    #[case(3, 5)]
    #[case(4, 0)]
    fn pages_past_the_middle_shrink_then_empty(#[case] page: i64, #[case] expected_len: usize) {
        let all: Vec<u32> = (1..=25).collect();
        let request = PageRequest::new(Some(page), Some(10)).expect("valid request");
        let served = Page::from_ordered(all, request);
        assert_eq!(served.items.len(), expected_len);
        assert_eq!(served.total, 25);
        assert_eq!(served.total_pages, 3);
    }

    #[rstest]
    fn past_end_is_reported() {
        let request = PageRequest::new(Some(4), Some(10)).expect("valid request");
        let served = Page::from_ordered((1..=25).collect::<Vec<u32>>(), request);
        assert!(served.is_past_end());
        assert!(served.items.is_empty());
    }

    #[rstest]
    fn envelope_serialises_camel_case() {
        let request = PageRequest::new(Some(1), Some(2)).expect("valid request");
        let served = Page::new(vec!["a"], 3, request).map(str::to_uppercase);
        let value = serde_json::to_value(&served).expect("serialise page");
        assert_eq!(
            value,
            json!({
                "items": ["A"],
                "total": 3,
                "page": 1,
                "limit": 2,
                "totalPages": 2,
            })
        );
        assert!(matches!(value.get("totalPages"), Some(Value::Number(_))));
    }
}
