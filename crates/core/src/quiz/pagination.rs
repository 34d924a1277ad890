//! Paging policy for question listings.
//!
//! Pure functions with no side effects. Out-of-range input is never an
//! error: a page below 1 becomes page 1 and a page size outside
//! `1..=MAX_PAGE_SIZE` becomes [`DEFAULT_PAGE_SIZE`].

use serde::{Deserialize, Serialize};

/// Page size used when the requested one is out of range.
pub const DEFAULT_PAGE_SIZE: u32 = 25;

/// Largest page size a caller may request.
pub const MAX_PAGE_SIZE: u32 = 100;

/// Clamps a requested page number to the first page when it is below 1.
pub fn normalize_page(page: i64) -> u32 {
    if page < 1 {
        1
    } else {
        u32::try_from(page).unwrap_or(u32::MAX)
    }
}

/// Resets a requested page size to [`DEFAULT_PAGE_SIZE`] when it falls outside
/// `1..=MAX_PAGE_SIZE`.
pub fn normalize_page_size(page_size: i64) -> u32 {
    if (1..=i64::from(MAX_PAGE_SIZE)).contains(&page_size) {
        page_size as u32
    } else {
        DEFAULT_PAGE_SIZE
    }
}

/// Number of pages needed to hold `total_count` rows, rounding up.
///
/// Zero rows means zero pages.
pub fn total_pages(total_count: u64, page_size: u32) -> u64 {
    if page_size == 0 {
        return 0;
    }
    total_count.div_ceil(u64::from(page_size))
}

/// A normalized page request.
///
/// Only constructible through [`PageRequest::new`], so `page >= 1` and
/// `1 <= page_size <= MAX_PAGE_SIZE` always hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageRequest {
    page: u32,
    page_size: u32,
}

impl PageRequest {
    /// Builds a request from raw caller input, normalizing both values.
    ///
    /// # Examples
    ///
    /// ```
    /// use quizbank_core::quiz::PageRequest;
    ///
    /// let request = PageRequest::new(-3, 0);
    /// assert_eq!(request.page(), 1);
    /// assert_eq!(request.page_size(), 25);
    /// ```
    pub fn new(page: i64, page_size: i64) -> Self {
        Self {
            page: normalize_page(page),
            page_size: normalize_page_size(page_size),
        }
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    /// Rows to skip before this page starts.
    pub fn offset(&self) -> u64 {
        u64::from(self.page - 1) * u64::from(self.page_size)
    }

    /// Maximum number of rows on this page.
    pub fn limit(&self) -> u64 {
        u64::from(self.page_size)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

/// One page of results plus the metadata needed to navigate the rest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total_count: u64,
    pub page: u32,
    pub page_size: u32,
    pub total_pages: u64,
}

impl<T> Page<T> {
    /// Assembles a page, deriving `total_pages` from the count and page size.
    pub fn new(items: Vec<T>, total_count: u64, request: PageRequest) -> Self {
        Self {
            items,
            total_count,
            page: request.page(),
            page_size: request.page_size(),
            total_pages: total_pages(total_count, request.page_size()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn has_next(&self) -> bool {
        u64::from(self.page) < self.total_pages
    }

    pub fn has_previous(&self) -> bool {
        self.page > 1
    }
}
