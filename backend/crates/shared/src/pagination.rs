//! Page-number pagination
//!
//! Every list endpoint accepts `?page=N` (1-based) and answers with
//! `{count, next, previous, results}`. `next`/`previous` are page numbers
//! or `null`.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::app_error::AppError;

/// Default number of items per page
pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// `?page=` query parameter
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<u32>,
}

/// A page was requested that does not exist
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("Invalid page")]
pub struct InvalidPage;

impl From<InvalidPage> for AppError {
    fn from(err: InvalidPage) -> Self {
        AppError::not_found(err.to_string())
    }
}

/// Validated page window handed to repositories
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    page: u32,
    size: u32,
}

impl PageRequest {
    /// Build a window; page 0 is rejected, a zero size falls back to the default
    pub fn new(page: Option<u32>, size: u32) -> Result<Self, InvalidPage> {
        let page = page.unwrap_or(1);
        if page == 0 {
            return Err(InvalidPage);
        }
        let size = if size == 0 { DEFAULT_PAGE_SIZE } else { size };
        Ok(Self { page, size })
    }

    pub fn from_query(query: PageQuery, size: u32) -> Result<Self, InvalidPage> {
        Self::new(query.page, size)
    }

    #[inline]
    pub const fn page(&self) -> u32 {
        self.page
    }

    /// SQL `LIMIT`
    #[inline]
    pub const fn limit(&self) -> i64 {
        self.size as i64
    }

    /// SQL `OFFSET`
    #[inline]
    pub const fn offset(&self) -> i64 {
        (self.page as i64 - 1) * self.size as i64
    }

    /// Slice an in-memory collection the way `LIMIT/OFFSET` would
    pub fn slice<T: Clone>(&self, items: &[T]) -> Vec<T> {
        items
            .iter()
            .skip(self.offset() as usize)
            .take(self.size as usize)
            .cloned()
            .collect()
    }
}

/// Paginated response body
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    pub count: u64,
    pub next: Option<u32>,
    pub previous: Option<u32>,
    pub results: Vec<T>,
}

impl<T> Page<T> {
    /// Assemble a page from one window of results and the total count
    ///
    /// Fails when the window lies past the last page; page 1 of an empty
    /// collection is valid.
    pub fn new(results: Vec<T>, count: u64, request: PageRequest) -> Result<Self, InvalidPage> {
        let size = u64::from(request.size);
        let last_page = count.div_ceil(size).max(1);
        let page = u64::from(request.page);
        if page > last_page {
            return Err(InvalidPage);
        }

        Ok(Self {
            count,
            next: (page < last_page).then(|| request.page + 1),
            previous: (page > 1).then(|| request.page - 1),
            results,
        })
    }

    /// Convert the items, keeping the page metadata
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            count: self.count,
            next: self.next,
            previous: self.previous,
            results: self.results.into_iter().map(f).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_request_window() {
        let req = PageRequest::new(Some(3), 10).unwrap();
        assert_eq!(req.limit(), 10);
        assert_eq!(req.offset(), 20);

        let req = PageRequest::new(None, 0).unwrap();
        assert_eq!(req.page(), 1);
        assert_eq!(req.limit(), i64::from(DEFAULT_PAGE_SIZE));

        assert_eq!(PageRequest::new(Some(0), 10), Err(InvalidPage));
    }

    #[test]
    fn test_page_links() {
        let req = PageRequest::new(Some(2), 2).unwrap();
        let page = Page::new(vec![3, 4], 5, req).unwrap();
        assert_eq!(page.next, Some(3));
        assert_eq!(page.previous, Some(1));

        let req = PageRequest::new(Some(3), 2).unwrap();
        let page = Page::new(vec![5], 5, req).unwrap();
        assert_eq!(page.next, None);
        assert_eq!(page.previous, Some(2));
    }

    #[test]
    fn test_empty_first_page_is_valid() {
        let req = PageRequest::new(None, 10).unwrap();
        let page: Page<i32> = Page::new(vec![], 0, req).unwrap();
        assert_eq!(page.count, 0);
        assert_eq!(page.next, None);
        assert_eq!(page.previous, None);
    }

    #[test]
    fn test_page_past_end_is_invalid() {
        let req = PageRequest::new(Some(4), 2).unwrap();
        assert_eq!(Page::<i32>::new(vec![], 5, req), Err(InvalidPage));
    }

    #[test]
    fn test_slice() {
        let req = PageRequest::new(Some(2), 2).unwrap();
        assert_eq!(req.slice(&[1, 2, 3, 4, 5]), vec![3, 4]);
    }
}
