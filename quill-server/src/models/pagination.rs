//! Pagination types

use serde::{Deserialize, Serialize};

/// Maximum items per page
const MAX_PER_PAGE: u32 = 100;

/// Default items per page for public listings
pub const DEFAULT_PER_PAGE: u32 = 6;

/// Pagination parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    /// Page number (1-indexed)
    pub page: u32,
    /// Items per page (max 100)
    pub per_page: u32,
}

impl Pagination {
    /// Create pagination with validation.
    ///
    /// - Page is clamped to minimum of 1
    /// - Per page is clamped to 1..=100
    pub fn new(page: u32, per_page: u32) -> Self {
        Self {
            page: page.max(1),
            per_page: per_page.clamp(1, MAX_PER_PAGE),
        }
    }

    /// Build from a raw `page` query value.
    ///
    /// Missing and non-integer values select page 1. Any integer that is
    /// not a valid page (below 1, or beyond what fits) selects the last
    /// page once [`within`](Self::within) knows the total.
    pub fn from_param(raw: Option<&str>, per_page: u32) -> Self {
        let page = match raw.map(parse_page) {
            Some(PageParam::Number(page)) => page,
            Some(PageParam::OutOfRange) => u32::MAX,
            Some(PageParam::NotANumber) | None => 1,
        };
        Self::new(page, per_page)
    }

    /// Clamp the page into the range that exists for `total` items.
    ///
    /// Requests past the end land on the last page.
    pub fn within(self, total: i64) -> Self {
        let last = total_pages(total, self.per_page);
        Self {
            page: self.page.min(last),
            per_page: self.per_page,
        }
    }

    /// Calculate SQL OFFSET value.
    pub fn offset(&self) -> u64 {
        (self.page as u64 - 1) * self.per_page as u64
    }

    /// Get LIMIT value.
    pub fn limit(&self) -> u32 {
        self.per_page
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page: 1,
            per_page: DEFAULT_PER_PAGE,
        }
    }
}

enum PageParam {
    Number(u32),
    OutOfRange,
    NotANumber,
}

fn parse_page(raw: &str) -> PageParam {
    let raw = raw.trim();
    let (negative, digits) = match raw.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, raw.strip_prefix('+').unwrap_or(raw)),
    };
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return PageParam::NotANumber;
    }
    if negative {
        return PageParam::OutOfRange;
    }
    match digits.parse::<u32>() {
        Ok(page) if page >= 1 => PageParam::Number(page),
        _ => PageParam::OutOfRange,
    }
}

fn total_pages(total: i64, per_page: u32) -> u32 {
    if total <= 0 {
        1
    } else {
        let per_page = per_page.max(1) as i64;
        (((total + per_page - 1) / per_page).min(u32::MAX as i64) as u32).max(1)
    }
}

/// Paginated response wrapper
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Paginated<T> {
    /// Items for current page
    pub items: Vec<T>,
    /// Total count across all pages
    pub total: i64,
    /// Current page number
    pub page: u32,
    /// Items per page
    pub per_page: u32,
}

impl<T> Paginated<T> {
    /// Slice an already ordered, complete result set.
    pub fn from_vec(all: Vec<T>, page: Pagination) -> Self {
        let total = all.len() as i64;
        let page = page.within(total);
        let items = all
            .into_iter()
            .skip(page.offset() as usize)
            .take(page.limit() as usize)
            .collect();

        Self {
            items,
            total,
            page: page.page,
            per_page: page.per_page,
        }
    }

    /// Calculate total number of pages.
    pub fn total_pages(&self) -> u32 {
        total_pages(self.total, self.per_page)
    }

    /// Check if there's a next page.
    pub fn has_next(&self) -> bool {
        self.page < self.total_pages()
    }

    /// Check if there's a previous page.
    pub fn has_prev(&self) -> bool {
        self.page > 1
    }

    /// Convert the items while keeping the page bookkeeping.
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Paginated<U> {
        Paginated {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            page: self.page,
            per_page: self.per_page,
        }
    }
}

/// Query parameters for pagination
///
/// `page` stays a string so that junk values fall back to page 1
/// instead of rejecting the request, and out-of-range integers to the
/// last page.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PaginationParams {
    pub page: Option<String>,
    pub per_page: Option<u32>,
}

impl PaginationParams {
    pub fn resolve(&self, default_per_page: u32) -> Pagination {
        Pagination::from_param(
            self.page.as_deref(),
            self.per_page.unwrap_or(default_per_page),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offset_calculation() {
        let p = Pagination::new(1, 10);
        assert_eq!(p.offset(), 0);

        let p = Pagination::new(2, 10);
        assert_eq!(p.offset(), 10);

        let p = Pagination::new(3, 25);
        assert_eq!(p.offset(), 50);
    }

    #[test]
    fn clamps_page() {
        let p = Pagination::new(0, 10);
        assert_eq!(p.page, 1);
    }

    #[test]
    fn clamps_per_page() {
        let p = Pagination::new(1, 0);
        assert_eq!(p.per_page, 1);

        let p = Pagination::new(1, 999);
        assert_eq!(p.per_page, 100);
    }

    #[test]
    fn default_is_six_per_page() {
        assert_eq!(Pagination::default().per_page, 6);
    }

    #[test]
    fn lenient_page_param() {
        assert_eq!(Pagination::from_param(None, 6).page, 1);
        assert_eq!(Pagination::from_param(Some("abc"), 6).page, 1);
        assert_eq!(Pagination::from_param(Some(""), 6).page, 1);
        assert_eq!(Pagination::from_param(Some("2.5"), 6).page, 1);
        assert_eq!(Pagination::from_param(Some(" 3 "), 6).page, 3);
        assert_eq!(Pagination::from_param(Some("+2"), 6).page, 2);
    }

    #[test]
    fn invalid_page_numbers_land_on_last() {
        for raw in ["0", "-4", "-0", "99999999999999999999"] {
            let p = Pagination::from_param(Some(raw), 6).within(13);
            assert_eq!(p.page, 3, "page {raw:?}");
        }

        let p = Pagination::from_param(Some("0"), 6).within(0);
        assert_eq!(p.page, 1);
    }

    #[test]
    fn out_of_range_page_lands_on_last() {
        let p = Pagination::new(9, 6).within(13);
        assert_eq!(p.page, 3);

        let p = Pagination::new(4, 6).within(0);
        assert_eq!(p.page, 1);
    }

    #[test]
    fn from_vec_slices() {
        let page = Paginated::from_vec((1..=13).collect::<Vec<_>>(), Pagination::new(3, 6));
        assert_eq!(page.items, vec![13]);
        assert_eq!(page.total, 13);
        assert_eq!(page.total_pages(), 3);

        let page = Paginated::from_vec((1..=13).collect::<Vec<_>>(), Pagination::new(99, 6));
        assert_eq!(page.page, 3);
    }

    #[test]
    fn total_pages() {
        let paginated: Paginated<()> = Paginated {
            items: vec![],
            total: 0,
            page: 1,
            per_page: 10,
        };
        assert_eq!(paginated.total_pages(), 1);

        let paginated: Paginated<()> = Paginated {
            items: vec![],
            total: 25,
            page: 1,
            per_page: 10,
        };
        assert_eq!(paginated.total_pages(), 3);
    }

    #[test]
    fn has_next_prev() {
        let paginated: Paginated<()> = Paginated {
            items: vec![],
            total: 30,
            page: 1,
            per_page: 10,
        };
        assert!(paginated.has_next());
        assert!(!paginated.has_prev());

        let paginated: Paginated<()> = Paginated {
            items: vec![],
            total: 30,
            page: 3,
            per_page: 10,
        };
        assert!(!paginated.has_next());
        assert!(paginated.has_prev());
    }
}
