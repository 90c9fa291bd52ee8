use serde::{Deserialize, Serialize};

///
/// PaginationPolicy
///
/// Clamps caller page inputs. `page <= 0` or absent falls back to
/// `default_page`; a non-negative page size is capped at `max_page_size`;
/// a negative or absent page size falls back to `default_page_size`, where
/// `None` means unbounded.
///

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default)]
pub struct PaginationPolicy {
    pub default_page: u32,
    pub default_page_size: Option<u32>,
    pub max_page_size: u32,
}

impl PaginationPolicy {
    pub const DEFAULT_PAGE: u32 = 1;
    pub const MAX_PAGE_SIZE: u32 = 100;

    #[must_use]
    pub const fn new() -> Self {
        Self {
            default_page: Self::DEFAULT_PAGE,
            default_page_size: None,
            max_page_size: Self::MAX_PAGE_SIZE,
        }
    }

    #[must_use]
    pub const fn with_default_page_size(mut self, size: Option<u32>) -> Self {
        self.default_page_size = size;
        self
    }

    #[must_use]
    pub const fn with_max_page_size(mut self, size: u32) -> Self {
        self.max_page_size = size;
        self
    }

    #[must_use]
    pub fn limit_page(&self, page: Option<i64>) -> u32 {
        match page {
            Some(page) if page > 0 => u32::try_from(page).unwrap_or(u32::MAX),
            _ => self.default_page,
        }
    }

    #[must_use]
    pub fn limit_page_size(&self, page_size: Option<i64>) -> Option<u32> {
        match page_size {
            Some(size) if size >= 0 => Some(
                u32::try_from(size).map_or(self.max_page_size, |size| size.min(self.max_page_size)),
            ),
            _ => self.default_page_size,
        }
    }

    /// Window for the clamped inputs; `None` when the page size is unbounded.
    #[must_use]
    pub fn window(&self, page: Option<i64>, page_size: Option<i64>) -> Option<PageWindow> {
        let limit = self.limit_page_size(page_size)?;
        let page = self.limit_page(page).saturating_sub(1);

        Some(PageWindow {
            offset: u64::from(page) * u64::from(limit),
            limit,
        })
    }
}

impl Default for PaginationPolicy {
    fn default() -> Self {
        Self::new()
    }
}

///
/// PageWindow
/// Skip/take pair derived from a clamped page request.
///

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct PageWindow {
    pub offset: u64,
    pub limit: u32,
}

impl PageWindow {
    #[must_use]
    pub const fn new(offset: u64, limit: u32) -> Self {
        Self { offset, limit }
    }

    /// Slice an already ordered row set.
    #[must_use]
    pub fn apply<T>(self, rows: Vec<T>) -> Vec<T> {
        let offset = usize::try_from(self.offset).unwrap_or(usize::MAX);
        let limit = usize::try_from(self.limit).unwrap_or(usize::MAX);

        rows.into_iter().skip(offset).take(limit).collect()
    }
}
