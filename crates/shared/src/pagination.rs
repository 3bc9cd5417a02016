//! Offset pagination helpers shared by list endpoints.

use serde::{Deserialize, Serialize};

/// Default page size for list endpoints.
pub const DEFAULT_PER_PAGE: i64 = 50;

/// Hard cap on page size.
pub const MAX_PER_PAGE: i64 = 100;

/// Query-string pagination parameters.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

impl PageQuery {
    /// Effective page number, 1-based.
    pub fn page(&self) -> i64 {
        self.page.unwrap_or(1).max(1)
    }

    /// Effective page size, clamped to `1..=MAX_PER_PAGE`.
    pub fn per_page(&self) -> i64 {
        self.per_page.unwrap_or(DEFAULT_PER_PAGE).clamp(1, MAX_PER_PAGE)
    }

    /// SQL offset for the effective page.
    pub fn offset(&self) -> i64 {
        (self.page() - 1) * self.per_page()
    }
}

/// Pagination metadata echoed back with list responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pagination {
    pub page: i64,
    pub per_page: i64,
    pub total: i64,
    pub total_pages: i64,
}

impl Pagination {
    pub fn new(query: &PageQuery, total: i64) -> Self {
        let per_page = query.per_page();
        Self {
            page: query.page(),
            per_page,
            total,
            total_pages: (total + per_page - 1) / per_page,
        }
    }
}

/// Envelope for paginated list responses.
#[derive(Debug, Clone, Serialize)]
pub struct PaginatedResponse<T> {
    pub data: Vec<T>,
    pub pagination: Pagination,
}

impl<T> PaginatedResponse<T> {
    pub fn new(data: Vec<T>, query: &PageQuery, total: i64) -> Self {
        Self {
            data,
            pagination: Pagination::new(query, total),
        }
    }
}
