//! Pagination, sorting and list metadata.
//!
//! Untrusted query-string input is turned into a [`Filters`] value whose SQL
//! fragments are built only from static allow-listed column names.

mod metadata;
mod params;

pub use metadata::*;
pub use params::*;

use crate::validator::{FieldErrors, Validator};

pub const DEFAULT_PAGE: i64 = 1;
pub const DEFAULT_PAGE_SIZE: i64 = 20;
pub const DEFAULT_SORT: &str = "id";
pub const MAX_PAGE: i64 = 10_000_000;
pub const MAX_PAGE_SIZE: i64 = 100;

/// Sort direction encoded by an optional leading `-` on the sort key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

impl SortDirection {
    pub fn as_sql(&self) -> &'static str {
        match self {
            SortDirection::Ascending => "ASC",
            SortDirection::Descending => "DESC",
        }
    }
}

/// Validated page window and ordering for a list query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Filters {
    page: i64,
    page_size: i64,
    sort: String,
    sort_column: &'static str,
    direction: SortDirection,
}

impl Filters {
    /// Build filters from `page`, `page_size` and `sort` query parameters.
    ///
    /// Every parameter is checked before returning so the caller gets one
    /// message per offending field. `sort_safe_list` holds bare column names;
    /// a `-` prefix on the requested key selects descending order.
    pub fn from_query(
        params: &QueryParams,
        sort_safe_list: &'static [&'static str],
    ) -> Result<Self, FieldErrors> {
        let mut v = Validator::new();

        let page = read_int(params, "page", DEFAULT_PAGE, &mut v);
        let page_size = read_int(params, "page_size", DEFAULT_PAGE_SIZE, &mut v);
        let sort = read_string(params, "sort", DEFAULT_SORT);

        if let Some(page) = page {
            v.check(page > 0, "page", "must be greater than zero");
            v.check(page <= MAX_PAGE, "page", "must be a maximum of 10 million");
        }
        if let Some(page_size) = page_size {
            v.check(page_size > 0, "page_size", "must be greater than zero");
            v.check(
                page_size <= MAX_PAGE_SIZE,
                "page_size",
                "must be a maximum of 100",
            );
        }

        let (key, direction) = match sort.strip_prefix('-') {
            Some(key) => (key, SortDirection::Descending),
            None => (sort.as_str(), SortDirection::Ascending),
        };
        let sort_column = sort_safe_list.iter().copied().find(|column| *column == key);
        v.check(sort_column.is_some(), "sort", "invalid sort value");

        v.finish()?;

        match (page, page_size, sort_column) {
            (Some(page), Some(page_size), Some(sort_column)) => Ok(Self {
                page,
                page_size,
                sort,
                sort_column,
                direction,
            }),
            // finish() already reported every missing piece
            _ => Err(FieldErrors::new()),
        }
    }

    pub fn page(&self) -> i64 {
        self.page
    }

    pub fn page_size(&self) -> i64 {
        self.page_size
    }

    /// The sort key as the client sent it, including any `-` prefix.
    pub fn sort(&self) -> &str {
        &self.sort
    }

    /// Allow-listed column to order by.
    pub fn sort_column(&self) -> &'static str {
        self.sort_column
    }

    pub fn sort_direction(&self) -> SortDirection {
        self.direction
    }

    pub fn limit(&self) -> i64 {
        self.page_size
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1) * self.page_size
    }

    /// `ORDER BY` body with `id` as the tie-break so equal sort keys keep a
    /// stable position across pages.
    pub fn order_by(&self) -> String {
        format!("{} {}, id ASC", self.sort_column, self.direction.as_sql())
    }
}
