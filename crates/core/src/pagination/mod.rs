//! List pagination strategies.
//!
//! Pagination is split in two halves so it works with any storage: a
//! strategy first turns the request into a [`ListQuery`] (ordering, optional
//! position filter, offset, limit), the view fetches exactly that slice, and
//! the strategy then builds the page body with next/previous links.

pub mod cursor;
pub mod page_number;

use serde::Serialize;

use crate::ordering::Ordering;
use crate::query::{positive_int, QueryParams};

pub use cursor::{Cursor, CursorPage, CursorPagination, CursorPlan};
pub use page_number::{PageNumberPage, PageNumberPagination, PagePlan};

/// Items per page when the request does not ask for a size.
pub const DEFAULT_PAGE_SIZE: u64 = 15;

/// Largest page a request may ask for.
pub const MAX_PAGE_SIZE: u64 = 250;

/// Query parameter used to ask for a page size.
pub const PAGE_SIZE_QUERY_PARAM: &str = "page_size";

/// Query parameter used to pick a strategy per request.
pub const PAGINATION_QUERY_PARAM: &str = "pagination";

/// The available strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PaginationKind {
    PageNumber,
    Cursor,
}

impl PaginationKind {
    /// Map a `?pagination=` value to a strategy.
    pub fn from_query_value(value: &str) -> Option<Self> {
        match value {
            "page" => Some(PaginationKind::PageNumber),
            "cursor" => Some(PaginationKind::Cursor),
            _ => None,
        }
    }

    /// Pick the strategy for a request: an explicit `?pagination=` value
    /// wins, anything else falls back to the view's default (which may be
    /// no pagination at all).
    pub fn select(query: &QueryParams, default: Option<Self>) -> Option<Self> {
        query
            .get(PAGINATION_QUERY_PARAM)
            .and_then(Self::from_query_value)
            .or(default)
    }
}

/// Page size settings shared by both strategies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageSize {
    pub default: u64,
    /// Query parameter a client may use to choose the size. `None` disables it.
    pub query_param: Option<String>,
    pub max: Option<u64>,
}

impl Default for PageSize {
    fn default() -> Self {
        Self {
            default: DEFAULT_PAGE_SIZE,
            query_param: Some(PAGE_SIZE_QUERY_PARAM.to_string()),
            max: Some(MAX_PAGE_SIZE),
        }
    }
}

impl PageSize {
    /// The size for this request. Non-positive or malformed values fall back
    /// to the default; oversized values are clamped.
    pub fn resolve(&self, query: &QueryParams) -> u64 {
        self.query_param
            .as_deref()
            .and_then(|param| query.get(param))
            .and_then(|raw| positive_int(raw, true, self.max))
            .unwrap_or(self.default)
    }
}

/// Direction of a cursor position filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    GreaterThan,
    LessThan,
}

impl Comparison {
    pub fn as_sql(&self) -> &'static str {
        match self {
            Comparison::GreaterThan => ">",
            Comparison::LessThan => "<",
        }
    }
}

/// Keep only rows whose `field` compares to `value` in the given direction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PositionFilter {
    pub field: String,
    pub comparison: Comparison,
    /// The position as text, exactly as it was read from an item.
    pub value: String,
}

/// The slice of an ordered result set a view must fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListQuery {
    pub ordering: Ordering,
    pub position: Option<PositionFilter>,
    pub offset: u64,
    /// `None` fetches everything after `offset`.
    pub limit: Option<u64>,
}

impl ListQuery {
    /// Every row, in order.
    pub fn all(ordering: Ordering) -> Self {
        Self {
            ordering,
            position: None,
            offset: 0,
            limit: None,
        }
    }

    pub fn window(ordering: Ordering, offset: u64, limit: u64) -> Self {
        Self {
            ordering,
            position: None,
            offset,
            limit: Some(limit),
        }
    }
}
