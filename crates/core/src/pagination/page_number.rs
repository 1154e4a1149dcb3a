//! Page-number pagination (`?page=3&page_size=20`).

use serde::Serialize;

use super::{ListQuery, PageSize};
use crate::error::CoreError;
use crate::ordering::Ordering;
use crate::query::{QueryParams, RequestUrl};

pub const PAGE_QUERY_PARAM: &str = "page";

const INVALID_PAGE: &str = "Invalid page.";

/// Page-number strategy settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageNumberPagination {
    pub page_size: PageSize,
    pub page_query_param: String,
    /// Values of the page parameter that mean "the last page".
    pub last_page_strings: Vec<String>,
}

impl Default for PageNumberPagination {
    fn default() -> Self {
        Self {
            page_size: PageSize::default(),
            page_query_param: PAGE_QUERY_PARAM.to_string(),
            last_page_strings: vec!["last".to_string()],
        }
    }
}

/// A resolved page: which page, how big, and out of how many.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PagePlan {
    pub number: u64,
    pub page_size: u64,
    pub count: u64,
    pub num_pages: u64,
}

impl PagePlan {
    pub fn offset(&self) -> u64 {
        (self.number - 1) * self.page_size
    }

    pub fn has_next(&self) -> bool {
        self.number < self.num_pages
    }

    pub fn has_previous(&self) -> bool {
        self.number > 1
    }

    /// The slice of rows to fetch for this page.
    pub fn list_query(&self, ordering: Ordering) -> ListQuery {
        ListQuery::window(ordering, self.offset(), self.page_size)
    }
}

/// Body of a page-number page, placed under the envelope's `data`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageNumberPage<T> {
    pub count: u64,
    pub next: Option<String>,
    pub previous: Option<String>,
    pub results: Vec<T>,
}

impl PageNumberPagination {
    pub fn page_size(&self, query: &QueryParams) -> u64 {
        self.page_size.resolve(query)
    }

    /// Resolve the requested page against the total row count.
    ///
    /// An empty result set still has one (empty) page. Anything that is not
    /// a page number, is below 1, or is past the last page is a 404.
    pub fn plan(&self, query: &QueryParams, count: u64) -> Result<PagePlan, CoreError> {
        let page_size = self.page_size(query).max(1);
        let num_pages = count.max(1).div_ceil(page_size);

        let raw = query.get(&self.page_query_param).unwrap_or("1");
        let number = if self.last_page_strings.iter().any(|s| s == raw) {
            num_pages
        } else {
            let parsed: i64 = raw
                .trim()
                .parse()
                .map_err(|_| CoreError::NotFoundMessage(INVALID_PAGE.into()))?;
            if parsed < 1 || parsed.unsigned_abs() > num_pages {
                return Err(CoreError::NotFoundMessage(INVALID_PAGE.into()));
            }
            parsed.unsigned_abs()
        };

        Ok(PagePlan {
            number,
            page_size,
            count,
            num_pages,
        })
    }

    /// Build the page body with absolute next/previous links.
    pub fn page<T>(&self, plan: &PagePlan, url: &RequestUrl, results: Vec<T>) -> PageNumberPage<T> {
        PageNumberPage {
            count: plan.count,
            next: self.next_link(plan, url),
            previous: self.previous_link(plan, url),
            results,
        }
    }

    fn next_link(&self, plan: &PagePlan, url: &RequestUrl) -> Option<String> {
        if !plan.has_next() {
            return None;
        }
        Some(url.with_param(&self.page_query_param, &(plan.number + 1).to_string()))
    }

    /// Going back to page 1 drops the parameter entirely.
    fn previous_link(&self, plan: &PagePlan, url: &RequestUrl) -> Option<String> {
        if !plan.has_previous() {
            return None;
        }
        let previous = plan.number - 1;
        if previous == 1 {
            return Some(url.without_param(&self.page_query_param));
        }
        Some(url.with_param(&self.page_query_param, &previous.to_string()))
    }
}
