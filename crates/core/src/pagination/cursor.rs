//! Cursor pagination (`?cursor=<opaque>`).
//!
//! A cursor is a position (the text form of the ordering field of some
//! item), a direction, and an offset from that position. The offset lets a
//! page boundary fall inside a run of items that share a position.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::Serialize;

use super::{Comparison, ListQuery, PageSize, PositionFilter};
use crate::error::CoreError;
use crate::ordering::{Ordering, DEFAULT_ORDERBY_KEY, DEFAULT_ORDERING};
use crate::query::{positive_int, QueryParams, RequestUrl};

pub const CURSOR_QUERY_PARAM: &str = "cursor";

/// Largest offset a cursor may carry.
pub const OFFSET_CUTOFF: u64 = 1000;

const INVALID_CURSOR: &str = "Invalid cursor";

/// Decoded cursor contents.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Cursor {
    pub offset: u64,
    pub reverse: bool,
    pub position: Option<String>,
}

impl Cursor {
    /// Encode as base64 of `o=<offset>&r=1&p=<position>`, omitting defaults.
    pub fn encode(&self) -> String {
        let mut tokens: Vec<(&str, String)> = Vec::with_capacity(3);
        if self.offset != 0 {
            tokens.push(("o", self.offset.to_string()));
        }
        if self.reverse {
            tokens.push(("r", "1".to_string()));
        }
        if let Some(position) = &self.position {
            tokens.push(("p", position.clone()));
        }
        let querystring = serde_urlencoded::to_string(&tokens).unwrap_or_default();
        STANDARD.encode(querystring)
    }

    /// Decode a cursor, clamping the offset to `offset_cutoff`.
    pub fn decode(encoded: &str, offset_cutoff: u64) -> Result<Self, CoreError> {
        let invalid = || CoreError::NotFoundMessage(INVALID_CURSOR.into());

        let bytes = STANDARD.decode(encoded.trim()).map_err(|_| invalid())?;
        let querystring = String::from_utf8(bytes).map_err(|_| invalid())?;
        let tokens = QueryParams::parse(Some(&querystring));

        let first = |key: &str| tokens.get_all(key).next().map(str::to_string);

        let offset = match first("o") {
            Some(raw) => positive_int(&raw, false, Some(offset_cutoff)).ok_or_else(invalid)?,
            None => 0,
        };
        let reverse = match first("r") {
            Some(raw) => raw.trim().parse::<i64>().map_err(|_| invalid())? != 0,
            None => false,
        };

        Ok(Self {
            offset,
            reverse,
            position: first("p"),
        })
    }
}

/// Cursor strategy settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CursorPagination {
    pub page_size: PageSize,
    pub cursor_query_param: String,
    /// Ordering used when the request does not pick an allowed one.
    pub ordering: String,
    pub orderby_query_param: String,
    /// Exact orderings a request may choose, direction included.
    pub orderby_fields: Vec<String>,
    pub offset_cutoff: u64,
}

impl Default for CursorPagination {
    fn default() -> Self {
        Self {
            page_size: PageSize::default(),
            cursor_query_param: CURSOR_QUERY_PARAM.to_string(),
            ordering: DEFAULT_ORDERING.to_string(),
            orderby_query_param: DEFAULT_ORDERBY_KEY.to_string(),
            orderby_fields: vec!["created".to_string(), "-created".to_string()],
            offset_cutoff: OFFSET_CUTOFF,
        }
    }
}

/// Everything needed to fetch one cursor page and then build its links.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CursorPlan {
    pub cursor: Cursor,
    pub ordering: Ordering,
    pub page_size: u64,
}

impl CursorPlan {
    /// The slice to fetch. One extra row is read to detect a following page.
    pub fn list_query(&self) -> ListQuery {
        let ordering = if self.cursor.reverse {
            self.ordering.reversed()
        } else {
            self.ordering.clone()
        };

        let position = self.cursor.position.as_ref().map(|value| {
            let comparison = if self.cursor.reverse != self.ordering.is_descending() {
                Comparison::LessThan
            } else {
                Comparison::GreaterThan
            };
            PositionFilter {
                field: self.ordering.field().to_string(),
                comparison,
                value: value.clone(),
            }
        });

        ListQuery {
            ordering,
            position,
            offset: self.cursor.offset,
            limit: Some(self.page_size + 1),
        }
    }
}

/// Body of a cursor page, placed under the envelope's `data`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CursorPage<T> {
    pub next: Option<String>,
    pub previous: Option<String>,
    pub results: Vec<T>,
}

impl CursorPagination {
    /// The ordering for this request.
    ///
    /// `?orderby=` is honoured only when it names one of `orderby_fields`.
    /// Lookups across relations (`__`) cannot be used as positions.
    pub fn ordering(&self, query: &QueryParams) -> Result<Ordering, CoreError> {
        let raw = query
            .get(&self.orderby_query_param)
            .filter(|requested| self.orderby_fields.iter().any(|f| f == *requested))
            .unwrap_or(self.ordering.as_str());

        if raw.contains("__") {
            return Err(CoreError::ImproperlyConfigured(
                "Cursor pagination does not support double underscore lookups for orderings. \
                 Orderings should be an unchanging, unique or nearly-unique field, such as \
                 \"-created\" or \"pk\"."
                    .into(),
            ));
        }
        Ordering::parse(raw).map_err(|_| {
            CoreError::ImproperlyConfigured(format!(
                "Using cursor pagination, but \"{raw}\" is not a usable ordering."
            ))
        })
    }

    /// Decode the request's cursor and resolve ordering and page size.
    pub fn plan(&self, query: &QueryParams) -> Result<CursorPlan, CoreError> {
        let cursor = match query.get(&self.cursor_query_param) {
            Some(encoded) => Cursor::decode(encoded, self.offset_cutoff)?,
            None => Cursor::default(),
        };
        Ok(CursorPlan {
            cursor,
            ordering: self.ordering(query)?,
            page_size: self.page_size.resolve(query).max(1),
        })
    }

    /// Build the page from the rows fetched for [`CursorPlan::list_query`].
    ///
    /// `position_of` returns the text form of an item's ordering field.
    pub fn page<T, F>(
        &self,
        plan: &CursorPlan,
        url: &RequestUrl,
        fetched: Vec<T>,
        position_of: F,
    ) -> CursorPage<T>
    where
        F: Fn(&T, &str) -> Option<String>,
    {
        let state = PageState::new(plan, fetched, &position_of);
        let next = state
            .next_cursor(plan, &position_of)
            .map(|cursor| url.with_param(&self.cursor_query_param, &cursor.encode()));
        let previous = state
            .previous_cursor(plan, &position_of)
            .map(|cursor| url.with_param(&self.cursor_query_param, &cursor.encode()));

        CursorPage {
            next,
            previous,
            results: state.page,
        }
    }
}

/// The current page plus what is known about its neighbours.
struct PageState<T> {
    page: Vec<T>,
    has_next: bool,
    has_previous: bool,
    next_position: Option<String>,
    previous_position: Option<String>,
}

impl<T> PageState<T> {
    fn new<F>(plan: &CursorPlan, mut fetched: Vec<T>, position_of: &F) -> Self
    where
        F: Fn(&T, &str) -> Option<String>,
    {
        let page_size = usize::try_from(plan.page_size).unwrap_or(usize::MAX);
        let field = plan.ordering.field();

        let has_following_position = fetched.len() > page_size;
        let following_position = if has_following_position {
            fetched.last().and_then(|item| position_of(item, field))
        } else {
            None
        };
        fetched.truncate(page_size);

        let cursor = &plan.cursor;
        let at_start = cursor.position.is_none() && cursor.offset == 0;

        if cursor.reverse {
            fetched.reverse();
            let has_next = !at_start;
            Self {
                page: fetched,
                has_next,
                has_previous: has_following_position,
                next_position: if has_next { cursor.position.clone() } else { None },
                previous_position: following_position,
            }
        } else {
            let has_previous = !at_start;
            Self {
                page: fetched,
                has_next: has_following_position,
                has_previous,
                next_position: following_position,
                previous_position: if has_previous { cursor.position.clone() } else { None },
            }
        }
    }

    fn next_cursor<F>(&self, plan: &CursorPlan, position_of: &F) -> Option<Cursor>
    where
        F: Fn(&T, &str) -> Option<String>,
    {
        if !self.has_next {
            return None;
        }
        let cursor = &plan.cursor;
        let field = plan.ordering.field();

        // Coming back from a reversed page, the first position is not a
        // reliable marker.
        let mut compare = match self.page.last() {
            Some(last) if cursor.reverse => position_of(last, field),
            _ => self.next_position.clone(),
        };

        let mut offset = 0;
        let mut position = None;
        let mut has_item_with_unique_position = false;
        for item in self.page.iter().rev() {
            let item_position = position_of(item, field);
            if item_position != compare {
                has_item_with_unique_position = true;
                position = item_position;
                break;
            }
            compare = item_position;
            offset += 1;
        }

        if !self.page.is_empty() && !has_item_with_unique_position {
            // The whole page shares one position.
            if !self.has_previous {
                offset = plan.page_size;
                position = None;
            } else if cursor.reverse {
                offset = 0;
                position = self.previous_position.clone();
            } else {
                offset = cursor.offset + plan.page_size;
                position = self.previous_position.clone();
            }
        }

        if self.page.is_empty() {
            position = self.next_position.clone();
        }

        Some(Cursor {
            offset,
            reverse: false,
            position,
        })
    }

    fn previous_cursor<F>(&self, plan: &CursorPlan, position_of: &F) -> Option<Cursor>
    where
        F: Fn(&T, &str) -> Option<String>,
    {
        if !self.has_previous {
            return None;
        }
        let cursor = &plan.cursor;
        let field = plan.ordering.field();

        let mut compare = match self.page.first() {
            Some(first) if !cursor.reverse && cursor.offset > 0 => position_of(first, field),
            _ => self.previous_position.clone(),
        };

        let mut offset = 0;
        let mut position = None;
        let mut has_item_with_unique_position = false;
        for item in &self.page {
            let item_position = position_of(item, field);
            if item_position != compare {
                has_item_with_unique_position = true;
                position = item_position;
                break;
            }
            compare = item_position;
            offset += 1;
        }

        if !self.page.is_empty() && !has_item_with_unique_position {
            if !self.has_next {
                offset = plan.page_size;
                position = None;
            } else if cursor.reverse {
                offset = cursor.offset + plan.page_size;
                position = self.next_position.clone();
            } else {
                offset = 0;
                position = self.next_position.clone();
            }
        }

        if self.page.is_empty() {
            position = self.previous_position.clone();
        }

        Some(Cursor {
            offset,
            reverse: true,
            position,
        })
    }
}
