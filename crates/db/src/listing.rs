//! SQL rendering for list queries.

use restx_core::error::CoreError;
use restx_core::pagination::ListQuery;
use sqlx::{Postgres, QueryBuilder};

use crate::DbPool;

/// A column that list endpoints may order and paginate by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortColumn {
    /// Public field name used in orderings (`created`).
    pub field: &'static str,
    /// Column expression in SQL (`n.created_at`).
    pub column: &'static str,
    /// Postgres type used to cast bound cursor positions (`timestamptz`).
    pub sql_type: &'static str,
}

impl SortColumn {
    pub const fn new(field: &'static str, column: &'static str, sql_type: &'static str) -> Self {
        Self {
            field,
            column,
            sql_type,
        }
    }
}

/// A table (or view) that list endpoints read from.
#[derive(Debug, Clone, Copy)]
pub struct ListingTable {
    pub table: &'static str,
    /// Comma separated select list.
    pub columns: &'static str,
    pub sort_columns: &'static [SortColumn],
}

impl ListingTable {
    fn sort_column(&self, field: &str) -> Result<&SortColumn, CoreError> {
        self.sort_columns
            .iter()
            .find(|c| c.field == field)
            .ok_or_else(|| {
                CoreError::ImproperlyConfigured(format!(
                    "Field \"{field}\" is not a sortable column of {}",
                    self.table
                ))
            })
    }

    /// Build `SELECT ... [WHERE pos] ORDER BY ... [LIMIT ..] [OFFSET ..]`.
    ///
    /// Unknown ordering or position fields are configuration errors; nothing
    /// from the query string reaches the SQL text unescaped.
    pub fn select(&self, query: &ListQuery) -> Result<QueryBuilder<'static, Postgres>, CoreError> {
        let order_column = self.sort_column(query.ordering.field())?;

        let mut builder = QueryBuilder::new(format!("SELECT {} FROM {}", self.columns, self.table));

        if let Some(position) = &query.position {
            let column = self.sort_column(&position.field)?;
            builder
                .push(" WHERE ")
                .push(column.column)
                .push(format!(" {} ", position.comparison.as_sql()))
                .push_bind(position.value.clone())
                .push(format!("::{}", column.sql_type));
        }

        let direction = if query.ordering.is_descending() {
            "DESC"
        } else {
            "ASC"
        };
        builder
            .push(" ORDER BY ")
            .push(order_column.column)
            .push(" ")
            .push(direction);

        if let Some(limit) = query.limit {
            builder.push(" LIMIT ").push_bind(to_i64(limit));
        }
        if query.offset > 0 {
            builder.push(" OFFSET ").push_bind(to_i64(query.offset));
        }

        tracing::debug!(sql = builder.sql(), "Rendered list query");
        Ok(builder)
    }

    /// Total number of rows, for page-number pagination.
    pub async fn count(&self, pool: &DbPool) -> Result<u64, sqlx::Error> {
        let query = format!("SELECT COUNT(*) FROM {}", self.table);
        let count: i64 = sqlx::query_scalar(&query).fetch_one(pool).await?;
        Ok(u64::try_from(count).unwrap_or_default())
    }
}

fn to_i64(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}
