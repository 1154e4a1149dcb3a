//! Queries against the `notes` table.

use restx_api::{AppError, AppResult};
use restx_core::fields::choice::{lookup_json, Choice};
use restx_core::fields::Metadata;
use restx_core::pagination::ListQuery;
use restx_core::types::{DbId, Timestamp};
use restx_db::{DbPool, ListingTable, SortColumn};
use sqlx::types::Json;
use sqlx::FromRow;

use super::{Note, NoteInput, NoteStatus};

/// Column list for `notes` queries.
const NOTE_COLUMNS: &str = "id, title, body, status, metadata, created_at";

/// Listing configuration: the fields list endpoints may order by.
pub const NOTES: ListingTable = ListingTable {
    table: "notes",
    columns: NOTE_COLUMNS,
    sort_columns: &[
        SortColumn::new("created", "created_at", "timestamptz"),
        SortColumn::new("title", "title", "text"),
    ],
};

/// A row from the `notes` table.
#[derive(Debug, Clone, FromRow)]
pub struct NoteRow {
    pub id: DbId,
    pub title: String,
    pub body: String,
    pub status: String,
    pub metadata: Option<Json<Metadata>>,
    pub created_at: Timestamp,
}

impl TryFrom<NoteRow> for Note {
    type Error = AppError;

    fn try_from(row: NoteRow) -> Result<Self, Self::Error> {
        let status: NoteStatus = lookup_json(&serde_json::Value::String(row.status))
            .map_err(|e| AppError::InternalError(format!("note {}: stored {e}", row.id)))?;
        Ok(Note {
            id: row.id,
            title: row.title,
            body: row.body,
            status,
            metadata: row.metadata.map(|Json(m)| m),
            created_at: row.created_at,
        })
    }
}

fn into_notes(rows: Vec<NoteRow>) -> AppResult<Vec<Note>> {
    rows.into_iter().map(Note::try_from).collect()
}

/// Provides CRUD operations for notes.
pub struct NoteRepo;

impl NoteRepo {
    pub async fn count(pool: &DbPool) -> Result<u64, sqlx::Error> {
        NOTES.count(pool).await
    }

    /// Rows for one page, cursor window or the whole listing.
    pub async fn list(pool: &DbPool, query: &ListQuery) -> AppResult<Vec<Note>> {
        let mut builder = NOTES.select(query)?;
        let rows = builder.build_query_as::<NoteRow>().fetch_all(pool).await?;
        into_notes(rows)
    }

    pub async fn find_by_id(pool: &DbPool, id: DbId) -> AppResult<Option<Note>> {
        let query = format!("SELECT {NOTE_COLUMNS} FROM notes WHERE id = $1");
        let row = sqlx::query_as::<_, NoteRow>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await?;
        row.map(Note::try_from).transpose()
    }

    pub async fn create(pool: &DbPool, input: &NoteInput) -> AppResult<Note> {
        let query = format!(
            "INSERT INTO notes (title, body, status, metadata) \
             VALUES ($1, $2, $3, $4) \
             RETURNING {NOTE_COLUMNS}"
        );
        let row = sqlx::query_as::<_, NoteRow>(&query)
            .bind(&input.title)
            .bind(&input.body)
            .bind(input.status.value())
            .bind(input.metadata.clone().map(Json))
            .fetch_one(pool)
            .await?;
        Note::try_from(row)
    }

    /// Write every editable column of `note`.
    pub async fn update(pool: &DbPool, note: &Note) -> AppResult<Note> {
        let query = format!(
            "UPDATE notes SET title = $2, body = $3, status = $4, metadata = $5 \
             WHERE id = $1 \
             RETURNING {NOTE_COLUMNS}"
        );
        let row = sqlx::query_as::<_, NoteRow>(&query)
            .bind(note.id)
            .bind(&note.title)
            .bind(&note.body)
            .bind(note.status.value())
            .bind(note.metadata.clone().map(Json))
            .fetch_one(pool)
            .await?;
        Note::try_from(row)
    }

    /// Returns `true` if a row was deleted.
    pub async fn delete(pool: &DbPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM notes WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Mark the given notes as published, returning how many changed.
    pub async fn publish(pool: &DbPool, ids: &[DbId]) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE notes SET status = $1 WHERE id = ANY($2) AND status <> $1",
        )
        .bind(NoteStatus::Published.value())
        .bind(ids)
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }
}
