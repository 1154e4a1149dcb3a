//! The notes resource: model, serializers and the routes mounting its views.

use std::borrow::Cow;

use restx_api::ApiRouter;
use restx_core::fields::choice::{self, Choice};
use restx_core::fields::Metadata;
use restx_core::types::{DbId, Timestamp};
use restx_db::DbPool;
use serde::{Deserialize, Serialize};
use utoipa::openapi::{RefOr, Schema};
use utoipa::ToSchema;
use validator::Validate;

pub mod repo;
pub mod views;

use views::{NoteDetailView, NoteListView, NotePublishView};

/// Mount every notes view.
pub fn api(pool: DbPool) -> ApiRouter {
    ApiRouter::new()
        .list_create("/notes/", NoteListView::new(pool.clone()))
        .retrieve_update_destroy("/notes/{id}/", NoteDetailView::new(pool.clone()))
        .action("/notes/publish/", NotePublishView::new(pool))
}

// ---------------------------------------------------------------------------
// Model
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NoteStatus {
    #[default]
    Draft,
    Published,
}

impl Choice for NoteStatus {
    type Value = &'static str;
    const CHOICES: &'static [Self] = &[NoteStatus::Draft, NoteStatus::Published];

    fn value(&self) -> &'static str {
        match self {
            NoteStatus::Draft => "draft",
            NoteStatus::Published => "published",
        }
    }
}

impl utoipa::PartialSchema for NoteStatus {
    fn schema() -> RefOr<Schema> {
        RefOr::T(Schema::Object(choice::schema::<Self>()))
    }
}

impl ToSchema for NoteStatus {
    fn name() -> Cow<'static, str> {
        Cow::Borrowed("NoteStatus")
    }
}

/// A note as the views see it.
#[derive(Debug, Clone, PartialEq)]
pub struct Note {
    pub id: DbId,
    pub title: String,
    pub body: String,
    pub status: NoteStatus,
    pub metadata: Option<Metadata>,
    pub created_at: Timestamp,
}

// ---------------------------------------------------------------------------
// Serializers
// ---------------------------------------------------------------------------

/// Body of `POST /notes/` and `PUT /notes/{id}/`.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct NoteInput {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[serde(default)]
    pub body: String,
    #[serde(default, with = "restx_core::fields::choice::serde_value")]
    pub status: NoteStatus,
    pub metadata: Option<Metadata>,
}

/// Body of `PATCH /notes/{id}/`; absent fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct NotePatch {
    #[validate(length(min = 1, max = 200))]
    pub title: Option<String>,
    pub body: Option<String>,
    #[serde(default, with = "restx_core::fields::choice::serde_value::option")]
    pub status: Option<NoteStatus>,
    /// `null` clears the metadata.
    #[serde(default, deserialize_with = "restx_core::fields::metadata::deserialize_patch")]
    #[schema(value_type = Option<Metadata>)]
    pub metadata: Option<Option<Metadata>>,
}

impl NotePatch {
    pub fn apply(self, note: &mut Note) {
        if let Some(title) = self.title {
            note.title = title;
        }
        if let Some(body) = self.body {
            note.body = body;
        }
        if let Some(status) = self.status {
            note.status = status;
        }
        if let Some(metadata) = self.metadata {
            note.metadata = metadata;
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct NoteOut {
    pub id: DbId,
    /// Canonical location; also sent as the `Location` header on create.
    pub url: String,
    pub title: String,
    pub body: String,
    #[serde(with = "restx_core::fields::choice::serde_value")]
    pub status: NoteStatus,
    pub metadata: Option<Metadata>,
    /// Epoch milliseconds.
    #[serde(with = "restx_core::fields::timestamp::millis")]
    #[schema(value_type = i64)]
    pub created: Timestamp,
}

impl From<Note> for NoteOut {
    fn from(note: Note) -> Self {
        Self {
            url: format!("/notes/{}/", note.id),
            id: note.id,
            title: note.title,
            body: note.body,
            status: note.status,
            metadata: note.metadata,
            created: note.created_at,
        }
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct PublishNotes {
    #[validate(length(min = 1, max = 100))]
    pub ids: Vec<DbId>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PublishResult {
    pub published: u64,
}
