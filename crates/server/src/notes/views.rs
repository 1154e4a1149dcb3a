//! Generic view impls for notes.

use async_trait::async_trait;
use chrono::SecondsFormat;
use restx_api::request::RequestContext;
use restx_api::views::{
    ActionView, BaseView, CreateView, DestroyView, ListView, ObjectView, RetrieveView, Update,
    UpdateView,
};
use restx_api::AppError;
use restx_core::error::CoreError;
use restx_core::ordering::{IdentityOrdering, OrderingFilter, OrderingMapper};
use restx_core::pagination::{CursorPagination, ListQuery};
use restx_core::types::DbId;
use restx_db::DbPool;

use super::repo::NoteRepo;
use super::{Note, NoteInput, NoteOut, NotePatch, PublishNotes, PublishResult};

static IDENTITY: IdentityOrdering = IdentityOrdering;

/// Text form of a sortable field, in the format Postgres casts back.
fn position(note: &Note, field: &str) -> Option<String> {
    match field {
        "created" => Some(note.created_at.to_rfc3339_opts(SecondsFormat::Micros, true)),
        "title" => Some(note.title.clone()),
        _ => None,
    }
}

fn not_found(id: DbId) -> AppError {
    CoreError::NotFound {
        entity: "Note",
        id: id.to_string(),
    }
    .into()
}

// ---------------------------------------------------------------------------
// /notes/
// ---------------------------------------------------------------------------

#[derive(Clone)]
pub struct NoteListView {
    pool: DbPool,
}

impl NoteListView {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

impl BaseView for NoteListView {
    type Object = Note;
    const VIEW_ID: &'static str = "notes.views.NoteListView";
    const RESOURCE: Option<&'static str> = Some("note");

    fn resource_id(&self, note: &Note) -> Option<String> {
        Some(note.id.to_string())
    }
}

#[async_trait]
impl ListView for NoteListView {
    type ListResponse = NoteOut;

    fn ordering_filter(&self) -> OrderingFilter {
        OrderingFilter::new("-created", &["created", "title"])
    }

    fn ordering_mapper(&self) -> Option<&dyn OrderingMapper> {
        Some(&IDENTITY)
    }

    fn cursor_pagination(&self) -> CursorPagination {
        CursorPagination {
            orderby_fields: ["created", "-created", "title", "-title"]
                .into_iter()
                .map(String::from)
                .collect(),
            ..CursorPagination::default()
        }
    }

    fn cursor_position(&self, note: &Note, field: &str) -> Option<String> {
        position(note, field)
    }

    async fn count(&self, _ctx: &RequestContext) -> Result<u64, AppError> {
        Ok(NoteRepo::count(&self.pool).await?)
    }

    async fn fetch(&self, _ctx: &RequestContext, query: &ListQuery) -> Result<Vec<Note>, AppError> {
        NoteRepo::list(&self.pool, query).await
    }
}

#[async_trait]
impl CreateView for NoteListView {
    type CreateRequest = NoteInput;
    type CreateResponse = NoteOut;

    async fn perform_create(&self, _ctx: &RequestContext, input: NoteInput) -> Result<Note, AppError> {
        NoteRepo::create(&self.pool, &input).await
    }
}

// ---------------------------------------------------------------------------
// /notes/{id}/
// ---------------------------------------------------------------------------

#[derive(Clone)]
pub struct NoteDetailView {
    pool: DbPool,
}

impl NoteDetailView {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

impl BaseView for NoteDetailView {
    type Object = Note;
    const VIEW_ID: &'static str = "notes.views.NoteDetailView";
    const RESOURCE: Option<&'static str> = Some("note");

    fn resource_id(&self, note: &Note) -> Option<String> {
        Some(note.id.to_string())
    }
}

#[async_trait]
impl ObjectView for NoteDetailView {
    type Id = DbId;

    async fn get_object(&self, _ctx: &RequestContext, id: DbId) -> Result<Note, AppError> {
        NoteRepo::find_by_id(&self.pool, id)
            .await?
            .ok_or_else(|| not_found(id))
    }
}

impl RetrieveView for NoteDetailView {
    type RetrieveResponse = NoteOut;
}

#[async_trait]
impl UpdateView for NoteDetailView {
    type UpdateRequest = NoteInput;
    type PartialUpdateRequest = NotePatch;
    type UpdateResponse = NoteOut;

    async fn perform_update(
        &self,
        _ctx: &RequestContext,
        mut note: Note,
        changes: Update<NoteInput, NotePatch>,
    ) -> Result<Note, AppError> {
        match changes {
            Update::Full(input) => {
                note.title = input.title;
                note.body = input.body;
                note.status = input.status;
                note.metadata = input.metadata;
            }
            Update::Partial(patch) => patch.apply(&mut note),
        }
        NoteRepo::update(&self.pool, &note).await
    }
}

#[async_trait]
impl DestroyView for NoteDetailView {
    async fn perform_destroy(&self, _ctx: &RequestContext, note: Note) -> Result<(), AppError> {
        if !NoteRepo::delete(&self.pool, note.id).await? {
            return Err(not_found(note.id));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// /notes/publish/
// ---------------------------------------------------------------------------

#[derive(Clone)]
pub struct NotePublishView {
    pool: DbPool,
}

impl NotePublishView {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

impl BaseView for NotePublishView {
    type Object = Note;
    const VIEW_ID: &'static str = "notes.views.NotePublishView";
}

#[async_trait]
impl ActionView for NotePublishView {
    type ActionRequest = PublishNotes;
    type ActionResponse = PublishResult;

    async fn perform_action(
        &self,
        _ctx: &RequestContext,
        input: PublishNotes,
    ) -> Result<PublishResult, AppError> {
        let published = NoteRepo::publish(&self.pool, &input.ids).await?;
        tracing::info!(requested = input.ids.len(), published, "Published notes");
        Ok(PublishResult { published })
    }
}
