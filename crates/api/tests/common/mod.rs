//! Shared fixtures: an in-memory notes resource mounted through every
//! generic view, plus request helpers.

#![allow(dead_code)]

use std::borrow::Cow;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, HeaderName, Method, Request, StatusCode};
use axum::response::Response;
use axum::Router;
use chrono::{SecondsFormat, TimeZone, Utc};
use http_body_util::BodyExt;
use restx_api::config::ApiSettings;
use restx_api::request::RequestContext;
use restx_api::views::{
    ActionView, BaseView, CreateView, DestroyView, ListView, ObjectView, RetrieveView, Update,
    UpdateView,
};
use restx_api::{ApiRouter, AppError};
use restx_core::error::CoreError;
use restx_core::fields::choice::{self, Choice};
use restx_core::fields::Metadata;
use restx_core::ordering::{IdentityOrdering, OrderingFilter, OrderingMapper};
use restx_core::pagination::{Comparison, ListQuery, PaginationKind};
use restx_core::types::Timestamp;
use serde::{Deserialize, Serialize};
use tower::ServiceExt;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use utoipa::openapi::{RefOr, Schema};
use utoipa::ToSchema;
use validator::Validate;

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

#[derive(Debug, Clone)]
pub struct Note {
    pub id: u64,
    pub title: String,
    pub body: String,
    pub status: NoteStatus,
    pub metadata: Option<Metadata>,
    pub created: Timestamp,
}

/// Position text that sorts the same way as the timestamps.
fn created_position(created: &Timestamp) -> String {
    created.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn sort_key(note: &Note, field: &str) -> String {
    match field {
        "title" => note.title.clone(),
        _ => created_position(&note.created),
    }
}

// ---------------------------------------------------------------------------
// Serializers
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateNote {
    #[validate(length(min = 1, max = 100))]
    pub title: String,
    #[serde(default)]
    pub body: String,
    #[serde(default, with = "restx_core::fields::choice::serde_value")]
    pub status: NoteStatus,
    pub metadata: Option<Metadata>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct PatchNote {
    #[validate(length(min = 1, max = 100))]
    pub title: Option<String>,
    pub body: Option<String>,
    #[serde(default, with = "restx_core::fields::choice::serde_value::option")]
    pub status: Option<NoteStatus>,
    #[serde(default, deserialize_with = "restx_core::fields::metadata::deserialize_patch")]
    #[schema(value_type = Option<Metadata>)]
    pub metadata: Option<Option<Metadata>>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct NoteOut {
    pub id: u64,
    pub url: String,
    pub title: String,
    pub body: String,
    #[serde(with = "restx_core::fields::choice::serde_value")]
    pub status: NoteStatus,
    pub metadata: Option<Metadata>,
    #[serde(with = "restx_core::fields::timestamp::millis")]
    #[schema(value_type = i64)]
    pub created: Timestamp,
}

impl From<Note> for NoteOut {
    fn from(note: Note) -> Self {
        Self {
            id: note.id,
            url: format!("/notes/{}/", note.id),
            title: note.title,
            body: note.body,
            status: note.status,
            metadata: note.metadata,
            created: note.created,
        }
    }
}

/// Compact shape used by the title listing.
#[derive(Debug, Serialize, ToSchema)]
pub struct NoteTitle {
    pub id: u64,
    pub title: String,
}

impl From<Note> for NoteTitle {
    fn from(note: Note) -> Self {
        Self {
            id: note.id,
            title: note.title,
        }
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct PublishNotes {
    #[validate(length(min = 1))]
    pub ids: Vec<u64>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PublishResult {
    pub published: usize,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct SummaryRequest {
    #[serde(default)]
    pub include_drafts: bool,
}

/// Already a complete body; not enveloped.
#[derive(Debug, Serialize, ToSchema)]
pub struct NoteSummary {
    pub status: String,
    pub total: usize,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ExportRequest {
    pub id: u64,
    #[serde(default)]
    pub compact: bool,
}

/// Either rendering of a note, documented as `oneOf`.
#[derive(Debug, Serialize, ToSchema)]
#[serde(untagged)]
pub enum NoteExport {
    Full(NoteOut),
    Compact(NoteTitle),
}

// ---------------------------------------------------------------------------
// Store
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
struct StoreInner {
    next_id: u64,
    notes: Vec<Note>,
}

/// Shared in-memory storage behind every test view.
#[derive(Debug, Clone, Default)]
pub struct NoteStore {
    inner: Arc<Mutex<StoreInner>>,
}

pub fn base_time() -> Timestamp {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
}

impl NoteStore {
    /// Insert a note created `seconds` after the base time.
    pub fn seed(&self, title: &str, seconds: i64) -> Note {
        let mut inner = self.inner.lock().unwrap();
        inner.next_id += 1;
        let note = Note {
            id: inner.next_id,
            title: title.to_string(),
            body: String::new(),
            status: NoteStatus::Draft,
            metadata: None,
            created: base_time() + chrono::Duration::seconds(seconds),
        };
        inner.notes.push(note.clone());
        note
    }

    /// Insert `count` notes one second apart, titled `note-1..`.
    pub fn seed_many(&self, count: usize) {
        for i in 1..=count {
            self.seed(&format!("note-{i}"), i as i64);
        }
    }

    pub fn len(&self) -> usize {
        self.inner.lock().unwrap().notes.len()
    }

    fn get(&self, id: u64) -> Option<Note> {
        self.inner
            .lock()
            .unwrap()
            .notes
            .iter()
            .find(|n| n.id == id)
            .cloned()
    }

    fn save(&self, note: Note) {
        let mut inner = self.inner.lock().unwrap();
        if let Some(existing) = inner.notes.iter_mut().find(|n| n.id == note.id) {
            *existing = note;
        }
    }

    fn query(&self, query: &ListQuery) -> Vec<Note> {
        let inner = self.inner.lock().unwrap();
        let mut rows: Vec<Note> = inner
            .notes
            .iter()
            .filter(|note| match &query.position {
                None => true,
                Some(position) => {
                    let key = sort_key(note, &position.field);
                    match position.comparison {
                        Comparison::GreaterThan => key > position.value,
                        Comparison::LessThan => key < position.value,
                    }
                }
            })
            .cloned()
            .collect();

        let field = query.ordering.field().to_string();
        rows.sort_by(|a, b| {
            let ordering = sort_key(a, &field).cmp(&sort_key(b, &field));
            if query.ordering.is_descending() {
                ordering.reverse()
            } else {
                ordering
            }
        });

        rows.into_iter()
            .skip(query.offset as usize)
            .take(query.limit.map(|l| l as usize).unwrap_or(usize::MAX))
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Views
// ---------------------------------------------------------------------------

static IDENTITY: IdentityOrdering = IdentityOrdering;

#[derive(Clone)]
pub struct NoteListView {
    pub store: NoteStore,
}

impl BaseView for NoteListView {
    type Object = Note;
    const VIEW_ID: &'static str = "notes.views.NoteListView";
    const RESOURCE: Option<&'static str> = Some("note");

    fn resource_id(&self, object: &Note) -> Option<String> {
        Some(object.id.to_string())
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

    fn cursor_position(&self, object: &Note, field: &str) -> Option<String> {
        Some(sort_key(object, field))
    }

    async fn count(&self, _ctx: &RequestContext) -> Result<u64, AppError> {
        Ok(self.store.len() as u64)
    }

    async fn fetch(&self, _ctx: &RequestContext, query: &ListQuery) -> Result<Vec<Note>, AppError> {
        Ok(self.store.query(query))
    }
}

#[async_trait]
impl CreateView for NoteListView {
    type CreateRequest = CreateNote;
    type CreateResponse = NoteOut;

    async fn perform_create(&self, _ctx: &RequestContext, input: CreateNote) -> Result<Note, AppError> {
        let mut note = self.store.seed(&input.title, self.store.len() as i64 + 1);
        note.body = input.body;
        note.status = input.status;
        note.metadata = input.metadata;
        self.store.save(note.clone());
        Ok(note)
    }
}

/// Unpaginated listing with its own response shape.
#[derive(Clone)]
pub struct NoteTitleView {
    pub store: NoteStore,
}

impl BaseView for NoteTitleView {
    type Object = Note;
    const VIEW_ID: &'static str = "notes.views.NoteTitleView";
}

#[async_trait]
impl ListView for NoteTitleView {
    type ListResponse = NoteTitle;

    fn default_pagination(&self) -> Option<PaginationKind> {
        None
    }

    async fn count(&self, _ctx: &RequestContext) -> Result<u64, AppError> {
        Ok(self.store.len() as u64)
    }

    async fn fetch(&self, _ctx: &RequestContext, query: &ListQuery) -> Result<Vec<Note>, AppError> {
        Ok(self.store.query(query))
    }
}

#[derive(Clone)]
pub struct NoteDetailView {
    pub store: NoteStore,
}

impl BaseView for NoteDetailView {
    type Object = Note;
    const VIEW_ID: &'static str = "notes.views.NoteDetailView";
    const RESOURCE: Option<&'static str> = Some("note");

    fn resource_id(&self, object: &Note) -> Option<String> {
        Some(object.id.to_string())
    }
}

#[async_trait]
impl ObjectView for NoteDetailView {
    type Id = u64;

    async fn get_object(&self, _ctx: &RequestContext, id: u64) -> Result<Note, AppError> {
        self.store.get(id).ok_or_else(|| {
            CoreError::NotFound {
                entity: "Note",
                id: id.to_string(),
            }
            .into()
        })
    }
}

impl RetrieveView for NoteDetailView {
    type RetrieveResponse = NoteOut;
}

#[async_trait]
impl UpdateView for NoteDetailView {
    type UpdateRequest = CreateNote;
    type PartialUpdateRequest = PatchNote;
    type UpdateResponse = NoteOut;

    async fn perform_update(
        &self,
        _ctx: &RequestContext,
        mut note: Note,
        changes: Update<CreateNote, PatchNote>,
    ) -> Result<Note, AppError> {
        match changes {
            Update::Full(input) => {
                note.title = input.title;
                note.body = input.body;
                note.status = input.status;
                note.metadata = input.metadata;
            }
            Update::Partial(input) => {
                if let Some(title) = input.title {
                    note.title = title;
                }
                if let Some(body) = input.body {
                    note.body = body;
                }
                if let Some(status) = input.status {
                    note.status = status;
                }
                if let Some(metadata) = input.metadata {
                    note.metadata = metadata;
                }
            }
        }
        self.store.save(note.clone());
        Ok(note)
    }
}

#[async_trait]
impl DestroyView for NoteDetailView {
    async fn perform_destroy(&self, _ctx: &RequestContext, note: Note) -> Result<(), AppError> {
        let mut inner = self.store.inner.lock().unwrap();
        inner.notes.retain(|n| n.id != note.id);
        Ok(())
    }
}

#[derive(Clone)]
pub struct NotePublishView {
    pub store: NoteStore,
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
        let mut inner = self.store.inner.lock().unwrap();
        let mut published = 0;
        for note in inner.notes.iter_mut().filter(|n| input.ids.contains(&n.id)) {
            note.status = NoteStatus::Published;
            published += 1;
        }
        Ok(PublishResult { published })
    }
}

#[derive(Clone)]
pub struct NoteSummaryView {
    pub store: NoteStore,
}

impl BaseView for NoteSummaryView {
    type Object = Note;
    const VIEW_ID: &'static str = "notes.views.NoteSummaryView";
}

#[async_trait]
impl ActionView for NoteSummaryView {
    type ActionRequest = SummaryRequest;
    type ActionResponse = NoteSummary;
    const ENVELOPE: bool = false;

    async fn perform_action(
        &self,
        _ctx: &RequestContext,
        input: SummaryRequest,
    ) -> Result<NoteSummary, AppError> {
        let inner = self.store.inner.lock().unwrap();
        let total = inner
            .notes
            .iter()
            .filter(|n| input.include_drafts || n.status == NoteStatus::Published)
            .count();
        Ok(NoteSummary {
            status: "success".into(),
            total,
        })
    }
}

#[derive(Clone)]
pub struct NoteExportView {
    pub store: NoteStore,
}

impl BaseView for NoteExportView {
    type Object = Note;
    const VIEW_ID: &'static str = "notes.views.NoteExportView";
}

#[async_trait]
impl ActionView for NoteExportView {
    type ActionRequest = ExportRequest;
    type ActionResponse = NoteExport;

    async fn perform_action(
        &self,
        _ctx: &RequestContext,
        input: ExportRequest,
    ) -> Result<NoteExport, AppError> {
        let note = self.store.get(input.id).ok_or_else(|| {
            AppError::from(CoreError::NotFound {
                entity: "Note",
                id: input.id.to_string(),
            })
        })?;
        Ok(if input.compact {
            NoteExport::Compact(note.into())
        } else {
            NoteExport::Full(note.into())
        })
    }
}

// ---------------------------------------------------------------------------
// App
// ---------------------------------------------------------------------------

pub fn test_settings() -> ApiSettings {
    ApiSettings {
        debug: true,
        additional_docs_dirs: Vec::new(),
        title: "Notes".to_string(),
        version: "1.0.0".to_string(),
    }
}

/// Every generic view over `store`.
pub fn notes_api(store: &NoteStore) -> ApiRouter {
    ApiRouter::new()
        .list_create("/notes/", NoteListView { store: store.clone() })
        .retrieve_update_destroy("/notes/{id}/", NoteDetailView { store: store.clone() })
        .list("/notes/titles/", NoteTitleView { store: store.clone() })
        .action("/notes/publish/", NotePublishView { store: store.clone() })
        .action("/notes/summary/", NoteSummaryView { store: store.clone() })
        .action("/notes/export/", NoteExportView { store: store.clone() })
}

/// Build the application router with the same middleware the server uses
/// (request ID, timeout, resource logging).
pub fn build_test_app(store: &NoteStore) -> Router {
    let request_id_header = HeaderName::from_static("x-request-id");

    notes_api(store)
        .into_router()
        .layer(axum::middleware::from_fn(restx_api::middleware::log_resource))
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(30),
        ))
        .layer(PropagateRequestIdLayer::new(request_id_header.clone()))
        .layer(SetRequestIdLayer::new(request_id_header, MakeRequestUuid))
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

pub async fn send(app: Router, method: Method, uri: &str, body: Option<serde_json::Value>) -> Response {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::HOST, "testserver");
    let request = match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    app.oneshot(request).await.unwrap()
}

pub async fn get(app: Router, uri: &str) -> Response {
    send(app, Method::GET, uri, None).await
}

pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> Response {
    send(app, Method::POST, uri, Some(body)).await
}

pub async fn put_json(app: Router, uri: &str, body: serde_json::Value) -> Response {
    send(app, Method::PUT, uri, Some(body)).await
}

pub async fn patch_json(app: Router, uri: &str, body: serde_json::Value) -> Response {
    send(app, Method::PATCH, uri, Some(body)).await
}

pub async fn delete(app: Router, uri: &str) -> Response {
    send(app, Method::DELETE, uri, None).await
}

pub async fn body_json(response: Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}
