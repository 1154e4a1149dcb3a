use std::collections::BTreeMap;

use axum::routing::{delete, get, patch, post, put, MethodRouter};
use axum::Router;
use restx_core::docs::Documentation;
use utoipa::openapi::OpenApi;

use super::{
    mixins, ActionView, BaseView, CreateView, DestroyView, ListView, RetrieveView, UpdateView,
};
use crate::config::ApiSettings;
use crate::schema::{self, AutoSchema, OperationKind, OperationSchema, ResponseShape, SchemaRef};

/// Router builder for generic views.
///
/// Each registration mounts the view's handlers at `path` and records the
/// operation so [`ApiRouter::openapi`] can document it. Registering the same
/// method twice on one path panics, as axum does.
///
/// ```ignore
/// let api = ApiRouter::new()
///     .list_create("/notes/", NoteListView::new(pool.clone()))
///     .retrieve_update_destroy("/notes/{id}/", NoteDetailView::new(pool));
/// let openapi = api.openapi(&settings);
/// let app = api.into_router();
/// ```
pub struct ApiRouter<S = ()> {
    routes: BTreeMap<String, MethodRouter<S>>,
    operations: Vec<OperationSchema>,
}

impl<S> Default for ApiRouter<S>
where
    S: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<S> ApiRouter<S>
where
    S: Clone + Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self {
            routes: BTreeMap::new(),
            operations: Vec::new(),
        }
    }

    fn mount(
        mut self,
        path: &str,
        method_router: MethodRouter<S>,
        operations: impl IntoIterator<Item = OperationSchema>,
    ) -> Self {
        let merged = match self.routes.remove(path) {
            Some(existing) => existing.merge(method_router),
            None => method_router,
        };
        self.routes.insert(path.to_string(), merged);
        self.operations.extend(operations);
        self
    }

    fn operation<V: BaseView>(
        path: &str,
        kind: OperationKind,
        view: &V,
        request: Option<SchemaRef>,
        response: ResponseShape,
    ) -> OperationSchema {
        OperationSchema {
            path: path.to_string(),
            kind,
            view_id: V::VIEW_ID,
            status: view.response_status_code(&kind.method()),
            request,
            response,
        }
    }

    // -----------------------------------------------------------------------
    // Single operations
    // -----------------------------------------------------------------------

    pub fn list<V: ListView>(self, path: &str, view: V) -> Self {
        let op = Self::operation(
            path,
            OperationKind::List,
            &view,
            None,
            ResponseShape::List {
                item: SchemaRef::of::<V::ListResponse>(),
                pagination: view.default_pagination(),
            },
        );
        self.mount(path, get(mixins::list::<V>).with_state(view), [op])
    }

    pub fn create<V: CreateView>(self, path: &str, view: V) -> Self {
        let op = Self::operation(
            path,
            OperationKind::Create,
            &view,
            Some(SchemaRef::of::<V::CreateRequest>()),
            ResponseShape::Object(SchemaRef::of::<V::CreateResponse>()),
        );
        self.mount(path, post(mixins::create::<V>).with_state(view), [op])
    }

    pub fn retrieve<V: RetrieveView>(self, path: &str, view: V) -> Self {
        let op = Self::operation(
            path,
            OperationKind::Retrieve,
            &view,
            None,
            ResponseShape::Object(SchemaRef::of::<V::RetrieveResponse>()),
        );
        self.mount(path, get(mixins::retrieve::<V>).with_state(view), [op])
    }

    /// Mounts both `PUT` and `PATCH`.
    pub fn update<V: UpdateView>(self, path: &str, view: V) -> Self {
        let full = Self::operation(
            path,
            OperationKind::Update,
            &view,
            Some(SchemaRef::of::<V::UpdateRequest>()),
            ResponseShape::Object(SchemaRef::of::<V::UpdateResponse>()),
        );
        let partial = Self::operation(
            path,
            OperationKind::PartialUpdate,
            &view,
            Some(SchemaRef::of::<V::PartialUpdateRequest>()),
            ResponseShape::Object(SchemaRef::of::<V::UpdateResponse>()),
        );
        let method_router = put(mixins::update::<V>)
            .patch(mixins::partial_update::<V>)
            .with_state(view);
        self.mount(path, method_router, [full, partial])
    }

    pub fn destroy<V: DestroyView>(self, path: &str, view: V) -> Self {
        let op = Self::operation(path, OperationKind::Destroy, &view, None, ResponseShape::Empty);
        self.mount(path, delete(mixins::destroy::<V>).with_state(view), [op])
    }

    pub fn action<V: ActionView>(self, path: &str, view: V) -> Self {
        let response = if V::ENVELOPE {
            ResponseShape::Object(SchemaRef::of::<V::ActionResponse>())
        } else {
            ResponseShape::Raw(SchemaRef::of::<V::ActionResponse>())
        };
        let mut op = Self::operation(
            path,
            OperationKind::Action,
            &view,
            Some(SchemaRef::of::<V::ActionRequest>()),
            response,
        );
        op.status = view.action_status_code();
        self.mount(path, post(mixins::action::<V>).with_state(view), [op])
    }

    // -----------------------------------------------------------------------
    // Combinations
    // -----------------------------------------------------------------------

    pub fn list_create<V: ListView + CreateView>(self, path: &str, view: V) -> Self {
        self.list(path, view.clone()).create(path, view)
    }

    pub fn retrieve_update<V: RetrieveView + UpdateView>(self, path: &str, view: V) -> Self {
        self.retrieve(path, view.clone()).update(path, view)
    }

    pub fn retrieve_destroy<V: RetrieveView + DestroyView>(self, path: &str, view: V) -> Self {
        self.retrieve(path, view.clone()).destroy(path, view)
    }

    pub fn retrieve_update_destroy<V>(self, path: &str, view: V) -> Self
    where
        V: RetrieveView + UpdateView + DestroyView,
    {
        self.retrieve(path, view.clone())
            .update(path, view.clone())
            .destroy(path, view)
    }

    // -----------------------------------------------------------------------
    // Output
    // -----------------------------------------------------------------------

    /// Operations mounted so far, in registration order.
    pub fn operations(&self) -> &[OperationSchema] {
        &self.operations
    }

    /// The enveloped OpenAPI document for every mounted operation, using
    /// the process-wide documentation table.
    pub fn openapi(&self, settings: &ApiSettings) -> OpenApi {
        self.openapi_with_docs(settings, settings.documentation())
    }

    pub fn openapi_with_docs(&self, settings: &ApiSettings, documentation: &Documentation) -> OpenApi {
        let mut openapi = schema::generate(settings, &self.operations);
        AutoSchema::new(documentation, settings.debug).apply(&mut openapi, &self.operations);
        openapi
    }

    pub fn into_router(self) -> Router<S> {
        self.routes
            .into_iter()
            .fold(Router::new(), |router, (path, method_router)| {
                router.route(&path, method_router)
            })
    }
}
