//! OpenAPI generation for routes mounted through [`ApiRouter`].
//!
//! [`generate`] builds a plain document from the operations the router
//! recorded. [`AutoSchema::apply`] is a post-pass over that document which
//! applies documentation overrides and wraps every response schema in the
//! `{status, data}` envelope.
//!
//! [`ApiRouter`]: crate::ApiRouter

use std::sync::Arc;

use axum::http::{Method, StatusCode};
use axum::routing::get;
use axum::{Json, Router};
use restx_core::docs::{Documentation, OperationDocs};
use restx_core::ordering::DEFAULT_ORDERBY_KEY;
use restx_core::pagination::cursor::CURSOR_QUERY_PARAM;
use restx_core::pagination::page_number::PAGE_QUERY_PARAM;
use restx_core::pagination::{PaginationKind, PAGE_SIZE_QUERY_PARAM, PAGINATION_QUERY_PARAM};
use utoipa::openapi::extensions::ExtensionsBuilder;
use utoipa::openapi::path::{Operation, OperationBuilder, Parameter, ParameterBuilder, ParameterIn};
use utoipa::openapi::request_body::RequestBodyBuilder;
use utoipa::openapi::schema::{Array, ObjectBuilder, Schema, SchemaType, Type};
use utoipa::openapi::{
    Components, ContentBuilder, Deprecated, Info, OpenApi, PathItem, Paths, Ref, RefOr, Required,
    Response, ResponseBuilder,
};
use utoipa::ToSchema;

use crate::config::ApiSettings;

const JSON: &str = "application/json";

/// Component registered for destroy responses.
pub const SUCCESS_RESPONSE: &str = "SuccessResponse";

// ---------------------------------------------------------------------------
// Recorded operations
// ---------------------------------------------------------------------------

/// The generic operation behind a route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    List,
    Create,
    Retrieve,
    Update,
    PartialUpdate,
    Destroy,
    Action,
}

impl OperationKind {
    pub fn method(&self) -> Method {
        match self {
            OperationKind::List | OperationKind::Retrieve => Method::GET,
            OperationKind::Create | OperationKind::Action => Method::POST,
            OperationKind::Update => Method::PUT,
            OperationKind::PartialUpdate => Method::PATCH,
            OperationKind::Destroy => Method::DELETE,
        }
    }

    /// Suffix of generated operation ids.
    fn action_name(&self) -> &'static str {
        match self {
            OperationKind::List => "list",
            OperationKind::Create | OperationKind::Action => "create",
            OperationKind::Retrieve => "retrieve",
            OperationKind::Update => "update",
            OperationKind::PartialUpdate => "partial_update",
            OperationKind::Destroy => "destroy",
        }
    }
}

/// A named schema plus every component schema it refers to.
#[derive(Debug, Clone)]
pub struct SchemaRef {
    pub name: String,
    pub components: Vec<(String, RefOr<Schema>)>,
}

impl SchemaRef {
    pub fn of<T: ToSchema>() -> Self {
        let name = T::name().into_owned();
        let mut components = vec![(name.clone(), T::schema())];
        T::schemas(&mut components);
        Self { name, components }
    }

    fn reference(&self) -> RefOr<Schema> {
        schema_ref(&self.name)
    }
}

/// What a successful response of an operation carries.
#[derive(Debug, Clone)]
pub enum ResponseShape {
    /// A single rendered object.
    Object(SchemaRef),
    /// A list of rendered objects, paginated by the view's default strategy.
    List {
        item: SchemaRef,
        pagination: Option<PaginationKind>,
    },
    /// `{status}` only.
    Empty,
    /// A complete body that is not enveloped.
    Raw(SchemaRef),
}

/// Everything the schema layer needs to know about one mounted operation.
#[derive(Debug, Clone)]
pub struct OperationSchema {
    pub path: String,
    pub kind: OperationKind,
    pub view_id: &'static str,
    pub status: StatusCode,
    pub request: Option<SchemaRef>,
    pub response: ResponseShape,
}

impl OperationSchema {
    pub fn method(&self) -> Method {
        self.kind.method()
    }

    /// `api_notes_list` style id built from the path and the operation.
    pub fn default_operation_id(&self) -> String {
        let mut tokens: Vec<String> = path_segments(&self.path)
            .filter(|segment| !is_path_param(segment))
            .map(|segment| segment.replace(['-', '.'], "_"))
            .collect();
        tokens.push(self.kind.action_name().to_string());
        tokens.join("_")
    }

    fn tag(&self) -> Option<&str> {
        path_segments(&self.path).find(|segment| !is_path_param(segment) && *segment != "api")
    }
}

fn path_segments(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|segment| !segment.is_empty())
}

fn is_path_param(segment: &str) -> bool {
    segment.starts_with('{') && segment.ends_with('}')
}

// ---------------------------------------------------------------------------
// Schema building blocks
// ---------------------------------------------------------------------------

fn schema_ref(name: &str) -> RefOr<Schema> {
    RefOr::Ref(Ref::from_schema_name(name))
}

fn object(builder: ObjectBuilder) -> RefOr<Schema> {
    RefOr::T(Schema::Object(builder.build()))
}

fn array_of(items: RefOr<Schema>) -> RefOr<Schema> {
    RefOr::T(Schema::Array(Array::new(items)))
}

fn nullable_uri() -> RefOr<Schema> {
    object(ObjectBuilder::new().schema_type(SchemaType::Array(vec![Type::String, Type::Null])))
}

fn status_property() -> RefOr<Schema> {
    object(
        ObjectBuilder::new()
            .schema_type(Type::String)
            .examples([serde_json::json!("success")]),
    )
}

/// `{status: "success", data: <data>}`.
pub fn envelope_schema(data: RefOr<Schema>) -> RefOr<Schema> {
    object(
        ObjectBuilder::new()
            .schema_type(Type::Object)
            .property("status", status_property())
            .property("data", data),
    )
}

/// `{status: "success"}`.
pub fn success_schema() -> RefOr<Schema> {
    object(
        ObjectBuilder::new()
            .schema_type(Type::Object)
            .property("status", status_property()),
    )
}

/// Page body of a strategy, with `results` holding `items`.
pub fn paginated_schema(kind: PaginationKind, items: RefOr<Schema>) -> RefOr<Schema> {
    let builder = ObjectBuilder::new().schema_type(Type::Object).required("results");
    let builder = match kind {
        PaginationKind::PageNumber => builder
            .required("count")
            .property(
                "count",
                object(ObjectBuilder::new().schema_type(Type::Integer).examples([123])),
            ),
        PaginationKind::Cursor => builder,
    };
    object(
        builder
            .property("next", nullable_uri())
            .property("previous", nullable_uri())
            .property("results", array_of(items)),
    )
}

fn query_parameter(name: &str, schema_type: Type, description: &str) -> Parameter {
    ParameterBuilder::new()
        .name(name)
        .parameter_in(ParameterIn::Query)
        .required(Required::False)
        .description(Some(description))
        .schema(Some(object(ObjectBuilder::new().schema_type(schema_type))))
        .build()
}

fn list_parameters() -> Vec<Parameter> {
    vec![
        ParameterBuilder::new()
            .name(PAGINATION_QUERY_PARAM)
            .parameter_in(ParameterIn::Query)
            .required(Required::False)
            .description(Some("Pagination strategy for this request."))
            .schema(Some(object(
                ObjectBuilder::new()
                    .schema_type(Type::String)
                    .enum_values(Some(["page", "cursor"])),
            )))
            .build(),
        query_parameter(PAGE_QUERY_PARAM, Type::Integer, "A page number within the paginated result set."),
        query_parameter(PAGE_SIZE_QUERY_PARAM, Type::Integer, "Number of results to return per page."),
        query_parameter(CURSOR_QUERY_PARAM, Type::String, "The pagination cursor value."),
        query_parameter(DEFAULT_ORDERBY_KEY, Type::String, "Which field to use when ordering the results."),
    ]
}

fn path_parameters(path: &str) -> Vec<Parameter> {
    path_segments(path)
        .filter(|segment| is_path_param(segment))
        .map(|segment| {
            ParameterBuilder::new()
                .name(&segment[1..segment.len() - 1])
                .parameter_in(ParameterIn::Path)
                .required(Required::True)
                .schema(Some(object(ObjectBuilder::new().schema_type(Type::String))))
                .build()
        })
        .collect()
}

fn json_response(schema: Option<RefOr<Schema>>) -> Response {
    match schema {
        Some(schema) => ResponseBuilder::new()
            .description("")
            .content(JSON, ContentBuilder::new().schema(Some(schema)).build())
            .build(),
        None => ResponseBuilder::new().description("No response body").build(),
    }
}

fn register_on_missing(components: &mut Components, name: &str, schema: RefOr<Schema>) {
    components.schemas.entry(name.to_string()).or_insert(schema);
}

fn operation_mut<'a>(paths: &'a mut Paths, path: &str, method: &Method) -> Option<&'a mut Operation> {
    let item = paths.paths.get_mut(path)?;
    slot(item, method).as_mut()
}

fn slot<'a>(item: &'a mut PathItem, method: &Method) -> &'a mut Option<Operation> {
    match *method {
        Method::POST => &mut item.post,
        Method::PUT => &mut item.put,
        Method::PATCH => &mut item.patch,
        Method::DELETE => &mut item.delete,
        _ => &mut item.get,
    }
}

// ---------------------------------------------------------------------------
// Generation
// ---------------------------------------------------------------------------

/// Build the plain document: one operation per recorded entry, response
/// schemas referring straight to the rendered types.
pub fn generate(settings: &ApiSettings, operations: &[OperationSchema]) -> OpenApi {
    let mut openapi = OpenApi::new(Info::new(&settings.title, &settings.version), Paths::new());
    let mut components = Components::new();

    for op in operations {
        let mut builder = OperationBuilder::new().operation_id(Some(op.default_operation_id()));
        if let Some(tag) = op.tag() {
            builder = builder.tag(tag);
        }
        for parameter in path_parameters(&op.path) {
            builder = builder.parameter(parameter);
        }
        if op.kind == OperationKind::List {
            for parameter in list_parameters() {
                builder = builder.parameter(parameter);
            }
        }

        if let Some(request) = &op.request {
            for (name, schema) in &request.components {
                register_on_missing(&mut components, name, schema.clone());
            }
            let body = RequestBodyBuilder::new()
                .content(JSON, ContentBuilder::new().schema(Some(request.reference())).build())
                .required(Some(Required::True))
                .build();
            builder = builder.request_body(Some(body));
        }

        let response_schema = match &op.response {
            ResponseShape::Object(item) | ResponseShape::Raw(item) => {
                for (name, schema) in &item.components {
                    register_on_missing(&mut components, name, schema.clone());
                }
                Some(item.reference())
            }
            ResponseShape::List { item, pagination } => {
                for (name, schema) in &item.components {
                    register_on_missing(&mut components, name, schema.clone());
                }
                let items = item.reference();
                Some(match pagination {
                    Some(kind) => paginated_schema(*kind, items),
                    None => array_of(items),
                })
            }
            ResponseShape::Empty => None,
        };
        builder = builder.response(op.status.as_u16().to_string(), json_response(response_schema));

        let item = openapi.paths.paths.entry(op.path.clone()).or_default();
        *slot(item, &op.method()) = Some(builder.build());
    }

    openapi.components = Some(components);
    openapi
}

// ---------------------------------------------------------------------------
// Post-pass
// ---------------------------------------------------------------------------

/// Applies documentation overrides and response envelopes to a generated
/// document.
#[derive(Debug, Clone, Copy)]
pub struct AutoSchema<'a> {
    documentation: &'a Documentation,
    debug: bool,
}

impl<'a> AutoSchema<'a> {
    pub fn new(documentation: &'a Documentation, debug: bool) -> Self {
        Self {
            documentation,
            debug,
        }
    }

    pub fn apply(&self, openapi: &mut OpenApi, operations: &[OperationSchema]) {
        let components = openapi.components.get_or_insert_with(Components::new);

        for op in operations {
            let Some(operation) = operation_mut(&mut openapi.paths, &op.path, &op.method()) else {
                tracing::warn!(path = %op.path, method = %op.method(), "Operation missing from document");
                continue;
            };

            self.apply_docs(operation, op);

            if let Some(envelope) = envelope_for(components, &op.response) {
                operation.responses.responses.insert(
                    op.status.as_u16().to_string(),
                    RefOr::T(json_response(Some(envelope))),
                );
            }
        }
    }

    fn view_docs(&self, op: &OperationSchema) -> Option<&'a OperationDocs> {
        let method = op.method();
        let docs = self.documentation.lookup(op.view_id, method.as_str());
        if docs.is_none() && self.debug {
            tracing::warn!(
                view = op.view_id,
                method = %method,
                "No additional documentation is defined for this view and method"
            );
        }
        docs
    }

    fn apply_docs(&self, operation: &mut Operation, op: &OperationSchema) {
        // Generated descriptions are never kept.
        operation.description = None;

        let Some(docs) = self.view_docs(op) else {
            return;
        };

        if let Some(operation_id) = docs.operation_id.as_ref().filter(|s| !s.is_empty()) {
            operation.operation_id = Some(operation_id.clone());
        }
        if let Some(summary) = docs.summary.as_ref().filter(|s| !s.is_empty()) {
            operation.summary = Some(summary.clone());
        }
        if let Some(description) = docs.description.as_ref().filter(|s| !s.is_empty()) {
            operation.description = Some(description.clone());
        }
        if docs.deprecated == Some(true) {
            operation.deprecated = Some(Deprecated::True);
        }

        let extensions = docs.extensions();
        if !extensions.is_empty() {
            let extensions = extensions
                .into_iter()
                .fold(ExtensionsBuilder::new(), |builder, (key, value)| builder.add(key, value))
                .build();
            match operation.extensions.as_mut() {
                Some(existing) => existing.merge(extensions),
                None => operation.extensions = Some(extensions),
            }
        }
    }
}

/// Register the components behind a response shape and return a reference
/// to its envelope. `None` leaves the response untouched.
fn envelope_for(components: &mut Components, shape: &ResponseShape) -> Option<RefOr<Schema>> {
    let (name, data) = match shape {
        ResponseShape::Raw(_) => return None,
        ResponseShape::Empty => {
            register_on_missing(components, SUCCESS_RESPONSE, success_schema());
            return Some(schema_ref(SUCCESS_RESPONSE));
        }
        ResponseShape::Object(item) => (item.name.clone(), item.reference()),
        ResponseShape::List { item, pagination } => {
            let (list_name, list_schema) = match pagination {
                Some(kind) => (
                    format!("Paginated{}List", item.name),
                    paginated_schema(*kind, item.reference()),
                ),
                None => (format!("{}List", item.name), array_of(item.reference())),
            };
            register_on_missing(components, &list_name, list_schema);
            let reference = schema_ref(&list_name);
            (list_name, reference)
        }
    };

    let envelope_name = format!("{name}Response");
    register_on_missing(components, &envelope_name, envelope_schema(data));
    Some(schema_ref(&envelope_name))
}

/// Serve `openapi` as JSON at `path`.
pub fn openapi_router<S>(path: &str, openapi: OpenApi) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    let document = Arc::new(openapi);
    Router::new().route(
        path,
        get(move || {
            let document = Arc::clone(&document);
            async move { Json(document.as_ref().clone()) }
        }),
    )
}
