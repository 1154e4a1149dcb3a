//! Handlers driving the generic view traits.
//!
//! Each handler is generic over the view type, which doubles as the axum
//! state of its route. They all answer with the `{status, data}` envelope.

use axum::extract::rejection::PathRejection;
use axum::extract::{FromRequest, Path, Request, State};
use axum::http::{header, HeaderMap, HeaderValue, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use restx_core::error::CoreError;
use restx_core::pagination::{CursorPage, ListQuery, PaginationKind};
use serde::Serialize;
use serde_json::Value;

use super::{
    ActionView, BaseView, CreateView, DestroyView, ListView, ObjectView, RetrieveView, Update,
    UpdateView,
};
use crate::error::{AppError, AppResult};
use crate::request::{RequestContext, ResourceData, ValidJson};
use crate::response::Envelope;

/// Field of a created object's representation copied into `Location`.
pub const URL_FIELD_NAME: &str = "url";

/// `POST` on a collection.
pub async fn create<V: CreateView>(
    State(view): State<V>,
    ctx: RequestContext,
    ValidJson(input): ValidJson<V::CreateRequest>,
) -> AppResult<Response> {
    let object = view.perform_create(&ctx, input).await?;
    let resource = view.resource_data(&object);

    let data = to_value(V::CreateResponse::from(object))?;
    let mut headers = HeaderMap::new();
    if let Some(location) = success_location(&data) {
        headers.insert(header::LOCATION, location);
    }

    let status = view.response_status_code(&Method::POST);
    Ok(respond(status, headers, resource, Envelope::success(data)))
}

/// `GET` on a collection, paginated by the strategy the request selects.
pub async fn list<V: ListView>(State(view): State<V>, ctx: RequestContext) -> AppResult<Response> {
    let status = view.response_status_code(&Method::GET);
    let query = ctx.query();

    let response = match PaginationKind::select(query, view.default_pagination()) {
        Some(PaginationKind::PageNumber) => {
            let ordering = view.ordering_filter().resolve(query, view.ordering_mapper())?;
            let paginator = view.page_number_pagination();
            let count = view.count(&ctx).await?;
            let plan = paginator.plan(query, count)?;

            let objects = view.fetch(&ctx, &plan.list_query(ordering)).await?;
            let results: Vec<V::ListResponse> = objects.into_iter().map(Into::into).collect();
            let page = paginator.page(&plan, &ctx.url, results);
            respond(status, HeaderMap::new(), None, Envelope::success(page))
        }
        Some(PaginationKind::Cursor) => {
            let paginator = view.cursor_pagination();
            let plan = paginator.plan(query)?;

            let fetched = view.fetch(&ctx, &plan.list_query()).await?;
            let page = paginator.page(&plan, &ctx.url, fetched, |object, field| {
                view.cursor_position(object, field)
            });
            let page = CursorPage {
                next: page.next,
                previous: page.previous,
                results: page
                    .results
                    .into_iter()
                    .map(Into::into)
                    .collect::<Vec<V::ListResponse>>(),
            };
            respond(status, HeaderMap::new(), None, Envelope::success(page))
        }
        None => {
            let ordering = view.ordering_filter().resolve(query, view.ordering_mapper())?;
            let objects = view.fetch(&ctx, &ListQuery::all(ordering)).await?;
            let results: Vec<V::ListResponse> = objects.into_iter().map(Into::into).collect();
            respond(status, HeaderMap::new(), None, Envelope::success(results))
        }
    };
    Ok(response)
}

/// `GET` on a single object.
pub async fn retrieve<V: RetrieveView>(
    State(view): State<V>,
    ctx: RequestContext,
    path: Result<Path<V::Id>, PathRejection>,
) -> AppResult<Response> {
    let object = view.get_object(&ctx, object_id(path)?).await?;
    let resource = view.resource_data(&object);

    let data = V::RetrieveResponse::from(object);
    let status = view.response_status_code(&Method::GET);
    Ok(respond(status, HeaderMap::new(), resource, Envelope::success(data)))
}

/// `PUT` on a single object.
pub async fn update<V: UpdateView>(
    State(view): State<V>,
    ctx: RequestContext,
    path: Result<Path<V::Id>, PathRejection>,
    request: Request,
) -> AppResult<Response> {
    let object = view.get_object(&ctx, object_id(path)?).await?;
    let resource = view.resource_data(&object);

    // The object is looked up before the body is validated, so a missing
    // object is a 404 even when the body is bad.
    let ValidJson(input) = ValidJson::<V::UpdateRequest>::from_request(request, &()).await?;
    finish_update(view, ctx, object, resource, Update::Full(input), Method::PUT).await
}

/// `PATCH` on a single object.
pub async fn partial_update<V: UpdateView>(
    State(view): State<V>,
    ctx: RequestContext,
    path: Result<Path<V::Id>, PathRejection>,
    request: Request,
) -> AppResult<Response> {
    let object = view.get_object(&ctx, object_id(path)?).await?;
    let resource = view.resource_data(&object);

    let ValidJson(input) =
        ValidJson::<V::PartialUpdateRequest>::from_request(request, &()).await?;
    finish_update(view, ctx, object, resource, Update::Partial(input), Method::PATCH).await
}

async fn finish_update<V: UpdateView>(
    view: V,
    ctx: RequestContext,
    object: V::Object,
    resource: Option<ResourceData>,
    changes: Update<V::UpdateRequest, V::PartialUpdateRequest>,
    method: Method,
) -> AppResult<Response> {
    let updated = view.perform_update(&ctx, object, changes).await?;
    let data = V::UpdateResponse::from(updated);
    let status = view.response_status_code(&method);
    Ok(respond(status, HeaderMap::new(), resource, Envelope::success(data)))
}

/// `DELETE` on a single object. Answers `{"status": "success"}`.
pub async fn destroy<V: DestroyView>(
    State(view): State<V>,
    ctx: RequestContext,
    path: Result<Path<V::Id>, PathRejection>,
) -> AppResult<Response> {
    let object = view.get_object(&ctx, object_id(path)?).await?;
    let resource = view.resource_data(&object);

    view.perform_destroy(&ctx, object).await?;
    let status = view.response_status_code(&Method::DELETE);
    Ok(respond(status, HeaderMap::new(), resource, Envelope::empty()))
}

/// `POST` on an action endpoint.
pub async fn action<V: ActionView>(
    State(view): State<V>,
    ctx: RequestContext,
    ValidJson(input): ValidJson<V::ActionRequest>,
) -> AppResult<Response> {
    let output = view.perform_action(&ctx, input).await?;
    let status = view.action_status_code();
    let response = if V::ENVELOPE {
        respond(status, HeaderMap::new(), None, Envelope::success(output))
    } else {
        respond(status, HeaderMap::new(), None, output)
    };
    Ok(response)
}

/// Unwrap the `{id}` path parameter. A value that does not parse cannot
/// name an object, so it is a 404 rather than a 400.
fn object_id<T>(path: Result<Path<T>, PathRejection>) -> Result<T, AppError> {
    match path {
        Ok(Path(id)) => Ok(id),
        Err(rejection) => {
            tracing::debug!(error = %rejection, "Unusable object id");
            Err(CoreError::NotFoundMessage("Not found.".into()).into())
        }
    }
}

fn to_value<T: Serialize>(value: T) -> AppResult<Value> {
    serde_json::to_value(value)
        .map_err(|e| AppError::InternalError(format!("Failed to render response: {e}")))
}

fn success_location(data: &Value) -> Option<HeaderValue> {
    data.get(URL_FIELD_NAME)
        .and_then(Value::as_str)
        .and_then(|url| HeaderValue::from_str(url).ok())
}

fn respond<T: Serialize>(
    status: StatusCode,
    headers: HeaderMap,
    resource: Option<ResourceData>,
    body: T,
) -> Response {
    let mut response = (status, headers, Json(body)).into_response();
    if let Some(resource) = resource {
        response.extensions_mut().insert(resource);
    }
    response
}
