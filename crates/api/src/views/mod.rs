//! Generic views.
//!
//! A view is a cheap, cloneable value (usually holding a pool) that
//! implements one trait per operation it supports. Each operation trait
//! names its own request and response types, so input validation and output
//! rendering can use different shapes:
//!
//! | Trait          | Method      | Request type            | Response type       |
//! |----------------|-------------|-------------------------|---------------------|
//! | [`CreateView`] | `POST`      | `CreateRequest`         | `CreateResponse`    |
//! | [`ListView`]   | `GET`       |                         | `ListResponse`      |
//! | [`RetrieveView`] | `GET`     |                         | `RetrieveResponse`  |
//! | [`UpdateView`] | `PUT/PATCH` | `UpdateRequest`, `PartialUpdateRequest` | `UpdateResponse` |
//! | [`DestroyView`] | `DELETE`   |                         |                     |
//! | [`ActionView`] | `POST`      | `ActionRequest`         | `ActionResponse`    |
//!
//! The handlers in [`mixins`] drive these traits; [`router::ApiRouter`]
//! mounts them.

use async_trait::async_trait;
use axum::http::{Method, StatusCode};
use restx_core::ordering::{OrderingFilter, OrderingMapper};
use restx_core::pagination::{
    CursorPagination, ListQuery, PageNumberPagination, PaginationKind,
};
use serde::de::DeserializeOwned;
use serde::Serialize;
use utoipa::ToSchema;
use validator::Validate;

use crate::error::AppError;
use crate::request::{RequestContext, ResourceData};

pub mod mixins;
pub mod router;

/// Status code used for a method when the view does not override it.
///
/// `DELETE` answers 200 because the body still carries a `status`.
pub fn default_status_code(method: &Method) -> StatusCode {
    if *method == Method::POST {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    }
}

/// Shared configuration of every generic view.
pub trait BaseView: Clone + Send + Sync + 'static {
    /// The model the view operates on.
    type Object: Send + Sync + 'static;

    /// Dotted `"<module>.<ViewName>"` identifier used to look up
    /// documentation overrides.
    const VIEW_ID: &'static str;

    /// Resource name recorded on single-instance responses.
    const RESOURCE: Option<&'static str> = None;

    /// Identifier recorded alongside [`Self::RESOURCE`].
    fn resource_id(&self, _object: &Self::Object) -> Option<String> {
        None
    }

    /// Status code for successful responses to `method`.
    fn response_status_code(&self, method: &Method) -> StatusCode {
        default_status_code(method)
    }

    /// Resource data for `object`, when the view names a resource.
    fn resource_data(&self, object: &Self::Object) -> Option<ResourceData> {
        Self::RESOURCE.map(|resource| ResourceData {
            resource,
            resource_id: self.resource_id(object),
        })
    }
}

/// Views addressing a single object through a path parameter.
#[async_trait]
pub trait ObjectView: BaseView {
    /// The `{id}` path parameter.
    type Id: DeserializeOwned + Send + 'static;

    /// Fetch the object, or fail with a 404 style error.
    async fn get_object(&self, ctx: &RequestContext, id: Self::Id) -> Result<Self::Object, AppError>;
}

#[async_trait]
pub trait CreateView: BaseView {
    type CreateRequest: DeserializeOwned + Validate + ToSchema + Send + 'static;
    type CreateResponse: Serialize + ToSchema + From<Self::Object> + Send;

    async fn perform_create(
        &self,
        ctx: &RequestContext,
        input: Self::CreateRequest,
    ) -> Result<Self::Object, AppError>;
}

#[async_trait]
pub trait ListView: BaseView {
    type ListResponse: Serialize + ToSchema + From<Self::Object> + Send;

    /// Strategy used when the request does not pick one. `None` lists
    /// everything.
    fn default_pagination(&self) -> Option<PaginationKind> {
        Some(PaginationKind::PageNumber)
    }

    fn page_number_pagination(&self) -> PageNumberPagination {
        PageNumberPagination::default()
    }

    fn cursor_pagination(&self) -> CursorPagination {
        CursorPagination::default()
    }

    /// Ordering used for page-number and unpaginated listings.
    fn ordering_filter(&self) -> OrderingFilter {
        OrderingFilter::default()
    }

    /// Maps the raw `orderby` value. Without a mapper the default ordering
    /// always applies.
    fn ordering_mapper(&self) -> Option<&dyn OrderingMapper> {
        None
    }

    /// Text form of `field` on `object`, for cursor positions.
    ///
    /// Must be comparable in the same order the storage sorts by.
    fn cursor_position(&self, _object: &Self::Object, _field: &str) -> Option<String> {
        None
    }

    async fn count(&self, ctx: &RequestContext) -> Result<u64, AppError>;

    async fn fetch(&self, ctx: &RequestContext, query: &ListQuery) -> Result<Vec<Self::Object>, AppError>;
}

pub trait RetrieveView: ObjectView {
    type RetrieveResponse: Serialize + ToSchema + From<Self::Object> + Send;
}

/// Validated body of a `PUT` or `PATCH`.
#[derive(Debug, Clone, PartialEq)]
pub enum Update<F, P> {
    Full(F),
    Partial(P),
}

#[async_trait]
pub trait UpdateView: ObjectView {
    type UpdateRequest: DeserializeOwned + Validate + ToSchema + Send + 'static;
    type PartialUpdateRequest: DeserializeOwned + Validate + ToSchema + Send + 'static;
    type UpdateResponse: Serialize + ToSchema + From<Self::Object> + Send;

    async fn perform_update(
        &self,
        ctx: &RequestContext,
        object: Self::Object,
        changes: Update<Self::UpdateRequest, Self::PartialUpdateRequest>,
    ) -> Result<Self::Object, AppError>;
}

#[async_trait]
pub trait DestroyView: ObjectView {
    async fn perform_destroy(&self, ctx: &RequestContext, object: Self::Object) -> Result<(), AppError>;
}

/// A `POST` endpoint that performs an operation rather than creating a
/// resource.
#[async_trait]
pub trait ActionView: BaseView {
    type ActionRequest: DeserializeOwned + Validate + ToSchema + Send + 'static;
    type ActionResponse: Serialize + ToSchema + Send;

    /// `false` when [`Self::ActionResponse`] is already a complete body and
    /// must not be wrapped in the envelope.
    const ENVELOPE: bool = true;

    fn action_status_code(&self) -> StatusCode {
        StatusCode::OK
    }

    async fn perform_action(
        &self,
        ctx: &RequestContext,
        input: Self::ActionRequest,
    ) -> Result<Self::ActionResponse, AppError>;
}
