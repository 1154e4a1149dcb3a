//! Middleware observing generic view responses.

use axum::extract::Request;
use axum::middleware::Next;
use axum::response::Response;

use crate::request::ResourceData;

/// Log the resource a single-instance operation touched.
///
/// Mount with `axum::middleware::from_fn(log_resource)`.
pub async fn log_resource(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();

    let response = next.run(request).await;

    if let Some(data) = response.extensions().get::<ResourceData>() {
        tracing::info!(
            %method,
            %path,
            status = response.status().as_u16(),
            resource = data.resource,
            resource_id = data.resource_id.as_deref().unwrap_or("-"),
            "Resource touched"
        );
    }
    response
}
