#![allow(dead_code)]

use axum::body::Body;
use axum::http::{header, Method, Request};
use axum::response::Response;
use axum::Router;
use http_body_util::BodyExt;
use restx_api::config::ApiSettings;
use sqlx::PgPool;
use tower::ServiceExt;

/// The server's routes with resource logging, as `main` mounts them.
pub fn build_test_app(pool: PgPool) -> Router {
    restx_server::routes::app_routes(pool, &ApiSettings::default())
        .layer(axum::middleware::from_fn(restx_api::middleware::log_resource))
}

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

pub async fn body_json(response: Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}
