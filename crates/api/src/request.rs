//! Request-side extractors shared by the generic views.

use axum::extract::{FromRequest, FromRequestParts, OriginalUri, Request};
use axum::http::request::Parts;
use axum::http::{header, Method};
use axum::Json;
use restx_core::query::{QueryParams, RequestUrl};
use serde::de::DeserializeOwned;
use validator::Validate;

use crate::error::AppError;

/// Method, URL and parsed query string of the current request.
///
/// Pagination links are built from [`RequestContext::url`], so they keep
/// every query parameter the client sent.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub method: Method,
    pub url: RequestUrl,
}

impl RequestContext {
    pub fn new(method: Method, url: &str) -> Self {
        Self {
            method,
            url: RequestUrl::parse(url),
        }
    }

    pub fn query(&self) -> &QueryParams {
        self.url.query()
    }
}

impl<S: Send + Sync> FromRequestParts<S> for RequestContext {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // Nested routers see a stripped `parts.uri`; links need the full path.
        let uri = parts
            .extensions
            .get::<OriginalUri>()
            .map(|original| &original.0)
            .unwrap_or(&parts.uri);
        let path_and_query = uri
            .path_and_query()
            .map(|pq| pq.as_str())
            .unwrap_or("/");

        // Absolute links when the client told us where it connected.
        let host = parts
            .headers
            .get(header::HOST)
            .and_then(|v| v.to_str().ok())
            .or_else(|| uri.authority().map(|a| a.as_str()));
        let url = match host {
            Some(host) => {
                let scheme = parts
                    .headers
                    .get("x-forwarded-proto")
                    .and_then(|v| v.to_str().ok())
                    .or_else(|| uri.scheme_str())
                    .unwrap_or("http");
                format!("{scheme}://{host}{path_and_query}")
            }
            None => path_and_query.to_string(),
        };

        Ok(Self::new(parts.method.clone(), &url))
    }
}

/// JSON body extractor that also runs `validator` checks.
///
/// Malformed bodies and failed validation both reject with [`AppError`], so
/// clients always get the standard error body.
#[derive(Debug, Clone)]
pub struct ValidJson<T>(pub T);

impl<S, T> FromRequest<S> for ValidJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        value.validate()?;
        Ok(Self(value))
    }
}

/// The single resource touched by a create, retrieve, update or destroy.
///
/// Stored in the response extensions so middleware can observe it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceData {
    pub resource: &'static str,
    pub resource_id: Option<String>,
}

#[cfg(test)]
mod tests {
    use axum::body::Body;

    use super::*;

    async fn context_for(request: axum::http::Request<Body>) -> RequestContext {
        let (mut parts, _) = request.into_parts();
        RequestContext::from_request_parts(&mut parts, &()).await.unwrap()
    }

    #[tokio::test]
    async fn builds_absolute_url_from_host() {
        let request = axum::http::Request::get("/notes/?page=2&pagination=page")
            .header(header::HOST, "api.example.com")
            .body(Body::empty())
            .unwrap();
        let ctx = context_for(request).await;

        assert_eq!(ctx.url.base(), "http://api.example.com/notes/");
        assert_eq!(ctx.query().get("page"), Some("2"));
        assert_eq!(ctx.method, Method::GET);
    }

    #[tokio::test]
    async fn honours_forwarded_proto() {
        let request = axum::http::Request::get("/notes/")
            .header(header::HOST, "api.example.com")
            .header("x-forwarded-proto", "https")
            .body(Body::empty())
            .unwrap();
        let ctx = context_for(request).await;

        assert_eq!(ctx.url.base(), "https://api.example.com/notes/");
    }

    #[tokio::test]
    async fn prefers_the_original_uri_of_nested_routes() {
        let mut request = axum::http::Request::get("/notes/?page=2")
            .header(header::HOST, "api.example.com")
            .body(Body::empty())
            .unwrap();
        request
            .extensions_mut()
            .insert(OriginalUri("/api/notes/?page=2".parse().unwrap()));
        let ctx = context_for(request).await;

        assert_eq!(ctx.url.base(), "http://api.example.com/api/notes/");
        assert_eq!(ctx.query().get("page"), Some("2"));
    }

    #[tokio::test]
    async fn falls_back_to_relative_url() {
        let request = axum::http::Request::get("/notes/?cursor=abc")
            .body(Body::empty())
            .unwrap();
        let ctx = context_for(request).await;

        assert_eq!(ctx.url.base(), "/notes/");
        assert_eq!(ctx.query().get("cursor"), Some("abc"));
    }
}
