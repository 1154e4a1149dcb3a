pub mod health;

use axum::Router;
use restx_api::config::ApiSettings;
use restx_api::schema::openapi_router;
use restx_db::DbPool;

use crate::notes;

/// Path the OpenAPI document is served from.
pub const OPENAPI_PATH: &str = "/openapi.json";

/// Every route of the server: the health check, the notes resource and its
/// OpenAPI document.
pub fn app_routes(pool: DbPool, settings: &ApiSettings) -> Router {
    let api = notes::api(pool.clone());
    let openapi = api.openapi(settings);
    tracing::info!(
        operations = api.operations().len(),
        "Generated OpenAPI document"
    );

    Router::new()
        .merge(health::router(pool))
        .merge(api.into_router())
        .merge(openapi_router(OPENAPI_PATH, openapi))
}
