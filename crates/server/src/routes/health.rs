//! `GET /health`, mounted beside the API and left out of its document.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::{routing::get, Json, Router};
use restx_db::DbPool;
use serde::Serialize;

#[derive(Debug, PartialEq, Eq, Serialize)]
struct Health {
    status: &'static str,
    version: &'static str,
    db_healthy: bool,
}

impl Health {
    fn new(db_healthy: bool) -> Self {
        Self {
            status: if db_healthy { "ok" } else { "degraded" },
            version: env!("CARGO_PKG_VERSION"),
            db_healthy,
        }
    }
}

impl IntoResponse for Health {
    /// A degraded service answers 503.
    fn into_response(self) -> Response {
        let code = if self.db_healthy {
            StatusCode::OK
        } else {
            StatusCode::SERVICE_UNAVAILABLE
        };
        (code, Json(self)).into_response()
    }
}

async fn health(State(pool): State<DbPool>) -> Health {
    match restx_db::health_check(&pool).await {
        Ok(()) => Health::new(true),
        Err(err) => {
            tracing::warn!(error = %err, "Database unreachable from health check");
            Health::new(false)
        }
    }
}

pub fn router(pool: DbPool) -> Router {
    Router::new().route("/health", get(health)).with_state(pool)
}
