use crate::model::HealthResponse;
use axum::Json;

/// Liveness check. Does not touch the store.
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}
