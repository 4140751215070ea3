use axum::{extract::State, response::Json};
use serde_json::{json, Value};

use crate::server::app::AppState;

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is up")
    )
)]
pub async fn health_check(State(state): State<AppState>) -> Json<Value> {
    let database = match state.db.ping().await {
        Ok(()) => "ok",
        Err(err) => {
            tracing::warn!("Database ping failed: {}", err);
            "unavailable"
        }
    };

    Json(json!({
        "status": "healthy",
        "service": "lectern",
        "version": env!("CARGO_PKG_VERSION"),
        "database": database,
    }))
}
