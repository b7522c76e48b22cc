use axum::Json;

use crate::dto::HealthResponse;

pub async fn healthz() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}
