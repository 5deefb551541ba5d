use axum::Json;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct IndexResponse {
    pub message: String,
    pub container_id: String,
}

/// Liveness check that also reports which host answered.
pub async fn index() -> Json<IndexResponse> {
    let container_id = gethostname::gethostname().to_string_lossy().into_owned();
    Json(IndexResponse {
        message: "API is running".to_string(),
        container_id,
    })
}
