use axum::{
    http::{header, StatusCode},
    response::IntoResponse,
};

/// Liveness probe. Answers `ok` for as long as the process is up.
pub async fn health() -> impl IntoResponse {
    (StatusCode::OK, [(header::CACHE_CONTROL, "no-store")], "ok")
}
