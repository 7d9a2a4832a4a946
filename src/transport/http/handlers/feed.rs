use crate::transport::http::handlers::common::to_data;
use crate::transport::http::types::{ApiResponse, AppState};
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;

#[utoipa::path(
    get,
    path = "/notifications",
    responses(
        (status = 200, description = "Notifications that have not expired yet, oldest first", body = ApiResponse)
    )
)]
pub async fn notifications_handler(State(state): State<AppState>) -> impl IntoResponse {
    (StatusCode::OK, Json(ApiResponse::ok(to_data(&state.board.active()))))
}

#[utoipa::path(
    get,
    path = "/refresh",
    responses(
        (status = 200, description = "Reload generations for proposals and issues", body = ApiResponse)
    )
)]
pub async fn refresh_handler(State(state): State<AppState>) -> impl IntoResponse {
    (StatusCode::OK, Json(ApiResponse::ok(to_data(&state.refresh.snapshot()))))
}
