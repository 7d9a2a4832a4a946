use crate::transport::http::types::{ApiResponse, AppState};
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Bound wallet provider is reachable, or a flow is running against it", body = ApiResponse),
        (status = 503, description = "No provider bound or provider unreachable", body = ApiResponse)
    )
)]
pub async fn healthcheck_handler(State(state): State<AppState>) -> impl IntoResponse {
    // A running flow (e.g. waiting for a receipt) holds the app; answer from the last snapshot.
    let Ok(app) = state.app.try_lock() else {
        let network = state.snapshot.borrow().network_id;
        return match network {
            Some(network) => (
                StatusCode::OK,
                Json(ApiResponse::ok(serde_json::json!({
                    "status": "busy",
                    "network_id": network,
                }))),
            )
                .into_response(),
            None => unhealthy("no provider bound".to_string()).into_response(),
        };
    };

    match app.probe_network().await {
        Ok(network) => (
            StatusCode::OK,
            Json(ApiResponse::ok(serde_json::json!({
                "status": "ok",
                "network_id": network,
            }))),
        )
            .into_response(),
        Err(e) => unhealthy(format!("Provider check failed: {}", e)).into_response(),
    }
}

fn unhealthy(reason: String) -> (StatusCode, Json<ApiResponse>) {
    (
        StatusCode::SERVICE_UNAVAILABLE,
        Json(ApiResponse {
            success: false,
            data: Some(serde_json::json!({ "status": "unhealthy" })),
            code: Some("PROVIDER_UNAVAILABLE".to_string()),
            error: Some(reason),
        }),
    )
}
