use crate::domain::registration::FixedAnswer;
use crate::domain::types::format_address;
use crate::transport::http::handlers::common::{connect_failure, to_data};
use crate::transport::http::types::{json_422, ApiResponse, AppState, ConnectRequest};
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;

#[utoipa::path(
    get,
    path = "/session",
    responses(
        (status = 200, description = "Current account, citizen identifier, registration state and contract", body = ApiResponse)
    )
)]
pub async fn get_session_handler(State(state): State<AppState>) -> impl IntoResponse {
    let snapshot = state.snapshot.borrow().clone();
    (StatusCode::OK, Json(ApiResponse::ok(to_data(&snapshot))))
}

#[utoipa::path(
    post,
    path = "/session/init",
    responses(
        (status = 200, description = "Provider bound and contract resolved", body = ApiResponse),
        (status = 503, description = "No wallet provider available", body = ApiResponse)
    )
)]
pub async fn init_session_handler(State(state): State<AppState>) -> impl IntoResponse {
    let mut app = state.app.lock().await;
    match app.init().await {
        Ok(()) => (StatusCode::OK, Json(ApiResponse::ok(to_data(&app.snapshot())))).into_response(),
        Err(e) => connect_failure(&e).into_response(),
    }
}

#[utoipa::path(
    post,
    path = "/session/connect",
    request_body = ConnectRequest,
    responses(
        (status = 200, description = "Wallet connected and citizen registered", body = ApiResponse),
        (status = 403, description = "Connection or registration declined", body = ApiResponse),
        (status = 502, description = "Registration transaction failed", body = ApiResponse),
        (status = 503, description = "No wallet provider available", body = ApiResponse)
    )
)]
pub async fn connect_handler(
    State(state): State<AppState>,
    payload: Result<Json<ConnectRequest>, JsonRejection>,
) -> impl IntoResponse {
    let Json(request) = match payload {
        Ok(p) => p,
        Err(e) => return json_422(e, "{ approve_registration?: bool }").into_response(),
    };

    let mut app = state.app.lock().await;
    let prompt = FixedAnswer(request.approve_registration);
    match app.connect_wallet(&prompt).await {
        Ok(account) => {
            let mut data = to_data(&app.snapshot());
            data["connected"] = serde_json::json!(format_address(&account));
            (StatusCode::OK, Json(ApiResponse::ok(data))).into_response()
        }
        Err(e) => connect_failure(&e).into_response(),
    }
}
