use crate::transport::http::handlers::common::submit_failure;
use crate::transport::http::types::{
    json_422, ApiResponse, AppState, CreateProposalRequest, ReportIssueRequest, VoteRequest,
};
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

#[utoipa::path(
    post,
    path = "/proposals/{id}/vote",
    request_body = VoteRequest,
    params(("id" = u64, Path, description = "Proposal id")),
    responses(
        (status = 200, description = "Vote recorded", body = ApiResponse),
        (status = 401, description = "Wallet not connected", body = ApiResponse),
        (status = 403, description = "Transaction rejected in the wallet", body = ApiResponse),
        (status = 501, description = "Contract interface is degraded", body = ApiResponse),
        (status = 502, description = "Transaction failed", body = ApiResponse)
    )
)]
pub async fn vote_handler(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    payload: Result<Json<VoteRequest>, JsonRejection>,
) -> impl IntoResponse {
    let Json(request) = match payload {
        Ok(p) => p,
        Err(e) => return json_422(e, "{ choice: bool }").into_response(),
    };

    let mut app = state.app.lock().await;
    match app.vote(id, request.choice).await {
        Ok(()) => (
            StatusCode::OK,
            Json(ApiResponse::ok(json!({ "proposal_id": id, "choice": request.choice }))),
        )
            .into_response(),
        Err(e) => submit_failure(&e).into_response(),
    }
}

#[utoipa::path(
    post,
    path = "/proposals",
    request_body = CreateProposalRequest,
    responses(
        (status = 200, description = "Proposal created", body = ApiResponse),
        (status = 401, description = "Wallet not connected", body = ApiResponse),
        (status = 403, description = "Transaction rejected in the wallet", body = ApiResponse),
        (status = 501, description = "Contract interface is degraded", body = ApiResponse),
        (status = 502, description = "Transaction failed", body = ApiResponse)
    )
)]
pub async fn create_proposal_handler(
    State(state): State<AppState>,
    payload: Result<Json<CreateProposalRequest>, JsonRejection>,
) -> impl IntoResponse {
    let Json(request) = match payload {
        Ok(p) => p,
        Err(e) => {
            return json_422(e, "{ title: string, description: string, duration_seconds: u64 }")
                .into_response()
        }
    };

    let title = request.title.clone();
    let mut app = state.app.lock().await;
    match app
        .create_proposal(request.title, request.description, request.duration_seconds)
        .await
    {
        Ok(()) => (StatusCode::OK, Json(ApiResponse::ok(json!({ "title": title })))).into_response(),
        Err(e) => submit_failure(&e).into_response(),
    }
}

#[utoipa::path(
    post,
    path = "/issues",
    request_body = ReportIssueRequest,
    responses(
        (status = 200, description = "Issue reported", body = ApiResponse),
        (status = 401, description = "Wallet not connected", body = ApiResponse),
        (status = 403, description = "Transaction rejected in the wallet", body = ApiResponse),
        (status = 501, description = "Contract interface is degraded", body = ApiResponse),
        (status = 502, description = "Transaction failed", body = ApiResponse)
    )
)]
pub async fn report_issue_handler(
    State(state): State<AppState>,
    payload: Result<Json<ReportIssueRequest>, JsonRejection>,
) -> impl IntoResponse {
    let Json(request) = match payload {
        Ok(p) => p,
        Err(e) => {
            return json_422(e, "{ category: string, description: string, location: string }")
                .into_response()
        }
    };

    let category = request.category.clone();
    let mut app = state.app.lock().await;
    match app
        .report_issue(request.category, request.description, request.location)
        .await
    {
        Ok(()) => {
            (StatusCode::OK, Json(ApiResponse::ok(json!({ "category": category })))).into_response()
        }
        Err(e) => submit_failure(&e).into_response(),
    }
}
