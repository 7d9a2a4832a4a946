use crate::transport::http::handlers::{actions, feed, health, session};
use crate::transport::http::types::{
    ApiResponse, ConnectRequest, CreateProposalRequest, ReportIssueRequest, VoteRequest,
};
use axum::routing::{get, post};
use axum::Router;
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(
        health::healthcheck_handler,
        session::get_session_handler,
        session::init_session_handler,
        session::connect_handler,
        actions::vote_handler,
        actions::create_proposal_handler,
        actions::report_issue_handler,
        feed::notifications_handler,
        feed::refresh_handler
    ),
    components(schemas(
        ApiResponse,
        ConnectRequest,
        VoteRequest,
        CreateProposalRequest,
        ReportIssueRequest
    ))
)]
#[allow(dead_code)]
pub struct ApiDoc;

pub fn create_router(app_state: crate::transport::http::types::AppState) -> Router {
    Router::new()
        .route("/health", get(health::healthcheck_handler))
        .route("/session", get(session::get_session_handler))
        .route("/session/init", post(session::init_session_handler))
        .route("/session/connect", post(session::connect_handler))
        .route("/proposals", post(actions::create_proposal_handler))
        .route("/proposals/:id/vote", post(actions::vote_handler))
        .route("/issues", post(actions::report_issue_handler))
        .route("/notifications", get(feed::notifications_handler))
        .route("/refresh", get(feed::refresh_handler))
        .with_state(app_state)
}
