use crate::app::{CivicApp, NotificationBoard, RefreshTracker, SessionSnapshot};
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::sync::Arc;
use tokio::sync::{watch, Mutex};
use utoipa::ToSchema;

#[derive(Clone)]
pub struct AppState {
    /// Flows are serialized through this lock; the event pump shares it.
    pub app: Arc<Mutex<CivicApp>>,
    /// Last published session state; read without waiting for a running flow.
    pub snapshot: watch::Receiver<SessionSnapshot>,
    pub board: Arc<NotificationBoard>,
    pub refresh: Arc<RefreshTracker>,
}

#[derive(Serialize, Deserialize, Debug, ToSchema)]
pub struct ApiResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Object)]
    pub data: Option<JsonValue>,
    /// Machine-readable error code, e.g. `NOT_CONNECTED`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ApiResponse {
    pub fn ok(data: JsonValue) -> Self {
        Self {
            success: true,
            data: Some(data),
            code: None,
            error: None,
        }
    }

    pub fn failure(code: &str, error: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            code: Some(code.to_string()),
            error: Some(error.into()),
        }
    }
}

#[derive(Deserialize, Debug, Default, ToSchema)]
pub struct ConnectRequest {
    /// Answer to the registration confirmation, used only if the citizen is not registered yet.
    #[serde(default)]
    pub approve_registration: bool,
}

#[derive(Deserialize, Debug, ToSchema)]
pub struct VoteRequest {
    /// `true` votes in favour.
    pub choice: bool,
}

#[derive(Deserialize, Debug, ToSchema)]
pub struct CreateProposalRequest {
    pub title: String,
    pub description: String,
    /// Voting period in seconds.
    pub duration_seconds: u64,
}

#[derive(Deserialize, Debug, ToSchema)]
pub struct ReportIssueRequest {
    pub category: String,
    pub description: String,
    pub location: String,
}

pub fn json_422(err: JsonRejection, expected: &str) -> (StatusCode, Json<ApiResponse>) {
    (
        StatusCode::UNPROCESSABLE_ENTITY,
        Json(ApiResponse::failure(
            "INVALID_REQUEST",
            format!("Invalid JSON body: {} (expected: {})", err, expected),
        )),
    )
}
