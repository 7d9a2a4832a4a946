use crate::domain::error::{ConnectError, ErrorCode, RegistrationError, SubmitError};
use crate::transport::http::types::ApiResponse;
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;
use serde_json::Value as JsonValue;

pub type HandlerError = (StatusCode, Json<ApiResponse>);

pub fn to_data<T: Serialize>(value: &T) -> JsonValue {
    serde_json::to_value(value).unwrap_or(JsonValue::Null)
}

pub fn connect_failure(err: &ConnectError) -> HandlerError {
    let status = match err {
        ConnectError::ProviderUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        ConnectError::UserDeclined
        | ConnectError::Registration(RegistrationError::Declined)
        | ConnectError::Registration(RegistrationError::Rejected) => StatusCode::FORBIDDEN,
        ConnectError::Registration(RegistrationError::Failed(_)) => StatusCode::BAD_GATEWAY,
    };
    (status, Json(ApiResponse::failure(err.code(), err.to_string())))
}

pub fn submit_failure(err: &SubmitError) -> HandlerError {
    let status = match err {
        SubmitError::NotConnected => StatusCode::UNAUTHORIZED,
        SubmitError::Unsupported(_) => StatusCode::NOT_IMPLEMENTED,
        SubmitError::Rejected => StatusCode::FORBIDDEN,
        SubmitError::SubmissionFailed(_) => StatusCode::BAD_GATEWAY,
    };
    (status, Json(ApiResponse::failure(err.code(), err.to_string())))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn submit_errors_map_to_distinct_statuses() {
        assert_eq!(submit_failure(&SubmitError::NotConnected).0, StatusCode::UNAUTHORIZED);
        assert_eq!(submit_failure(&SubmitError::Rejected).0, StatusCode::FORBIDDEN);
        assert_eq!(submit_failure(&SubmitError::Unsupported("vote")).0, StatusCode::NOT_IMPLEMENTED);
        let (status, Json(body)) = submit_failure(&SubmitError::SubmissionFailed("revert".into()));
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body.code.as_deref(), Some("SUBMISSION_FAILED"));
    }

    #[test]
    fn registration_rejections_are_forbidden() {
        let declined = ConnectError::Registration(RegistrationError::Declined);
        assert_eq!(connect_failure(&declined).0, StatusCode::FORBIDDEN);
        assert_eq!(connect_failure(&ConnectError::UserDeclined).0, StatusCode::FORBIDDEN);
        let unavailable = ConnectError::ProviderUnavailable("none".into());
        assert_eq!(connect_failure(&unavailable).0, StatusCode::SERVICE_UNAVAILABLE);
    }
}
