//! JSON envelopes shared by every endpoint.

use crate::auth::{AuthError, Session};
use crate::models::GenerationResult;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::error;

/// Error rendered as `{ "success": false, "error": "..." }`.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    success: bool,
    error: &'a str,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            success: false,
            error: &self.message,
        };
        (self.status, Json(body)).into_response()
    }
}

impl From<crate::Error> for ApiError {
    fn from(err: crate::Error) -> Self {
        error!("Request failed: {}", err);
        Self::internal("Failed to process the request. Please try again.")
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        let status = match &err {
            AuthError::MissingRegistrationFields
            | AuthError::MissingCredentials
            | AuthError::WeakPassword
            | AuthError::InvalidPhone
            | AuthError::EmailTaken => StatusCode::BAD_REQUEST,
            AuthError::InvalidCredentials | AuthError::MissingToken | AuthError::InvalidToken => {
                StatusCode::UNAUTHORIZED
            }
            AuthError::UserNotFound => StatusCode::NOT_FOUND,
            AuthError::Store(inner) => {
                error!("User store failure: {}", inner);
                return Self::internal("Failed to access user data. Please try again.");
            }
        };
        Self::new(status, err.to_string())
    }
}

/// Body of a `/api/generate-look` response. Always carries an image.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateLookResponse {
    pub success: bool,
    pub mime_type: String,
    pub image_base64: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_mock: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<&'static str>,
}

impl From<GenerationResult> for GenerateLookResponse {
    fn from(result: GenerationResult) -> Self {
        let reason = result.fallback_reason();
        Self {
            success: true,
            mime_type: result.mime_type().to_string(),
            image_base64: result.image_data().to_string(),
            is_mock: reason.map(|_| true),
            error_code: reason.and_then(|r| r.error_code()),
        }
    }
}

/// `{ "success": true, "token": ..., "user": {...} }`
#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub success: bool,
    #[serde(flatten)]
    pub session: Session,
}

impl From<Session> for SessionResponse {
    fn from(session: Session) -> Self {
        Self {
            success: true,
            session,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct UserResponse<T: Serialize> {
    pub success: bool,
    pub user: T,
}
