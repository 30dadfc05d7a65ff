use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::domain::errors::DomainError;
use crate::domain::repositories::RepoError;
use crate::domain::voice::VoiceError;
use crate::services::ImportError;

/// API error type with HTTP status code and message
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    /// Creates a new API error
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    /// Creates a 400 Bad Request error
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    /// Creates a 401 Unauthorized error
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, message)
    }

    /// Creates a 403 Forbidden error
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, message)
    }

    /// Creates a 404 Not Found error
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    /// Creates a 409 Conflict error
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(StatusCode::CONFLICT, message)
    }

    /// Creates a 500 Internal Server Error
    pub fn internal_server_error(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(json!({
            "error": self.message
        }));

        (self.status, body).into_response()
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::Validation(_) => Self::bad_request(err.to_string()),
            DomainError::InvalidTransition { .. } => Self::conflict(err.to_string()),
        }
    }
}

impl From<RepoError> for ApiError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::NotFound(_) => Self::not_found(err.to_string()),
            RepoError::Conflict(_) => Self::conflict(err.to_string()),
            RepoError::Database(ref msg) => {
                tracing::error!(error = %msg, "Database error");
                Self::internal_server_error("Database error")
            }
        }
    }
}

impl From<VoiceError> for ApiError {
    fn from(err: VoiceError) -> Self {
        // provider bodies stay in the logs
        tracing::warn!(error = %err, "Voice provider error");
        let message = match &err {
            VoiceError::NotConfigured(_) => "Voice provider is not configured",
            _ => "Voice provider error",
        };
        if err.is_transient() {
            Self::internal_server_error(message)
        } else {
            Self::new(StatusCode::BAD_GATEWAY, message)
        }
    }
}

impl From<ImportError> for ApiError {
    fn from(err: ImportError) -> Self {
        Self::bad_request(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn domain_errors_map_to_client_errors() {
        let err = ApiError::from(DomainError::validation("Campaign name is required"));
        assert_eq!(err.status, StatusCode::BAD_REQUEST);

        let err = ApiError::from(DomainError::transition("completed", "active"));
        assert_eq!(err.status, StatusCode::CONFLICT);
    }

    #[test]
    fn repository_errors_hide_database_details() {
        let err = ApiError::from(RepoError::Database("password authentication failed".into()));
        assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.message, "Database error");

        assert_eq!(
            ApiError::from(RepoError::not_found("Campaign")).status,
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::from(RepoError::Conflict("dup".into())).status,
            StatusCode::CONFLICT
        );
    }

    #[test]
    fn permanent_voice_errors_are_bad_gateway() {
        let rejected = VoiceError::Api {
            status: 400,
            body: "bad assistant".into(),
        };
        assert_eq!(ApiError::from(rejected).status, StatusCode::BAD_GATEWAY);

        let outage = VoiceError::Api {
            status: 503,
            body: String::new(),
        };
        assert_eq!(ApiError::from(outage).status, StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn voice_error_body_is_not_returned() {
        let err = ApiError::from(VoiceError::Api {
            status: 401,
            body: r#"{"message":"Invalid key sk_live_123"}"#.into(),
        });
        assert_eq!(err.status, StatusCode::BAD_GATEWAY);
        assert_eq!(err.message, "Voice provider error");

        let err = ApiError::from(VoiceError::Request("connect to 10.0.0.7 refused".into()));
        assert_eq!(err.message, "Voice provider error");
    }

    #[test]
    fn missing_phone_column_is_bad_request() {
        let err = ApiError::from(ImportError::MissingPhoneColumn);
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
    }
}
