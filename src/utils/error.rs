use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use serde::Serialize;
use thiserror::Error;

use crate::database::StoreError;

/// Action hint telling the client to send the user to the profile form.
pub const ACTION_COMPLETE_PROFILE: &str = "complete-profile";
/// Action hint telling the client to open the plans page.
pub const ACTION_UPGRADE_SUBSCRIPTION: &str = "upgrade-subscription";

/// Request-level failure rendered as the JSON error envelope.
///
/// Every failure a handler can produce goes through this type so the client
/// only ever has to read `errorCode` (and `action`, when present).
#[derive(Debug, Error)]
pub enum AppError {
    #[error("{message}")]
    Api {
        status: StatusCode,
        code: &'static str,
        message: String,
        action: Option<&'static str>,
        details: Option<serde_json::Value>,
    },

    #[error("Database error: {0}")]
    Store(#[from] StoreError),

    #[error("Internal error: {0}")]
    Internal(String),
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ErrorEnvelope<'a> {
    success: bool,
    message: String,
    error_code: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    action: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<&'a serde_json::Value>,
    timestamp: String,
}

impl AppError {
    pub fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        AppError::Api {
            status,
            code,
            message: message.into(),
            action: None,
            details: None,
        }
    }

    pub fn bad_request(code: &'static str, message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, code, message)
    }

    pub fn unauthorized(code: &'static str, message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, code, message)
    }

    pub fn forbidden(code: &'static str, message: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, code, message)
    }

    pub fn not_found(code: &'static str, message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, code, message)
    }

    pub fn conflict(code: &'static str, message: impl Into<String>) -> Self {
        Self::new(StatusCode::CONFLICT, code, message)
    }

    pub fn gone(code: &'static str, message: impl Into<String>) -> Self {
        Self::new(StatusCode::GONE, code, message)
    }

    pub fn unprocessable(code: &'static str, message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNPROCESSABLE_ENTITY, code, message)
    }

    /// Attach a client action hint (`complete-profile`, ...).
    pub fn with_action(mut self, hint: &'static str) -> Self {
        if let AppError::Api { action, .. } = &mut self {
            *action = Some(hint);
        }
        self
    }

    pub fn with_details(mut self, value: serde_json::Value) -> Self {
        if let AppError::Api { details, .. } = &mut self {
            *details = Some(value);
        }
        self
    }

    /// Machine-readable code sent as `errorCode`.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Api { code, .. } => code,
            AppError::Store(StoreError::Duplicate(_)) => "DUPLICATE_ENTRY",
            AppError::Store(StoreError::Validation(_)) => "VALIDATION_ERROR",
            AppError::Store(StoreError::InvalidId(_)) => "INVALID_ID",
            AppError::Store(StoreError::Unavailable(_)) => "DATABASE_ERROR",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    pub fn action(&self) -> Option<&'static str> {
        match self {
            AppError::Api { action, .. } => *action,
            _ => None,
        }
    }

    fn public_message(&self) -> String {
        match self {
            AppError::Api { message, .. } => message.clone(),
            AppError::Store(StoreError::Duplicate(_)) => "Resource already exists".to_string(),
            AppError::Store(StoreError::Validation(msg)) => format!("Validation failed: {}", msg),
            AppError::Store(StoreError::InvalidId(msg)) => format!("Invalid identifier: {}", msg),
            AppError::Store(StoreError::Unavailable(_)) => "A database error occurred".to_string(),
            AppError::Internal(_) => "An internal server error occurred".to_string(),
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Api { status, .. } => *status,
            AppError::Store(StoreError::Duplicate(_)) => StatusCode::CONFLICT,
            AppError::Store(StoreError::Validation(_)) | AppError::Store(StoreError::InvalidId(_)) => {
                StatusCode::BAD_REQUEST
            }
            AppError::Store(StoreError::Unavailable(_)) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        if status.is_server_error() {
            log::error!("💥 {} - {}", self.code(), self);
        }

        let details = match self {
            AppError::Api { details, .. } => details.as_ref(),
            _ => None,
        };

        HttpResponse::build(status).json(ErrorEnvelope {
            success: false,
            message: self.public_message(),
            error_code: self.code(),
            action: self.action(),
            details,
            timestamp: chrono::Utc::now().to_rfc3339(),
        })
    }
}
