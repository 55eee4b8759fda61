//! # API Errors
//!
//! The only place an error becomes an HTTP status.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  ErrorKind            Status   errorType                                │
//! │  ─────────────────    ──────   ──────────────────────────────────────   │
//! │  Validation           400      VALIDATION_ERROR                         │
//! │  BusinessLogic        400      BUSINESS_LOGIC_ERROR                     │
//! │  NotFound             404      PRODUCT_NOT_FOUND / LOCATION_NOT_FOUND   │
//! │  ConnectionFailed     503      CONNECTION_FAILED                        │
//! │  AuthFailed           503      AUTH_FAILED                              │
//! │  Unavailable          503      DATABASE_UNAVAILABLE                     │
//! │  Internal             500      INTERNAL_ERROR                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::Utc;
use serde::Serialize;
use tracing::{error, warn};
use ts_rs::TS;
use uuid::Uuid;

use garage_core::{CoreError, ErrorKind};

/// A failed request, tagged with the id it was logged under.
#[derive(Debug, thiserror::Error)]
#[error("{error}")]
pub struct ApiError {
    pub request_id: Uuid,
    #[source]
    pub error: CoreError,
}

impl ApiError {
    pub fn new(request_id: Uuid, error: impl Into<CoreError>) -> Self {
        ApiError {
            request_id,
            error: error.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        status_for(self.error.kind())
    }

    /// Builds the JSON envelope without logging.
    pub fn body(&self) -> ErrorBody {
        let validation_errors: Vec<FieldError> = self
            .error
            .validation_errors()
            .iter()
            .map(|e| FieldError {
                field: e.field().to_string(),
                message: e.to_string(),
            })
            .collect();

        ErrorBody {
            success: false,
            error: self.error.to_string(),
            details: ErrorDetails {
                request_id: self.request_id,
                error_type: self.error.error_type().to_string(),
                suggestion: self.error.suggestion().to_string(),
                validation_errors: (!validation_errors.is_empty()).then_some(validation_errors),
                timestamp: Utc::now().to_rfc3339(),
            },
        }
    }
}

/// HTTP status for an error category.
pub fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::Validation | ErrorKind::BusinessLogic => StatusCode::BAD_REQUEST,
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::ConnectionFailed | ErrorKind::AuthFailed | ErrorKind::Unavailable => {
            StatusCode::SERVICE_UNAVAILABLE
        }
        ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let kind = self.error.kind();
        let error_type = self.error.error_type();

        match kind {
            ErrorKind::Validation | ErrorKind::BusinessLogic | ErrorKind::NotFound => warn!(
                request_id = %self.request_id,
                error_type,
                error = %self.error,
                "Checkout rejected"
            ),
            _ => error!(
                request_id = %self.request_id,
                error_type,
                retryable = kind.is_retryable(),
                error = ?self.error,
                "Checkout failed"
            ),
        }

        (status, Json(self.body())).into_response()
    }
}

// =============================================================================
// Envelope
// =============================================================================

#[derive(Debug, Serialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    pub success: bool,
    pub error: String,
    pub details: ErrorDetails,
}

#[derive(Debug, Serialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ErrorDetails {
    pub request_id: Uuid,
    pub error_type: String,
    pub suggestion: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub validation_errors: Option<Vec<FieldError>>,
    pub timestamp: String,
}

/// One field-level validation problem.
#[derive(Debug, Serialize, TS)]
#[ts(export)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}
