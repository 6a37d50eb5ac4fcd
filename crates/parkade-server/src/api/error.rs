//! API error types and response handling.
//!
//! Every handler returns [`ApiResult`], and every failure leaves the server
//! as a JSON [`ErrorResponse`] with a matching status code.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use parkade_core::ParkingError;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Result type alias for API handlers.
pub type ApiResult<T> = Result<T, ApiError>;

/// Unified API error type.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ApiError {
    /// 400 Bad Request - Invalid input from client.
    #[error("Bad Request: {message}")]
    BadRequest {
        /// Machine-readable error code.
        error_code: String,
        /// Human-readable error message.
        message: String,
    },

    /// 404 Not Found - Spot or session does not exist.
    #[error("Not Found: {message}")]
    NotFound {
        /// Machine-readable error code.
        error_code: String,
        /// Human-readable error message.
        message: String,
    },

    /// 409 Conflict - The lot's current state rules the operation out.
    #[error("Conflict: {message}")]
    Conflict {
        /// Machine-readable error code.
        error_code: String,
        /// Human-readable error message.
        message: String,
        /// Optional structured context, e.g. the spot or vehicle involved.
        details: Option<serde_json::Value>,
    },

    /// 422 Unprocessable Entity - Well-formed input that cannot be billed.
    #[error("Unprocessable: {message}")]
    Unprocessable {
        /// Machine-readable error code.
        error_code: String,
        /// Human-readable error message.
        message: String,
    },

    /// 500 Internal Server Error - Unexpected server-side error.
    #[error("Internal Error: {message}")]
    InternalError {
        /// Machine-readable error code.
        error_code: String,
        /// Human-readable error message.
        message: String,
    },
}

/// Standard JSON error response body.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({
    "error": "LOT_FULL",
    "message": "No available spot fits vehicle KA-1234 (size standard)",
    "details": null
}))]
pub struct ErrorResponse {
    /// Machine-readable error code (e.g., "LOT_FULL").
    #[schema(example = "LOT_FULL")]
    pub error: String,

    /// Human-readable error message.
    #[schema(example = "No available spot fits vehicle KA-1234 (size standard)")]
    pub message: String,

    /// Optional additional details.
    #[schema(nullable)]
    pub details: Option<serde_json::Value>,
}

impl ApiError {
    /// Shorthand for a 400 with the given code.
    pub fn bad_request(error_code: &str, message: impl Into<String>) -> Self {
        Self::BadRequest {
            error_code: error_code.to_string(),
            message: message.into(),
        }
    }

    /// HTTP status this error is returned with.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest { .. } => StatusCode::BAD_REQUEST,
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::Conflict { .. } => StatusCode::CONFLICT,
            Self::Unprocessable { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            Self::InternalError { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match self {
            Self::BadRequest {
                error_code,
                message,
            }
            | Self::NotFound {
                error_code,
                message,
            }
            | Self::Unprocessable {
                error_code,
                message,
            } => ErrorResponse {
                error: error_code,
                message,
                details: None,
            },

            Self::Conflict {
                error_code,
                message,
                details,
            } => ErrorResponse {
                error: error_code,
                message,
                details,
            },

            Self::InternalError {
                error_code,
                message,
            } => {
                tracing::error!(error_code = %error_code, message = %message, "Internal server error");
                ErrorResponse {
                    error: error_code,
                    message,
                    details: None,
                }
            }
        };

        (status, Json(body)).into_response()
    }
}

/// Map engine errors onto HTTP statuses.
impl From<ParkingError> for ApiError {
    fn from(err: ParkingError) -> Self {
        let error_code = err.error_code().to_string();
        let message = err.to_string();

        match &err {
            ParkingError::LotFull { vehicle, size } => Self::Conflict {
                error_code,
                message,
                details: Some(serde_json::json!({
                    "vehicle_id": vehicle,
                    "size_class": size,
                })),
            },
            ParkingError::DuplicateSession(vehicle) => Self::Conflict {
                error_code,
                message,
                details: Some(serde_json::json!({ "vehicle_id": vehicle })),
            },
            ParkingError::DuplicateSpot(spot)
            | ParkingError::SpotOccupied(spot)
            | ParkingError::SpotUnavailable(spot)
            | ParkingError::SpotNotOccupied(spot) => Self::Conflict {
                error_code,
                message,
                details: Some(serde_json::json!({ "spot_id": spot })),
            },
            _ => match err.http_status_code() {
                400 => Self::BadRequest {
                    error_code,
                    message,
                },
                404 => Self::NotFound {
                    error_code,
                    message,
                },
                422 => Self::Unprocessable {
                    error_code,
                    message,
                },
                _ => Self::InternalError {
                    error_code,
                    message,
                },
            },
        }
    }
}
