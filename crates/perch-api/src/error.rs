use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use perch_presence::PresenceError;
use perch_types::api::ErrorResponse;
use tracing::error;

/// Transport mapping for engine failures.
pub struct ApiError(pub PresenceError);

impl From<PresenceError> for ApiError {
    fn from(err: PresenceError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            PresenceError::Validation(_) => StatusCode::BAD_REQUEST,
            PresenceError::NotFound(_) => StatusCode::NOT_FOUND,
            PresenceError::Unauthenticated => StatusCode::UNAUTHORIZED,
            PresenceError::Provider(_) => StatusCode::BAD_GATEWAY,
            PresenceError::Persistence(_) | PresenceError::Decryption { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        // Storage details stay in the log
        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            error!("Request failed: {:#}", self.0);
            "internal error".to_string()
        } else {
            self.0.to_string()
        };

        (status, Json(ErrorResponse { error: message })).into_response()
    }
}
