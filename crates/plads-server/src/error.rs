use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

/// Error kinds for all API operations. Each kind carries enough context
/// for the boundary to pick a status code; the client-facing message is
/// always generic, never internal driver/provider text.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Invalid inputs provided, please check your data.")]
    InvalidInput,
    #[error("Unsupported image type, only png/jpg/jpeg are accepted.")]
    UnsupportedImageType,
    #[error("User already exists, please login instead.")]
    DuplicateEmail,
    #[error("Could not find location for the provided address.")]
    LocationNotFound,
    #[error("Invalid credentials, could not log in.")]
    InvalidCredentials,
    #[error("Authentication failed.")]
    AuthenticationFailed,
    #[error("You do not have permission to modify this place.")]
    Forbidden,
    #[error("{0}")]
    NotFound(String),
    #[error("Something went wrong, please try again.")]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidInput
            | Self::UnsupportedImageType
            | Self::DuplicateEmail
            | Self::LocationNotFound => StatusCode::UNPROCESSABLE_ENTITY,
            Self::InvalidCredentials | Self::AuthenticationFailed => StatusCode::FORBIDDEN,
            Self::Forbidden => StatusCode::UNAUTHORIZED,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let Self::Internal(ref e) = self {
            tracing::error!("Internal error: {:#}", e);
        }
        let status = self.status_code();
        (status, Json(json!({ "message": self.to_string() }))).into_response()
    }
}
