use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use relay::{PatchError, RelayError};
use serde::Serialize;

#[derive(thiserror::Error, Debug)]
pub enum ApiError {
    #[error("bad input: {0}")]
    BadInput(String),
    #[error(transparent)]
    Patch(#[from] PatchError),
    #[error(transparent)]
    Relay(#[from] RelayError),
}

#[derive(Serialize)]
struct ErrorResponse {
    ok: bool,
    error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::BadInput(_) | ApiError::Patch(_) => StatusCode::BAD_REQUEST,
            ApiError::Relay(RelayError::ConfigurationMissing) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Relay(RelayError::RecordNotFound { .. }) => StatusCode::NOT_FOUND,
            ApiError::Relay(_) => StatusCode::BAD_GATEWAY,
        };

        tracing::error!(%status, "request failed: {self}");
        let body = Json(ErrorResponse {
            ok: false,
            error: self.to_string(),
        });
        (status, body).into_response()
    }
}
