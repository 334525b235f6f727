use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use raspadinha_core::GameError;
use raspadinha_shared::ApiError;
use tracing::error;

/// `ApiError` rendered as `{"error": ...}` with its status code.
#[derive(Debug)]
pub struct AppError(pub ApiError);

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.0.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self.0.body())).into_response()
    }
}

impl From<ApiError> for AppError {
    fn from(e: ApiError) -> Self {
        AppError(e)
    }
}

impl From<GameError> for AppError {
    fn from(e: GameError) -> Self {
        if let GameError::Persistence(inner) = &e {
            error!(error = %inner, "failed to persist game state");
        }
        AppError(e.into())
    }
}

impl From<reqwest::Error> for AppError {
    fn from(e: reqwest::Error) -> Self {
        error!(error = %e, "pix provider request failed");
        AppError(ApiError::Upstream {
            status: 500,
            message: e.to_string(),
            body: None,
        })
    }
}

pub type AppResult<T> = Result<T, AppError>;
