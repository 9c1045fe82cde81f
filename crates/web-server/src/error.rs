use analytics::AnalyticsError;
use analyzer::error::AnalyzerError;
use api_client::ApiError;
use axum::{
    extract::rejection::QueryRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    Unauthorized(String),
    #[error(transparent)]
    Analyzer(#[from] AnalyzerError),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Analyzer(err) => analyzer_status(err),
        }
    }
}

// Malformed query strings get the same envelope as every other failure.
impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl From<axum_extra::extract::QueryRejection> for AppError {
    fn from(rejection: axum_extra::extract::QueryRejection) -> Self {
        AppError::BadRequest(rejection.to_string())
    }
}

/// Caller mistakes are 400, missing or rejected auth is 401, and anything
/// that points at the remote service or at broken data is 500.
fn analyzer_status(err: &AnalyzerError) -> StatusCode {
    match err {
        AnalyzerError::InvalidArgument(_) => StatusCode::BAD_REQUEST,
        AnalyzerError::Analytics(AnalyticsError::LengthMismatch { .. })
        | AnalyzerError::Analytics(AnalyticsError::EmptyInput) => StatusCode::BAD_REQUEST,
        AnalyzerError::Analytics(AnalyticsError::InvalidData(_)) => StatusCode::INTERNAL_SERVER_ERROR,
        AnalyzerError::Api(api) => match api {
            ApiError::Validation(_) | ApiError::InvalidArgument(_) => StatusCode::BAD_REQUEST,
            ApiError::MissingCredentials
            | ApiError::Unauthenticated
            | ApiError::InvalidCredentials
            | ApiError::TokenExpired
            | ApiError::Authentication(_) => StatusCode::UNAUTHORIZED,
            ApiError::Registration(_)
            | ApiError::InvalidResponse(_)
            | ApiError::Remote { .. }
            | ApiError::Transport(_) => StatusCode::INTERNAL_SERVER_ERROR,
        },
    }
}

/// Converts our custom `AppError` into the `{success: false, error}` envelope.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = ?self, "Request failed.");
        } else {
            tracing::debug!(error = %self, %status, "Request rejected.");
        }

        let body = Json(json!({ "success": false, "error": self.to_string() }));
        (status, body).into_response()
    }
}
