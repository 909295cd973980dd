use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::aggregate::MergeError;
use crate::recommender::RecommendError;
use crate::segment::SegmentError;
use crate::spotify::UpstreamError;

/// Application error type.
///
/// Every variant renders as an empty JSON list paired with the status the
/// client should see, so callers always get a well-formed body.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("no access token could be obtained")]
    Unauthorized,
    #[error("upstream returned status {0}")]
    Upstream(u16),
    #[error("upstream request failed: {0}")]
    Transport(String),
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("invariant violated: {0}")]
    Invariant(String),
    #[error("{0}")]
    Internal(String),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::Upstream(code) => {
                StatusCode::from_u16(*code).unwrap_or(StatusCode::BAD_GATEWAY)
            }
            AppError::Transport(_) => StatusCode::BAD_GATEWAY,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Invariant(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<UpstreamError> for AppError {
    fn from(err: UpstreamError) -> Self {
        match err {
            UpstreamError::Status(code) => AppError::Upstream(code),
            UpstreamError::Transport(msg) => AppError::Transport(msg),
        }
    }
}

impl From<SegmentError> for AppError {
    fn from(err: SegmentError) -> Self {
        AppError::BadRequest(err.to_string())
    }
}

impl From<RecommendError> for AppError {
    fn from(err: RecommendError) -> Self {
        AppError::BadRequest(err.to_string())
    }
}

impl From<MergeError> for AppError {
    fn from(err: MergeError) -> Self {
        AppError::Invariant(err.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        tracing::warn!(status = status.as_u16(), error = %self, "request failed");
        (status, Json(json!([]))).into_response()
    }
}
