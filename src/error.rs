use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::error;

use crate::inventory::ServingError;

/// Error returned by every HTTP handler.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("Not enough permissions")]
    Forbidden,

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }

    pub fn unauthorized(msg: impl Into<String>) -> Self {
        Self::Unauthorized(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Constraint class of a failed write, looked up through any `anyhow` context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DbViolation {
    Unique,
    ForeignKey,
}

pub fn db_violation(e: &anyhow::Error) -> Option<DbViolation> {
    let db = e.downcast_ref::<sqlx::Error>()?.as_database_error()?;
    match db.code().as_deref() {
        Some("23505") => Some(DbViolation::Unique),
        Some("23503") => Some(DbViolation::ForeignKey),
        _ => None,
    }
}

impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        AppError::Internal(e.into())
    }
}

impl From<ServingError> for AppError {
    fn from(e: ServingError) -> Self {
        match e {
            ServingError::NotFound(msg) => AppError::NotFound(msg),
            ServingError::InvalidArgument(msg) => AppError::BadRequest(msg),
            ServingError::Store(e) => AppError::Internal(e),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let detail = match &self {
            AppError::Internal(e) => {
                error!(error = ?e, "internal error");
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };
        (status, Json(json!({ "detail": detail }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serving_errors_map_to_http_statuses() {
        let not_found: AppError = ServingError::NotFound("Meal or user not found".into()).into();
        assert_eq!(not_found.status(), StatusCode::NOT_FOUND);

        let invalid: AppError = ServingError::InvalidArgument("portions must be positive".into()).into();
        assert_eq!(invalid.status(), StatusCode::BAD_REQUEST);

        let store: AppError = ServingError::Store(anyhow::anyhow!("connection reset")).into();
        assert_eq!(store.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn internal_details_are_not_leaked() {
        let resp = AppError::Internal(anyhow::anyhow!("password=hunter2")).into_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let text = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(!text.contains("hunter2"));
        let body: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(body["detail"], "Internal server error");
    }
}
