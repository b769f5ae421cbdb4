use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use instaclone_types::{ErrorResponse, FieldErrors};

use crate::error::DomainError;

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug)]
pub enum ApiError {
    Validation(FieldErrors),
    NotFound(String),
    BadRequest(String),
    Unauthorized(String),
    Forbidden(String),
    InternalError(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message, details, fields) = match self {
            ApiError::Validation(fields) => {
                // first message doubles as the summary
                let first = fields.values().flatten().next().cloned();
                (StatusCode::BAD_REQUEST, "Bad Request", first, Some(fields))
            }
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "Not Found", Some(msg), None),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "Bad Request", Some(msg), None),
            ApiError::Unauthorized(msg) => {
                (StatusCode::UNAUTHORIZED, "Unauthorized", Some(msg), None)
            }
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, "Forbidden", Some(msg), None),
            ApiError::InternalError(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal Server Error",
                    Some("An unexpected error occurred".to_string()),
                    None,
                )
            }
        };

        let error_response = ErrorResponse {
            error: message.to_string(),
            details,
            fields,
        };

        (status, Json(error_response)).into_response()
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::Validation(fields) => ApiError::Validation(fields),
            DomainError::NotFound(msg) => ApiError::NotFound(msg),
            DomainError::Conflict(msg) => ApiError::BadRequest(msg),
            DomainError::Forbidden(msg) => ApiError::Forbidden(msg),
            DomainError::Unauthorized(msg) => ApiError::Unauthorized(msg),
            DomainError::Store(e) => ApiError::InternalError(format!("{:#}", e)),
        }
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        ApiError::InternalError(format!("{:#}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_validation_maps_to_400_with_fields() {
        let err: ApiError = DomainError::field("content", "Comment cannot be empty").into();
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let json = body_json(response).await;
        assert_eq!(json["details"], "Comment cannot be empty");
        assert_eq!(json["fields"]["content"][0], "Comment cannot be empty");
    }

    #[tokio::test]
    async fn test_conflict_is_bad_request() {
        let err: ApiError = DomainError::Conflict("You are already following bob".into()).into();
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(body_json(response).await.get("fields").is_none());
    }

    #[tokio::test]
    async fn test_store_errors_are_hidden() {
        let err: ApiError = DomainError::Store(anyhow::anyhow!("disk I/O error")).into();
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_json(response).await["details"], "An unexpected error occurred");
    }
}
