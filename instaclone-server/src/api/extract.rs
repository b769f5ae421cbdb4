//! JSON body extraction that reports bad bodies through [`ApiError`].
//!
//! A missing required field becomes a field error, anything else the body
//! parser rejects becomes a plain 400.

use axum::{
    async_trait,
    extract::{rejection::JsonRejection, FromRequest, Request},
    Json,
};
use once_cell::sync::Lazy;
use regex::Regex;

use super::ApiError;
use crate::error::DomainError;

pub const REQUIRED_FIELD: &str = "This field is required.";

static MISSING_FIELD_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"missing field `([^`]+)`").expect("missing field pattern is valid"));

/// Drop-in replacement for `Json<T>` in handler arguments
#[derive(Debug)]
pub struct ApiJson<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for ApiJson<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(rejection) => Err(rejection.into()),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        let text = rejection.body_text();
        tracing::debug!("Rejected JSON body: {}", text);

        if let JsonRejection::JsonDataError(_) = rejection {
            if let Some(field) = MISSING_FIELD_RE.captures(&text).and_then(|c| c.get(1)) {
                return DomainError::field(field.as_str(), REQUIRED_FIELD).into();
            }
        }
        ApiError::BadRequest(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use instaclone_types::CreateCommentRequest;

    async fn extract(content_type: &str, body: &'static str) -> Result<CreateCommentRequest, ApiError> {
        let req = axum::http::Request::builder()
            .method("POST")
            .header("content-type", content_type)
            .body(Body::from(body))
            .unwrap();
        ApiJson::<CreateCommentRequest>::from_request(req, &())
            .await
            .map(|ApiJson(v)| v)
    }

    #[tokio::test]
    async fn test_missing_field_is_a_field_error() {
        match extract("application/json", "{}").await {
            Err(ApiError::Validation(fields)) => {
                assert_eq!(fields["content"], vec![REQUIRED_FIELD.to_string()]);
            }
            other => panic!("unexpected {:?}", other.map(|c| c.content)),
        }
    }

    #[tokio::test]
    async fn test_syntax_and_content_type_errors_are_bad_requests() {
        assert!(matches!(
            extract("application/json", "{\"content\":").await,
            Err(ApiError::BadRequest(_))
        ));
        assert!(matches!(
            extract("text/plain", "{\"content\":\"hi\"}").await,
            Err(ApiError::BadRequest(_))
        ));
    }

    #[tokio::test]
    async fn test_valid_body_passes_through() {
        let req = extract("application/json", "{\"content\":\"hi\"}").await.unwrap();
        assert_eq!(req.content, "hi");
    }
}
