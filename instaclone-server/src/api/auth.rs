use axum::{
    extract::State,
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    Json,
};
use uuid::Uuid;

use instaclone_types::{
    ChangePasswordRequest, LoginRequest, LoginResponse, MessageResponse, RefreshRequest,
    RefreshResponse, RegisterRequest, UserDetail,
};

use super::{ApiError, ApiJson, ApiResult};
use crate::accounts::AccountService;
use crate::session::TokenRejection;
use crate::state::AppState;

/// Token from an `Authorization: Bearer <token>` header
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

fn resolve(state: &AppState, token: &str) -> ApiResult<Uuid> {
    match state.authenticated_user(token)? {
        Ok(user_id) => Ok(user_id),
        Err(TokenRejection::Expired) => Err(ApiError::Unauthorized(
            "Token is expired".to_string(),
        )),
        Err(TokenRejection::Unknown) => Err(ApiError::Unauthorized(
            "Given token not valid for any token type".to_string(),
        )),
    }
}

/// Authenticated user for endpoints that require one
pub fn require_user(state: &AppState, headers: &HeaderMap) -> ApiResult<Uuid> {
    let token = bearer_token(headers).ok_or_else(|| {
        ApiError::Unauthorized("Authentication credentials were not provided.".to_string())
    })?;
    resolve(state, token)
}

/// Viewer for public endpoints; no header means anonymous, a bad token is still rejected
pub fn optional_user(state: &AppState, headers: &HeaderMap) -> ApiResult<Option<Uuid>> {
    bearer_token(headers)
        .map(|token| resolve(state, token))
        .transpose()
}

fn accounts(state: &AppState) -> AccountService {
    AccountService::new(state.db.pool.clone(), state.session_manager.clone())
}

/// POST /api/users/register/
pub async fn register(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<UserDetail>)> {
    let detail = accounts(&state).register(&payload)?;
    tracing::info!("Registered user {}", detail.username);
    Ok((StatusCode::CREATED, Json(state.media.user_detail(detail))))
}

/// POST /api/users/login/
pub async fn login(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<LoginRequest>,
) -> ApiResult<Json<LoginResponse>> {
    let mut response = accounts(&state).login(&payload)?;
    response.user = state.media.user_detail(response.user);
    Ok(Json(response))
}

/// POST /api/users/token/refresh/
pub async fn refresh(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<RefreshRequest>,
) -> ApiResult<Json<RefreshResponse>> {
    let access = accounts(&state).refresh(&payload.refresh)?;
    Ok(Json(RefreshResponse { access }))
}

/// POST /api/users/logout/
pub async fn logout(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<Json<MessageResponse>> {
    require_user(&state, &headers)?;
    let token = bearer_token(&headers).unwrap_or_default();
    accounts(&state).logout(token)?;

    Ok(Json(MessageResponse {
        message: "Logged out successfully".to_string(),
    }))
}

/// POST /api/users/profiles/change_password/
pub async fn change_password(
    State(state): State<AppState>,
    headers: HeaderMap,
    ApiJson(payload): ApiJson<ChangePasswordRequest>,
) -> ApiResult<Json<MessageResponse>> {
    let user_id = require_user(&state, &headers)?;
    let token = bearer_token(&headers).unwrap_or_default();
    accounts(&state).change_password(&user_id, token, &payload)?;

    Ok(Json(MessageResponse {
        message: "Password changed successfully".to_string(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_bearer_token_parsing() {
        let mut headers = HeaderMap::new();
        assert_eq!(bearer_token(&headers), None);

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer abc-123"));
        assert_eq!(bearer_token(&headers), Some("abc-123"));

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Basic abc"));
        assert_eq!(bearer_token(&headers), None);

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer "));
        assert_eq!(bearer_token(&headers), None);
    }
}
