//! Follow endpoints. Everything here is the explicit form, which reports
//! "already following" / "not following" as errors, except
//! [`toggle_follow`].

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode, Uri},
    Json,
};

use instaclone_types::{
    Follow, FollowCreatedResponse, FollowRequest, FollowStateResponse, Paginated,
    ToggleFollowResponse,
};

use super::auth::require_user;
use super::{envelope, ApiResult};
use crate::pagination::PageQuery;
use crate::ledger::{EngagementLedger, FollowState};
use crate::state::AppState;

fn ledger(state: &AppState) -> EngagementLedger {
    EngagementLedger::new(state.db.pool.clone())
}

fn state_response(message: String, follow: FollowState) -> FollowStateResponse {
    FollowStateResponse {
        message,
        is_following: follow.is_following,
        followers_count: follow.followers_count,
    }
}

/// GET /api/posts/follows/  the caller's own follow edges
pub async fn list_follows(
    State(state): State<AppState>,
    headers: HeaderMap,
    uri: Uri,
    Query(query): Query<PageQuery>,
) -> ApiResult<Json<Paginated<Follow>>> {
    let follower = require_user(&state, &headers)?;
    let page = ledger(&state).follows_of(&follower, &query)?;
    Ok(Json(envelope(&state, &uri, page.map(|f| state.media.follow(f)))))
}

/// POST /api/posts/follows/  `{username}`
pub async fn create_follow(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Option<Json<FollowRequest>>,
) -> ApiResult<(StatusCode, Json<FollowCreatedResponse>)> {
    let follower = require_user(&state, &headers)?;
    let payload = payload.map(|Json(p)| p).unwrap_or_default();
    let follow = ledger(&state).follow(&follower, payload.username.as_deref())?;

    Ok((
        StatusCode::CREATED,
        Json(FollowCreatedResponse {
            message: format!("Successfully followed {}", follow.following.username),
            follow: state.media.follow(follow),
        }),
    ))
}

/// DELETE /api/posts/follows/unfollow/  `{username}`
pub async fn delete_follow(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Option<Json<FollowRequest>>,
) -> ApiResult<Json<FollowStateResponse>> {
    let follower = require_user(&state, &headers)?;
    let payload = payload.map(|Json(p)| p).unwrap_or_default();
    let follow = ledger(&state).unfollow(&follower, payload.username.as_deref())?;

    let message = format!("Successfully unfollowed {}", follow.target.username);
    Ok(Json(state_response(message, follow)))
}

/// POST /api/users/profiles/:username/follow/
pub async fn follow_user(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(username): Path<String>,
) -> ApiResult<Json<FollowStateResponse>> {
    let follower = require_user(&state, &headers)?;
    let follow = ledger(&state).follow_state(&follower, &username)?;

    let message = format!("Successfully followed {}", follow.target.username);
    Ok(Json(state_response(message, follow)))
}

/// DELETE /api/users/profiles/:username/unfollow/
pub async fn unfollow_user(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(username): Path<String>,
) -> ApiResult<Json<FollowStateResponse>> {
    let follower = require_user(&state, &headers)?;
    let follow = ledger(&state).unfollow(&follower, Some(&username))?;

    let message = format!("Successfully unfollowed {}", follow.target.username);
    Ok(Json(state_response(message, follow)))
}

/// POST /api/posts/follow/:username/  (toggle)
pub async fn toggle_follow(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(username): Path<String>,
) -> ApiResult<Json<ToggleFollowResponse>> {
    let follower = require_user(&state, &headers)?;
    let follow = ledger(&state).toggle_follow(&follower, &username)?;

    let status = if follow.is_following {
        "followed"
    } else {
        "unfollowed"
    };
    Ok(Json(ToggleFollowResponse {
        status: status.to_string(),
        is_following: follow.is_following,
        followers_count: follow.followers_count,
        message: format!("Successfully {} {}!", status, follow.target.username),
    }))
}
