use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode, Uri},
    Json,
};

use instaclone_types::{Comment, CreateCommentRequest, Paginated, UpdateCommentRequest};

use super::auth::require_user;
use super::extract::REQUIRED_FIELD;
use super::posts::parse_id;
use super::{envelope, ApiJson, ApiResult};
use crate::error::DomainError;
use crate::feed::FeedComposer;
use crate::ledger::EngagementLedger;
use crate::pagination::PageQuery;
use crate::state::AppState;

fn ledger(state: &AppState) -> EngagementLedger {
    EngagementLedger::new(state.db.pool.clone())
}

/// GET /api/posts/comments/
pub async fn list_comments(
    State(state): State<AppState>,
    headers: HeaderMap,
    uri: Uri,
    Query(query): Query<PageQuery>,
) -> ApiResult<Json<Paginated<Comment>>> {
    require_user(&state, &headers)?;
    let page = FeedComposer::new(state.db.pool.clone()).all_comments(&query)?;
    Ok(Json(envelope(&state, &uri, page.map(|c| state.media.comment(c)))))
}

/// POST /api/posts/comments/  `{post, content}`
pub async fn create_comment(
    State(state): State<AppState>,
    headers: HeaderMap,
    ApiJson(payload): ApiJson<CreateCommentRequest>,
) -> ApiResult<(StatusCode, Json<Comment>)> {
    let user_id = require_user(&state, &headers)?;
    let raw_post = payload
        .post
        .as_deref()
        .ok_or_else(|| DomainError::field("post", REQUIRED_FIELD))?;
    let post_id = parse_id(raw_post, "Post")?;
    let comment = ledger(&state).add_comment(&user_id, &post_id, &payload.content)?;
    Ok((StatusCode::CREATED, Json(state.media.comment(comment))))
}

/// GET /api/posts/comments/:id/
pub async fn get_comment(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Comment>> {
    let comment_id = parse_id(&id, "Comment")?;
    let comment = ledger(&state).get_comment(&comment_id)?;
    Ok(Json(state.media.comment(comment)))
}

/// PUT|PATCH /api/posts/comments/:id/
pub async fn update_comment(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
    ApiJson(payload): ApiJson<UpdateCommentRequest>,
) -> ApiResult<Json<Comment>> {
    let comment_id = parse_id(&id, "Comment")?;
    let user_id = require_user(&state, &headers)?;
    let comment = ledger(&state).update_comment(&user_id, &comment_id, &payload.content)?;
    Ok(Json(state.media.comment(comment)))
}

/// DELETE /api/posts/comments/:id/
pub async fn delete_comment(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    let comment_id = parse_id(&id, "Comment")?;
    let user_id = require_user(&state, &headers)?;
    ledger(&state).delete_comment(&user_id, &comment_id)?;
    Ok(StatusCode::NO_CONTENT)
}
