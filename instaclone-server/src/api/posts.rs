use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode, Uri},
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use instaclone_types::{
    Comment, CreateCommentRequest, CreatePostRequest, LikeResponse, Paginated, Post,
    SearchResults, UpdatePostRequest,
};

use super::auth::{optional_user, require_user};
use super::{envelope, ApiError, ApiJson, ApiResult};
use crate::feed::FeedComposer;
use crate::ledger::EngagementLedger;
use crate::pagination::PageQuery;
use crate::posts::PostService;
use crate::search::SearchService;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: Option<String>,
}

/// Post ids arrive as raw path segments so a malformed id is a 404, not a 400
pub(crate) fn parse_id(raw: &str, what: &str) -> ApiResult<Uuid> {
    Uuid::parse_str(raw).map_err(|_| ApiError::NotFound(format!("{} not found", what)))
}

fn feed(state: &AppState) -> FeedComposer {
    FeedComposer::new(state.db.pool.clone())
}

/// GET /api/posts/feed/
pub async fn home_feed(
    State(state): State<AppState>,
    headers: HeaderMap,
    uri: Uri,
    Query(query): Query<PageQuery>,
) -> ApiResult<Json<Paginated<Post>>> {
    let viewer = optional_user(&state, &headers)?;
    let page = feed(&state).home(viewer, &query)?;
    Ok(Json(envelope(&state, &uri, page.map(|p| state.media.post(p)))))
}

/// GET /api/posts/explore/
pub async fn explore(
    State(state): State<AppState>,
    headers: HeaderMap,
    uri: Uri,
    Query(query): Query<PageQuery>,
) -> ApiResult<Json<Paginated<Post>>> {
    let viewer = optional_user(&state, &headers)?;
    let page = feed(&state).explore(viewer, &query)?;
    Ok(Json(envelope(&state, &uri, page.map(|p| state.media.post(p)))))
}

/// GET /api/posts/user/:username/
pub async fn user_posts(
    State(state): State<AppState>,
    headers: HeaderMap,
    uri: Uri,
    Path(username): Path<String>,
    Query(query): Query<PageQuery>,
) -> ApiResult<Json<Paginated<Post>>> {
    let viewer = optional_user(&state, &headers)?;
    let (_user, page) = feed(&state).profile(&username, viewer, &query)?;
    Ok(Json(envelope(&state, &uri, page.map(|p| state.media.post(p)))))
}

/// GET /api/posts/search/?q=
pub async fn search(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<SearchQuery>,
) -> ApiResult<Json<SearchResults>> {
    let viewer = optional_user(&state, &headers)?;
    let mut results = SearchService::new(state.db.pool.clone())
        .search(query.q.as_deref().unwrap_or_default(), viewer)?;

    results.users = results
        .users
        .into_iter()
        .map(|u| state.media.search_result(u))
        .collect();
    results.posts = results.posts.into_iter().map(|p| state.media.post(p)).collect();
    Ok(Json(results))
}

/// GET /api/posts/posts/
pub async fn list_posts(
    State(state): State<AppState>,
    headers: HeaderMap,
    uri: Uri,
    Query(query): Query<PageQuery>,
) -> ApiResult<Json<Paginated<Post>>> {
    let viewer = optional_user(&state, &headers)?;
    let page = feed(&state).all_posts(viewer, &query)?;
    Ok(Json(envelope(&state, &uri, page.map(|p| state.media.post(p)))))
}

/// POST /api/posts/posts/
pub async fn create_post(
    State(state): State<AppState>,
    headers: HeaderMap,
    ApiJson(payload): ApiJson<CreatePostRequest>,
) -> ApiResult<(StatusCode, Json<Post>)> {
    let author = require_user(&state, &headers)?;
    let post = PostService::new(state.db.pool.clone()).create(&author, &payload)?;
    Ok((StatusCode::CREATED, Json(state.media.post(post))))
}

/// GET /api/posts/posts/:id/
pub async fn get_post(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> ApiResult<Json<Post>> {
    let post_id = parse_id(&id, "Post")?;
    let viewer = optional_user(&state, &headers)?;
    let post = feed(&state).post_detail(&post_id, viewer)?;
    Ok(Json(state.media.post(post)))
}

/// PUT|PATCH /api/posts/posts/:id/
pub async fn update_post(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
    ApiJson(payload): ApiJson<UpdatePostRequest>,
) -> ApiResult<Json<Post>> {
    let post_id = parse_id(&id, "Post")?;
    let user_id = require_user(&state, &headers)?;
    let post = PostService::new(state.db.pool.clone()).update(&user_id, &post_id, &payload)?;
    Ok(Json(state.media.post(post)))
}

/// DELETE /api/posts/posts/:id/
pub async fn delete_post(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    let post_id = parse_id(&id, "Post")?;
    let user_id = require_user(&state, &headers)?;
    PostService::new(state.db.pool.clone()).destroy(&user_id, &post_id)?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/posts/posts/:id/like/
pub async fn like_post(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> ApiResult<Json<LikeResponse>> {
    let post_id = parse_id(&id, "Post")?;
    let user_id = require_user(&state, &headers)?;
    let like = EngagementLedger::new(state.db.pool.clone()).toggle_like(&user_id, &post_id)?;

    let message = if like.liked {
        "Post liked successfully"
    } else {
        "Post unliked successfully"
    };
    Ok(Json(LikeResponse {
        liked: like.liked,
        total_likes: like.total_likes,
        message: message.to_string(),
    }))
}

/// GET /api/posts/posts/:id/comments/
pub async fn post_comments(
    State(state): State<AppState>,
    uri: Uri,
    Path(id): Path<String>,
    Query(query): Query<PageQuery>,
) -> ApiResult<Json<Paginated<Comment>>> {
    let post_id = parse_id(&id, "Post")?;
    let page = feed(&state).comments(&post_id, &query)?;
    Ok(Json(envelope(&state, &uri, page.map(|c| state.media.comment(c)))))
}

/// POST /api/posts/posts/:id/add_comment/
pub async fn add_comment(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
    ApiJson(payload): ApiJson<CreateCommentRequest>,
) -> ApiResult<(StatusCode, Json<Comment>)> {
    let post_id = parse_id(&id, "Post")?;
    let user_id = require_user(&state, &headers)?;
    let comment = EngagementLedger::new(state.db.pool.clone()).add_comment(
        &user_id,
        &post_id,
        &payload.content,
    )?;
    Ok((StatusCode::CREATED, Json(state.media.comment(comment))))
}
