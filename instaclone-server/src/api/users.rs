use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, Uri},
    Json,
};

use instaclone_types::{
    Paginated, UpdateProfileRequest, UserDetail, UserSearchResult, UserStats, UserSummary,
};

use super::auth::{optional_user, require_user};
use super::posts::SearchQuery;
use super::{envelope, ApiJson, ApiResult};
use crate::pagination::PageQuery;
use crate::profiles::ProfileService;
use crate::state::AppState;

fn profiles(state: &AppState) -> ProfileService {
    ProfileService::new(state.db.pool.clone())
}

/// GET /api/users/profiles/me/
pub async fn me(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<Json<UserDetail>> {
    let user_id = require_user(&state, &headers)?;
    let detail = profiles(&state).own_detail(&user_id)?;
    Ok(Json(state.media.user_detail(detail)))
}

/// PUT|PATCH /api/users/profiles/update_me/
pub async fn update_me(
    State(state): State<AppState>,
    headers: HeaderMap,
    ApiJson(payload): ApiJson<UpdateProfileRequest>,
) -> ApiResult<Json<UserDetail>> {
    let user_id = require_user(&state, &headers)?;
    let detail = profiles(&state).update_own(&user_id, &payload)?;
    Ok(Json(state.media.user_detail(detail)))
}

/// GET /api/users/profiles/:username/
pub async fn get_profile(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(username): Path<String>,
) -> ApiResult<Json<UserDetail>> {
    let viewer = require_user(&state, &headers)?;
    let detail = profiles(&state).detail(&username, Some(viewer))?;
    Ok(Json(state.media.user_detail(detail)))
}

/// PUT|PATCH /api/users/profiles/:username/
pub async fn update_profile(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(username): Path<String>,
    ApiJson(payload): ApiJson<UpdateProfileRequest>,
) -> ApiResult<Json<UserDetail>> {
    let user_id = require_user(&state, &headers)?;
    let detail = profiles(&state).update(&user_id, &username, &payload)?;
    Ok(Json(state.media.user_detail(detail)))
}

/// GET /api/users/profiles/:username/followers/
pub async fn followers(
    State(state): State<AppState>,
    headers: HeaderMap,
    uri: Uri,
    Path(username): Path<String>,
    Query(query): Query<PageQuery>,
) -> ApiResult<Json<Paginated<UserSummary>>> {
    require_user(&state, &headers)?;
    let page = profiles(&state).followers(&username, &query)?;
    Ok(Json(envelope(&state, &uri, page.map(|u| state.media.user(u)))))
}

/// GET /api/users/profiles/:username/following/
pub async fn following(
    State(state): State<AppState>,
    headers: HeaderMap,
    uri: Uri,
    Path(username): Path<String>,
    Query(query): Query<PageQuery>,
) -> ApiResult<Json<Paginated<UserSummary>>> {
    require_user(&state, &headers)?;
    let page = profiles(&state).following(&username, &query)?;
    Ok(Json(envelope(&state, &uri, page.map(|u| state.media.user(u)))))
}

/// GET /api/users/search/?q=
pub async fn search_users(
    State(state): State<AppState>,
    headers: HeaderMap,
    uri: Uri,
    Query(search): Query<SearchQuery>,
    Query(query): Query<PageQuery>,
) -> ApiResult<Json<Paginated<UserSearchResult>>> {
    let viewer = optional_user(&state, &headers)?;
    let page = profiles(&state).search(search.q.as_deref().unwrap_or_default(), viewer, &query)?;
    Ok(Json(envelope(
        &state,
        &uri,
        page.map(|u| state.media.search_result(u)),
    )))
}

/// GET /api/users/suggested/
pub async fn suggested(
    State(state): State<AppState>,
    headers: HeaderMap,
    uri: Uri,
    Query(query): Query<PageQuery>,
) -> ApiResult<Json<Paginated<UserSearchResult>>> {
    let user_id = require_user(&state, &headers)?;
    let page = profiles(&state).suggested(&user_id, &query)?;
    Ok(Json(envelope(
        &state,
        &uri,
        page.map(|u| state.media.search_result(u)),
    )))
}

/// GET /api/users/stats/
pub async fn my_stats(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<Json<UserStats>> {
    let user_id = require_user(&state, &headers)?;
    let service = profiles(&state);
    let me = service.own_detail(&user_id)?;
    Ok(Json(service.stats(&me.username)?))
}

/// GET /api/users/stats/:username/
pub async fn user_stats(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(username): Path<String>,
) -> ApiResult<Json<UserStats>> {
    require_user(&state, &headers)?;
    Ok(Json(profiles(&state).stats(&username)?))
}
