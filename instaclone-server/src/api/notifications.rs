use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, Uri},
    Json,
};

use instaclone_types::{MessageResponse, Notification, Paginated, UnreadCountResponse};

use super::auth::require_user;
use super::posts::parse_id;
use super::{envelope, ApiResult};
use crate::notifications::Inbox;
use crate::pagination::PageQuery;
use crate::state::AppState;

fn inbox(state: &AppState) -> Inbox {
    Inbox::new(state.db.pool.clone())
}

/// GET /api/users/notifications/
pub async fn list_notifications(
    State(state): State<AppState>,
    headers: HeaderMap,
    uri: Uri,
    Query(query): Query<PageQuery>,
) -> ApiResult<Json<Paginated<Notification>>> {
    let user_id = require_user(&state, &headers)?;
    let page = inbox(&state).list(&user_id, &query)?;
    Ok(Json(envelope(
        &state,
        &uri,
        page.map(|n| state.media.notification(n)),
    )))
}

/// GET /api/users/notifications/unread_count/
pub async fn unread_count(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<Json<UnreadCountResponse>> {
    let user_id = require_user(&state, &headers)?;
    let unread_count = inbox(&state).unread_count(&user_id)?;
    Ok(Json(UnreadCountResponse { unread_count }))
}

/// POST /api/users/notifications/:id/mark_read/
pub async fn mark_read(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> ApiResult<Json<MessageResponse>> {
    let user_id = require_user(&state, &headers)?;
    let notification_id = parse_id(&id, "Notification")?;
    inbox(&state).mark_read(&user_id, &notification_id)?;
    Ok(Json(MessageResponse {
        message: "Notification marked as read".to_string(),
    }))
}

/// POST /api/users/notifications/mark_all_read/
pub async fn mark_all_read(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<Json<MessageResponse>> {
    let user_id = require_user(&state, &headers)?;
    inbox(&state).mark_all_read(&user_id)?;
    Ok(Json(MessageResponse {
        message: "All notifications marked as read".to_string(),
    }))
}
