use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::enums::NotificationKind;

// Custom serde module for DateTime to ensure RFC3339 string format
mod datetime_format {
    use chrono::{DateTime, Utc};
    use serde::{self, Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(date: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let s = date.to_rfc3339();
        serializer.serialize_str(&s)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse::<DateTime<Utc>>().map_err(serde::de::Error::custom)
    }
}

/// Field name -> validation messages. Problems that are not tied to a single
/// field are reported under `non_field_errors`.
pub type FieldErrors = BTreeMap<String, Vec<String>>;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub is_active: bool,
    #[serde(with = "datetime_format")]
    pub date_joined: DateTime<Utc>,
}

/// Compact author/actor representation nested inside posts, comments and follows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserSummary {
    pub id: Uuid,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    /// Absolute URL once rendered by the API layer
    pub profile_image: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    pub user_id: Uuid,
    pub bio: String,
    pub profile_image: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub location: String,
    pub website: String,
    pub is_private: bool,
    /// Whether the user wants to receive notifications at all
    pub email_notifications: bool,
    #[serde(with = "datetime_format")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "datetime_format")]
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileView {
    pub bio: String,
    pub profile_image: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub location: String,
    pub website: String,
    pub is_private: bool,
    pub email_notifications: bool,
    pub posts_count: i64,
    pub followers_count: i64,
    pub following_count: i64,
    #[serde(with = "datetime_format")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "datetime_format")]
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserDetail {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(with = "datetime_format")]
    pub date_joined: DateTime<Utc>,
    pub is_active: bool,
    pub profile: ProfileView,
    /// Viewer follows this user (always false when viewing oneself)
    pub is_following: bool,
    /// This user follows the viewer (always false when viewing oneself)
    pub is_followed_by: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserSearchResult {
    pub id: Uuid,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub profile_image: Option<String>,
    pub bio: String,
    pub followers_count: i64,
    pub is_following: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    pub id: Uuid,
    pub user: UserSummary,
    pub image: Option<String>,
    pub caption: String,
    #[serde(with = "datetime_format")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "datetime_format")]
    pub updated_at: DateTime<Utc>,
    pub total_likes: i64,
    /// Active comments only
    pub total_comments: i64,
    /// Whether the viewer likes this post (false for anonymous viewers)
    #[serde(default)]
    pub is_liked: bool,
    pub is_active: bool,
    /// Up to three newest active comments, populated for feed listings
    #[serde(default)]
    pub recent_comments: Vec<Comment>,
    /// Full active comment thread, populated for single-post views
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comments: Option<Vec<Comment>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    pub id: Uuid,
    pub post_id: Uuid,
    pub user: UserSummary,
    pub content: String,
    #[serde(with = "datetime_format")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "datetime_format")]
    pub updated_at: DateTime<Utc>,
    pub is_active: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Follow {
    pub id: Uuid,
    pub follower: UserSummary,
    pub following: UserSummary,
    #[serde(with = "datetime_format")]
    pub created_at: DateTime<Utc>,
}

/// What a notification points at. Each kind carries only the reference it needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NotificationTarget {
    Like { post_id: Uuid },
    Comment { comment_id: Uuid },
    Follow,
    Mention { comment_id: Uuid },
}

impl NotificationTarget {
    pub fn kind(&self) -> NotificationKind {
        match self {
            NotificationTarget::Like { .. } => NotificationKind::Like,
            NotificationTarget::Comment { .. } => NotificationKind::Comment,
            NotificationTarget::Follow => NotificationKind::Follow,
            NotificationTarget::Mention { .. } => NotificationKind::Mention,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub id: Uuid,
    pub recipient_id: Uuid,
    pub sender: UserSummary,
    pub notification_type: NotificationKind,
    pub message: String,
    pub target: NotificationTarget,
    pub is_read: bool,
    #[serde(with = "datetime_format")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResults {
    pub users: Vec<UserSearchResult>,
    pub posts: Vec<Post>,
    pub query: String,
    pub total_results: usize,
}

impl SearchResults {
    pub fn empty() -> Self {
        Self {
            users: Vec::new(),
            posts: Vec::new(),
            query: String::new(),
            total_results: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserStats {
    pub posts_count: i64,
    pub followers_count: i64,
    pub following_count: i64,
    pub total_likes_received: i64,
    pub total_comments_received: i64,
}

/// Page-number pagination envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Paginated<T> {
    pub count: u64,
    pub next: Option<String>,
    pub previous: Option<String>,
    pub results: Vec<T>,
}

impl<T> Paginated<T> {
    pub fn map<U, F: FnMut(T) -> U>(self, f: F) -> Paginated<U> {
        Paginated {
            count: self.count,
            next: self.next,
            previous: self.previous,
            results: self.results.into_iter().map(f).collect(),
        }
    }
}

// Request/Response types for API
#[derive(Debug, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    pub password: String,
    pub password_confirm: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub access: String,
    pub refresh: String,
    pub user: UserDetail,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RefreshRequest {
    pub refresh: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RefreshResponse {
    pub access: String,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct CreatePostRequest {
    #[serde(default)]
    pub caption: Option<String>,
    /// Relative media reference produced by the upload collaborator
    #[serde(default)]
    pub image: Option<String>,
}

/// Partial post update. An empty `image` string removes the image.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct UpdatePostRequest {
    #[serde(default)]
    pub caption: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateCommentRequest {
    /// Target post id; only read by the top-level comments endpoint
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub post: Option<String>,
    pub content: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UpdateCommentRequest {
    pub content: String,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct FollowRequest {
    #[serde(default)]
    pub username: Option<String>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct UpdateProfileFields {
    pub bio: Option<String>,
    pub profile_image: Option<String>,
    /// `YYYY-MM-DD`; an empty string clears the date
    pub birth_date: Option<String>,
    pub location: Option<String>,
    pub website: Option<String>,
    pub is_private: Option<bool>,
    pub email_notifications: Option<bool>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct UpdateProfileRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub profile: Option<UpdateProfileFields>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChangePasswordRequest {
    pub old_password: String,
    pub new_password: String,
    pub new_password_confirm: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LikeResponse {
    pub liked: bool,
    pub total_likes: i64,
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct FollowStateResponse {
    pub message: String,
    pub is_following: bool,
    pub followers_count: i64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct FollowCreatedResponse {
    pub message: String,
    pub follow: Follow,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ToggleFollowResponse {
    pub status: String,
    pub is_following: bool,
    pub followers_count: i64,
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UnreadCountResponse {
    pub unread_count: i64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub details: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fields: Option<FieldErrors>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notification_target_is_tagged() {
        let post_id = Uuid::new_v4();
        let json = serde_json::to_value(NotificationTarget::Like { post_id }).unwrap();
        assert_eq!(json["type"], "like");
        assert_eq!(json["post_id"], post_id.to_string());

        let json = serde_json::to_value(NotificationTarget::Follow).unwrap();
        assert_eq!(json, serde_json::json!({ "type": "follow" }));
    }

    #[test]
    fn test_notification_target_kind() {
        let comment_id = Uuid::new_v4();
        assert_eq!(
            NotificationTarget::Mention { comment_id }.kind(),
            NotificationKind::Mention
        );
        assert_eq!(NotificationTarget::Follow.kind(), NotificationKind::Follow);
    }

    #[test]
    fn test_empty_search_results_shape() {
        let json = serde_json::to_value(SearchResults::empty()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "users": [], "posts": [], "query": "", "total_results": 0 })
        );
    }

    #[test]
    fn test_error_response_omits_missing_fields() {
        let body = ErrorResponse {
            error: "Not Found".to_string(),
            details: Some("Post not found".to_string()),
            fields: None,
        };
        let json = serde_json::to_value(body).unwrap();
        assert!(json.get("fields").is_none());
    }
}
