/// Media references: extension checks and absolute URL rendering.
///
/// Stored references are paths relative to the media root
/// (`posts/alice/sunrise.jpg`); responses carry absolute URLs.
use instaclone_types::{
    Comment, Follow, Notification, Post, ProfileView, UserDetail, UserSearchResult, UserSummary,
};

pub const ALLOWED_IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp"];

pub const DEFAULT_PROFILE_IMAGE: &str = "profiles/default-profile.png";

/// Whether the reference ends in one of the accepted image extensions
pub fn has_allowed_extension(reference: &str) -> bool {
    reference
        .rsplit_once('.')
        .map(|(_, ext)| {
            let ext = ext.to_ascii_lowercase();
            ALLOWED_IMAGE_EXTENSIONS.contains(&ext.as_str())
        })
        .unwrap_or(false)
}

pub fn extension_error() -> String {
    format!(
        "File extension is not allowed. Allowed extensions are: {}.",
        ALLOWED_IMAGE_EXTENSIONS.join(", ")
    )
}

#[derive(Debug, Clone)]
pub struct MediaUrls {
    base_url: String,
}

impl MediaUrls {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Absolute URL for a stored reference
    pub fn url(&self, reference: &str) -> String {
        if reference.starts_with("http://") || reference.starts_with("https://") {
            return reference.to_string();
        }
        format!("{}/{}", self.base_url, reference.trim_start_matches('/'))
    }

    fn opt(&self, reference: Option<String>) -> Option<String> {
        reference
            .filter(|r| !r.is_empty())
            .map(|r| self.url(&r))
    }

    pub fn user(&self, mut user: UserSummary) -> UserSummary {
        user.profile_image = self.opt(user.profile_image);
        user
    }

    pub fn comment(&self, mut comment: Comment) -> Comment {
        comment.user = self.user(comment.user);
        comment
    }

    pub fn post(&self, mut post: Post) -> Post {
        post.user = self.user(post.user);
        post.image = self.opt(post.image);
        post.recent_comments = post
            .recent_comments
            .into_iter()
            .map(|c| self.comment(c))
            .collect();
        post.comments = post
            .comments
            .map(|comments| comments.into_iter().map(|c| self.comment(c)).collect());
        post
    }

    pub fn follow(&self, mut follow: Follow) -> Follow {
        follow.follower = self.user(follow.follower);
        follow.following = self.user(follow.following);
        follow
    }

    pub fn profile(&self, mut profile: ProfileView) -> ProfileView {
        profile.profile_image = self.opt(profile.profile_image);
        profile
    }

    pub fn user_detail(&self, mut detail: UserDetail) -> UserDetail {
        detail.profile = self.profile(detail.profile);
        detail
    }

    pub fn search_result(&self, mut result: UserSearchResult) -> UserSearchResult {
        result.profile_image = self.opt(result.profile_image);
        result
    }

    pub fn notification(&self, mut notification: Notification) -> Notification {
        notification.sender = self.user(notification.sender);
        notification
    }
}
