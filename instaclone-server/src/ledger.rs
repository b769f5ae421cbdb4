//! Engagement Ledger: likes, follows and comments.
//!
//! Likes and the toggle-form follow flip a `{absent, present}` membership
//! based on the presence check made at request time. The store's uniqueness
//! constraint is the only guard against two requests racing past that check;
//! losing the race is reported as "present", never as an error.

use uuid::Uuid;

use instaclone_types::{Comment, Follow, NotificationTarget, User};

use crate::db::repositories::{
    CommentRepository, FollowRepository, Insertion, LikeRepository, PostRepository,
    UserRepository,
};
use crate::db::DbPool;
use crate::error::{DomainError, DomainResult};
use crate::mention::extract_mentions;
use crate::notifications::Notifier;
use crate::pagination::{Page, PageQuery, PageSize, PageWindow};

pub const MAX_COMMENT_LEN: usize = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LikeState {
    pub liked: bool,
    pub total_likes: i64,
}

#[derive(Debug, Clone)]
pub struct FollowState {
    pub target: User,
    pub is_following: bool,
    pub followers_count: i64,
}

/// Trimmed comment content, or the reason it is rejected
pub fn clean_comment(content: &str) -> DomainResult<String> {
    let trimmed = content.trim();
    if trimmed.is_empty() {
        return Err(DomainError::field("content", "Comment cannot be empty"));
    }
    if trimmed.chars().count() > MAX_COMMENT_LEN {
        return Err(DomainError::field(
            "content",
            format!("Comment cannot exceed {} characters", MAX_COMMENT_LEN),
        ));
    }
    Ok(trimmed.to_string())
}

pub struct EngagementLedger {
    pool: DbPool,
    notifier: Notifier,
}

impl EngagementLedger {
    pub fn new(pool: DbPool) -> Self {
        let notifier = Notifier::new(pool.clone());
        Self { pool, notifier }
    }

    fn target_user(&self, username: &str) -> DomainResult<User> {
        UserRepository::new(self.pool.clone())
            .get_by_username(username)?
            .filter(|u| u.is_active)
            .ok_or_else(|| DomainError::not_found("User not found"))
    }

    fn ensure_not_self(follower: &Uuid, target: &User) -> DomainResult<()> {
        if *follower == target.id {
            return Err(DomainError::non_field("You cannot follow yourself"));
        }
        Ok(())
    }

    /// Like the post if the user has not, otherwise remove the like
    pub fn toggle_like(&self, user_id: &Uuid, post_id: &Uuid) -> DomainResult<LikeState> {
        let post = PostRepository::new(self.pool.clone())
            .get_record(post_id)?
            .filter(|p| p.is_active)
            .ok_or_else(|| DomainError::not_found("Post not found"))?;

        let likes = LikeRepository::new(self.pool.clone());
        let liked = if likes.exists(user_id, post_id)? {
            likes.delete(user_id, post_id)?;
            false
        } else {
            if likes.insert(user_id, post_id)? == Insertion::Created {
                self.notifier.notify(
                    &post.user_id,
                    user_id,
                    NotificationTarget::Like { post_id: *post_id },
                );
            }
            true
        };

        let total_likes = likes.count_for_post(post_id)?;
        tracing::info!(
            "User {} {} post {} ({} likes)",
            user_id,
            if liked { "liked" } else { "unliked" },
            post_id,
            total_likes
        );
        Ok(LikeState { liked, total_likes })
    }

    /// Follow if not following, otherwise unfollow. Never errors on state.
    pub fn toggle_follow(&self, follower: &Uuid, username: &str) -> DomainResult<FollowState> {
        let target = self.target_user(username)?;
        Self::ensure_not_self(follower, &target)?;

        let follows = FollowRepository::new(self.pool.clone());
        let is_following = if follows.is_following(follower, &target.id)? {
            follows.delete(follower, &target.id)?;
            false
        } else {
            if follows.insert(follower, &target.id)? == Insertion::Created {
                self.notifier
                    .notify(&target.id, follower, NotificationTarget::Follow);
            }
            true
        };

        let followers_count = follows.follower_count(&target.id)?;
        tracing::info!(
            "User {} {} {}",
            follower,
            if is_following { "followed" } else { "unfollowed" },
            target.username
        );
        Ok(FollowState {
            target,
            is_following,
            followers_count,
        })
    }

    /// Explicit follow: already following is a conflict
    pub fn follow(&self, follower: &Uuid, username: Option<&str>) -> DomainResult<Follow> {
        let username = username
            .map(str::trim)
            .filter(|u| !u.is_empty())
            .ok_or_else(|| DomainError::field("username", "Username is required"))?;
        let target = self.target_user(username)?;
        Self::ensure_not_self(follower, &target)?;

        let follows = FollowRepository::new(self.pool.clone());
        let already = || DomainError::Conflict(format!("You are already following {}", target.username));
        if follows.is_following(follower, &target.id)? {
            return Err(already());
        }
        if follows.insert(follower, &target.id)? == Insertion::AlreadyPresent {
            return Err(already());
        }

        self.notifier
            .notify(&target.id, follower, NotificationTarget::Follow);
        tracing::info!("User {} followed {}", follower, target.username);

        follows
            .get(follower, &target.id)?
            .ok_or_else(|| DomainError::not_found("Follow not found"))
    }

    /// Explicit unfollow: not following is a conflict
    pub fn unfollow(&self, follower: &Uuid, username: Option<&str>) -> DomainResult<FollowState> {
        let username = username
            .map(str::trim)
            .filter(|u| !u.is_empty())
            .ok_or_else(|| DomainError::field("username", "Username is required"))?;
        let target = self.target_user(username)?;
        Self::ensure_not_self(follower, &target)?;

        let follows = FollowRepository::new(self.pool.clone());
        if follows.delete(follower, &target.id)? == 0 {
            return Err(DomainError::Conflict(format!(
                "You are not following {}",
                target.username
            )));
        }

        let followers_count = follows.follower_count(&target.id)?;
        tracing::info!("User {} unfollowed {}", follower, target.username);
        Ok(FollowState {
            target,
            is_following: false,
            followers_count,
        })
    }

    /// Edges the user has created, newest first
    pub fn follows_of(&self, follower: &Uuid, query: &PageQuery) -> DomainResult<Page<Follow>> {
        let follows = FollowRepository::new(self.pool.clone());
        let total = follows.following_count(follower)? as u64;
        let window = PageWindow::resolve(query, PageSize::Standard, total);
        let items = follows.list_by_follower(follower, window.limit(), window.offset())?;
        Ok(Page { items, window })
    }

    /// Explicit follow returning the relation state instead of the edge
    pub fn follow_state(&self, follower: &Uuid, username: &str) -> DomainResult<FollowState> {
        let follow = self.follow(follower, Some(username))?;
        let followers_count =
            FollowRepository::new(self.pool.clone()).follower_count(&follow.following.id)?;
        let target = self.target_user(&follow.following.username)?;
        Ok(FollowState {
            target,
            is_following: true,
            followers_count,
        })
    }

    /// Add a comment to an active post
    pub fn add_comment(&self, user_id: &Uuid, post_id: &Uuid, content: &str) -> DomainResult<Comment> {
        let content = clean_comment(content)?;
        let post = PostRepository::new(self.pool.clone())
            .get_record(post_id)?
            .filter(|p| p.is_active)
            .ok_or_else(|| DomainError::not_found("Post not found"))?;

        let comment = CommentRepository::new(self.pool.clone()).create(post_id, user_id, &content)?;
        tracing::info!("User {} commented on post {}", user_id, post_id);

        self.notifier.notify(
            &post.user_id,
            user_id,
            NotificationTarget::Comment {
                comment_id: comment.id,
            },
        );
        self.notify_mentions(&comment, &post.user_id);

        Ok(comment)
    }

    fn notify_mentions(&self, comment: &Comment, post_owner: &Uuid) {
        let users = UserRepository::new(self.pool.clone());
        for username in extract_mentions(&comment.content) {
            let mentioned = match users.get_by_username(&username) {
                Ok(Some(user)) => user,
                Ok(None) => continue,
                Err(e) => {
                    tracing::warn!("Failed to resolve mention @{}: {:#}", username, e);
                    continue;
                }
            };
            if mentioned.id == *post_owner {
                continue;
            }
            self.notifier.notify(
                &mentioned.id,
                &comment.user.id,
                NotificationTarget::Mention {
                    comment_id: comment.id,
                },
            );
        }
    }

    /// Active comment, 404 when missing or moderated
    pub fn get_comment(&self, comment_id: &Uuid) -> DomainResult<Comment> {
        CommentRepository::new(self.pool.clone())
            .get_active(comment_id)?
            .ok_or_else(|| DomainError::not_found("Comment not found"))
    }

    pub fn update_comment(
        &self,
        user_id: &Uuid,
        comment_id: &Uuid,
        content: &str,
    ) -> DomainResult<Comment> {
        let comment = self.get_comment(comment_id)?;
        if comment.user.id != *user_id {
            return Err(DomainError::Forbidden(
                "You can only edit your own comments".to_string(),
            ));
        }
        let content = clean_comment(content)?;

        let comments = CommentRepository::new(self.pool.clone());
        comments.update_content(comment_id, &content)?;
        self.get_comment(comment_id)
    }

    /// Soft delete; the row stays for moderation history
    pub fn delete_comment(&self, user_id: &Uuid, comment_id: &Uuid) -> DomainResult<()> {
        let comment = self.get_comment(comment_id)?;
        if comment.user.id != *user_id {
            return Err(DomainError::Forbidden(
                "You can only delete your own comments".to_string(),
            ));
        }
        CommentRepository::new(self.pool.clone()).set_active(comment_id, false)?;
        tracing::info!("User {} deleted comment {}", user_id, comment_id);
        Ok(())
    }
}
