mod user_repository;
mod profile_repository;
mod post_repository;
mod comment_repository;
mod like_repository;
mod follow_repository;
mod notification_repository;

pub use user_repository::{NewUser, UserRepository};
pub use profile_repository::ProfileRepository;
pub use post_repository::{PostOrder, PostRecord, PostRepository};
pub use comment_repository::CommentRepository;
pub use like_repository::LikeRepository;
pub use follow_repository::FollowRepository;
pub use notification_repository::{NotificationRepository, MAX_MESSAGE_LEN};

/// Result of inserting a membership row into a uniquely keyed table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Insertion {
    Created,
    /// The store already held the row (possibly inserted by a concurrent request)
    AlreadyPresent,
}
