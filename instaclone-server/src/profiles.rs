//! User profiles: detail views, edits, follower lists, people search and stats.

use chrono::NaiveDate;
use uuid::Uuid;

use instaclone_types::{
    ProfileView, UpdateProfileRequest, User, UserDetail, UserSearchResult, UserStats, UserSummary,
};

use crate::accounts::{check_email, check_name};
use crate::db::repositories::{FollowRepository, PostRepository, ProfileRepository, UserRepository};
use crate::db::DbPool;
use crate::error::{DomainError, DomainResult, Validator};
use crate::media;
use crate::pagination::{Page, PageQuery, PageSize, PageWindow};

pub const MAX_BIO_LEN: usize = 500;
pub const MAX_LOCATION_LEN: usize = 100;
pub const SUGGESTED_USERS: i64 = 20;

pub struct ProfileService {
    pool: DbPool,
}

impl ProfileService {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    fn users(&self) -> UserRepository {
        UserRepository::new(self.pool.clone())
    }

    fn user_named(&self, username: &str) -> DomainResult<User> {
        self.users()
            .get_by_username(username)?
            .ok_or_else(|| DomainError::not_found("User not found"))
    }

    /// Full profile of `username` as seen by `viewer`
    pub fn detail(&self, username: &str, viewer: Option<Uuid>) -> DomainResult<UserDetail> {
        let user = self.user_named(username)?;
        self.detail_for(user, viewer)
    }

    fn detail_for(&self, user: User, viewer: Option<Uuid>) -> DomainResult<UserDetail> {
        let profile = ProfileRepository::new(self.pool.clone())
            .get(&user.id)?
            .ok_or_else(|| DomainError::not_found("Profile not found"))?;
        let follows = FollowRepository::new(self.pool.clone());

        let (is_following, is_followed_by) = match viewer {
            Some(viewer) if viewer != user.id => (
                follows.is_following(&viewer, &user.id)?,
                follows.is_following(&user.id, &viewer)?,
            ),
            _ => (false, false),
        };

        let view = ProfileView {
            bio: profile.bio,
            profile_image: profile.profile_image,
            birth_date: profile.birth_date,
            location: profile.location,
            website: profile.website,
            is_private: profile.is_private,
            email_notifications: profile.email_notifications,
            posts_count: PostRepository::new(self.pool.clone()).count_by_user(&user.id)? as i64,
            followers_count: follows.follower_count(&user.id)?,
            following_count: follows.following_count(&user.id)?,
            created_at: profile.created_at,
            updated_at: profile.updated_at,
        };

        Ok(UserDetail {
            id: user.id,
            username: user.username,
            email: user.email,
            first_name: user.first_name,
            last_name: user.last_name,
            date_joined: user.date_joined,
            is_active: user.is_active,
            profile: view,
            is_following,
            is_followed_by,
        })
    }

    /// Full profile of the signed-in user
    pub fn own_detail(&self, user_id: &Uuid) -> DomainResult<UserDetail> {
        let user = self.user_by_id(user_id)?;
        self.detail_for(user, Some(*user_id))
    }

    fn user_by_id(&self, user_id: &Uuid) -> DomainResult<User> {
        self.users()
            .get_by_id(user_id)?
            .ok_or_else(|| DomainError::not_found("User not found"))
    }

    /// Apply a partial account/profile edit to `username`. Only the owner may edit.
    pub fn update(
        &self,
        editor: &Uuid,
        username: &str,
        request: &UpdateProfileRequest,
    ) -> DomainResult<UserDetail> {
        let user = self.user_named(username)?;
        if user.id != *editor {
            return Err(DomainError::Forbidden(
                "You can only update your own profile".to_string(),
            ));
        }
        self.apply_update(user, request)
    }

    pub fn update_own(
        &self,
        user_id: &Uuid,
        request: &UpdateProfileRequest,
    ) -> DomainResult<UserDetail> {
        let user = self.user_by_id(user_id)?;
        self.apply_update(user, request)
    }

    fn apply_update(&self, user: User, request: &UpdateProfileRequest) -> DomainResult<UserDetail> {
        let users = self.users();
        let profiles = ProfileRepository::new(self.pool.clone());
        let mut profile = profiles
            .get(&user.id)?
            .ok_or_else(|| DomainError::not_found("Profile not found"))?;

        let first_name = request.first_name.as_deref().map(str::trim).unwrap_or(&user.first_name);
        let last_name = request.last_name.as_deref().map(str::trim).unwrap_or(&user.last_name);
        let email = request.email.as_deref().map(str::trim).unwrap_or(&user.email);

        let mut v = Validator::new();
        check_name(&mut v, "first_name", first_name);
        check_name(&mut v, "last_name", last_name);
        if request.email.is_some() {
            check_email(&mut v, &users, email, Some(&user.id))?;
        }

        if let Some(fields) = &request.profile {
            if let Some(bio) = &fields.bio {
                v.check(
                    bio.chars().count() <= MAX_BIO_LEN,
                    "bio",
                    &format!("Bio cannot exceed {} characters", MAX_BIO_LEN),
                );
                profile.bio = bio.clone();
            }
            if let Some(location) = &fields.location {
                v.check(
                    location.chars().count() <= MAX_LOCATION_LEN,
                    "location",
                    &format!("Location cannot exceed {} characters", MAX_LOCATION_LEN),
                );
                profile.location = location.trim().to_string();
            }
            if let Some(website) = &fields.website {
                let website = website.trim();
                v.check(
                    website.is_empty()
                        || website.starts_with("http://")
                        || website.starts_with("https://"),
                    "website",
                    "Website must start with http:// or https://",
                );
                profile.website = website.to_string();
            }
            if let Some(birth_date) = &fields.birth_date {
                let birth_date = birth_date.trim();
                if birth_date.is_empty() {
                    profile.birth_date = None;
                } else {
                    match NaiveDate::parse_from_str(birth_date, "%Y-%m-%d") {
                        Ok(date) => profile.birth_date = Some(date),
                        Err(_) => v.add(
                            "birth_date",
                            "Date has wrong format. Use one of these formats instead: YYYY-MM-DD.",
                        ),
                    }
                }
            }
            if let Some(image) = &fields.profile_image {
                let image = image.trim();
                if image.is_empty() {
                    profile.profile_image = Some(media::DEFAULT_PROFILE_IMAGE.to_string());
                } else {
                    v.check(
                        media::has_allowed_extension(image),
                        "profile_image",
                        &media::extension_error(),
                    );
                    profile.profile_image = Some(image.to_string());
                }
            }
            if let Some(is_private) = fields.is_private {
                profile.is_private = is_private;
            }
            if let Some(enabled) = fields.email_notifications {
                profile.email_notifications = enabled;
            }
        }
        v.finish()?;

        users.update_account(&user.id, first_name, last_name, email)?;
        if request.profile.is_some() {
            profiles.update(&profile)?;
        }
        tracing::info!("User {} updated their profile", user.username);

        let refreshed = self.user_by_id(&user.id)?;
        self.detail_for(refreshed, Some(user.id))
    }

    /// Users following `username`, newest follower first
    pub fn followers(&self, username: &str, query: &PageQuery) -> DomainResult<Page<UserSummary>> {
        let user = self.user_named(username)?;
        let follows = FollowRepository::new(self.pool.clone());
        let window = PageWindow::resolve(query, PageSize::Standard, follows.follower_count(&user.id)? as u64);
        let items = follows.list_followers(&user.id, window.limit(), window.offset())?;
        Ok(Page { items, window })
    }

    /// Users `username` follows, newest first
    pub fn following(&self, username: &str, query: &PageQuery) -> DomainResult<Page<UserSummary>> {
        let user = self.user_named(username)?;
        let follows = FollowRepository::new(self.pool.clone());
        let window = PageWindow::resolve(query, PageSize::Standard, follows.following_count(&user.id)? as u64);
        let items = follows.list_following(&user.id, window.limit(), window.offset())?;
        Ok(Page { items, window })
    }

    /// Username search. A blank query yields an empty page.
    pub fn search(
        &self,
        needle: &str,
        viewer: Option<Uuid>,
        query: &PageQuery,
    ) -> DomainResult<Page<UserSearchResult>> {
        let needle = needle.trim();
        if needle.is_empty() {
            return Ok(Page::empty());
        }
        let users = self.users();
        let window = PageWindow::resolve(query, PageSize::Standard, users.count_by_username(needle)?);
        let items = users.search_by_username(needle, viewer, window.limit(), window.offset())?;
        Ok(Page { items, window })
    }

    /// At most [`SUGGESTED_USERS`] accounts, paginated like any other listing
    pub fn suggested(&self, viewer: &Uuid, query: &PageQuery) -> DomainResult<Page<UserSearchResult>> {
        let users = self.users().suggested_for(viewer, SUGGESTED_USERS)?;
        Ok(Page::paginate(users, query, PageSize::Standard))
    }

    pub fn stats(&self, username: &str) -> DomainResult<UserStats> {
        let user = self.user_named(username)?;
        let follows = FollowRepository::new(self.pool.clone());
        let posts = PostRepository::new(self.pool.clone());
        let (likes, comments) = posts.engagement_received(&user.id)?;

        Ok(UserStats {
            posts_count: posts.count_by_user(&user.id)? as i64,
            followers_count: follows.follower_count(&user.id)?,
            following_count: follows.following_count(&user.id)?,
            total_likes_received: likes,
            total_comments_received: comments,
        })
    }
}
