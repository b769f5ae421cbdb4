//! Feed Composer: ordered, paginated post listings for a viewer.
//!
//! | listing | order                                          | page size |
//! |---------|------------------------------------------------|-----------|
//! | home    | followed users and self first, then recency    | 10        |
//! | explore | like count, then recency                       | 20 (≤100) |
//! | profile | recency                                        | 12        |
//! | all     | recency                                        | 20 (≤100) |
//!
//! Anonymous viewers get the home feed in plain recency order.

use uuid::Uuid;

use instaclone_types::{Comment, Post, User};

use crate::db::repositories::{CommentRepository, PostOrder, PostRepository, UserRepository};
use crate::db::DbPool;
use crate::error::{DomainError, DomainResult};
use crate::pagination::{
    Page, PageQuery, PageSize, PageWindow, HOME_FEED_PAGE_SIZE, PROFILE_FEED_PAGE_SIZE,
};

/// Number of newest comments attached to each feed card
pub const RECENT_COMMENTS: i64 = 3;

pub struct FeedComposer {
    pool: DbPool,
}

impl FeedComposer {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    fn posts(&self) -> PostRepository {
        PostRepository::new(self.pool.clone())
    }

    /// Home timeline
    pub fn home(&self, viewer: Option<Uuid>, query: &PageQuery) -> DomainResult<Page<Post>> {
        let order = match viewer {
            Some(_) => PostOrder::FollowedFirst,
            None => PostOrder::Recent,
        };
        self.active_listing(order, viewer, query, PageSize::Fixed(HOME_FEED_PAGE_SIZE))
    }

    /// Most liked posts across the platform
    pub fn explore(&self, viewer: Option<Uuid>, query: &PageQuery) -> DomainResult<Page<Post>> {
        self.active_listing(PostOrder::MostLiked, viewer, query, PageSize::Standard)
    }

    /// Every active post, newest first
    pub fn all_posts(&self, viewer: Option<Uuid>, query: &PageQuery) -> DomainResult<Page<Post>> {
        self.active_listing(PostOrder::Recent, viewer, query, PageSize::Standard)
    }

    /// One user's posts, newest first
    pub fn profile(
        &self,
        username: &str,
        viewer: Option<Uuid>,
        query: &PageQuery,
    ) -> DomainResult<(User, Page<Post>)> {
        let user = UserRepository::new(self.pool.clone())
            .get_by_username(username)?
            .ok_or_else(|| DomainError::not_found("User not found"))?;

        let posts = self.posts();
        let total = posts.count_by_user(&user.id)?;
        let window = PageWindow::resolve(query, PageSize::Fixed(PROFILE_FEED_PAGE_SIZE), total);
        let items = posts.list_by_user(&user.id, viewer, window.limit(), window.offset())?;

        Ok((user, Page { items: self.with_recent_comments(items)?, window }))
    }

    /// A single active post with its full comment thread
    pub fn post_detail(&self, post_id: &Uuid, viewer: Option<Uuid>) -> DomainResult<Post> {
        let mut post = self
            .posts()
            .get_card(post_id, viewer)?
            .ok_or_else(|| DomainError::not_found("Post not found"))?;

        let comments = CommentRepository::new(self.pool.clone());
        post.recent_comments = comments.recent_for_post(post_id, RECENT_COMMENTS)?;
        post.comments = Some(comments.list_for_post(post_id)?);
        Ok(post)
    }

    /// Active comments on an active post, oldest first
    pub fn comments(&self, post_id: &Uuid, query: &PageQuery) -> DomainResult<Page<Comment>> {
        if !self.posts().is_active(post_id)? {
            return Err(DomainError::not_found("Post not found"));
        }
        self.visible_comments(Some(post_id), query)
    }

    /// Every visible comment on the platform, oldest first
    pub fn all_comments(&self, query: &PageQuery) -> DomainResult<Page<Comment>> {
        self.visible_comments(None, query)
    }

    fn visible_comments(&self, post_id: Option<&Uuid>, query: &PageQuery) -> DomainResult<Page<Comment>> {
        let comments = CommentRepository::new(self.pool.clone());
        let total = comments.count_visible(post_id)?;
        let window = PageWindow::resolve(query, PageSize::Standard, total);
        let items = comments.list_visible(post_id, window.limit(), window.offset())?;
        Ok(Page { items, window })
    }

    fn active_listing(
        &self,
        order: PostOrder,
        viewer: Option<Uuid>,
        query: &PageQuery,
        size: PageSize,
    ) -> DomainResult<Page<Post>> {
        let posts = self.posts();
        let total = posts.count_active()?;
        let window = PageWindow::resolve(query, size, total);
        let items = posts.list_active(order, viewer, window.limit(), window.offset())?;
        Ok(Page {
            items: self.with_recent_comments(items)?,
            window,
        })
    }

    fn with_recent_comments(&self, mut posts: Vec<Post>) -> DomainResult<Vec<Post>> {
        let comments = CommentRepository::new(self.pool.clone());
        for post in &mut posts {
            post.recent_comments = comments.recent_for_post(&post.id, RECENT_COMMENTS)?;
        }
        Ok(posts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::{FollowRepository, LikeRepository, NewUser};
    use crate::db::Database;

    fn setup() -> Database {
        let db = Database::in_memory().unwrap();
        db.initialize().unwrap();
        db
    }

    fn user(db: &Database, name: &str) -> Uuid {
        UserRepository::new(db.pool.clone())
            .create_with_profile(&NewUser {
                username: name,
                email: &format!("{}@example.com", name),
                first_name: "",
                last_name: "",
                password_hash: "!",
            })
            .unwrap()
            .id
    }

    fn post_at(db: &Database, author: Uuid, caption: &str, at: &str) -> Uuid {
        let id = Uuid::new_v4();
        db.connection()
            .unwrap()
            .execute(
                "INSERT INTO posts (id, user_id, caption, created_at, updated_at) VALUES (?1, ?2, ?3, ?4, ?4)",
                [id.to_string(), author.to_string(), caption.to_string(), at.to_string()],
            )
            .unwrap();
        id
    }

    fn captions(page: &Page<Post>) -> Vec<&str> {
        page.items.iter().map(|p| p.caption.as_str()).collect()
    }

    #[test]
    fn test_home_feed_puts_followed_content_first() {
        let db = setup();
        let (a, b, c, d) = (user(&db, "viewer"), user(&db, "bee"), user(&db, "cee"), user(&db, "dee"));
        let follows = FollowRepository::new(db.pool.clone());
        follows.insert(&a, &b).unwrap();
        follows.insert(&a, &c).unwrap();

        post_at(&db, b, "b-old", "2024-01-01T00:00:00.000000Z");
        post_at(&db, c, "c-mid", "2024-01-02T00:00:00.000000Z");
        post_at(&db, a, "self", "2024-01-03T00:00:00.000000Z");
        post_at(&db, d, "d-newest", "2024-02-01T00:00:00.000000Z");

        let feed = FeedComposer::new(db.pool.clone());
        let page = feed.home(Some(a), &PageQuery::first()).unwrap();
        assert_eq!(captions(&page), vec!["self", "c-mid", "b-old", "d-newest"]);

        // anonymous viewers get plain recency
        let page = feed.home(None, &PageQuery::first()).unwrap();
        assert_eq!(captions(&page), vec!["d-newest", "self", "c-mid", "b-old"]);
    }

    #[test]
    fn test_explore_orders_by_likes_then_recency() {
        let db = setup();
        let author = user(&db, "author");
        let p1 = post_at(&db, author, "five-likes-older", "2024-01-01T00:00:00.000000Z");
        let p2 = post_at(&db, author, "three-likes-newer", "2024-01-05T00:00:00.000000Z");
        post_at(&db, author, "no-likes-newest", "2024-01-09T00:00:00.000000Z");

        let likes = LikeRepository::new(db.pool.clone());
        for i in 0..5 {
            let fan = user(&db, &format!("fan{}", i));
            likes.insert(&fan, &p1).unwrap();
            if i < 3 {
                likes.insert(&fan, &p2).unwrap();
            }
        }

        let page = FeedComposer::new(db.pool.clone())
            .explore(None, &PageQuery::first())
            .unwrap();
        assert_eq!(
            captions(&page),
            vec!["five-likes-older", "three-likes-newer", "no-likes-newest"]
        );
    }

    #[test]
    fn test_soft_deleted_posts_leave_every_listing() {
        let db = setup();
        let author = user(&db, "author");
        let hidden = post_at(&db, author, "hidden", "2024-01-01T00:00:00.000000Z");
        post_at(&db, author, "shown", "2024-01-02T00:00:00.000000Z");
        CommentRepository::new(db.pool.clone())
            .create(&hidden, &author, "still here")
            .unwrap();
        PostRepository::new(db.pool.clone()).set_active(&hidden, false).unwrap();

        let feed = FeedComposer::new(db.pool.clone());
        let q = PageQuery::first();
        assert_eq!(captions(&feed.home(Some(author), &q).unwrap()), vec!["shown"]);
        assert_eq!(captions(&feed.explore(None, &q).unwrap()), vec!["shown"]);
        assert_eq!(captions(&feed.profile("author", None, &q).unwrap().1), vec!["shown"]);
        assert!(matches!(
            feed.post_detail(&hidden, None),
            Err(DomainError::NotFound(_))
        ));

        // row and comments are retained
        assert!(PostRepository::new(db.pool.clone()).get_record(&hidden).unwrap().is_some());
        assert_eq!(
            CommentRepository::new(db.pool.clone()).count_all_for_post(&hidden).unwrap(),
            1
        );
    }

    #[test]
    fn test_home_feed_pages_of_ten_clamp() {
        let db = setup();
        let author = user(&db, "author");
        for i in 0..15 {
            post_at(&db, author, &format!("post {}", i), &format!("2024-01-{:02}T00:00:00.000000Z", i + 1));
        }
        let feed = FeedComposer::new(db.pool.clone());

        let first = feed.home(None, &PageQuery::first()).unwrap();
        assert_eq!(first.items.len(), 10);
        assert_eq!(first.window.num_pages, 2);

        let beyond = PageQuery { page: Some("9".to_string()), page_size: Some("50".to_string()) };
        let last = feed.home(None, &beyond).unwrap();
        assert_eq!(last.window.page, 2);
        assert_eq!(last.items.len(), 5);
    }

    #[test]
    fn test_cards_carry_three_newest_comments() {
        let db = setup();
        let author = user(&db, "author");
        let post = post_at(&db, author, "chatty", "2024-01-01T00:00:00.000000Z");
        let comments = CommentRepository::new(db.pool.clone());
        for text in ["one", "two", "three", "four"] {
            comments.create(&post, &author, text).unwrap();
        }

        let feed = FeedComposer::new(db.pool.clone());
        let page = feed.all_posts(None, &PageQuery::first()).unwrap();
        let recent: Vec<_> = page.items[0].recent_comments.iter().map(|c| c.content.as_str()).collect();
        assert_eq!(recent, vec!["four", "three", "two"]);

        let detail = feed.post_detail(&post, None).unwrap();
        assert_eq!(detail.comments.unwrap().len(), 4);
        assert_eq!(detail.total_comments, 4);
    }

    #[test]
    fn test_unknown_profile_is_not_found() {
        let db = setup();
        let feed = FeedComposer::new(db.pool.clone());
        assert!(matches!(
            feed.profile("nobody", None, &PageQuery::first()),
            Err(DomainError::NotFound(_))
        ));
    }

    #[test]
    fn test_comment_listing_is_paged_and_scoped() {
        let db = setup();
        let author = user(&db, "author");
        let shown = post_at(&db, author, "shown", "2024-01-01T00:00:00.000000Z");
        let hidden = post_at(&db, author, "hidden", "2024-01-02T00:00:00.000000Z");
        let comments = CommentRepository::new(db.pool.clone());
        for i in 0..3 {
            comments.create(&shown, &author, &format!("note {}", i)).unwrap();
        }
        comments.create(&hidden, &author, "gone with the post").unwrap();
        PostRepository::new(db.pool.clone()).set_active(&hidden, false).unwrap();

        let feed = FeedComposer::new(db.pool.clone());
        let q = PageQuery { page: Some("2".to_string()), page_size: Some("2".to_string()) };
        let page = feed.comments(&shown, &q).unwrap();
        assert_eq!(page.window.total, 3);
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.items[0].content, "note 2");

        assert_eq!(feed.all_comments(&PageQuery::first()).unwrap().window.total, 3);
        assert!(matches!(
            feed.comments(&hidden, &PageQuery::first()),
            Err(DomainError::NotFound(_))
        ));
    }
}
