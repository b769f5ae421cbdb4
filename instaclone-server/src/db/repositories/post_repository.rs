use anyhow::{Context, Result};
use rusqlite::{named_params, OptionalExtension};
use uuid::Uuid;

use instaclone_types::Post;

use crate::db::query::{self, active_posts, post_card_from_row, post_card_select};
use crate::db::DbPool;

/// Stored post columns, independent of visibility
#[derive(Debug, Clone, PartialEq)]
pub struct PostRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    pub image: Option<String>,
    pub caption: String,
    pub is_active: bool,
}

/// Ordering for post listings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostOrder {
    /// Newest first
    Recent,
    /// Posts by the viewer or by users the viewer follows first, newest first within each group
    FollowedFirst,
    /// Most liked first, newest first among equal counts
    MostLiked,
}

impl PostOrder {
    fn clause(self) -> &'static str {
        match self {
            PostOrder::Recent => "ORDER BY p.created_at DESC, p.rowid DESC",
            PostOrder::FollowedFirst => {
                "ORDER BY CASE WHEN p.user_id = :viewer
                                 OR p.user_id IN (SELECT following_id FROM follows WHERE follower_id = :viewer)
                               THEN 0 ELSE 1 END,
                          p.created_at DESC, p.rowid DESC"
            }
            PostOrder::MostLiked => "ORDER BY total_likes DESC, p.created_at DESC, p.rowid DESC",
        }
    }
}

pub struct PostRepository {
    pool: DbPool,
}

impl PostRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Insert a new active post and return its id
    pub fn create(&self, user_id: &Uuid, image: Option<&str>, caption: &str) -> Result<Uuid> {
        let conn = self.pool.get()?;
        let id = Uuid::new_v4();
        let now = query::now();
        conn.execute(
            "INSERT INTO posts (id, user_id, image, caption, is_active, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, 1, ?5, ?5)",
            rusqlite::params![id.to_string(), user_id.to_string(), image, caption, now],
        )
        .context("Failed to create post")?;
        Ok(id)
    }

    /// Stored row regardless of `is_active`
    pub fn get_record(&self, post_id: &Uuid) -> Result<Option<PostRecord>> {
        let conn = self.pool.get()?;
        let record = conn
            .query_row(
                "SELECT id, user_id, image, caption, is_active FROM posts WHERE id = ?",
                [post_id.to_string()],
                |row| {
                    Ok(PostRecord {
                        id: query::uuid_at(row, 0)?,
                        user_id: query::uuid_at(row, 1)?,
                        image: row.get(2)?,
                        caption: row.get(3)?,
                        is_active: row.get(4)?,
                    })
                },
            )
            .optional()
            .context("Failed to load post")?;
        Ok(record)
    }

    /// Active post card for the viewer, or `None` when missing or soft-deleted
    pub fn get_card(&self, post_id: &Uuid, viewer: Option<Uuid>) -> Result<Option<Post>> {
        let conn = self.pool.get()?;
        let sql = format!(
            "{} WHERE p.id = :id AND {}",
            post_card_select(),
            active_posts("p")
        );
        let post = conn
            .query_row(
                &sql,
                named_params! {
                    ":id": post_id.to_string(),
                    ":viewer": query::viewer_param(viewer),
                },
                post_card_from_row,
            )
            .optional()
            .context("Failed to load post card")?;
        Ok(post)
    }

    pub fn is_active(&self, post_id: &Uuid) -> Result<bool> {
        let conn = self.pool.get()?;
        let active: bool = conn
            .query_row(
                &format!(
                    "SELECT EXISTS(SELECT 1 FROM posts p WHERE p.id = ? AND {})",
                    active_posts("p")
                ),
                [post_id.to_string()],
                |row| row.get(0),
            )
            .context("Failed to check post")?;
        Ok(active)
    }

    pub fn count_active(&self) -> Result<u64> {
        let conn = self.pool.get()?;
        let count: i64 = conn
            .query_row(
                &format!("SELECT COUNT(*) FROM posts p WHERE {}", active_posts("p")),
                [],
                |row| row.get(0),
            )
            .context("Failed to count posts")?;
        Ok(count as u64)
    }

    /// A page of all active posts in the given order
    pub fn list_active(
        &self,
        order: PostOrder,
        viewer: Option<Uuid>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Post>> {
        let conn = self.pool.get()?;
        let sql = format!(
            "{} WHERE {} {} LIMIT :limit OFFSET :offset",
            post_card_select(),
            active_posts("p"),
            order.clause()
        );
        let mut stmt = conn.prepare(&sql)?;
        let posts = stmt
            .query_map(
                named_params! {
                    ":viewer": query::viewer_param(viewer),
                    ":limit": limit,
                    ":offset": offset,
                },
                post_card_from_row,
            )?
            .collect::<Result<Vec<_>, _>>()
            .context("Failed to list posts")?;

        tracing::debug!("Listed {} posts ({:?})", posts.len(), order);
        Ok(posts)
    }

    pub fn count_by_user(&self, user_id: &Uuid) -> Result<u64> {
        let conn = self.pool.get()?;
        let count: i64 = conn
            .query_row(
                &format!(
                    "SELECT COUNT(*) FROM posts p WHERE p.user_id = ? AND {}",
                    active_posts("p")
                ),
                [user_id.to_string()],
                |row| row.get(0),
            )
            .context("Failed to count user posts")?;
        Ok(count as u64)
    }

    /// A page of one user's active posts, newest first
    pub fn list_by_user(
        &self,
        user_id: &Uuid,
        viewer: Option<Uuid>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Post>> {
        let conn = self.pool.get()?;
        let sql = format!(
            "{} WHERE p.user_id = :user_id AND {} {} LIMIT :limit OFFSET :offset",
            post_card_select(),
            active_posts("p"),
            PostOrder::Recent.clause()
        );
        let mut stmt = conn.prepare(&sql)?;
        let posts = stmt
            .query_map(
                named_params! {
                    ":user_id": user_id.to_string(),
                    ":viewer": query::viewer_param(viewer),
                    ":limit": limit,
                    ":offset": offset,
                },
                post_card_from_row,
            )?
            .collect::<Result<Vec<_>, _>>()
            .context("Failed to list user posts")?;
        Ok(posts)
    }

    /// Active posts whose caption contains `needle`, newest first
    pub fn search_captions(
        &self,
        needle: &str,
        viewer: Option<Uuid>,
        limit: i64,
    ) -> Result<Vec<Post>> {
        let conn = self.pool.get()?;
        let sql = format!(
            "{} WHERE {} AND INSTR(LOWER(p.caption), LOWER(:q)) > 0 {} LIMIT :limit",
            post_card_select(),
            active_posts("p"),
            PostOrder::Recent.clause()
        );
        let mut stmt = conn.prepare(&sql)?;
        let posts = stmt
            .query_map(
                named_params! {
                    ":q": needle,
                    ":viewer": query::viewer_param(viewer),
                    ":limit": limit,
                },
                post_card_from_row,
            )?
            .collect::<Result<Vec<_>, _>>()
            .context("Failed to search posts")?;
        Ok(posts)
    }

    pub fn update(&self, post_id: &Uuid, image: Option<&str>, caption: &str) -> Result<()> {
        let conn = self.pool.get()?;
        conn.execute(
            "UPDATE posts SET image = ?1, caption = ?2, updated_at = ?3 WHERE id = ?4",
            rusqlite::params![image, caption, query::now(), post_id.to_string()],
        )
        .context("Failed to update post")?;
        Ok(())
    }

    /// Soft delete or restore; returns whether the row exists
    pub fn set_active(&self, post_id: &Uuid, active: bool) -> Result<bool> {
        let conn = self.pool.get()?;
        let rows = conn
            .execute(
                "UPDATE posts SET is_active = ?1, updated_at = ?2 WHERE id = ?3",
                rusqlite::params![active, query::now(), post_id.to_string()],
            )
            .context("Failed to change post visibility")?;
        Ok(rows > 0)
    }

    /// Likes and active comments received on a user's active posts
    pub fn engagement_received(&self, user_id: &Uuid) -> Result<(i64, i64)> {
        let conn = self.pool.get()?;
        let totals = conn
            .query_row(
                &format!(
                    "SELECT
                        (SELECT COUNT(*) FROM post_likes l JOIN posts p ON p.id = l.post_id
                          WHERE p.user_id = ?1 AND {active_p}),
                        (SELECT COUNT(*) FROM comments c JOIN posts p ON p.id = c.post_id
                          WHERE p.user_id = ?1 AND {active_p} AND {active_c})",
                    active_p = active_posts("p"),
                    active_c = query::active_comments("c"),
                ),
                [user_id.to_string()],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .context("Failed to total engagement")?;
        Ok(totals)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;

    const ALICE: &str = "550e8400-e29b-41d4-a716-446655440001";
    const SUNRISE: &str = "650e8400-e29b-41d4-a716-446655440001";
    const DELETED_DRAFT: &str = "650e8400-e29b-41d4-a716-446655440006";

    fn id(raw: &str) -> Uuid {
        Uuid::parse_str(raw).unwrap()
    }

    fn setup() -> PostRepository {
        let db = Database::in_memory().unwrap();
        db.initialize().unwrap();
        db.seed_demo_data().unwrap();
        PostRepository::new(db.pool)
    }

    #[test]
    fn test_card_counts_and_viewer_flag() {
        let repo = setup();
        let bob = id("550e8400-e29b-41d4-a716-446655440002");

        let card = repo.get_card(&id(SUNRISE), Some(bob)).unwrap().unwrap();
        assert_eq!(card.total_likes, 3);
        // the moderated comment is not counted
        assert_eq!(card.total_comments, 2);
        assert!(card.is_liked);
        assert_eq!(card.user.username, "alice");

        let anonymous = repo.get_card(&id(SUNRISE), None).unwrap().unwrap();
        assert!(!anonymous.is_liked);
    }

    #[test]
    fn test_soft_deleted_post_hidden_but_retained() {
        let repo = setup();
        assert!(repo.get_card(&id(DELETED_DRAFT), None).unwrap().is_none());
        assert!(!repo.get_record(&id(DELETED_DRAFT)).unwrap().unwrap().is_active);
        assert_eq!(repo.count_active().unwrap(), 6);
    }

    #[test]
    fn test_most_liked_order() {
        let repo = setup();
        let posts = repo.list_active(PostOrder::MostLiked, None, 3, 0).unwrap();
        let likes: Vec<_> = posts.iter().map(|p| p.total_likes).collect();
        assert_eq!(likes, vec![3, 2, 1]);
    }

    #[test]
    fn test_list_by_user_is_newest_first() {
        let repo = setup();
        let posts = repo.list_by_user(&id(ALICE), None, 12, 0).unwrap();
        assert_eq!(posts.len(), 2);
        assert!(posts[0].created_at > posts[1].created_at);
        assert_eq!(repo.count_by_user(&id(ALICE)).unwrap(), 2);
    }

    #[test]
    fn test_search_captions_case_insensitive() {
        let repo = setup();
        let posts = repo.search_captions("SUNRISE", None, 10).unwrap();
        assert_eq!(posts.len(), 1);
        // soft-deleted captions never match
        assert!(repo.search_captions("draft", None, 10).unwrap().is_empty());
    }

    #[test]
    fn test_engagement_received() {
        let repo = setup();
        // alice: 3 likes on sunrise; 2 + 1 active comments across her posts
        assert_eq!(repo.engagement_received(&id(ALICE)).unwrap(), (3, 3));
    }
}
