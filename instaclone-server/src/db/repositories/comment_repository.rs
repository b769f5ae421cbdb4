use anyhow::{Context, Result};
use rusqlite::OptionalExtension;
use uuid::Uuid;

use instaclone_types::Comment;

use crate::db::query::{self, active_comments, active_posts, comment_from_row, comment_select};
use crate::db::DbPool;

pub struct CommentRepository {
    pool: DbPool,
}

impl CommentRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn create(&self, post_id: &Uuid, user_id: &Uuid, content: &str) -> Result<Comment> {
        let conn = self.pool.get()?;
        let id = Uuid::new_v4();
        let now = query::now();
        conn.execute(
            "INSERT INTO comments (id, post_id, user_id, content, is_active, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, 1, ?5, ?5)",
            rusqlite::params![
                id.to_string(),
                post_id.to_string(),
                user_id.to_string(),
                content,
                now
            ],
        )
        .context("Failed to create comment")?;

        let comment = conn
            .query_row(
                &format!("{} WHERE c.id = ?", comment_select()),
                [id.to_string()],
                comment_from_row,
            )
            .context("Failed to load created comment")?;
        Ok(comment)
    }

    /// Active comment on an active post
    pub fn get_active(&self, comment_id: &Uuid) -> Result<Option<Comment>> {
        let conn = self.pool.get()?;
        let comment = conn
            .query_row(
                &format!(
                    "{} JOIN posts p ON p.id = c.post_id WHERE c.id = ? AND {} AND {}",
                    comment_select(),
                    active_comments("c"),
                    active_posts("p")
                ),
                [comment_id.to_string()],
                comment_from_row,
            )
            .optional()
            .context("Failed to load comment")?;
        Ok(comment)
    }

    /// Full active thread, oldest first
    pub fn list_for_post(&self, post_id: &Uuid) -> Result<Vec<Comment>> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(&format!(
            "{} WHERE c.post_id = ? AND {} ORDER BY c.created_at ASC, c.rowid ASC",
            comment_select(),
            active_comments("c")
        ))?;
        let comments = stmt
            .query_map([post_id.to_string()], comment_from_row)?
            .collect::<Result<Vec<_>, _>>()
            .context("Failed to list comments")?;
        Ok(comments)
    }

    /// Active comments on active posts, optionally limited to one post
    pub fn count_visible(&self, post_id: Option<&Uuid>) -> Result<u64> {
        let conn = self.pool.get()?;
        let count: i64 = conn
            .query_row(
                &format!(
                    "SELECT COUNT(*) FROM comments c JOIN posts p ON p.id = c.post_id
                     WHERE {} AND {} AND (?1 IS NULL OR c.post_id = ?1)",
                    active_comments("c"),
                    active_posts("p")
                ),
                [post_id.map(|id| id.to_string())],
                |row| row.get(0),
            )
            .context("Failed to count comments")?;
        Ok(count as u64)
    }

    /// A page of visible comments, oldest first
    pub fn list_visible(&self, post_id: Option<&Uuid>, limit: i64, offset: i64) -> Result<Vec<Comment>> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(&format!(
            "{} JOIN posts p ON p.id = c.post_id
             WHERE {} AND {} AND (?1 IS NULL OR c.post_id = ?1)
             ORDER BY c.created_at ASC, c.rowid ASC
             LIMIT ?2 OFFSET ?3",
            comment_select(),
            active_comments("c"),
            active_posts("p")
        ))?;
        let comments = stmt
            .query_map(
                rusqlite::params![post_id.map(|id| id.to_string()), limit, offset],
                comment_from_row,
            )?
            .collect::<Result<Vec<_>, _>>()
            .context("Failed to list comments")?;
        Ok(comments)
    }

    /// Newest `limit` active comments, newest first
    pub fn recent_for_post(&self, post_id: &Uuid, limit: i64) -> Result<Vec<Comment>> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(&format!(
            "{} WHERE c.post_id = ?1 AND {} ORDER BY c.created_at DESC, c.rowid DESC LIMIT ?2",
            comment_select(),
            active_comments("c")
        ))?;
        let comments = stmt
            .query_map(
                rusqlite::params![post_id.to_string(), limit],
                comment_from_row,
            )?
            .collect::<Result<Vec<_>, _>>()
            .context("Failed to list recent comments")?;
        Ok(comments)
    }

    pub fn update_content(&self, comment_id: &Uuid, content: &str) -> Result<()> {
        let conn = self.pool.get()?;
        conn.execute(
            "UPDATE comments SET content = ?1, updated_at = ?2 WHERE id = ?3",
            rusqlite::params![content, query::now(), comment_id.to_string()],
        )
        .context("Failed to update comment")?;
        Ok(())
    }

    /// Soft delete or restore; returns whether the row exists
    pub fn set_active(&self, comment_id: &Uuid, active: bool) -> Result<bool> {
        let conn = self.pool.get()?;
        let rows = conn
            .execute(
                "UPDATE comments SET is_active = ?1, updated_at = ?2 WHERE id = ?3",
                rusqlite::params![active, query::now(), comment_id.to_string()],
            )
            .context("Failed to change comment visibility")?;
        Ok(rows > 0)
    }

    /// Rows for a post including moderated ones
    pub fn count_all_for_post(&self, post_id: &Uuid) -> Result<i64> {
        let conn = self.pool.get()?;
        let count = conn
            .query_row(
                "SELECT COUNT(*) FROM comments WHERE post_id = ?",
                [post_id.to_string()],
                |row| row.get(0),
            )
            .context("Failed to count comments")?;
        Ok(count)
    }
}
