use anyhow::{Context, Result};
use uuid::Uuid;

use super::Insertion;
use crate::db::query;
use crate::db::DbPool;

pub struct LikeRepository {
    pool: DbPool,
}

impl LikeRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn exists(&self, user_id: &Uuid, post_id: &Uuid) -> Result<bool> {
        let conn = self.pool.get()?;
        let exists: bool = conn
            .query_row(
                "SELECT EXISTS(SELECT 1 FROM post_likes WHERE post_id = ?1 AND user_id = ?2)",
                [post_id.to_string(), user_id.to_string()],
                |row| row.get(0),
            )
            .context("Failed to check like")?;
        Ok(exists)
    }

    /// Insert the pair; a duplicate reported by the store is not an error
    pub fn insert(&self, user_id: &Uuid, post_id: &Uuid) -> Result<Insertion> {
        let conn = self.pool.get()?;
        match conn.execute(
            "INSERT INTO post_likes (post_id, user_id, created_at) VALUES (?1, ?2, ?3)",
            [post_id.to_string(), user_id.to_string(), query::now()],
        ) {
            Ok(_) => Ok(Insertion::Created),
            Err(e) if query::is_unique_violation(&e) => {
                tracing::debug!("Like by {} on {} already present", user_id, post_id);
                Ok(Insertion::AlreadyPresent)
            }
            Err(e) => Err(e).context("Failed to like post"),
        }
    }

    /// Returns the number of rows removed
    pub fn delete(&self, user_id: &Uuid, post_id: &Uuid) -> Result<usize> {
        let conn = self.pool.get()?;
        let rows = conn
            .execute(
                "DELETE FROM post_likes WHERE post_id = ?1 AND user_id = ?2",
                [post_id.to_string(), user_id.to_string()],
            )
            .context("Failed to unlike post")?;
        Ok(rows)
    }

    pub fn count_for_post(&self, post_id: &Uuid) -> Result<i64> {
        let conn = self.pool.get()?;
        let count = conn
            .query_row(
                "SELECT COUNT(*) FROM post_likes WHERE post_id = ?",
                [post_id.to_string()],
                |row| row.get(0),
            )
            .context("Failed to count likes")?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;

    const RIDGE: &str = "650e8400-e29b-41d4-a716-446655440003";
    const ALICE: &str = "550e8400-e29b-41d4-a716-446655440001";
    const BOB: &str = "550e8400-e29b-41d4-a716-446655440002";

    fn id(raw: &str) -> Uuid {
        Uuid::parse_str(raw).unwrap()
    }

    fn setup() -> LikeRepository {
        let db = Database::in_memory().unwrap();
        db.initialize().unwrap();
        db.seed_demo_data().unwrap();
        LikeRepository::new(db.pool)
    }

    #[test]
    fn test_duplicate_insert_reports_present() {
        let repo = setup();
        // alice already likes the ridge post
        assert!(repo.exists(&id(ALICE), &id(RIDGE)).unwrap());
        assert_eq!(
            repo.insert(&id(ALICE), &id(RIDGE)).unwrap(),
            Insertion::AlreadyPresent
        );
        assert_eq!(repo.count_for_post(&id(RIDGE)).unwrap(), 1);
    }

    #[test]
    fn test_insert_then_delete() {
        let repo = setup();
        assert_eq!(repo.insert(&id(BOB), &id(RIDGE)).unwrap(), Insertion::Created);
        assert_eq!(repo.count_for_post(&id(RIDGE)).unwrap(), 2);
        assert_eq!(repo.delete(&id(BOB), &id(RIDGE)).unwrap(), 1);
        assert_eq!(repo.delete(&id(BOB), &id(RIDGE)).unwrap(), 0);
    }
}
