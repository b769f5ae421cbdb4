use anyhow::{Context, Result};
use rusqlite::OptionalExtension;
use uuid::Uuid;

use instaclone_types::{Follow, UserSummary};

use super::Insertion;
use crate::db::query::{self, USER_SUMMARY_COLUMNS};
use crate::db::DbPool;

const FOLLOW_SELECT: &str = "SELECT f.id, f.created_at,
        a.id, a.username, a.first_name, a.last_name, ap.profile_image,
        b.id, b.username, b.first_name, b.last_name, bp.profile_image
 FROM follows f
 JOIN users a ON a.id = f.follower_id
 LEFT JOIN profiles ap ON ap.user_id = a.id
 JOIN users b ON b.id = f.following_id
 LEFT JOIN profiles bp ON bp.user_id = b.id";

fn follow_from_row(row: &rusqlite::Row) -> rusqlite::Result<Follow> {
    Ok(Follow {
        id: query::uuid_at(row, 0)?,
        created_at: query::datetime_at(row, 1)?,
        follower: query::user_summary_at(row, 2)?,
        following: query::user_summary_at(row, 7)?,
    })
}

pub struct FollowRepository {
    pool: DbPool,
}

impl FollowRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Check if `follower_id` follows `following_id`
    pub fn is_following(&self, follower_id: &Uuid, following_id: &Uuid) -> Result<bool> {
        let conn = self.pool.get()?;
        let exists: bool = conn
            .query_row(
                "SELECT EXISTS(SELECT 1 FROM follows WHERE follower_id = ?1 AND following_id = ?2)",
                [follower_id.to_string(), following_id.to_string()],
                |row| row.get(0),
            )
            .context("Failed to check follow")?;
        Ok(exists)
    }

    /// Create the edge; a duplicate reported by the store is not an error
    pub fn insert(&self, follower_id: &Uuid, following_id: &Uuid) -> Result<Insertion> {
        let conn = self.pool.get()?;
        match conn.execute(
            "INSERT INTO follows (id, follower_id, following_id, created_at) VALUES (?1, ?2, ?3, ?4)",
            [
                Uuid::new_v4().to_string(),
                follower_id.to_string(),
                following_id.to_string(),
                query::now(),
            ],
        ) {
            Ok(_) => Ok(Insertion::Created),
            Err(e) if query::is_unique_violation(&e) => {
                tracing::debug!("Follow {} -> {} already present", follower_id, following_id);
                Ok(Insertion::AlreadyPresent)
            }
            Err(e) => Err(e).context("Failed to follow user"),
        }
    }

    /// Returns the number of rows removed
    pub fn delete(&self, follower_id: &Uuid, following_id: &Uuid) -> Result<usize> {
        let conn = self.pool.get()?;
        let rows = conn
            .execute(
                "DELETE FROM follows WHERE follower_id = ?1 AND following_id = ?2",
                [follower_id.to_string(), following_id.to_string()],
            )
            .context("Failed to unfollow user")?;
        Ok(rows)
    }

    /// The stored edge with both ends expanded
    pub fn get(&self, follower_id: &Uuid, following_id: &Uuid) -> Result<Option<Follow>> {
        let conn = self.pool.get()?;
        let follow = conn
            .query_row(
                &format!("{} WHERE f.follower_id = ?1 AND f.following_id = ?2", FOLLOW_SELECT),
                [follower_id.to_string(), following_id.to_string()],
                follow_from_row,
            )
            .optional()
            .context("Failed to load follow")?;
        Ok(follow)
    }

    /// Edges created by `follower_id`, newest first
    pub fn list_by_follower(&self, follower_id: &Uuid, limit: i64, offset: i64) -> Result<Vec<Follow>> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(&format!(
            "{} WHERE f.follower_id = ?1 ORDER BY f.created_at DESC, f.rowid DESC LIMIT ?2 OFFSET ?3",
            FOLLOW_SELECT
        ))?;
        let follows = stmt
            .query_map(
                rusqlite::params![follower_id.to_string(), limit, offset],
                follow_from_row,
            )?
            .collect::<Result<Vec<_>, _>>()
            .context("Failed to list follows")?;
        Ok(follows)
    }

    /// Get follower count
    pub fn follower_count(&self, user_id: &Uuid) -> Result<i64> {
        let conn = self.pool.get()?;
        let count = conn
            .query_row(
                "SELECT COUNT(*) FROM follows WHERE following_id = ?",
                [user_id.to_string()],
                |row| row.get(0),
            )
            .context("Failed to count followers")?;
        Ok(count)
    }

    /// Get following count
    pub fn following_count(&self, user_id: &Uuid) -> Result<i64> {
        let conn = self.pool.get()?;
        let count = conn
            .query_row(
                "SELECT COUNT(*) FROM follows WHERE follower_id = ?",
                [user_id.to_string()],
                |row| row.get(0),
            )
            .context("Failed to count following")?;
        Ok(count)
    }

    /// Users following `user_id`, newest edge first
    pub fn list_followers(&self, user_id: &Uuid, limit: i64, offset: i64) -> Result<Vec<UserSummary>> {
        self.list_edges("f.follower_id", "f.following_id", user_id, limit, offset)
    }

    /// Users `user_id` follows, newest edge first
    pub fn list_following(&self, user_id: &Uuid, limit: i64, offset: i64) -> Result<Vec<UserSummary>> {
        self.list_edges("f.following_id", "f.follower_id", user_id, limit, offset)
    }

    fn list_edges(
        &self,
        other_end: &str,
        this_end: &str,
        user_id: &Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<UserSummary>> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {columns}
             FROM follows f
             JOIN users u ON u.id = {other_end}
             LEFT JOIN profiles pr ON pr.user_id = u.id
             WHERE {this_end} = ?1
             ORDER BY f.created_at DESC, f.rowid DESC
             LIMIT ?2 OFFSET ?3",
            columns = USER_SUMMARY_COLUMNS,
        ))?;
        let users = stmt
            .query_map(
                rusqlite::params![user_id.to_string(), limit, offset],
                |row| query::user_summary_at(row, 0),
            )?
            .collect::<Result<Vec<_>, _>>()
            .context("Failed to list follow edges")?;
        Ok(users)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;

    const ALICE: &str = "550e8400-e29b-41d4-a716-446655440001";
    const BOB: &str = "550e8400-e29b-41d4-a716-446655440002";
    const CHARLIE: &str = "550e8400-e29b-41d4-a716-446655440003";
    const DIANA: &str = "550e8400-e29b-41d4-a716-446655440004";

    fn id(raw: &str) -> Uuid {
        Uuid::parse_str(raw).unwrap()
    }

    fn setup() -> FollowRepository {
        let db = Database::in_memory().unwrap();
        db.initialize().unwrap();
        db.seed_demo_data().unwrap();
        FollowRepository::new(db.pool)
    }

    #[test]
    fn test_follow_round_trip_restores_edges() {
        let repo = setup();
        let before = repo.follower_count(&id(DIANA)).unwrap();

        assert_eq!(repo.insert(&id(ALICE), &id(DIANA)).unwrap(), Insertion::Created);
        assert!(repo.is_following(&id(ALICE), &id(DIANA)).unwrap());
        assert_eq!(repo.delete(&id(ALICE), &id(DIANA)).unwrap(), 1);

        assert!(!repo.is_following(&id(ALICE), &id(DIANA)).unwrap());
        assert_eq!(repo.follower_count(&id(DIANA)).unwrap(), before);
    }

    #[test]
    fn test_duplicate_follow_reports_present() {
        let repo = setup();
        assert_eq!(
            repo.insert(&id(ALICE), &id(BOB)).unwrap(),
            Insertion::AlreadyPresent
        );
    }

    #[test]
    fn test_self_follow_is_an_error() {
        let repo = setup();
        assert!(repo.insert(&id(ALICE), &id(ALICE)).is_err());
    }

    #[test]
    fn test_followers_newest_first() {
        let repo = setup();
        let followers = repo.list_followers(&id(ALICE), 20, 0).unwrap();
        let names: Vec<_> = followers.iter().map(|u| u.username.as_str()).collect();
        assert_eq!(names, vec!["charlie", "bob"]);

        let following = repo.list_following(&id(DIANA), 20, 0).unwrap();
        assert_eq!(following[0].id, id(CHARLIE));
    }

    #[test]
    fn test_get_expands_both_ends() {
        let repo = setup();
        let follow = repo.get(&id(ALICE), &id(BOB)).unwrap().unwrap();
        assert_eq!(follow.follower.username, "alice");
        assert_eq!(follow.following.username, "bob");
    }

    #[test]
    fn test_list_by_follower_only_own_edges() {
        let repo = setup();
        repo.insert(&id(ALICE), &id(DIANA)).unwrap();

        let edges = repo.list_by_follower(&id(ALICE), 20, 0).unwrap();
        let names: Vec<_> = edges.iter().map(|f| f.following.username.as_str()).collect();
        assert_eq!(names, vec!["diana", "bob"]);
        assert!(edges.iter().all(|f| f.follower.id == id(ALICE)));

        assert_eq!(repo.list_by_follower(&id(ALICE), 1, 1).unwrap().len(), 1);
    }
}
