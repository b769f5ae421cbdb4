use anyhow::{Context, Result};
use rusqlite::{named_params, OptionalExtension, Row};
use uuid::Uuid;

use instaclone_types::{User, UserSearchResult, UserSummary};

use crate::db::query::{self, USER_SUMMARY_COLUMNS};
use crate::db::DbPool;
use crate::media::DEFAULT_PROFILE_IMAGE;

const USER_COLUMNS: &str = "id, username, email, first_name, last_name, is_active, date_joined";

/// Columns for a [`UserSearchResult`]; expects a `:viewer` parameter
const SEARCH_RESULT_SELECT: &str = "SELECT u.id, u.username, u.first_name, u.last_name, pr.profile_image,
        COALESCE(pr.bio, ''),
        (SELECT COUNT(*) FROM follows f WHERE f.following_id = u.id) AS followers_count,
        EXISTS(SELECT 1 FROM follows f WHERE f.follower_id = :viewer AND f.following_id = u.id)
 FROM users u
 LEFT JOIN profiles pr ON pr.user_id = u.id";

fn user_from_row(row: &Row) -> rusqlite::Result<User> {
    Ok(User {
        id: query::uuid_at(row, 0)?,
        username: row.get(1)?,
        email: row.get(2)?,
        first_name: row.get(3)?,
        last_name: row.get(4)?,
        is_active: row.get(5)?,
        date_joined: query::datetime_at(row, 6)?,
    })
}

fn search_result_from_row(row: &Row) -> rusqlite::Result<UserSearchResult> {
    Ok(UserSearchResult {
        id: query::uuid_at(row, 0)?,
        username: row.get(1)?,
        first_name: row.get(2)?,
        last_name: row.get(3)?,
        profile_image: row.get(4)?,
        bio: row.get(5)?,
        followers_count: row.get(6)?,
        is_following: row.get(7)?,
    })
}

/// Account fields for a new user
#[derive(Debug, Clone)]
pub struct NewUser<'a> {
    pub username: &'a str,
    pub email: &'a str,
    pub first_name: &'a str,
    pub last_name: &'a str,
    pub password_hash: &'a str,
}

pub struct UserRepository {
    pool: DbPool,
}

impl UserRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Create a user together with its profile in one transaction
    pub fn create_with_profile(&self, new_user: &NewUser) -> Result<User> {
        let mut conn = self.pool.get()?;
        let tx = conn.transaction()?;
        let id = Uuid::new_v4();
        let now = query::now();

        tx.execute(
            "INSERT INTO users (id, username, email, first_name, last_name, password_hash, is_active, date_joined)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, 1, ?7)",
            rusqlite::params![
                id.to_string(),
                new_user.username,
                new_user.email,
                new_user.first_name,
                new_user.last_name,
                new_user.password_hash,
                now,
            ],
        )
        .context("Failed to create user")?;
        tx.execute(
            "INSERT INTO profiles (user_id, profile_image, created_at, updated_at) VALUES (?1, ?2, ?3, ?3)",
            rusqlite::params![id.to_string(), DEFAULT_PROFILE_IMAGE, now],
        )
        .context("Failed to create profile")?;

        let user = tx
            .query_row(
                &format!("SELECT {} FROM users WHERE id = ?", USER_COLUMNS),
                [id.to_string()],
                user_from_row,
            )
            .context("Failed to load created user")?;
        tx.commit().context("Failed to commit new user")?;

        tracing::info!("Created user {} ({})", user.username, user.id);
        Ok(user)
    }

    /// Get user by ID
    pub fn get_by_id(&self, user_id: &Uuid) -> Result<Option<User>> {
        let conn = self.pool.get()?;
        let user = conn
            .query_row(
                &format!("SELECT {} FROM users WHERE id = ?", USER_COLUMNS),
                [user_id.to_string()],
                user_from_row,
            )
            .optional()
            .context("Failed to load user")?;
        Ok(user)
    }

    /// Get user by username (exact match)
    pub fn get_by_username(&self, username: &str) -> Result<Option<User>> {
        let conn = self.pool.get()?;
        let user = conn
            .query_row(
                &format!("SELECT {} FROM users WHERE username = ?", USER_COLUMNS),
                [username],
                user_from_row,
            )
            .optional()
            .context("Failed to load user by username")?;
        Ok(user)
    }

    /// User together with the stored password hash, for login
    pub fn get_credentials(&self, username: &str) -> Result<Option<(User, String)>> {
        let conn = self.pool.get()?;
        let found = conn
            .query_row(
                &format!(
                    "SELECT {}, password_hash FROM users WHERE username = ?",
                    USER_COLUMNS
                ),
                [username],
                |row| Ok((user_from_row(row)?, row.get::<_, String>(7)?)),
            )
            .optional()
            .context("Failed to load credentials")?;
        Ok(found)
    }

    pub fn get_password_hash(&self, user_id: &Uuid) -> Result<Option<String>> {
        let conn = self.pool.get()?;
        let hash = conn
            .query_row(
                "SELECT password_hash FROM users WHERE id = ?",
                [user_id.to_string()],
                |row| row.get(0),
            )
            .optional()
            .context("Failed to load password hash")?;
        Ok(hash)
    }

    pub fn set_password_hash(&self, user_id: &Uuid, hash: &str) -> Result<()> {
        let conn = self.pool.get()?;
        conn.execute(
            "UPDATE users SET password_hash = ?1 WHERE id = ?2",
            [hash, &user_id.to_string()],
        )
        .context("Failed to update password")?;
        Ok(())
    }

    /// Case-insensitive username check
    pub fn username_taken(&self, username: &str) -> Result<bool> {
        let conn = self.pool.get()?;
        let taken: bool = conn
            .query_row(
                "SELECT EXISTS(SELECT 1 FROM users WHERE LOWER(username) = LOWER(?))",
                [username],
                |row| row.get(0),
            )
            .context("Failed to check username")?;
        Ok(taken)
    }

    /// Case-insensitive email check, optionally ignoring one user
    pub fn email_taken(&self, email: &str, except: Option<&Uuid>) -> Result<bool> {
        let conn = self.pool.get()?;
        let except = except.map(|id| id.to_string()).unwrap_or_default();
        let taken: bool = conn
            .query_row(
                "SELECT EXISTS(SELECT 1 FROM users WHERE LOWER(email) = LOWER(?1) AND id <> ?2)",
                [email, &except],
                |row| row.get(0),
            )
            .context("Failed to check email")?;
        Ok(taken)
    }

    pub fn update_account(
        &self,
        user_id: &Uuid,
        first_name: &str,
        last_name: &str,
        email: &str,
    ) -> Result<()> {
        let conn = self.pool.get()?;
        conn.execute(
            "UPDATE users SET first_name = ?1, last_name = ?2, email = ?3 WHERE id = ?4",
            [first_name, last_name, email, &user_id.to_string()],
        )
        .context("Failed to update account")?;
        Ok(())
    }

    pub fn get_summary(&self, user_id: &Uuid) -> Result<Option<UserSummary>> {
        let conn = self.pool.get()?;
        let summary = conn
            .query_row(
                &format!(
                    "SELECT {} FROM users u LEFT JOIN profiles pr ON pr.user_id = u.id WHERE u.id = ?",
                    USER_SUMMARY_COLUMNS
                ),
                [user_id.to_string()],
                |row| query::user_summary_at(row, 0),
            )
            .optional()
            .context("Failed to load user summary")?;
        Ok(summary)
    }

    /// Active users whose username, first or last name contains `needle`
    pub fn search_people(
        &self,
        needle: &str,
        viewer: Option<Uuid>,
        limit: i64,
    ) -> Result<Vec<UserSearchResult>> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(&format!(
            "{} WHERE u.is_active = 1
               AND (INSTR(LOWER(u.username), LOWER(:q)) > 0
                    OR INSTR(LOWER(u.first_name), LOWER(:q)) > 0
                    OR INSTR(LOWER(u.last_name), LOWER(:q)) > 0)
             ORDER BY u.username
             LIMIT :limit",
            SEARCH_RESULT_SELECT
        ))?;
        let results = stmt
            .query_map(
                named_params! {
                    ":q": needle,
                    ":viewer": query::viewer_param(viewer),
                    ":limit": limit,
                },
                search_result_from_row,
            )?
            .collect::<Result<Vec<_>, _>>()
            .context("Failed to search users")?;
        Ok(results)
    }

    pub fn count_by_username(&self, needle: &str) -> Result<u64> {
        let conn = self.pool.get()?;
        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM users u
                 WHERE u.is_active = 1 AND INSTR(LOWER(u.username), LOWER(?)) > 0",
                [needle],
                |row| row.get(0),
            )
            .context("Failed to count users")?;
        Ok(count as u64)
    }

    /// Username-only search, ordered by username
    pub fn search_by_username(
        &self,
        needle: &str,
        viewer: Option<Uuid>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<UserSearchResult>> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(&format!(
            "{} WHERE u.is_active = 1 AND INSTR(LOWER(u.username), LOWER(:q)) > 0
             ORDER BY u.username
             LIMIT :limit OFFSET :offset",
            SEARCH_RESULT_SELECT
        ))?;
        let results = stmt
            .query_map(
                named_params! {
                    ":q": needle,
                    ":viewer": query::viewer_param(viewer),
                    ":limit": limit,
                    ":offset": offset,
                },
                search_result_from_row,
            )?
            .collect::<Result<Vec<_>, _>>()
            .context("Failed to search users by username")?;
        Ok(results)
    }

    /// Users the viewer does not follow yet, most-followed first
    pub fn suggested_for(&self, viewer: &Uuid, limit: i64) -> Result<Vec<UserSearchResult>> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(&format!(
            "{} WHERE u.is_active = 1
               AND u.id <> :viewer
               AND u.id NOT IN (SELECT following_id FROM follows WHERE follower_id = :viewer)
             ORDER BY followers_count DESC, u.username
             LIMIT :limit",
            SEARCH_RESULT_SELECT
        ))?;
        let results = stmt
            .query_map(
                named_params! {
                    ":viewer": viewer.to_string(),
                    ":limit": limit,
                },
                search_result_from_row,
            )?
            .collect::<Result<Vec<_>, _>>()
            .context("Failed to load suggested users")?;
        Ok(results)
    }

    pub fn count_all(&self) -> Result<i64> {
        let conn = self.pool.get()?;
        let count = conn
            .query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))
            .context("Failed to count users")?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;

    fn setup() -> UserRepository {
        let db = Database::in_memory().unwrap();
        db.initialize().unwrap();
        db.seed_demo_data().unwrap();
        UserRepository::new(db.pool)
    }

    fn new_user<'a>(username: &'a str, email: &'a str) -> NewUser<'a> {
        NewUser {
            username,
            email,
            first_name: "",
            last_name: "",
            password_hash: "!",
        }
    }

    #[test]
    fn test_create_with_profile() {
        let repo = setup();
        let user = repo
            .create_with_profile(&new_user("erin", "erin@example.com"))
            .unwrap();

        assert_eq!(user.username, "erin");
        assert!(user.is_active);
        let summary = repo.get_summary(&user.id).unwrap().unwrap();
        assert_eq!(summary.profile_image.as_deref(), Some(DEFAULT_PROFILE_IMAGE));
    }

    #[test]
    fn test_duplicate_username_rejected_by_store() {
        let repo = setup();
        assert!(repo
            .create_with_profile(&new_user("alice", "other@example.com"))
            .is_err());
        // the failed transaction leaves no orphan profile behind
        assert_eq!(repo.count_all().unwrap(), 4);
    }

    #[test]
    fn test_taken_checks_are_case_insensitive() {
        let repo = setup();
        assert!(repo.username_taken("ALICE").unwrap());
        assert!(repo.email_taken("Bob@Example.com", None).unwrap());

        let bob = repo.get_by_username("bob").unwrap().unwrap();
        assert!(!repo.email_taken("bob@example.com", Some(&bob.id)).unwrap());
    }

    #[test]
    fn test_search_people_matches_names() {
        let repo = setup();
        let results = repo.search_people("PRINCE", None, 10).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].username, "diana");

        let results = repo.search_people("li", None, 10).unwrap();
        let names: Vec<_> = results.iter().map(|r| r.username.as_str()).collect();
        assert_eq!(names, vec!["alice", "charlie"]);
    }

    #[test]
    fn test_suggested_excludes_self_and_followed() {
        let repo = setup();
        let alice = repo.get_by_username("alice").unwrap().unwrap();
        let suggested = repo.suggested_for(&alice.id, 20).unwrap();
        let names: Vec<_> = suggested.iter().map(|r| r.username.as_str()).collect();

        // alice follows bob
        assert_eq!(names, vec!["charlie", "diana"]);
    }
}
