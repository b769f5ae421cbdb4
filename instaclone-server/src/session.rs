use crate::db::{query, Database};
use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use rusqlite::OptionalExtension;
use uuid::Uuid;

/// Token pair handed to a client at login
#[derive(Debug, Clone)]
pub struct IssuedTokens {
    pub access: String,
    pub refresh: String,
}

/// Why a token was not accepted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenRejection {
    Unknown,
    Expired,
}

/// Database-backed session manager
///
/// Each session holds a short-lived access token and a longer-lived refresh
/// token:
/// - access tokens authenticate requests (`Authorization: Bearer`)
/// - refresh tokens mint a new access token, retiring the old one
/// - sessions whose refresh token has expired are purged
#[derive(Clone)]
pub struct SessionManager {
    db: Database,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl SessionManager {
    pub fn new(db: Database, access_ttl: Duration, refresh_ttl: Duration) -> Self {
        Self {
            db,
            access_ttl,
            refresh_ttl,
        }
    }

    /// Create a new session for a user
    pub fn create_session(&self, user_id: Uuid) -> Result<IssuedTokens> {
        let access = Uuid::new_v4().to_string();
        let refresh = Uuid::new_v4().to_string();
        let created_at = Utc::now();

        let conn = self.db.connection()?;
        conn.execute(
            "INSERT INTO sessions (access_token, refresh_token, user_id, created_at, access_expires_at, refresh_expires_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            rusqlite::params![
                access,
                refresh,
                user_id.to_string(),
                query::timestamp(&created_at),
                query::timestamp(&(created_at + self.access_ttl)),
                query::timestamp(&(created_at + self.refresh_ttl)),
            ],
        )
        .context("Failed to create session")?;

        tracing::info!("Created session for user {}", user_id);
        Ok(IssuedTokens { access, refresh })
    }

    /// Validate an access token and return the associated user ID
    ///
    /// Expired access tokens are rejected; the session itself stays until its
    /// refresh token expires.
    pub fn validate_access(&self, token: &str) -> Result<std::result::Result<Uuid, TokenRejection>> {
        let row: Option<(String, String, String)> = {
            let conn = self.db.connection()?;
            conn.query_row(
                "SELECT user_id, access_expires_at, refresh_expires_at FROM sessions WHERE access_token = ?1",
                [token],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .optional()
            .context("Failed to look up session")?
        };

        let Some((user_id, access_expires_at, refresh_expires_at)) = row else {
            return Ok(Err(TokenRejection::Unknown));
        };

        let now = Utc::now();
        if now > parse_time(&refresh_expires_at)? {
            self.delete_session(token)?;
            return Ok(Err(TokenRejection::Expired));
        }
        if now > parse_time(&access_expires_at)? {
            return Ok(Err(TokenRejection::Expired));
        }

        let user_id = Uuid::parse_str(&user_id).context("Failed to parse user ID")?;
        Ok(Ok(user_id))
    }

    /// Exchange a refresh token for a fresh access token
    pub fn refresh(&self, refresh_token: &str) -> Result<std::result::Result<String, TokenRejection>> {
        let conn = self.db.connection()?;
        let expires: Option<String> = conn
            .query_row(
                "SELECT refresh_expires_at FROM sessions WHERE refresh_token = ?1",
                [refresh_token],
                |row| row.get(0),
            )
            .optional()
            .context("Failed to look up refresh token")?;

        let Some(expires) = expires else {
            return Ok(Err(TokenRejection::Unknown));
        };
        let now = Utc::now();
        if now > parse_time(&expires)? {
            conn.execute(
                "DELETE FROM sessions WHERE refresh_token = ?1",
                [refresh_token],
            )
            .context("Failed to delete expired session")?;
            return Ok(Err(TokenRejection::Expired));
        }

        let access = Uuid::new_v4().to_string();
        conn.execute(
            "UPDATE sessions SET access_token = ?1, access_expires_at = ?2 WHERE refresh_token = ?3",
            rusqlite::params![
                access,
                query::timestamp(&(now + self.access_ttl)),
                refresh_token
            ],
        )
        .context("Failed to rotate access token")?;

        tracing::debug!("Rotated access token");
        Ok(Ok(access))
    }

    /// Delete a session (logout)
    pub fn delete_session(&self, access_token: &str) -> Result<()> {
        let conn = self.db.connection()?;
        let rows_affected = conn
            .execute(
                "DELETE FROM sessions WHERE access_token = ?1",
                [access_token],
            )
            .context("Failed to delete session")?;

        if rows_affected > 0 {
            tracing::info!("Deleted session");
        }

        Ok(())
    }

    /// Revoke every session of the user except the one using `keep`
    pub fn revoke_other_sessions(&self, user_id: &Uuid, keep: &str) -> Result<usize> {
        let conn = self.db.connection()?;
        let rows_affected = conn
            .execute(
                "DELETE FROM sessions WHERE user_id = ?1 AND access_token <> ?2",
                [user_id.to_string(), keep.to_string()],
            )
            .context("Failed to revoke sessions")?;

        if rows_affected > 0 {
            tracing::info!("Revoked {} other sessions for user {}", rows_affected, user_id);
        }
        Ok(rows_affected)
    }

    /// Remove sessions whose refresh token has expired
    pub fn cleanup_expired_sessions(&self) -> Result<usize> {
        let conn = self.db.connection()?;
        let rows_affected = conn
            .execute(
                "DELETE FROM sessions WHERE refresh_expires_at < ?1",
                [query::now()],
            )
            .context("Failed to cleanup expired sessions")?;

        if rows_affected > 0 {
            tracing::info!("Cleaned up {} expired sessions", rows_affected);
        }

        Ok(rows_affected)
    }
}

fn parse_time(raw: &str) -> Result<DateTime<Utc>> {
    Ok(DateTime::parse_from_rfc3339(raw)
        .context("Failed to parse expiry time")?
        .with_timezone(&Utc))
}
