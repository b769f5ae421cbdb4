//! Shared SQL fragments and row conversions.
//!
//! Every read path that lists or counts posts and comments goes through the
//! `active_*` predicates below so soft-deleted rows are filtered uniformly.

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use rusqlite::{ffi, types::Type, ErrorCode, Row};
use uuid::Uuid;

use instaclone_types::{Comment, Post, UserSummary};

/// Predicate selecting visible posts for the given table alias
pub fn active_posts(alias: &str) -> String {
    format!("{}.is_active = 1", alias)
}

/// Predicate selecting visible comments for the given table alias
pub fn active_comments(alias: &str) -> String {
    format!("{}.is_active = 1", alias)
}

/// Fixed-width timestamp so string order equals chronological order
pub fn timestamp(at: &DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn now() -> String {
    timestamp(&Utc::now())
}

fn conversion_error<E>(idx: usize, err: E) -> rusqlite::Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(err))
}

pub fn uuid_at(row: &Row, idx: usize) -> rusqlite::Result<Uuid> {
    let raw: String = row.get(idx)?;
    Uuid::parse_str(&raw).map_err(|e| conversion_error(idx, e))
}

pub fn datetime_at(row: &Row, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| conversion_error(idx, e))
}

pub fn date_at(row: &Row, idx: usize) -> rusqlite::Result<Option<NaiveDate>> {
    let raw: Option<String> = row.get(idx)?;
    match raw.filter(|s| !s.is_empty()) {
        Some(s) => NaiveDate::parse_from_str(&s, "%Y-%m-%d")
            .map(Some)
            .map_err(|e| conversion_error(idx, e)),
        None => Ok(None),
    }
}

/// True when the store rejected a duplicate UNIQUE / PRIMARY KEY value
pub fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _)
            if e.code == ErrorCode::ConstraintViolation
                && (e.extended_code == ffi::SQLITE_CONSTRAINT_UNIQUE
                    || e.extended_code == ffi::SQLITE_CONSTRAINT_PRIMARYKEY)
    )
}

/// Columns for a [`UserSummary`]: `u` is users, `pr` is profiles
pub const USER_SUMMARY_COLUMNS: &str = "u.id, u.username, u.first_name, u.last_name, pr.profile_image";

/// Read a [`UserSummary`] starting at column `start`
pub fn user_summary_at(row: &Row, start: usize) -> rusqlite::Result<UserSummary> {
    Ok(UserSummary {
        id: uuid_at(row, start)?,
        username: row.get(start + 1)?,
        first_name: row.get(start + 2)?,
        last_name: row.get(start + 3)?,
        profile_image: row.get(start + 4)?,
    })
}

/// Post card select. Expects a `:viewer` parameter (empty string when
/// anonymous); callers append WHERE / ORDER BY / LIMIT.
pub fn post_card_select() -> String {
    format!(
        "SELECT p.id, p.image, p.caption, p.created_at, p.updated_at, p.is_active,
                {user},
                (SELECT COUNT(*) FROM post_likes l WHERE l.post_id = p.id) AS total_likes,
                (SELECT COUNT(*) FROM comments c WHERE c.post_id = p.id AND {active_c}) AS total_comments,
                EXISTS(SELECT 1 FROM post_likes l WHERE l.post_id = p.id AND l.user_id = :viewer) AS is_liked
         FROM posts p
         JOIN users u ON u.id = p.user_id
         LEFT JOIN profiles pr ON pr.user_id = u.id",
        user = USER_SUMMARY_COLUMNS,
        active_c = active_comments("c"),
    )
}

pub fn post_card_from_row(row: &Row) -> rusqlite::Result<Post> {
    Ok(Post {
        id: uuid_at(row, 0)?,
        image: row.get(1)?,
        caption: row.get(2)?,
        created_at: datetime_at(row, 3)?,
        updated_at: datetime_at(row, 4)?,
        is_active: row.get(5)?,
        user: user_summary_at(row, 6)?,
        total_likes: row.get(11)?,
        total_comments: row.get(12)?,
        is_liked: row.get(13)?,
        recent_comments: Vec::new(),
        comments: None,
    })
}

/// Comment select; callers append WHERE / ORDER BY
pub fn comment_select() -> String {
    format!(
        "SELECT c.id, c.post_id, c.content, c.created_at, c.updated_at, c.is_active, {user}
         FROM comments c
         JOIN users u ON u.id = c.user_id
         LEFT JOIN profiles pr ON pr.user_id = u.id",
        user = USER_SUMMARY_COLUMNS,
    )
}

pub fn comment_from_row(row: &Row) -> rusqlite::Result<Comment> {
    Ok(Comment {
        id: uuid_at(row, 0)?,
        post_id: uuid_at(row, 1)?,
        content: row.get(2)?,
        created_at: datetime_at(row, 3)?,
        updated_at: datetime_at(row, 4)?,
        is_active: row.get(5)?,
        user: user_summary_at(row, 6)?,
    })
}

/// Viewer parameter value; anonymous viewers match no rows
pub fn viewer_param(viewer: Option<Uuid>) -> String {
    viewer.map(|id| id.to_string()).unwrap_or_default()
}
