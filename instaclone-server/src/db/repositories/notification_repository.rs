use anyhow::{anyhow, Context, Result};
use rusqlite::Row;
use uuid::Uuid;

use instaclone_types::{Notification, NotificationKind, NotificationTarget};

use crate::db::query::{self, USER_SUMMARY_COLUMNS};
use crate::db::DbPool;

/// Maximum stored message length
pub const MAX_MESSAGE_LEN: usize = 255;

fn target_columns(target: &NotificationTarget) -> (Option<String>, Option<String>) {
    match target {
        NotificationTarget::Like { post_id } => (Some(post_id.to_string()), None),
        NotificationTarget::Comment { comment_id } | NotificationTarget::Mention { comment_id } => {
            (None, Some(comment_id.to_string()))
        }
        NotificationTarget::Follow => (None, None),
    }
}

fn notification_from_row(row: &Row) -> rusqlite::Result<Notification> {
    let kind_raw: String = row.get(2)?;
    let kind = NotificationKind::parse(&kind_raw).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            2,
            rusqlite::types::Type::Text,
            anyhow!("unknown notification kind {}", kind_raw).into(),
        )
    })?;
    let post_id: Option<String> = row.get(4)?;
    let comment_id: Option<String> = row.get(5)?;
    let parse = |raw: Option<String>, idx: usize| -> rusqlite::Result<Uuid> {
        let raw = raw.ok_or(rusqlite::Error::InvalidColumnType(
            idx,
            "target".to_string(),
            rusqlite::types::Type::Null,
        ))?;
        Uuid::parse_str(&raw).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
        })
    };

    let target = match kind {
        NotificationKind::Like => NotificationTarget::Like {
            post_id: parse(post_id, 4)?,
        },
        NotificationKind::Comment => NotificationTarget::Comment {
            comment_id: parse(comment_id, 5)?,
        },
        NotificationKind::Mention => NotificationTarget::Mention {
            comment_id: parse(comment_id, 5)?,
        },
        NotificationKind::Follow => NotificationTarget::Follow,
    };

    Ok(Notification {
        id: query::uuid_at(row, 0)?,
        recipient_id: query::uuid_at(row, 1)?,
        notification_type: kind,
        message: row.get(3)?,
        target,
        is_read: row.get(6)?,
        created_at: query::datetime_at(row, 7)?,
        sender: query::user_summary_at(row, 8)?,
    })
}

pub struct NotificationRepository {
    pool: DbPool,
}

impl NotificationRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn create(
        &self,
        recipient_id: &Uuid,
        sender_id: &Uuid,
        target: &NotificationTarget,
        message: &str,
    ) -> Result<Uuid> {
        let conn = self.pool.get()?;
        let id = Uuid::new_v4();
        let message: String = message.chars().take(MAX_MESSAGE_LEN).collect();
        let (post_id, comment_id) = target_columns(target);
        conn.execute(
            "INSERT INTO notifications (id, recipient_id, sender_id, kind, message, post_id, comment_id, is_read, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, 0, ?8)",
            rusqlite::params![
                id.to_string(),
                recipient_id.to_string(),
                sender_id.to_string(),
                target.kind().as_str(),
                message,
                post_id,
                comment_id,
                query::now(),
            ],
        )
        .context("Failed to create notification")?;
        Ok(id)
    }

    /// A page of the recipient's notifications, newest first
    pub fn list_for(&self, recipient_id: &Uuid, limit: i64, offset: i64) -> Result<Vec<Notification>> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT n.id, n.recipient_id, n.kind, n.message, n.post_id, n.comment_id, n.is_read, n.created_at,
                    {}
             FROM notifications n
             JOIN users u ON u.id = n.sender_id
             LEFT JOIN profiles pr ON pr.user_id = u.id
             WHERE n.recipient_id = ?1
             ORDER BY n.created_at DESC, n.rowid DESC
             LIMIT ?2 OFFSET ?3",
            USER_SUMMARY_COLUMNS
        ))?;
        let notifications = stmt
            .query_map(
                rusqlite::params![recipient_id.to_string(), limit, offset],
                notification_from_row,
            )?
            .collect::<Result<Vec<_>, _>>()
            .context("Failed to list notifications")?;
        Ok(notifications)
    }

    pub fn count_for(&self, recipient_id: &Uuid) -> Result<u64> {
        let conn = self.pool.get()?;
        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM notifications WHERE recipient_id = ?",
                [recipient_id.to_string()],
                |row| row.get(0),
            )
            .context("Failed to count notifications")?;
        Ok(count as u64)
    }

    pub fn unread_count(&self, recipient_id: &Uuid) -> Result<i64> {
        let conn = self.pool.get()?;
        let count = conn
            .query_row(
                "SELECT COUNT(*) FROM notifications WHERE recipient_id = ? AND is_read = 0",
                [recipient_id.to_string()],
                |row| row.get(0),
            )
            .context("Failed to count unread notifications")?;
        Ok(count)
    }

    /// Mark one notification read; returns whether it belongs to the recipient
    pub fn mark_read(&self, notification_id: &Uuid, recipient_id: &Uuid) -> Result<bool> {
        let conn = self.pool.get()?;
        let rows = conn
            .execute(
                "UPDATE notifications SET is_read = 1 WHERE id = ?1 AND recipient_id = ?2",
                [notification_id.to_string(), recipient_id.to_string()],
            )
            .context("Failed to mark notification read")?;
        Ok(rows > 0)
    }

    /// Returns the number of notifications that changed state
    pub fn mark_all_read(&self, recipient_id: &Uuid) -> Result<usize> {
        let conn = self.pool.get()?;
        let rows = conn
            .execute(
                "UPDATE notifications SET is_read = 1 WHERE recipient_id = ? AND is_read = 0",
                [recipient_id.to_string()],
            )
            .context("Failed to mark notifications read")?;
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;

    const ALICE: &str = "550e8400-e29b-41d4-a716-446655440001";
    const BOB: &str = "550e8400-e29b-41d4-a716-446655440002";
    const SUNRISE: &str = "650e8400-e29b-41d4-a716-446655440001";

    fn id(raw: &str) -> Uuid {
        Uuid::parse_str(raw).unwrap()
    }

    fn setup() -> NotificationRepository {
        let db = Database::in_memory().unwrap();
        db.initialize().unwrap();
        db.seed_demo_data().unwrap();
        NotificationRepository::new(db.pool)
    }

    #[test]
    fn test_targets_round_trip_through_store() {
        let repo = setup();
        let like = NotificationTarget::Like { post_id: id(SUNRISE) };
        repo.create(&id(ALICE), &id(BOB), &like, "bob liked your post").unwrap();
        repo.create(&id(ALICE), &id(BOB), &NotificationTarget::Follow, "bob started following you")
            .unwrap();

        let listed = repo.list_for(&id(ALICE), 20, 0).unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].target, NotificationTarget::Follow);
        assert_eq!(listed[1].target, like);
        assert_eq!(listed[1].sender.username, "bob");
    }

    #[test]
    fn test_read_state() {
        let repo = setup();
        let first = repo
            .create(&id(ALICE), &id(BOB), &NotificationTarget::Follow, "one")
            .unwrap();
        repo.create(&id(ALICE), &id(BOB), &NotificationTarget::Follow, "two")
            .unwrap();
        assert_eq!(repo.unread_count(&id(ALICE)).unwrap(), 2);

        // only the recipient can mark it
        assert!(!repo.mark_read(&first, &id(BOB)).unwrap());
        assert!(repo.mark_read(&first, &id(ALICE)).unwrap());
        assert!(repo.mark_read(&first, &id(ALICE)).unwrap());
        assert_eq!(repo.unread_count(&id(ALICE)).unwrap(), 1);

        assert_eq!(repo.mark_all_read(&id(ALICE)).unwrap(), 1);
        assert_eq!(repo.unread_count(&id(ALICE)).unwrap(), 0);
    }

    #[test]
    fn test_long_message_is_truncated() {
        let repo = setup();
        let long = "x".repeat(400);
        repo.create(&id(ALICE), &id(BOB), &NotificationTarget::Follow, &long)
            .unwrap();
        let listed = repo.list_for(&id(ALICE), 20, 0).unwrap();
        assert_eq!(listed[0].message.len(), MAX_MESSAGE_LEN);
    }
}
