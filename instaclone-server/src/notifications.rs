//! Best-effort notification side effects.
//!
//! Primary actions (like, comment, follow) call into [`Notifier`] after their
//! own write has completed. Failures are logged and swallowed so they can
//! never undo or fail the action that triggered them. [`Inbox`] is the
//! recipient's read side.

use anyhow::Result;
use uuid::Uuid;

use instaclone_types::{Notification, NotificationTarget};

use crate::db::repositories::{NotificationRepository, ProfileRepository, UserRepository};
use crate::db::DbPool;
use crate::error::{DomainError, DomainResult};
use crate::pagination::{Page, PageQuery, PageSize, PageWindow};

/// What happened to a notification attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Created,
    /// Actor and recipient are the same user
    SkippedSelf,
    /// Recipient turned notifications off
    SkippedPreference,
    /// The store rejected the write; logged and ignored
    Failed,
}

pub fn message_for(sender_username: &str, target: &NotificationTarget) -> String {
    match target {
        NotificationTarget::Like { .. } => format!("{} liked your post", sender_username),
        NotificationTarget::Comment { .. } => format!("{} commented on your post", sender_username),
        NotificationTarget::Follow => format!("{} started following you", sender_username),
        NotificationTarget::Mention { .. } => {
            format!("{} mentioned you in a comment", sender_username)
        }
    }
}

#[derive(Clone)]
pub struct Notifier {
    pool: DbPool,
}

impl Notifier {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Record a notification for `recipient` about an action by `sender`
    pub fn notify(&self, recipient: &Uuid, sender: &Uuid, target: NotificationTarget) -> Delivery {
        if recipient == sender {
            return Delivery::SkippedSelf;
        }

        match self.try_notify(recipient, sender, &target) {
            Ok(delivery) => delivery,
            Err(e) => {
                tracing::warn!(
                    "Failed to create {} notification for {}: {:#}",
                    target.kind().as_str(),
                    recipient,
                    e
                );
                Delivery::Failed
            }
        }
    }

    fn try_notify(
        &self,
        recipient: &Uuid,
        sender: &Uuid,
        target: &NotificationTarget,
    ) -> Result<Delivery> {
        if !ProfileRepository::new(self.pool.clone()).notifications_enabled(recipient)? {
            return Ok(Delivery::SkippedPreference);
        }

        let sender_name = UserRepository::new(self.pool.clone())
            .get_by_id(sender)?
            .map(|u| u.username)
            .unwrap_or_else(|| "Someone".to_string());

        NotificationRepository::new(self.pool.clone()).create(
            recipient,
            sender,
            target,
            &message_for(&sender_name, target),
        )?;

        tracing::debug!("Notified {} ({})", recipient, target.kind().as_str());
        Ok(Delivery::Created)
    }
}

/// A user's own notifications
pub struct Inbox {
    pool: DbPool,
}

impl Inbox {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    fn repo(&self) -> NotificationRepository {
        NotificationRepository::new(self.pool.clone())
    }

    /// Newest first
    pub fn list(&self, recipient: &Uuid, query: &PageQuery) -> DomainResult<Page<Notification>> {
        let repo = self.repo();
        let window = PageWindow::resolve(query, PageSize::Standard, repo.count_for(recipient)?);
        let items = repo.list_for(recipient, window.limit(), window.offset())?;
        Ok(Page { items, window })
    }

    pub fn unread_count(&self, recipient: &Uuid) -> DomainResult<i64> {
        Ok(self.repo().unread_count(recipient)?)
    }

    /// Idempotent; someone else's notification is reported as missing
    pub fn mark_read(&self, recipient: &Uuid, notification_id: &Uuid) -> DomainResult<()> {
        if !self.repo().mark_read(notification_id, recipient)? {
            return Err(DomainError::not_found("Notification not found"));
        }
        Ok(())
    }

    pub fn mark_all_read(&self, recipient: &Uuid) -> DomainResult<usize> {
        let changed = self.repo().mark_all_read(recipient)?;
        tracing::debug!("Marked {} notifications read for {}", changed, recipient);
        Ok(changed)
    }
}
