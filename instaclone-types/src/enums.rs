use serde::{Deserialize, Serialize};

/// Kind of event a notification reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Like,
    Comment,
    Follow,
    Mention,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::Like => "like",
            NotificationKind::Comment => "comment",
            NotificationKind::Follow => "follow",
            NotificationKind::Mention => "mention",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "like" => Some(NotificationKind::Like),
            "comment" => Some(NotificationKind::Comment),
            "follow" => Some(NotificationKind::Follow),
            "mention" => Some(NotificationKind::Mention),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notification_kind_parse() {
        assert_eq!(NotificationKind::parse("like"), Some(NotificationKind::Like));
        assert_eq!(NotificationKind::parse("FOLLOW"), Some(NotificationKind::Follow));
        assert_eq!(NotificationKind::parse("share"), None);
    }

    #[test]
    fn test_notification_kind_serializes_lowercase() {
        let json = serde_json::to_string(&NotificationKind::Mention).unwrap();
        assert_eq!(json, "\"mention\"");
    }
}
