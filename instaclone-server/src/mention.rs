/// Mention extraction for comments
/// Extracts @username mentions from comment content
use once_cell::sync::Lazy;
use regex::Regex;

// @username preceded by start of text or a non-word character (so email
// addresses do not match). Usernames are 3 to 30 word characters.
static MENTION_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:^|[^@\w])@([a-zA-Z0-9_]{3,30})\b").expect("mention pattern is valid")
});

/// Extract all @username mentions from content
/// Returns unique usernames in order of first appearance, without the @ symbol.
/// Case is preserved because usernames are matched exactly.
pub fn extract_mentions(content: &str) -> Vec<String> {
    let mut mentions: Vec<String> = Vec::new();

    for cap in MENTION_RE.captures_iter(content) {
        if let Some(username) = cap.get(1) {
            let username = username.as_str();
            if !mentions.iter().any(|m| m.eq_ignore_ascii_case(username)) {
                mentions.push(username.to_string());
            }
        }
    }

    mentions
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_mentions() {
        assert_eq!(
            extract_mentions("Hey @alice, what do you think?"),
            vec!["alice"]
        );

        assert_eq!(
            extract_mentions("@bob and @charlie are both right"),
            vec!["bob", "charlie"]
        );

        assert_eq!(extract_mentions("No mentions here"), Vec::<String>::new());

        // Duplicate mentions should only appear once
        assert_eq!(extract_mentions("@alice @bob @Alice"), vec!["alice", "bob"]);

        // Should not match email addresses
        assert_eq!(
            extract_mentions("Email me at test@example.com"),
            Vec::<String>::new()
        );
    }

    #[test]
    fn test_too_short_handles_are_ignored() {
        assert_eq!(extract_mentions("@al @ok_name"), vec!["ok_name"]);
    }
}
