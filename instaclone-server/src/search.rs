//! Combined people and caption search.

use uuid::Uuid;

use instaclone_types::SearchResults;

use crate::db::repositories::{PostRepository, UserRepository};
use crate::db::DbPool;
use crate::error::DomainResult;

/// Cap applied independently to the user and post lists
pub const SEARCH_LIMIT: i64 = 10;

pub struct SearchService {
    pool: DbPool,
}

impl SearchService {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Case-insensitive substring search over names and captions.
    /// A blank query matches nothing.
    pub fn search(&self, query: &str, viewer: Option<Uuid>) -> DomainResult<SearchResults> {
        let needle = query.trim();
        if needle.is_empty() {
            return Ok(SearchResults::empty());
        }

        let users = UserRepository::new(self.pool.clone()).search_people(needle, viewer, SEARCH_LIMIT)?;
        let posts = PostRepository::new(self.pool.clone()).search_captions(needle, viewer, SEARCH_LIMIT)?;
        tracing::debug!(
            "Search {:?}: {} users, {} posts",
            needle,
            users.len(),
            posts.len()
        );

        Ok(SearchResults {
            total_results: users.len() + posts.len(),
            users,
            posts,
            query: needle.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::NewUser;
    use crate::db::Database;

    fn setup() -> (Database, SearchService) {
        let db = Database::in_memory().unwrap();
        db.initialize().unwrap();
        db.seed_demo_data().unwrap();
        let service = SearchService::new(db.pool.clone());
        (db, service)
    }

    #[test]
    fn test_blank_query_returns_nothing() {
        let (_db, service) = setup();
        for q in ["", "   "] {
            let results = service.search(q, None).unwrap();
            assert!(results.users.is_empty());
            assert!(results.posts.is_empty());
            assert_eq!(results.total_results, 0);
        }
    }

    #[test]
    fn test_matches_names_and_captions_case_insensitively() {
        let (_db, service) = setup();
        let results = service.search("SUNRISE", None).unwrap();
        assert_eq!(results.posts.len(), 1);
        assert_eq!(results.posts[0].caption, "Sunrise over the river");
        assert_eq!(results.query, "SUNRISE");

        let results = service.search("ali", None).unwrap();
        assert_eq!(results.users[0].username, "alice");
        assert_eq!(results.total_results, results.users.len() + results.posts.len());
    }

    #[test]
    fn test_inactive_posts_are_not_found() {
        let (_db, service) = setup();
        assert!(service.search("Deleted draft", None).unwrap().posts.is_empty());
    }

    #[test]
    fn test_each_list_is_capped() {
        let (db, service) = setup();
        let users = UserRepository::new(db.pool.clone());
        for i in 0..12 {
            let name = format!("zebra{}", i);
            let user = users
                .create_with_profile(&NewUser {
                    username: &name,
                    email: &format!("{}@example.com", name),
                    first_name: "",
                    last_name: "",
                    password_hash: "!",
                })
                .unwrap();
            PostRepository::new(db.pool.clone())
                .create(&user.id, None, "zebra crossing")
                .unwrap();
        }

        let results = service.search("zebra", None).unwrap();
        assert_eq!(results.users.len(), 10);
        assert_eq!(results.posts.len(), 10);
        assert_eq!(results.total_results, 20);
    }
}
