//! Post authoring: create, edit and soft-delete.

use uuid::Uuid;

use instaclone_types::{CreatePostRequest, Post, UpdatePostRequest};

use crate::db::repositories::{PostRecord, PostRepository};
use crate::db::DbPool;
use crate::error::{DomainError, DomainResult, Validator, NON_FIELD_ERRORS};
use crate::feed::FeedComposer;
use crate::media;

pub const MAX_CAPTION_LEN: usize = 2000;

/// Caption and image after normalisation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostContent {
    pub caption: String,
    pub image: Option<String>,
}

/// Validate a caption/image pair. A whitespace-only caption counts as absent
/// and at least one of the two is required.
pub fn validate_content(caption: Option<&str>, image: Option<&str>) -> DomainResult<PostContent> {
    let caption = caption.map(str::trim).unwrap_or_default().to_string();
    let image = image.map(str::trim).filter(|i| !i.is_empty()).map(str::to_string);

    let mut v = Validator::new();
    if caption.chars().count() > MAX_CAPTION_LEN {
        v.add(
            "caption",
            format!("Caption cannot exceed {} characters", MAX_CAPTION_LEN),
        );
    }
    if let Some(image) = &image {
        v.check(media::has_allowed_extension(image), "image", &media::extension_error());
    }
    if caption.is_empty() && image.is_none() {
        v.add(NON_FIELD_ERRORS, "Post must have either an image or a caption");
    }
    v.finish()?;

    Ok(PostContent { caption, image })
}

pub struct PostService {
    pool: DbPool,
}

impl PostService {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    fn owned_active(&self, user_id: &Uuid, post_id: &Uuid, verb: &str) -> DomainResult<PostRecord> {
        let record = PostRepository::new(self.pool.clone())
            .get_record(post_id)?
            .filter(|p| p.is_active)
            .ok_or_else(|| DomainError::not_found("Post not found"))?;
        if record.user_id != *user_id {
            return Err(DomainError::Forbidden(format!(
                "You can only {} your own posts",
                verb
            )));
        }
        Ok(record)
    }

    pub fn create(&self, author: &Uuid, request: &CreatePostRequest) -> DomainResult<Post> {
        let content = validate_content(request.caption.as_deref(), request.image.as_deref())?;
        let post_id = PostRepository::new(self.pool.clone()).create(
            author,
            content.image.as_deref(),
            &content.caption,
        )?;
        tracing::info!("User {} created post {}", author, post_id);

        FeedComposer::new(self.pool.clone()).post_detail(&post_id, Some(*author))
    }

    /// Partial update; the merged caption/image must still be valid.
    /// An empty `image` removes the image.
    pub fn update(
        &self,
        user_id: &Uuid,
        post_id: &Uuid,
        request: &UpdatePostRequest,
    ) -> DomainResult<Post> {
        let record = self.owned_active(user_id, post_id, "edit")?;

        let caption = request.caption.as_deref().unwrap_or(&record.caption);
        let image = match request.image.as_deref() {
            Some(new_image) => Some(new_image),
            None => record.image.as_deref(),
        };
        let content = validate_content(Some(caption), image)?;

        PostRepository::new(self.pool.clone()).update(
            post_id,
            content.image.as_deref(),
            &content.caption,
        )?;
        tracing::info!("User {} updated post {}", user_id, post_id);

        FeedComposer::new(self.pool.clone()).post_detail(post_id, Some(*user_id))
    }

    /// Soft delete; comments and likes stay attached to the hidden row
    pub fn destroy(&self, user_id: &Uuid, post_id: &Uuid) -> DomainResult<()> {
        self.owned_active(user_id, post_id, "delete")?;
        PostRepository::new(self.pool.clone()).set_active(post_id, false)?;
        tracing::info!("User {} deleted post {}", user_id, post_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::{NewUser, UserRepository};
    use crate::db::Database;
    use proptest::prelude::*;

    fn setup() -> (Database, PostService, Uuid) {
        let db = Database::in_memory().unwrap();
        db.initialize().unwrap();
        let author = UserRepository::new(db.pool.clone())
            .create_with_profile(&NewUser {
                username: "author",
                email: "author@example.com",
                first_name: "",
                last_name: "",
                password_hash: "!",
            })
            .unwrap()
            .id;
        let service = PostService::new(db.pool.clone());
        (db, service, author)
    }

    fn create(caption: Option<&str>, image: Option<&str>) -> CreatePostRequest {
        CreatePostRequest {
            caption: caption.map(str::to_string),
            image: image.map(str::to_string),
        }
    }

    #[test]
    fn test_create_with_caption_or_image() {
        let (_db, service, author) = setup();
        let post = service.create(&author, &create(Some(" hi "), None)).unwrap();
        assert_eq!(post.caption, "hi");
        assert_eq!(post.image, None);

        let post = service
            .create(&author, &create(None, Some("posts/a.png")))
            .unwrap();
        assert_eq!(post.image.as_deref(), Some("posts/a.png"));
        assert_eq!(post.comments.map(|c| c.len()), Some(0));
    }

    #[test]
    fn test_rejects_bad_extension() {
        let (_db, service, author) = setup();
        match service.create(&author, &create(Some("x"), Some("posts/a.gif"))) {
            Err(DomainError::Validation(errors)) => assert!(errors.contains_key("image")),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_update_cannot_empty_a_post() {
        let (_db, service, author) = setup();
        let post = service.create(&author, &create(Some("caption"), None)).unwrap();

        let clear_caption = UpdatePostRequest {
            caption: Some("   ".to_string()),
            image: None,
        };
        assert!(matches!(
            service.update(&author, &post.id, &clear_caption),
            Err(DomainError::Validation(_))
        ));

        let add_image = UpdatePostRequest {
            caption: Some(String::new()),
            image: Some("posts/b.jpg".to_string()),
        };
        let updated = service.update(&author, &post.id, &add_image).unwrap();
        assert_eq!(updated.caption, "");
        assert_eq!(updated.image.as_deref(), Some("posts/b.jpg"));
    }

    #[test]
    fn test_only_owner_may_edit_or_delete() {
        let (db, service, author) = setup();
        let other = UserRepository::new(db.pool.clone())
            .create_with_profile(&NewUser {
                username: "other",
                email: "other@example.com",
                first_name: "",
                last_name: "",
                password_hash: "!",
            })
            .unwrap()
            .id;
        let post = service.create(&author, &create(Some("mine"), None)).unwrap();

        assert!(matches!(
            service.destroy(&other, &post.id),
            Err(DomainError::Forbidden(_))
        ));
        service.destroy(&author, &post.id).unwrap();
        assert!(matches!(
            service.destroy(&author, &post.id),
            Err(DomainError::NotFound(_))
        ));
        assert!(PostRepository::new(db.pool.clone())
            .get_record(&post.id)
            .unwrap()
            .is_some());
    }

    proptest! {
        #[test]
        fn prop_post_needs_caption_or_image(
            caption in proptest::option::of("[ \t]{0,3}|[a-z ]{1,40}"),
            with_image in any::<bool>(),
        ) {
            let image = with_image.then_some("posts/pic.jpg");
            let has_caption = caption.as_deref().map(|c| !c.trim().is_empty()).unwrap_or(false);
            let result = validate_content(caption.as_deref(), image);
            prop_assert_eq!(result.is_ok(), has_caption || with_image);
        }
    }
}
