use crate::config::Settings;
use crate::db::Database;
use crate::media::MediaUrls;
use crate::session::{SessionManager, TokenRejection};

#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub session_manager: SessionManager,
    pub media: MediaUrls,
    /// Origin used when building pagination links
    pub public_url: String,
}

impl AppState {
    pub fn new(db: Database, settings: &Settings) -> Self {
        let session_manager =
            SessionManager::new(db.clone(), settings.access_ttl(), settings.refresh_ttl());
        Self {
            db,
            session_manager,
            media: MediaUrls::new(&settings.media.base_url),
            public_url: settings.server.public_url.clone(),
        }
    }

    /// Resolve an access token to its user
    pub fn authenticated_user(
        &self,
        token: &str,
    ) -> anyhow::Result<Result<uuid::Uuid, TokenRejection>> {
        self.session_manager.validate_access(token)
    }
}
