pub mod auth;
pub mod comments;
pub mod error;
pub mod extract;
pub mod follows;
pub mod notifications;
pub mod posts;
pub mod users;

use axum::http::Uri;
use instaclone_types::Paginated;

use crate::pagination::{Page, PageLinks};
use crate::state::AppState;

pub use error::{ApiError, ApiResult};
pub use extract::ApiJson;

/// Wrap a page in the `{count, next, previous, results}` envelope, with links
/// relative to the request being served
pub fn envelope<T>(state: &AppState, uri: &Uri, page: Page<T>) -> Paginated<T> {
    page.into_envelope(&PageLinks::new(&state.public_url, uri))
}
