use axum::{
    routing::{delete, get, post, put},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};

use crate::api;
use crate::state::AppState;

/// The full HTTP surface. `media_root` is served read-only under `/media`.
pub fn build_router(state: AppState, media_root: &str) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Health check
        .route("/health", get(health_check))
        // Accounts
        .route("/api/users/register/", post(api::auth::register))
        .route("/api/users/login/", post(api::auth::login))
        .route("/api/users/token/refresh/", post(api::auth::refresh))
        .route("/api/users/logout/", post(api::auth::logout))
        // People
        .route("/api/users/search/", get(api::users::search_users))
        .route("/api/users/suggested/", get(api::users::suggested))
        .route("/api/users/stats/", get(api::users::my_stats))
        .route("/api/users/stats/:username/", get(api::users::user_stats))
        // Profiles
        .route("/api/users/profiles/me/", get(api::users::me))
        .route(
            "/api/users/profiles/update_me/",
            put(api::users::update_me).patch(api::users::update_me),
        )
        .route(
            "/api/users/profiles/change_password/",
            post(api::auth::change_password),
        )
        .route(
            "/api/users/profiles/:username/",
            get(api::users::get_profile)
                .put(api::users::update_profile)
                .patch(api::users::update_profile),
        )
        .route(
            "/api/users/profiles/:username/followers/",
            get(api::users::followers),
        )
        .route(
            "/api/users/profiles/:username/following/",
            get(api::users::following),
        )
        .route(
            "/api/users/profiles/:username/follow/",
            post(api::follows::follow_user),
        )
        .route(
            "/api/users/profiles/:username/unfollow/",
            delete(api::follows::unfollow_user),
        )
        // Notifications
        .route(
            "/api/users/notifications/",
            get(api::notifications::list_notifications),
        )
        .route(
            "/api/users/notifications/unread_count/",
            get(api::notifications::unread_count),
        )
        .route(
            "/api/users/notifications/mark_all_read/",
            post(api::notifications::mark_all_read),
        )
        .route(
            "/api/users/notifications/:id/mark_read/",
            post(api::notifications::mark_read),
        )
        // Feeds and search
        .route("/api/posts/feed/", get(api::posts::home_feed))
        .route("/api/posts/explore/", get(api::posts::explore))
        .route("/api/posts/user/:username/", get(api::posts::user_posts))
        .route("/api/posts/search/", get(api::posts::search))
        // Posts
        .route(
            "/api/posts/posts/",
            get(api::posts::list_posts).post(api::posts::create_post),
        )
        .route(
            "/api/posts/posts/:id/",
            get(api::posts::get_post)
                .put(api::posts::update_post)
                .patch(api::posts::update_post)
                .delete(api::posts::delete_post),
        )
        .route("/api/posts/posts/:id/like/", post(api::posts::like_post))
        .route(
            "/api/posts/posts/:id/comments/",
            get(api::posts::post_comments),
        )
        .route(
            "/api/posts/posts/:id/add_comment/",
            post(api::posts::add_comment),
        )
        // Comments
        .route(
            "/api/posts/comments/",
            get(api::comments::list_comments).post(api::comments::create_comment),
        )
        .route(
            "/api/posts/comments/:id/",
            get(api::comments::get_comment)
                .put(api::comments::update_comment)
                .patch(api::comments::update_comment)
                .delete(api::comments::delete_comment),
        )
        // Follows
        .route(
            "/api/posts/follows/",
            get(api::follows::list_follows).post(api::follows::create_follow),
        )
        .route(
            "/api/posts/follows/unfollow/",
            delete(api::follows::delete_follow),
        )
        .route(
            "/api/posts/follow/:username/",
            post(api::follows::toggle_follow),
        )
        .nest_service("/media", ServeDir::new(media_root))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

async fn health_check() -> &'static str {
    "OK"
}
