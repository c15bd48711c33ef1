use axum::{routing::get, routing::post, Router};

use crate::AppState;
use crate::http::{handlers, pages};

pub fn health() -> Router<AppState> {
    Router::new().route("/health", get(handlers::health))
}

pub fn auth() -> Router<AppState> {
    Router::new().route("/auth/login", post(handlers::login))
}

pub fn users() -> Router<AppState> {
    Router::new()
        .route(
            "/users",
            post(handlers::create_user).get(handlers::list_users),
        )
        .route(
            "/users/:id",
            get(handlers::get_user)
                .patch(handlers::update_user)
                .delete(handlers::delete_user),
        )
        .route("/users/:id/posts", get(handlers::list_user_posts))
        .route("/users/:id/follow", post(handlers::follow_user))
        .route("/users/:id/unfollow", post(handlers::unfollow_user))
}

pub fn posts() -> Router<AppState> {
    Router::new()
        .route("/posts", post(handlers::create_post))
        .route(
            "/posts/:id",
            get(handlers::get_post)
                .patch(handlers::update_post)
                .delete(handlers::delete_post),
        )
        .route("/posts/:id/like", post(handlers::like_post))
        .route("/posts/:id/unlike", post(handlers::unlike_post))
}

pub fn timeline() -> Router<AppState> {
    Router::new().route("/timeline", get(handlers::timeline))
}

pub fn pages() -> Router<AppState> {
    Router::new()
        .route("/", get(pages::home))
        .route("/user-access", get(pages::user_access))
        .route("/user-access/login", get(pages::user_access))
}
