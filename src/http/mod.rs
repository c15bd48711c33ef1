use axum::Router;

use crate::AppState;

mod auth;
mod error;
mod handlers;
mod pages;
mod routes;
mod validate;

pub use auth::AuthUser;
pub use error::AppError;

pub fn router(state: AppState) -> Router {
    let api = Router::new()
        .merge(routes::health())
        .merge(routes::auth())
        .merge(routes::users())
        .merge(routes::posts())
        .merge(routes::timeline());

    Router::new()
        .nest("/v1", api)
        .merge(routes::pages())
        .fallback(pages::not_found)
        .with_state(state)
}
