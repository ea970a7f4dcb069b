pub mod auth;
pub mod config;
pub mod error;
pub mod extract;
pub mod middleware;
pub mod password;
pub mod posts;
pub mod sanitize;
pub mod token;
pub mod users;
pub mod votes;

use axum::{
    Json, Router, middleware as axum_middleware,
    routing::{get, post},
};

use soapbox_types::api::MessageResponse;

use crate::auth::AppState;
use crate::middleware::require_auth;

/// All routes, with the auth guard on the ones that need a caller.
pub fn router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/", get(root))
        .route("/login", post(auth::login))
        .route("/users/", get(users::list_users).post(users::create_user))
        .route("/users/{id}", get(users::get_user));

    // route_layer: unmatched methods still answer 405 instead of 401
    let protected_routes = Router::new()
        .route("/posts/", get(posts::get_posts).post(posts::create_post))
        .route(
            "/posts/{id}",
            get(posts::get_post)
                .put(posts::update_post)
                .delete(posts::delete_post),
        )
        .route("/vote/", post(votes::vote))
        .route_layer(axum_middleware::from_fn_with_state(state.clone(), require_auth));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .with_state(state)
}

async fn root() -> Json<MessageResponse> {
    Json(MessageResponse::new("Hello World"))
}
