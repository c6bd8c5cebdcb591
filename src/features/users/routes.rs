use crate::core::middleware::basic_auth_middleware;
use crate::features::users::handlers::{provisioning_handler, user_handler};
use crate::features::users::services::UserService;
use axum::{
    middleware::from_fn,
    routing::{get, post},
    Router,
};
use std::sync::Arc;

pub fn routes(service: Arc<UserService>) -> Router {
    Router::new()
        .route("/api/users/me", get(user_handler::get_me))
        .route(
            "/api/users/{user_id}/profile",
            get(user_handler::get_user_profile),
        )
        .with_state(service)
}

/// Identity provider hooks, gated by basic auth
pub fn provisioning_routes(service: Arc<UserService>, credentials: Arc<String>) -> Router {
    Router::new()
        .route(
            "/internal/users",
            post(provisioning_handler::create_user).put(provisioning_handler::update_user),
        )
        .route(
            "/internal/memberships",
            post(provisioning_handler::add_membership)
                .delete(provisioning_handler::remove_membership),
        )
        .with_state(service)
        .layer(from_fn(basic_auth_middleware(credentials, "provisioning")))
}
