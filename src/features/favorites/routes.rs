use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use crate::features::favorites::handlers::{list_favorites, toggle_favorite};
use crate::features::favorites::services::FavoriteService;

pub fn routes(service: Arc<FavoriteService>) -> Router {
    Router::new()
        .route("/api/files/{file_id}/favorite", post(toggle_favorite))
        .route("/api/orgs/{org_id}/favorites", get(list_favorites))
        .with_state(service)
}
