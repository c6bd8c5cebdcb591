use axum::{
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;

use crate::features::files::handlers::{
    create_file, delete_file, generate_upload_url, list_files, restore_file,
};
use crate::features::files::services::{FileQueryService, FileService};

/// Create routes for the files feature
pub fn routes(file_service: Arc<FileService>, query_service: Arc<FileQueryService>) -> Router {
    let mutations = Router::new()
        .route("/api/files/upload-url", post(generate_upload_url))
        .route("/api/files", post(create_file))
        .route("/api/files/{file_id}", delete(delete_file))
        .route("/api/files/{file_id}/restore", post(restore_file))
        .with_state(file_service);

    let queries = Router::new()
        .route("/api/orgs/{org_id}/files", get(list_files))
        .with_state(query_service);

    mutations.merge(queries)
}
