//! Org-scoped file records and their lifecycle.
//!
//! File bytes live in blob storage; this feature only tracks records pointing at them.
//!
//! ## Endpoints
//!
//! | Method | Endpoint | Auth | Description |
//! |--------|----------|------|-------------|
//! | POST | `/api/files/upload-url` | Yes | Presigned upload URL |
//! | POST | `/api/files` | Yes | Register an uploaded file |
//! | GET | `/api/orgs/{org_id}/files` | Optional | List files (empty without access) |
//! | DELETE | `/api/files/{file_id}` | Yes | Move to trash (admin or owner) |
//! | POST | `/api/files/{file_id}/restore` | Yes | Restore from trash (admin or owner) |

pub mod dtos;
pub mod handlers;
pub mod models;
pub mod repositories;
pub mod routes;
pub mod services;

pub use repositories::PgFileRepository;
pub use routes::routes;
pub use services::{FileQueryService, FileService};
