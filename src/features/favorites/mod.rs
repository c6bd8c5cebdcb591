//! Per-user favorites on org files.
//!
//! ## Endpoints
//!
//! | Method | Endpoint | Auth | Description |
//! |--------|----------|------|-------------|
//! | POST | `/api/files/{file_id}/favorite` | Yes | Toggle favorite |
//! | GET | `/api/orgs/{org_id}/favorites` | Optional | Caller's favorites (null without access) |

pub mod dtos;
pub mod handlers;
pub mod models;
pub mod repositories;
pub mod routes;
pub mod services;

pub use repositories::PgFavoriteRepository;
pub use routes::routes;
pub use services::FavoriteService;
