//! Users, their organization memberships and the provisioning hooks.
//!
//! Users are created by the identity provider's webhooks, never on first request.
//!
//! ## Endpoints
//!
//! | Method | Endpoint | Description |
//! |--------|----------|-------------|
//! | GET | `/api/users/me` | Caller's account and memberships |
//! | GET | `/api/users/{user_id}/profile` | Name and avatar of a user |
//! | POST | `/internal/users` | Hook: create user (idempotent) |
//! | PUT | `/internal/users` | Hook: update profile |
//! | POST | `/internal/memberships` | Hook: add or change membership |
//! | DELETE | `/internal/memberships` | Hook: remove membership |

pub mod dtos;
pub mod handlers;
pub mod models;
pub mod repositories;
pub mod routes;
pub mod services;

pub use repositories::PgUserRepository;
pub use routes::{provisioning_routes, routes};
pub use services::UserService;
