mod favorite_repository;

pub use favorite_repository::{FavoriteRepository, PgFavoriteRepository};
