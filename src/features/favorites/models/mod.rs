mod favorite;

pub use favorite::{Favorite, FavoriteKey};
