pub mod favorite;
pub mod ingredient;
pub mod measurement_unit;
pub mod recipe;
pub mod recipe_ingredient;
pub mod recipe_tag;
pub mod shopping_cart;
pub mod subscription;
pub mod tag;
pub mod user;
