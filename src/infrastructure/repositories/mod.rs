//! SeaORM repository implementations

pub mod ingredient_repository;
pub mod mark_repository;
pub mod recipe_repository;
pub mod subscription_repository;
pub mod tag_repository;
pub mod user_repository;

pub use ingredient_repository::SeaOrmIngredientRepository;
pub use mark_repository::SeaOrmMarkRepository;
pub use recipe_repository::SeaOrmRecipeRepository;
pub use subscription_repository::SeaOrmSubscriptionRepository;
pub use tag_repository::SeaOrmTagRepository;
pub use user_repository::SeaOrmUserRepository;

/// SQLite reports duplicate-pair inserts with this marker; the unique
/// constraint is the authoritative lock against racing toggle inserts.
pub(crate) fn is_unique_violation(err: &sea_orm::DbErr) -> bool {
    err.to_string().contains("UNIQUE constraint failed")
}
