//! Application state containing repositories and shared resources

use sea_orm::DatabaseConnection;
use std::sync::Arc;

use crate::domain::{
    IngredientRepository, MarkRepository, RecipeRepository, SubscriptionRepository, TagRepository,
    UserRepository,
};
use crate::infrastructure::{
    SeaOrmIngredientRepository, SeaOrmMarkRepository, SeaOrmRecipeRepository,
    SeaOrmSubscriptionRepository, SeaOrmTagRepository, SeaOrmUserRepository,
};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    db: DatabaseConnection,
    /// Root directory for decoded image payloads
    pub media_root: String,
    pub user_repo: Arc<dyn UserRepository>,
    pub tag_repo: Arc<dyn TagRepository>,
    pub ingredient_repo: Arc<dyn IngredientRepository>,
    pub recipe_repo: Arc<dyn RecipeRepository>,
    pub mark_repo: Arc<dyn MarkRepository>,
    pub subscription_repo: Arc<dyn SubscriptionRepository>,
}

impl AppState {
    /// Create a new AppState with all repositories initialized
    pub fn new(db: DatabaseConnection, media_root: String) -> Self {
        let user_repo = Arc::new(SeaOrmUserRepository::new(db.clone()));
        let tag_repo = Arc::new(SeaOrmTagRepository::new(db.clone()));
        let ingredient_repo = Arc::new(SeaOrmIngredientRepository::new(db.clone()));
        let recipe_repo = Arc::new(SeaOrmRecipeRepository::new(db.clone()));
        let mark_repo = Arc::new(SeaOrmMarkRepository::new(db.clone()));
        let subscription_repo = Arc::new(SeaOrmSubscriptionRepository::new(db.clone()));

        Self {
            db,
            media_root,
            user_repo,
            tag_repo,
            ingredient_repo,
            recipe_repo,
            mark_repo,
            subscription_repo,
        }
    }

    pub fn db(&self) -> &DatabaseConnection {
        &self.db
    }
}
