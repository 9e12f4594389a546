//! SeaORM implementation of MarkRepository
//!
//! Favorites and shopping-cart entries share the same two-state machine per
//! (user, recipe) pair; this repository drives both tables behind one trait.

use async_trait::async_trait;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    Set,
};

use crate::domain::{DomainError, MarkKind, MarkRepository};
use crate::models::{favorite, shopping_cart};

use super::is_unique_violation;

pub struct SeaOrmMarkRepository {
    db: DatabaseConnection,
}

impl SeaOrmMarkRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl MarkRepository for SeaOrmMarkRepository {
    async fn exists(
        &self,
        kind: MarkKind,
        user_id: i32,
        recipe_id: i32,
    ) -> Result<bool, DomainError> {
        let count = match kind {
            MarkKind::Favorite => {
                favorite::Entity::find()
                    .filter(favorite::Column::UserId.eq(user_id))
                    .filter(favorite::Column::RecipeId.eq(recipe_id))
                    .count(&self.db)
                    .await?
            }
            MarkKind::ShoppingCart => {
                shopping_cart::Entity::find()
                    .filter(shopping_cart::Column::UserId.eq(user_id))
                    .filter(shopping_cart::Column::RecipeId.eq(recipe_id))
                    .count(&self.db)
                    .await?
            }
        };
        Ok(count > 0)
    }

    async fn add(&self, kind: MarkKind, user_id: i32, recipe_id: i32) -> Result<(), DomainError> {
        let result = match kind {
            MarkKind::Favorite => {
                let entry = favorite::ActiveModel {
                    user_id: Set(user_id),
                    recipe_id: Set(recipe_id),
                    ..Default::default()
                };
                entry.insert(&self.db).await.map(|_| ())
            }
            MarkKind::ShoppingCart => {
                let entry = shopping_cart::ActiveModel {
                    user_id: Set(user_id),
                    recipe_id: Set(recipe_id),
                    ..Default::default()
                };
                entry.insert(&self.db).await.map(|_| ())
            }
        };

        match result {
            Ok(()) => Ok(()),
            // A duplicate racing past the existence check hits the unique
            // pair constraint and is reported as the same toggle error.
            Err(e) if is_unique_violation(&e) => Err(DomainError::Conflict(
                "This recipe is already added.".to_string(),
            )),
            Err(e) => Err(e.into()),
        }
    }

    async fn remove(
        &self,
        kind: MarkKind,
        user_id: i32,
        recipe_id: i32,
    ) -> Result<(), DomainError> {
        let rows_affected = match kind {
            MarkKind::Favorite => {
                favorite::Entity::delete_many()
                    .filter(favorite::Column::UserId.eq(user_id))
                    .filter(favorite::Column::RecipeId.eq(recipe_id))
                    .exec(&self.db)
                    .await?
                    .rows_affected
            }
            MarkKind::ShoppingCart => {
                shopping_cart::Entity::delete_many()
                    .filter(shopping_cart::Column::UserId.eq(user_id))
                    .filter(shopping_cart::Column::RecipeId.eq(recipe_id))
                    .exec(&self.db)
                    .await?
                    .rows_affected
            }
        };

        if rows_affected == 0 {
            return Err(DomainError::Conflict(
                "This recipe was not added.".to_string(),
            ));
        }
        Ok(())
    }
}
