//! SeaORM implementation of SubscriptionRepository

use async_trait::async_trait;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    Set,
};

use crate::domain::{DomainError, SubscriptionRepository, User};
use crate::models::subscription::{ActiveModel, Column, Entity as SubscriptionEntity};
use crate::models::user;

use super::is_unique_violation;

pub struct SeaOrmSubscriptionRepository {
    db: DatabaseConnection,
}

impl SeaOrmSubscriptionRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl SubscriptionRepository for SeaOrmSubscriptionRepository {
    async fn exists(&self, subscriber_id: i32, author_id: i32) -> Result<bool, DomainError> {
        let count = SubscriptionEntity::find()
            .filter(Column::SubscriberId.eq(subscriber_id))
            .filter(Column::AuthorId.eq(author_id))
            .count(&self.db)
            .await?;
        Ok(count > 0)
    }

    async fn add(&self, subscriber_id: i32, author_id: i32) -> Result<(), DomainError> {
        let edge = ActiveModel {
            subscriber_id: Set(subscriber_id),
            author_id: Set(author_id),
            ..Default::default()
        };

        match edge.insert(&self.db).await {
            Ok(_) => Ok(()),
            Err(e) if is_unique_violation(&e) => Err(DomainError::Conflict(
                "You are already subscribed to this author.".to_string(),
            )),
            Err(e) => Err(e.into()),
        }
    }

    async fn remove(&self, subscriber_id: i32, author_id: i32) -> Result<(), DomainError> {
        let result = SubscriptionEntity::delete_many()
            .filter(Column::SubscriberId.eq(subscriber_id))
            .filter(Column::AuthorId.eq(author_id))
            .exec(&self.db)
            .await?;

        if result.rows_affected == 0 {
            return Err(DomainError::Conflict(
                "You are not subscribed to this author.".to_string(),
            ));
        }
        Ok(())
    }

    async fn authors_of(&self, subscriber_id: i32) -> Result<Vec<User>, DomainError> {
        let edges = SubscriptionEntity::find()
            .filter(Column::SubscriberId.eq(subscriber_id))
            .all(&self.db)
            .await?;
        let author_ids: Vec<i32> = edges.into_iter().map(|e| e.author_id).collect();

        let authors = user::Entity::find()
            .filter(user::Column::Id.is_in(author_ids))
            .all(&self.db)
            .await?;

        Ok(authors
            .into_iter()
            .map(|u| User {
                id: u.id,
                email: u.email,
                username: u.username,
                first_name: u.first_name,
                last_name: u.last_name,
                password_hash: u.password_hash,
            })
            .collect())
    }
}
