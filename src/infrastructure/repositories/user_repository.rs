//! SeaORM implementation of UserRepository

use async_trait::async_trait;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};

use crate::domain::{DomainError, NewUser, RecipeBrief, User, UserRepository};
use crate::models::recipe;
use crate::models::user::{ActiveModel, Column, Entity as UserEntity, Model};

use super::is_unique_violation;

pub struct SeaOrmUserRepository {
    db: DatabaseConnection,
}

impl SeaOrmUserRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

fn to_domain(model: Model) -> User {
    User {
        id: model.id,
        email: model.email,
        username: model.username,
        first_name: model.first_name,
        last_name: model.last_name,
        password_hash: model.password_hash,
    }
}

#[async_trait]
impl UserRepository for SeaOrmUserRepository {
    async fn find_all(&self) -> Result<Vec<User>, DomainError> {
        let users = UserEntity::find().all(&self.db).await?;
        Ok(users.into_iter().map(to_domain).collect())
    }

    async fn find_by_id(&self, id: i32) -> Result<Option<User>, DomainError> {
        let user = UserEntity::find_by_id(id).one(&self.db).await?;
        Ok(user.map(to_domain))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, DomainError> {
        let user = UserEntity::find()
            .filter(Column::Email.eq(email))
            .one(&self.db)
            .await?;
        Ok(user.map(to_domain))
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, DomainError> {
        let user = UserEntity::find()
            .filter(Column::Username.eq(username))
            .one(&self.db)
            .await?;
        Ok(user.map(to_domain))
    }

    async fn create(&self, input: NewUser) -> Result<User, DomainError> {
        let now = chrono::Utc::now().to_rfc3339();

        let user = ActiveModel {
            email: Set(input.email),
            username: Set(input.username),
            first_name: Set(input.first_name),
            last_name: Set(input.last_name),
            password_hash: Set(input.password_hash),
            created_at: Set(now.clone()),
            updated_at: Set(now),
            ..Default::default()
        };

        match user.insert(&self.db).await {
            Ok(model) => Ok(to_domain(model)),
            // A registration racing past the existence checks lands here.
            Err(e) if is_unique_violation(&e) => Err(DomainError::Conflict(
                "A user with this email or username already exists.".to_string(),
            )),
            Err(e) => Err(e.into()),
        }
    }

    async fn update_password(&self, id: i32, password_hash: String) -> Result<(), DomainError> {
        let user = UserEntity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or(DomainError::NotFound)?;

        let mut active: ActiveModel = user.into();
        active.password_hash = Set(password_hash);
        active.updated_at = Set(chrono::Utc::now().to_rfc3339());
        active.update(&self.db).await?;

        Ok(())
    }

    async fn recipes_count(&self, author_id: i32) -> Result<u64, DomainError> {
        let count = recipe::Entity::find()
            .filter(recipe::Column::AuthorId.eq(author_id))
            .count(&self.db)
            .await?;
        Ok(count)
    }

    async fn author_recipes(
        &self,
        author_id: i32,
        limit: Option<u64>,
    ) -> Result<Vec<RecipeBrief>, DomainError> {
        let mut query = recipe::Entity::find()
            .filter(recipe::Column::AuthorId.eq(author_id))
            .order_by_desc(recipe::Column::PubDate);
        if let Some(limit) = limit {
            query = query.limit(limit);
        }

        let recipes = query.all(&self.db).await?;
        Ok(recipes
            .into_iter()
            .map(|r| RecipeBrief {
                id: r.id,
                name: r.name,
                image: r.image,
                cooking_time: r.cooking_time,
            })
            .collect())
    }
}
