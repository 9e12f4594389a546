//! SeaORM implementation of TagRepository

use async_trait::async_trait;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};

use crate::domain::{DomainError, Tag, TagRepository};
use crate::models::tag::{Column, Entity as TagEntity, Model};

pub struct SeaOrmTagRepository {
    db: DatabaseConnection,
}

impl SeaOrmTagRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

fn to_domain(model: Model) -> Tag {
    Tag {
        id: model.id,
        name: model.name,
        color: model.color,
        slug: model.slug,
    }
}

#[async_trait]
impl TagRepository for SeaOrmTagRepository {
    async fn find_all(&self) -> Result<Vec<Tag>, DomainError> {
        let tags = TagEntity::find().all(&self.db).await?;
        Ok(tags.into_iter().map(to_domain).collect())
    }

    async fn find_by_id(&self, id: i32) -> Result<Option<Tag>, DomainError> {
        let tag = TagEntity::find_by_id(id).one(&self.db).await?;
        Ok(tag.map(to_domain))
    }

    async fn find_by_ids(&self, ids: &[i32]) -> Result<Vec<Tag>, DomainError> {
        let tags = TagEntity::find()
            .filter(Column::Id.is_in(ids.iter().copied()))
            .all(&self.db)
            .await?;
        Ok(tags.into_iter().map(to_domain).collect())
    }
}
