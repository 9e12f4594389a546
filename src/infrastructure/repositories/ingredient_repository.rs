//! SeaORM implementation of IngredientRepository

use async_trait::async_trait;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder};

use crate::domain::{DomainError, Ingredient, IngredientRepository};
use crate::models::ingredient::{Column, Entity as IngredientEntity, Model};
use crate::models::measurement_unit;

pub struct SeaOrmIngredientRepository {
    db: DatabaseConnection,
}

impl SeaOrmIngredientRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

fn to_domain(model: Model, unit: Option<measurement_unit::Model>) -> Ingredient {
    Ingredient {
        id: model.id,
        name: model.name,
        measurement_unit: unit.map(|u| u.label),
    }
}

#[async_trait]
impl IngredientRepository for SeaOrmIngredientRepository {
    async fn find_all(&self, name_prefix: Option<&str>) -> Result<Vec<Ingredient>, DomainError> {
        let mut query = IngredientEntity::find()
            .find_also_related(measurement_unit::Entity)
            .order_by_asc(Column::Name);
        if let Some(prefix) = name_prefix {
            // SQLite LIKE is case-insensitive for ASCII
            query = query.filter(Column::Name.starts_with(prefix));
        }

        let rows = query.all(&self.db).await?;
        Ok(rows
            .into_iter()
            .map(|(model, unit)| to_domain(model, unit))
            .collect())
    }

    async fn find_by_id(&self, id: i32) -> Result<Option<Ingredient>, DomainError> {
        let row = IngredientEntity::find_by_id(id)
            .find_also_related(measurement_unit::Entity)
            .one(&self.db)
            .await?;
        Ok(row.map(|(model, unit)| to_domain(model, unit)))
    }

    async fn find_by_ids(&self, ids: &[i32]) -> Result<Vec<Ingredient>, DomainError> {
        let rows = IngredientEntity::find()
            .filter(Column::Id.is_in(ids.iter().copied()))
            .find_also_related(measurement_unit::Entity)
            .all(&self.db)
            .await?;
        Ok(rows
            .into_iter()
            .map(|(model, unit)| to_domain(model, unit))
            .collect())
    }
}
