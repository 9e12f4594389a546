use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "ingredients")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub name: String,
    pub measurement_unit_id: Option<i32>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::measurement_unit::Entity",
        from = "Column::MeasurementUnitId",
        to = "super::measurement_unit::Column::Id",
        on_update = "Cascade",
        on_delete = "SetNull"
    )]
    MeasurementUnit,
    #[sea_orm(has_many = "super::recipe_ingredient::Entity")]
    RecipeIngredients,
}

impl Related<super::measurement_unit::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::MeasurementUnit.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
