use sea_orm::sea_query::OnConflict;
use sea_orm::*;

use crate::models::{ingredient, measurement_unit, tag};

/// Insert demo catalog data (tags, units, ingredients). Idempotent.
pub async fn seed_demo_data(db: &DatabaseConnection) -> Result<(), DbErr> {
    // 1. Tags
    let tags = [
        ("Breakfast", "#E26C2D", "breakfast"),
        ("Lunch", "#49B64E", "lunch"),
        ("Dinner", "#8775D2", "dinner"),
    ];
    for (name, color, slug) in tags {
        let model = tag::ActiveModel {
            name: Set(name.to_owned()),
            color: Set(color.to_owned()),
            slug: Set(slug.to_owned()),
            ..Default::default()
        };
        tag::Entity::insert(model)
            .on_conflict(
                OnConflict::column(tag::Column::Name)
                    .do_nothing()
                    .to_owned(),
            )
            .do_nothing()
            .exec(db)
            .await?;
    }

    // 2. Measurement units
    let units = ["g", "kg", "ml", "l", "tbsp", "tsp", "pc"];
    for label in units {
        let model = measurement_unit::ActiveModel {
            label: Set(label.to_owned()),
            ..Default::default()
        };
        measurement_unit::Entity::insert(model)
            .on_conflict(
                OnConflict::column(measurement_unit::Column::Label)
                    .do_nothing()
                    .to_owned(),
            )
            .do_nothing()
            .exec(db)
            .await?;
    }

    // 3. Ingredients, each bound to a seeded unit
    let ingredients = [
        ("Salt", "g"),
        ("Sugar", "g"),
        ("Flour", "g"),
        ("Milk", "ml"),
        ("Butter", "g"),
        ("Egg", "pc"),
        ("Olive oil", "tbsp"),
    ];
    for (name, unit_label) in ingredients {
        let unit = measurement_unit::Entity::find()
            .filter(measurement_unit::Column::Label.eq(unit_label))
            .one(db)
            .await?;
        let model = ingredient::ActiveModel {
            name: Set(name.to_owned()),
            measurement_unit_id: Set(unit.map(|u| u.id)),
            ..Default::default()
        };
        ingredient::Entity::insert(model)
            .on_conflict(
                OnConflict::columns([
                    ingredient::Column::Name,
                    ingredient::Column::MeasurementUnitId,
                ])
                .do_nothing()
                .to_owned(),
            )
            .do_nothing()
            .exec(db)
            .await?;
    }

    Ok(())
}
