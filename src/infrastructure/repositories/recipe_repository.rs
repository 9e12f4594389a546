//! SeaORM implementation of RecipeRepository
//!
//! A recipe, its ingredient lines and its tag links are written together in
//! one transaction; lines are bulk-inserted scoped by recipe id. Deletion
//! removes owned lines and links before the recipe row.

use std::collections::HashMap;

use async_trait::async_trait;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    ModelTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};

use crate::domain::ingredients::IngredientAmount;
use crate::domain::shopping_list::IngredientLine;
use crate::domain::{
    DomainError, NewRecipe, RecipeBrief, RecipeFilter, RecipeIngredientView, RecipeRecord,
    RecipeRepository, RecipeUpdate, Tag,
};
use crate::models::{
    ingredient, measurement_unit, recipe, recipe_ingredient, recipe_tag, shopping_cart, tag,
};

pub struct SeaOrmRecipeRepository {
    db: DatabaseConnection,
}

impl SeaOrmRecipeRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

/// Unit labels for the given ingredient rows, keyed by unit id.
async fn unit_labels<C: ConnectionTrait>(
    conn: &C,
    ingredients: &[ingredient::Model],
) -> Result<HashMap<i32, String>, DomainError> {
    let unit_ids: Vec<i32> = ingredients
        .iter()
        .filter_map(|i| i.measurement_unit_id)
        .collect();
    let units = measurement_unit::Entity::find()
        .filter(measurement_unit::Column::Id.is_in(unit_ids))
        .all(conn)
        .await?;
    Ok(units.into_iter().map(|u| (u.id, u.label)).collect())
}

/// Resolve a recipe row into the full aggregate (tags + ingredient views).
async fn load_record<C: ConnectionTrait>(
    conn: &C,
    model: recipe::Model,
) -> Result<RecipeRecord, DomainError> {
    let tags = model
        .find_related(tag::Entity)
        .all(conn)
        .await?
        .into_iter()
        .map(|t| Tag {
            id: t.id,
            name: t.name,
            color: t.color,
            slug: t.slug,
        })
        .collect();

    let lines = recipe_ingredient::Entity::find()
        .filter(recipe_ingredient::Column::RecipeId.eq(model.id))
        .find_also_related(ingredient::Entity)
        .all(conn)
        .await?;

    let resolved: Vec<ingredient::Model> =
        lines.iter().filter_map(|(_, i)| i.clone()).collect();
    let labels = unit_labels(conn, &resolved).await?;

    let ingredients = lines
        .into_iter()
        .filter_map(|(line, ingredient)| {
            ingredient.map(|i| RecipeIngredientView {
                id: i.id,
                name: i.name,
                measurement_unit: i.measurement_unit_id.and_then(|id| labels.get(&id).cloned()),
                amount: line.amount,
            })
        })
        .collect();

    Ok(RecipeRecord {
        id: model.id,
        author_id: model.author_id,
        name: model.name,
        image: model.image,
        text: model.text,
        cooking_time: model.cooking_time,
        pub_date: model.pub_date,
        tags,
        ingredients,
    })
}

/// Bulk-insert ingredient lines scoped to the given recipe.
async fn insert_lines<C: ConnectionTrait>(
    conn: &C,
    recipe_id: i32,
    entries: &[IngredientAmount],
) -> Result<(), DomainError> {
    if entries.is_empty() {
        return Ok(());
    }
    let models = entries.iter().map(|e| recipe_ingredient::ActiveModel {
        recipe_id: Set(recipe_id),
        ingredient_id: Set(e.id),
        amount: Set(e.amount),
        ..Default::default()
    });
    recipe_ingredient::Entity::insert_many(models)
        .exec(conn)
        .await?;
    Ok(())
}

/// Bulk-insert tag links for the given recipe.
///
/// A repeated tag id collapses to one link, so the composite primary key
/// never trips on duplicate submissions.
async fn insert_tag_links<C: ConnectionTrait>(
    conn: &C,
    recipe_id: i32,
    tag_ids: &[i32],
) -> Result<(), DomainError> {
    let mut unique: Vec<i32> = Vec::with_capacity(tag_ids.len());
    for tag_id in tag_ids {
        if !unique.contains(tag_id) {
            unique.push(*tag_id);
        }
    }
    if unique.is_empty() {
        return Ok(());
    }
    let models = unique.into_iter().map(|tag_id| recipe_tag::ActiveModel {
        recipe_id: Set(recipe_id),
        tag_id: Set(tag_id),
    });
    recipe_tag::Entity::insert_many(models).exec(conn).await?;
    Ok(())
}

#[async_trait]
impl RecipeRepository for SeaOrmRecipeRepository {
    async fn find(&self, filter: RecipeFilter) -> Result<Vec<RecipeRecord>, DomainError> {
        let mut query = recipe::Entity::find().order_by_desc(recipe::Column::PubDate);

        if let Some(author_id) = filter.author {
            query = query.filter(recipe::Column::AuthorId.eq(author_id));
        }

        if let Some(user_id) = filter.favorited_by {
            let marked = crate::models::favorite::Entity::find()
                .filter(crate::models::favorite::Column::UserId.eq(user_id))
                .all(&self.db)
                .await?;
            let ids: Vec<i32> = marked.into_iter().map(|f| f.recipe_id).collect();
            query = query.filter(recipe::Column::Id.is_in(ids));
        }

        if let Some(user_id) = filter.in_cart_of {
            let marked = shopping_cart::Entity::find()
                .filter(shopping_cart::Column::UserId.eq(user_id))
                .all(&self.db)
                .await?;
            let ids: Vec<i32> = marked.into_iter().map(|c| c.recipe_id).collect();
            query = query.filter(recipe::Column::Id.is_in(ids));
        }

        if !filter.tag_slugs.is_empty() {
            let tags = tag::Entity::find()
                .filter(tag::Column::Slug.is_in(filter.tag_slugs.clone()))
                .all(&self.db)
                .await?;
            let tag_ids: Vec<i32> = tags.into_iter().map(|t| t.id).collect();
            let links = recipe_tag::Entity::find()
                .filter(recipe_tag::Column::TagId.is_in(tag_ids))
                .all(&self.db)
                .await?;
            let mut ids: Vec<i32> = links.into_iter().map(|l| l.recipe_id).collect();
            ids.sort_unstable();
            ids.dedup();
            query = query.filter(recipe::Column::Id.is_in(ids));
        }

        let rows = query.all(&self.db).await?;
        let mut records = Vec::with_capacity(rows.len());
        for row in rows {
            records.push(load_record(&self.db, row).await?);
        }
        Ok(records)
    }

    async fn find_by_id(&self, id: i32) -> Result<Option<RecipeRecord>, DomainError> {
        let model = recipe::Entity::find_by_id(id).one(&self.db).await?;
        match model {
            Some(model) => Ok(Some(load_record(&self.db, model).await?)),
            None => Ok(None),
        }
    }

    async fn brief(&self, id: i32) -> Result<Option<RecipeBrief>, DomainError> {
        let model = recipe::Entity::find_by_id(id).one(&self.db).await?;
        Ok(model.map(|r| RecipeBrief {
            id: r.id,
            name: r.name,
            image: r.image,
            cooking_time: r.cooking_time,
        }))
    }

    async fn create(&self, author_id: i32, input: NewRecipe) -> Result<RecipeRecord, DomainError> {
        let txn = self.db.begin().await?;

        let model = recipe::ActiveModel {
            author_id: Set(Some(author_id)),
            name: Set(input.name),
            image: Set(input.image),
            text: Set(input.text),
            cooking_time: Set(input.cooking_time),
            pub_date: Set(chrono::Utc::now().to_rfc3339()),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        insert_lines(&txn, model.id, &input.ingredients).await?;
        insert_tag_links(&txn, model.id, &input.tag_ids).await?;

        let record = load_record(&txn, model).await?;
        txn.commit().await?;

        Ok(record)
    }

    async fn update(&self, id: i32, input: RecipeUpdate) -> Result<RecipeRecord, DomainError> {
        let txn = self.db.begin().await?;

        let model = recipe::Entity::find_by_id(id)
            .one(&txn)
            .await?
            .ok_or(DomainError::NotFound)?;

        let mut active: recipe::ActiveModel = model.into();
        if let Some(name) = input.name {
            active.name = Set(name);
        }
        if let Some(image) = input.image {
            active.image = Set(image);
        }
        if let Some(text) = input.text {
            active.text = Set(text);
        }
        if let Some(cooking_time) = input.cooking_time {
            active.cooking_time = Set(cooking_time);
        }
        let model = active.update(&txn).await?;

        // Replace-on-present policy: an absent field leaves the old set alone.
        if let Some(entries) = input.ingredients {
            recipe_ingredient::Entity::delete_many()
                .filter(recipe_ingredient::Column::RecipeId.eq(id))
                .exec(&txn)
                .await?;
            insert_lines(&txn, id, &entries).await?;
        }
        if let Some(tag_ids) = input.tag_ids {
            recipe_tag::Entity::delete_many()
                .filter(recipe_tag::Column::RecipeId.eq(id))
                .exec(&txn)
                .await?;
            insert_tag_links(&txn, id, &tag_ids).await?;
        }

        let record = load_record(&txn, model).await?;
        txn.commit().await?;

        Ok(record)
    }

    async fn delete(&self, id: i32) -> Result<(), DomainError> {
        let txn = self.db.begin().await?;

        let model = recipe::Entity::find_by_id(id)
            .one(&txn)
            .await?
            .ok_or(DomainError::NotFound)?;

        // Owned ingredient lines and tag links go first, then the recipe.
        recipe_ingredient::Entity::delete_many()
            .filter(recipe_ingredient::Column::RecipeId.eq(id))
            .exec(&txn)
            .await?;
        recipe_tag::Entity::delete_many()
            .filter(recipe_tag::Column::RecipeId.eq(id))
            .exec(&txn)
            .await?;
        model.delete(&txn).await?;

        txn.commit().await?;
        Ok(())
    }

    async fn cart_lines(&self, user_id: i32) -> Result<Vec<IngredientLine>, DomainError> {
        let cart = shopping_cart::Entity::find()
            .filter(shopping_cart::Column::UserId.eq(user_id))
            .all(&self.db)
            .await?;
        let recipe_ids: Vec<i32> = cart.into_iter().map(|c| c.recipe_id).collect();
        if recipe_ids.is_empty() {
            return Ok(Vec::new());
        }

        let lines = recipe_ingredient::Entity::find()
            .filter(recipe_ingredient::Column::RecipeId.is_in(recipe_ids))
            .find_also_related(ingredient::Entity)
            .all(&self.db)
            .await?;

        let resolved: Vec<ingredient::Model> =
            lines.iter().filter_map(|(_, i)| i.clone()).collect();
        let labels = unit_labels(&self.db, &resolved).await?;

        Ok(lines
            .into_iter()
            .filter_map(|(line, ingredient)| {
                ingredient.map(|i| IngredientLine {
                    name: i.name,
                    measurement_unit: i
                        .measurement_unit_id
                        .and_then(|id| labels.get(&id).cloned())
                        .unwrap_or_default(),
                    amount: line.amount,
                })
            })
            .collect())
    }
}
