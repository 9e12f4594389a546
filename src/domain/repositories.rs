//! Repository trait definitions
//!
//! These traits define the contract for data access.
//! Implementations live in the infrastructure layer.

use async_trait::async_trait;

use super::errors::DomainError;
use super::ingredients::IngredientAmount;
use super::shopping_list::IngredientLine;

/// User data for API responses and credential checks
#[derive(Debug, Clone, serde::Serialize)]
pub struct User {
    pub id: i32,
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
}

/// Input for registering a user (password already hashed)
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub password_hash: String,
}

/// Tag data for API responses
#[derive(Debug, Clone, serde::Serialize)]
pub struct Tag {
    pub id: i32,
    pub name: String,
    pub color: String,
    pub slug: String,
}

/// Ingredient catalog entry with its unit label resolved
#[derive(Debug, Clone, serde::Serialize)]
pub struct Ingredient {
    pub id: i32,
    pub name: String,
    pub measurement_unit: Option<String>,
}

/// One resolved ingredient line of a recipe payload
#[derive(Debug, Clone, serde::Serialize)]
pub struct RecipeIngredientView {
    pub id: i32,
    pub name: String,
    pub measurement_unit: Option<String>,
    pub amount: i32,
}

/// Compact recipe shape used by favorite/cart responses and subscriptions
#[derive(Debug, Clone, serde::Serialize)]
pub struct RecipeBrief {
    pub id: i32,
    pub name: String,
    pub image: String,
    pub cooking_time: i32,
}

/// Fully resolved recipe aggregate
#[derive(Debug, Clone)]
pub struct RecipeRecord {
    pub id: i32,
    pub author_id: Option<i32>,
    pub name: String,
    pub image: String,
    pub text: String,
    pub cooking_time: i32,
    pub pub_date: String,
    pub tags: Vec<Tag>,
    pub ingredients: Vec<RecipeIngredientView>,
}

/// Input for creating a recipe; ingredient list already validated
#[derive(Debug, Clone)]
pub struct NewRecipe {
    pub name: String,
    pub image: String,
    pub text: String,
    pub cooking_time: i32,
    pub tag_ids: Vec<i32>,
    pub ingredients: Vec<IngredientAmount>,
}

/// Partial update; `None` fields are left untouched, including the
/// ingredient and tag sets (replace-on-present policy).
#[derive(Debug, Clone, Default)]
pub struct RecipeUpdate {
    pub name: Option<String>,
    pub image: Option<String>,
    pub text: Option<String>,
    pub cooking_time: Option<i32>,
    pub tag_ids: Option<Vec<i32>>,
    pub ingredients: Option<Vec<IngredientAmount>>,
}

/// Filter criteria for recipe listings
#[derive(Debug, Default, Clone)]
pub struct RecipeFilter {
    pub favorited_by: Option<i32>,
    pub in_cart_of: Option<i32>,
    pub author: Option<i32>,
    pub tag_slugs: Vec<String>,
}

/// The two per-recipe toggle relations sharing one state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkKind {
    Favorite,
    ShoppingCart,
}

/// Repository trait for users
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_all(&self) -> Result<Vec<User>, DomainError>;

    async fn find_by_id(&self, id: i32) -> Result<Option<User>, DomainError>;

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, DomainError>;

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, DomainError>;

    async fn create(&self, input: NewUser) -> Result<User, DomainError>;

    async fn update_password(&self, id: i32, password_hash: String) -> Result<(), DomainError>;

    /// Number of recipes authored by the given user
    async fn recipes_count(&self, author_id: i32) -> Result<u64, DomainError>;

    /// Briefs of the author's recipes, newest first, optionally capped
    async fn author_recipes(
        &self,
        author_id: i32,
        limit: Option<u64>,
    ) -> Result<Vec<RecipeBrief>, DomainError>;
}

/// Repository trait for subscriber -> author edges
#[async_trait]
pub trait SubscriptionRepository: Send + Sync {
    async fn exists(&self, subscriber_id: i32, author_id: i32) -> Result<bool, DomainError>;

    /// Fails with `Conflict` when the edge already exists.
    async fn add(&self, subscriber_id: i32, author_id: i32) -> Result<(), DomainError>;

    /// Fails with `Conflict` when the edge is absent.
    async fn remove(&self, subscriber_id: i32, author_id: i32) -> Result<(), DomainError>;

    /// Authors the given user subscribes to
    async fn authors_of(&self, subscriber_id: i32) -> Result<Vec<User>, DomainError>;
}

/// Repository trait for the tag catalog (read-only over the API)
#[async_trait]
pub trait TagRepository: Send + Sync {
    async fn find_all(&self) -> Result<Vec<Tag>, DomainError>;

    async fn find_by_id(&self, id: i32) -> Result<Option<Tag>, DomainError>;

    async fn find_by_ids(&self, ids: &[i32]) -> Result<Vec<Tag>, DomainError>;
}

/// Repository trait for the ingredient catalog (read-only over the API)
#[async_trait]
pub trait IngredientRepository: Send + Sync {
    /// All ingredients, optionally filtered by case-insensitive name prefix
    async fn find_all(&self, name_prefix: Option<&str>) -> Result<Vec<Ingredient>, DomainError>;

    async fn find_by_id(&self, id: i32) -> Result<Option<Ingredient>, DomainError>;

    async fn find_by_ids(&self, ids: &[i32]) -> Result<Vec<Ingredient>, DomainError>;
}

/// Repository trait for recipe aggregates
#[async_trait]
pub trait RecipeRepository: Send + Sync {
    async fn find(&self, filter: RecipeFilter) -> Result<Vec<RecipeRecord>, DomainError>;

    async fn find_by_id(&self, id: i32) -> Result<Option<RecipeRecord>, DomainError>;

    async fn brief(&self, id: i32) -> Result<Option<RecipeBrief>, DomainError>;

    /// Create the recipe, its ingredient lines and tag links in one transaction
    async fn create(&self, author_id: i32, input: NewRecipe) -> Result<RecipeRecord, DomainError>;

    /// Apply a partial update; present ingredient/tag sets replace the old ones
    async fn update(&self, id: i32, input: RecipeUpdate) -> Result<RecipeRecord, DomainError>;

    /// Delete the recipe after its owned lines and tag links
    async fn delete(&self, id: i32) -> Result<(), DomainError>;

    /// Every ingredient line of every recipe in the user's shopping cart
    async fn cart_lines(&self, user_id: i32) -> Result<Vec<IngredientLine>, DomainError>;
}

/// Repository trait for favorite/shopping-cart toggle relations
#[async_trait]
pub trait MarkRepository: Send + Sync {
    async fn exists(
        &self,
        kind: MarkKind,
        user_id: i32,
        recipe_id: i32,
    ) -> Result<bool, DomainError>;

    /// Fails with `Conflict` when the pair already exists.
    async fn add(&self, kind: MarkKind, user_id: i32, recipe_id: i32) -> Result<(), DomainError>;

    /// Fails with `Conflict` when the pair is absent.
    async fn remove(&self, kind: MarkKind, user_id: i32, recipe_id: i32)
        -> Result<(), DomainError>;
}
