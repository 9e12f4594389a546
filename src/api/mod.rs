pub mod auth;
pub mod error;
pub mod health;
pub mod ingredients;
pub mod recipes;
pub mod shapes;
pub mod tags;
pub mod users;

use axum::{
    routing::{get, post},
    Router,
};

use crate::infrastructure::AppState;

pub fn api_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(health::health_check))
        // Auth
        .route("/auth/token/login", post(auth::login))
        .route("/auth/token/logout", post(auth::logout))
        // Users
        .route("/users", get(users::list_users).post(users::create_user))
        .route("/users/me", get(users::me))
        .route("/users/set_password", post(users::set_password))
        .route("/users/subscriptions", get(users::subscriptions))
        .route("/users/:id", get(users::get_user))
        .route(
            "/users/:id/subscribe",
            post(users::subscribe).delete(users::unsubscribe),
        )
        // Tags
        .route("/tags", get(tags::list_tags))
        .route("/tags/:id", get(tags::get_tag))
        // Ingredients
        .route("/ingredients", get(ingredients::list_ingredients))
        .route("/ingredients/:id", get(ingredients::get_ingredient))
        // Recipes
        .route(
            "/recipes",
            get(recipes::list_recipes).post(recipes::create_recipe),
        )
        .route(
            "/recipes/download_shopping_cart",
            get(recipes::download_shopping_cart),
        )
        .route(
            "/recipes/:id",
            get(recipes::get_recipe)
                .put(recipes::update_recipe)
                .patch(recipes::update_recipe)
                .delete(recipes::delete_recipe),
        )
        .route(
            "/recipes/:id/favorite",
            post(recipes::add_favorite).delete(recipes::remove_favorite),
        )
        .route(
            "/recipes/:id/shopping_cart",
            post(recipes::add_to_cart).delete(recipes::remove_from_cart),
        )
        .with_state(state)
}
