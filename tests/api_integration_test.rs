use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait, QueryFilter, Set,
};
use tower::util::ServiceExt; // for `oneshot`

use recipegram::auth;
use recipegram::db;
use recipegram::infrastructure::AppState;
use recipegram::{api, models};

// Helper to create a test app state over in-memory SQLite
async fn setup_test_state() -> AppState {
    let db = db::init_db("sqlite::memory:")
        .await
        .expect("Failed to init DB");
    let media_root = std::env::temp_dir()
        .join(format!("recipegram_test_{:x}", rand_suffix()))
        .to_str()
        .unwrap()
        .to_string();
    AppState::new(db, media_root)
}

fn rand_suffix() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos() as u64
}

fn test_app(state: AppState) -> Router {
    api::api_router(state)
}

// Helper to create a test user, returning (id, bearer token)
async fn create_test_user(db: &DatabaseConnection, username: &str) -> (i32, String) {
    let now = chrono::Utc::now().to_rfc3339();
    let user = models::user::ActiveModel {
        email: Set(format!("{}@example.com", username)),
        username: Set(username.to_string()),
        first_name: Set("Test".to_string()),
        last_name: Set("User".to_string()),
        password_hash: Set(auth::hash_password("passw0rd!long").unwrap()),
        created_at: Set(now.clone()),
        updated_at: Set(now),
        ..Default::default()
    };
    let user = user.insert(db).await.expect("Failed to create user");
    let token = auth::create_jwt(&user.username, user.id).expect("Failed to create token");
    (user.id, token)
}

// Helper to create a measurement unit
async fn create_test_unit(db: &DatabaseConnection, label: &str) -> i32 {
    let unit = models::measurement_unit::ActiveModel {
        label: Set(label.to_string()),
        ..Default::default()
    };
    unit.insert(db).await.expect("Failed to create unit").id
}

// Helper to create an ingredient
async fn create_test_ingredient(db: &DatabaseConnection, name: &str, unit_id: i32) -> i32 {
    let ingredient = models::ingredient::ActiveModel {
        name: Set(name.to_string()),
        measurement_unit_id: Set(Some(unit_id)),
        ..Default::default()
    };
    ingredient
        .insert(db)
        .await
        .expect("Failed to create ingredient")
        .id
}

// Helper to create a tag
async fn create_test_tag(db: &DatabaseConnection, name: &str, color: &str, slug: &str) -> i32 {
    let tag = models::tag::ActiveModel {
        name: Set(name.to_string()),
        color: Set(color.to_string()),
        slug: Set(slug.to_string()),
        ..Default::default()
    };
    tag.insert(db).await.expect("Failed to create tag").id
}

fn authed_json_request(uri: &str, method: &str, token: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .method(method)
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(serde_json::to_vec(&body).unwrap()))
        .unwrap()
}

fn authed_request(uri: &str, method: &str, token: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .method(method)
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_text(response: axum::response::Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

#[tokio::test]
async fn test_register_and_login() {
    let state = setup_test_state().await;
    let app = test_app(state);

    let payload = serde_json::json!({
        "email": "anna@example.com",
        "username": "Anna",
        "first_name": "Anna",
        "last_name": "Smith",
        "password": "kitchen-secret-1"
    });
    let req = Request::builder()
        .uri("/users")
        .method("POST")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(serde_json::to_vec(&payload).unwrap()))
        .unwrap();
    let response = app.clone().oneshot(req).await.unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_json(response).await;
    // Username is lowercased on registration
    assert_eq!(body["username"], "anna");
    assert!(body.get("password").is_none());

    let login = serde_json::json!({
        "email": "anna@example.com",
        "password": "kitchen-secret-1"
    });
    let req = Request::builder()
        .uri("/auth/token/login")
        .method("POST")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(serde_json::to_vec(&login).unwrap()))
        .unwrap();
    let response = app.oneshot(req).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert!(body["auth_token"].is_string());
}

#[tokio::test]
async fn test_recipe_create_with_ingredient_lines() {
    let state = setup_test_state().await;
    let db = state.db().clone();
    let (_, token) = create_test_user(&db, "chef").await;
    let unit_id = create_test_unit(&db, "g").await;
    let salt = create_test_ingredient(&db, "Salt", unit_id).await;
    let flour = create_test_ingredient(&db, "Flour", unit_id).await;
    let tag_id = create_test_tag(&db, "Dinner", "#8775D2", "dinner").await;
    let app = test_app(state);

    let payload = serde_json::json!({
        "name": "Bread",
        "text": "Mix and bake.",
        "cooking_time": 90,
        "tags": [tag_id],
        "ingredients": [
            {"id": salt, "amount": 10},
            {"id": flour, "amount": 500}
        ]
    });
    let response = app
        .clone()
        .oneshot(authed_json_request("/recipes", "POST", &token, payload))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_json(response).await;
    assert_eq!(body["name"], "Bread");
    assert_eq!(body["tags"][0]["slug"], "dinner");
    assert_eq!(body["ingredients"].as_array().unwrap().len(), 2);
    assert_eq!(body["ingredients"][0]["measurement_unit"], "g");
    assert_eq!(body["author"]["username"], "chef");

    // Lines are persisted scoped to the recipe
    let recipe_id = body["id"].as_i64().unwrap() as i32;
    let lines = models::recipe_ingredient::Entity::find()
        .filter(models::recipe_ingredient::Column::RecipeId.eq(recipe_id))
        .all(&db)
        .await
        .unwrap();
    assert_eq!(lines.len(), 2);
}

#[tokio::test]
async fn test_recipe_update_replaces_ingredients_only_when_present() {
    let state = setup_test_state().await;
    let db = state.db().clone();
    let (_, token) = create_test_user(&db, "chef").await;
    let unit_id = create_test_unit(&db, "g").await;
    let salt = create_test_ingredient(&db, "Salt", unit_id).await;
    let sugar = create_test_ingredient(&db, "Sugar", unit_id).await;
    let app = test_app(state);

    let payload = serde_json::json!({
        "name": "Dough",
        "text": "Knead.",
        "cooking_time": 30,
        "ingredients": [{"id": salt, "amount": 5}]
    });
    let response = app
        .clone()
        .oneshot(authed_json_request("/recipes", "POST", &token, payload))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let recipe_id = body_json(response).await["id"].as_i64().unwrap();

    // Patch without ingredients leaves the lines untouched
    let patch = serde_json::json!({ "name": "Sweet dough" });
    let response = app
        .clone()
        .oneshot(authed_json_request(
            &format!("/recipes/{}", recipe_id),
            "PATCH",
            &token,
            patch,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["name"], "Sweet dough");
    assert_eq!(body["ingredients"].as_array().unwrap().len(), 1);
    assert_eq!(body["ingredients"][0]["name"], "Salt");

    // Patch with ingredients replaces the whole set
    let patch = serde_json::json!({ "ingredients": [{"id": sugar, "amount": 40}] });
    let response = app
        .oneshot(authed_json_request(
            &format!("/recipes/{}", recipe_id),
            "PATCH",
            &token,
            patch,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    let ingredients = body["ingredients"].as_array().unwrap();
    assert_eq!(ingredients.len(), 1);
    assert_eq!(ingredients[0]["name"], "Sugar");
    assert_eq!(ingredients[0]["amount"], 40);
}

#[tokio::test]
async fn test_duplicate_tag_ids_collapse_to_one_link() {
    let state = setup_test_state().await;
    let db = state.db().clone();
    let (_, token) = create_test_user(&db, "chef").await;
    let unit_id = create_test_unit(&db, "g").await;
    let salt = create_test_ingredient(&db, "Salt", unit_id).await;
    let dinner = create_test_tag(&db, "Dinner", "#8775D2", "dinner").await;
    let app = test_app(state);

    let payload = serde_json::json!({
        "name": "Stew",
        "text": "Simmer.",
        "cooking_time": 60,
        "tags": [dinner, dinner],
        "ingredients": [{"id": salt, "amount": 4}]
    });
    let response = app
        .oneshot(authed_json_request("/recipes", "POST", &token, payload))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_json(response).await;
    let tags = body["tags"].as_array().unwrap();
    assert_eq!(tags.len(), 1);
    assert_eq!(tags[0]["slug"], "dinner");

    let recipe_id = body["id"].as_i64().unwrap() as i32;
    let links = models::recipe_tag::Entity::find()
        .filter(models::recipe_tag::Column::RecipeId.eq(recipe_id))
        .all(&db)
        .await
        .unwrap();
    assert_eq!(links.len(), 1);
}

#[tokio::test]
async fn test_favorite_toggle_state_machine() {
    let state = setup_test_state().await;
    let db = state.db().clone();
    let (_, token) = create_test_user(&db, "chef").await;
    let unit_id = create_test_unit(&db, "g").await;
    let salt = create_test_ingredient(&db, "Salt", unit_id).await;
    let app = test_app(state);

    let payload = serde_json::json!({
        "name": "Soup",
        "text": "Boil.",
        "cooking_time": 20,
        "ingredients": [{"id": salt, "amount": 3}]
    });
    let response = app
        .clone()
        .oneshot(authed_json_request("/recipes", "POST", &token, payload))
        .await
        .unwrap();
    let recipe_id = body_json(response).await["id"].as_i64().unwrap();
    let uri = format!("/recipes/{}/favorite", recipe_id);

    // POST: absent -> present, brief payload
    let response = app
        .clone()
        .oneshot(authed_request(&uri, "POST", &token))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_json(response).await;
    assert_eq!(body["name"], "Soup");
    assert_eq!(body["cooking_time"], 20);
    assert!(body.get("text").is_none());

    // The stored mark resolves back to its recipe
    let mark = models::favorite::Entity::find()
        .filter(models::favorite::Column::RecipeId.eq(recipe_id as i32))
        .one(&db)
        .await
        .unwrap()
        .unwrap();
    let marked_recipe = mark
        .find_related(models::recipe::Entity)
        .one(&db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(marked_recipe.name, "Soup");

    // POST again: already present -> 400
    let response = app
        .clone()
        .oneshot(authed_request(&uri, "POST", &token))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert!(body["errors"].as_str().unwrap().contains("already"));

    // DELETE: present -> absent
    let response = app
        .clone()
        .oneshot(authed_request(&uri, "DELETE", &token))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    // DELETE again: absent -> 400
    let response = app
        .oneshot(authed_request(&uri, "DELETE", &token))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_shopping_cart_download_merges_lines() {
    let state = setup_test_state().await;
    let db = state.db().clone();
    let (_, token) = create_test_user(&db, "chef").await;
    let grams = create_test_unit(&db, "g").await;
    let ml = create_test_unit(&db, "ml").await;
    let salt = create_test_ingredient(&db, "Salt", grams).await;
    let milk = create_test_ingredient(&db, "Milk", ml).await;
    let app = test_app(state);

    // Recipe 1: Salt 10
    let response = app
        .clone()
        .oneshot(authed_json_request(
            "/recipes",
            "POST",
            &token,
            serde_json::json!({
                "name": "Recipe1",
                "text": "One.",
                "cooking_time": 5,
                "ingredients": [{"id": salt, "amount": 10}]
            }),
        ))
        .await
        .unwrap();
    let first = body_json(response).await["id"].as_i64().unwrap();

    // Recipe 2: Salt 5, Milk 250
    let response = app
        .clone()
        .oneshot(authed_json_request(
            "/recipes",
            "POST",
            &token,
            serde_json::json!({
                "name": "Recipe2",
                "text": "Two.",
                "cooking_time": 5,
                "ingredients": [
                    {"id": salt, "amount": 5},
                    {"id": milk, "amount": 250}
                ]
            }),
        ))
        .await
        .unwrap();
    let second = body_json(response).await["id"].as_i64().unwrap();

    for id in [first, second] {
        let response = app
            .clone()
            .oneshot(authed_request(
                &format!("/recipes/{}/shopping_cart", id),
                "POST",
                &token,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    let response = app
        .oneshot(authed_request(
            "/recipes/download_shopping_cart",
            "GET",
            &token,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let disposition = response
        .headers()
        .get(header::CONTENT_DISPOSITION)
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(disposition.contains("shopping_cart.txt"));

    // Salt merged across both recipes, output sorted by name
    let text = body_text(response).await;
    assert_eq!(text, "- Milk [ml]: 250\n- Salt [g]: 15\n");
}

#[tokio::test]
async fn test_subscribe_flow() {
    let state = setup_test_state().await;
    let db = state.db().clone();
    let (author_id, _) = create_test_user(&db, "author").await;
    let (_, reader_token) = create_test_user(&db, "reader").await;
    let app = test_app(state);

    let uri = format!("/users/{}/subscribe", author_id);
    let response = app
        .clone()
        .oneshot(authed_request(&uri, "POST", &reader_token))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["username"], "author");
    assert_eq!(body["is_subscribed"], true);
    assert_eq!(body["recipes_count"], 0);

    // Listing shows the author
    let response = app
        .clone()
        .oneshot(authed_request("/users/subscriptions", "GET", &reader_token))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body.as_array().unwrap().len(), 1);

    // Duplicate subscribe is rejected
    let response = app
        .clone()
        .oneshot(authed_request(&uri, "POST", &reader_token))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Unsubscribe, then unsubscribing again fails
    let response = app
        .clone()
        .oneshot(authed_request(&uri, "DELETE", &reader_token))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    let response = app
        .oneshot(authed_request(&uri, "DELETE", &reader_token))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_recipe_list_filters() {
    let state = setup_test_state().await;
    let db = state.db().clone();
    let (_, chef_token) = create_test_user(&db, "chef").await;
    let (_, guest_token) = create_test_user(&db, "guest").await;
    let unit_id = create_test_unit(&db, "g").await;
    let salt = create_test_ingredient(&db, "Salt", unit_id).await;
    let breakfast = create_test_tag(&db, "Breakfast", "#E26C2D", "breakfast").await;
    let app = test_app(state);

    let response = app
        .clone()
        .oneshot(authed_json_request(
            "/recipes",
            "POST",
            &chef_token,
            serde_json::json!({
                "name": "Porridge",
                "text": "Stir.",
                "cooking_time": 10,
                "tags": [breakfast],
                "ingredients": [{"id": salt, "amount": 1}]
            }),
        ))
        .await
        .unwrap();
    let recipe_id = body_json(response).await["id"].as_i64().unwrap();

    let response = app
        .clone()
        .oneshot(authed_json_request(
            "/recipes",
            "POST",
            &chef_token,
            serde_json::json!({
                "name": "Plain rice",
                "text": "Boil.",
                "cooking_time": 15,
                "ingredients": [{"id": salt, "amount": 2}]
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    // Tag slug filter matches only the tagged recipe
    let req = Request::builder()
        .uri("/recipes?tags=breakfast")
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(req).await.unwrap();
    let body = body_json(response).await;
    assert_eq!(body.as_array().unwrap().len(), 1);
    assert_eq!(body[0]["name"], "Porridge");

    // Favorite filter is viewer-relative
    let response = app
        .clone()
        .oneshot(authed_request(
            &format!("/recipes/{}/favorite", recipe_id),
            "POST",
            &guest_token,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = app
        .clone()
        .oneshot(authed_request("/recipes?is_favorited=1", "GET", &guest_token))
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(body.as_array().unwrap().len(), 1);
    assert_eq!(body[0]["is_favorited"], true);

    let response = app
        .oneshot(authed_request("/recipes?is_favorited=1", "GET", &chef_token))
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(body.as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_recipe_delete_removes_owned_lines() {
    let state = setup_test_state().await;
    let db = state.db().clone();
    let (_, token) = create_test_user(&db, "chef").await;
    let unit_id = create_test_unit(&db, "g").await;
    let salt = create_test_ingredient(&db, "Salt", unit_id).await;
    let app = test_app(state);

    let response = app
        .clone()
        .oneshot(authed_json_request(
            "/recipes",
            "POST",
            &token,
            serde_json::json!({
                "name": "Broth",
                "text": "Simmer.",
                "cooking_time": 45,
                "ingredients": [{"id": salt, "amount": 7}]
            }),
        ))
        .await
        .unwrap();
    let recipe_id = body_json(response).await["id"].as_i64().unwrap() as i32;

    let response = app
        .oneshot(authed_request(
            &format!("/recipes/{}", recipe_id),
            "DELETE",
            &token,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let lines = models::recipe_ingredient::Entity::find()
        .filter(models::recipe_ingredient::Column::RecipeId.eq(recipe_id))
        .all(&db)
        .await
        .unwrap();
    assert!(lines.is_empty());
    let recipe = models::recipe::Entity::find_by_id(recipe_id)
        .one(&db)
        .await
        .unwrap();
    assert!(recipe.is_none());
}

#[tokio::test]
async fn test_me_and_set_password() {
    let state = setup_test_state().await;
    let db = state.db().clone();
    let (_, token) = create_test_user(&db, "chef").await;
    let app = test_app(state);

    let response = app
        .clone()
        .oneshot(authed_request("/users/me", "GET", &token))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["username"], "chef");

    let response = app
        .clone()
        .oneshot(authed_json_request(
            "/users/set_password",
            "POST",
            &token,
            serde_json::json!({
                "current_password": "passw0rd!long",
                "new_password": "another-secret-9"
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    // Old password no longer verifies
    let login = serde_json::json!({
        "email": "chef@example.com",
        "password": "passw0rd!long"
    });
    let req = Request::builder()
        .uri("/auth/token/login")
        .method("POST")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(serde_json::to_vec(&login).unwrap()))
        .unwrap();
    let response = app.oneshot(req).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
