use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use sea_orm::{ActiveModelTrait, DatabaseConnection, Set};
use tower::util::ServiceExt; // for `oneshot`

use recipegram::auth;
use recipegram::db;
use recipegram::infrastructure::AppState;
use recipegram::{api, models};

async fn setup_test_state() -> AppState {
    let db = db::init_db("sqlite::memory:")
        .await
        .expect("Failed to init DB");
    let media_root = std::env::temp_dir()
        .join(format!("recipegram_err_test_{:x}", nanos()))
        .to_str()
        .unwrap()
        .to_string();
    AppState::new(db, media_root)
}

fn nanos() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos() as u64
}

fn test_app(state: AppState) -> Router {
    api::api_router(state)
}

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

async fn create_test_ingredient(db: &DatabaseConnection, name: &str) -> i32 {
    let unit = models::measurement_unit::ActiveModel {
        label: Set("g".to_string()),
        ..Default::default()
    };
    let unit = unit.insert(db).await.expect("Failed to create unit");
    let ingredient = models::ingredient::ActiveModel {
        name: Set(name.to_string()),
        measurement_unit_id: Set(Some(unit.id)),
        ..Default::default()
    };
    ingredient
        .insert(db)
        .await
        .expect("Failed to create ingredient")
        .id
}

fn json_request(uri: &str, method: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .method(method)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(serde_json::to_vec(&body).unwrap()))
        .unwrap()
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

#[tokio::test]
async fn test_create_recipe_requires_auth() {
    let state = setup_test_state().await;
    let app = test_app(state);

    let response = app
        .oneshot(json_request(
            "/recipes",
            "POST",
            serde_json::json!({"name": "x", "text": "y", "cooking_time": 1}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(response).await;
    assert_eq!(body["detail"], "Authentication credentials were not provided.");
}

#[tokio::test]
async fn test_invalid_token_rejected() {
    let state = setup_test_state().await;
    let app = test_app(state);

    let response = app
        .oneshot(authed_request("/users/me", "GET", "not-a-real-token"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_login_with_wrong_password() {
    let state = setup_test_state().await;
    let db = state.db().clone();
    create_test_user(&db, "chef").await;
    let app = test_app(state);

    let response = app
        .oneshot(json_request(
            "/auth/token/login",
            "POST",
            serde_json::json!({"email": "chef@example.com", "password": "wrong"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_register_duplicate_email() {
    let state = setup_test_state().await;
    let db = state.db().clone();
    create_test_user(&db, "chef").await;
    let app = test_app(state);

    let response = app
        .oneshot(json_request(
            "/users",
            "POST",
            serde_json::json!({
                "email": "chef@example.com",
                "username": "otherchef",
                "first_name": "Other",
                "last_name": "Chef",
                "password": "kitchen-secret-1"
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert!(body.get("email").is_some());
}

#[tokio::test]
async fn test_register_weak_password() {
    let state = setup_test_state().await;
    let app = test_app(state);

    let response = app
        .oneshot(json_request(
            "/users",
            "POST",
            serde_json::json!({
                "email": "weak@example.com",
                "username": "weak",
                "first_name": "W",
                "last_name": "K",
                "password": "12345678"
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert!(body.get("password").is_some());
}

#[tokio::test]
async fn test_recipe_validation_errors() {
    let state = setup_test_state().await;
    let db = state.db().clone();
    let (_, token) = create_test_user(&db, "chef").await;
    let salt = create_test_ingredient(&db, "Salt").await;
    let app = test_app(state);

    // Empty ingredient list
    let response = app
        .clone()
        .oneshot(authed_json_request(
            "/recipes",
            "POST",
            &token,
            serde_json::json!({
                "name": "Nothing",
                "text": "Empty.",
                "cooking_time": 5,
                "ingredients": []
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert!(body.get("ingredients").is_some());

    // Unknown ingredient id
    let response = app
        .clone()
        .oneshot(authed_json_request(
            "/recipes",
            "POST",
            &token,
            serde_json::json!({
                "name": "Ghost",
                "text": "Huh.",
                "cooking_time": 5,
                "ingredients": [{"id": 9999, "amount": 1}]
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Non-positive amount names the offending ingredient
    let response = app
        .clone()
        .oneshot(authed_json_request(
            "/recipes",
            "POST",
            &token,
            serde_json::json!({
                "name": "Zero",
                "text": "None.",
                "cooking_time": 5,
                "ingredients": [{"id": salt, "amount": 0}]
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert!(body["amount"][0].as_str().unwrap().contains("Salt"));

    // Duplicate ingredient entries
    let response = app
        .clone()
        .oneshot(authed_json_request(
            "/recipes",
            "POST",
            &token,
            serde_json::json!({
                "name": "Twice",
                "text": "Dup.",
                "cooking_time": 5,
                "ingredients": [
                    {"id": salt, "amount": 1},
                    {"id": salt, "amount": 2}
                ]
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Zero cooking time
    let response = app
        .clone()
        .oneshot(authed_json_request(
            "/recipes",
            "POST",
            &token,
            serde_json::json!({
                "name": "Instant",
                "text": "Fast.",
                "cooking_time": 0,
                "ingredients": [{"id": salt, "amount": 1}]
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert!(body.get("cooking_time").is_some());

    // Unknown tag id
    let response = app
        .oneshot(authed_json_request(
            "/recipes",
            "POST",
            &token,
            serde_json::json!({
                "name": "Untagged",
                "text": "Hm.",
                "cooking_time": 5,
                "tags": [777],
                "ingredients": [{"id": salt, "amount": 1}]
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert!(body.get("tags").is_some());
}

#[tokio::test]
async fn test_update_foreign_recipe_forbidden() {
    let state = setup_test_state().await;
    let db = state.db().clone();
    let (_, owner_token) = create_test_user(&db, "owner").await;
    let (_, intruder_token) = create_test_user(&db, "intruder").await;
    let salt = create_test_ingredient(&db, "Salt").await;
    let app = test_app(state);

    let response = app
        .clone()
        .oneshot(authed_json_request(
            "/recipes",
            "POST",
            &owner_token,
            serde_json::json!({
                "name": "Mine",
                "text": "Private.",
                "cooking_time": 5,
                "ingredients": [{"id": salt, "amount": 1}]
            }),
        ))
        .await
        .unwrap();
    let recipe_id = body_json(response).await["id"].as_i64().unwrap();

    let uri = format!("/recipes/{}", recipe_id);
    let response = app
        .clone()
        .oneshot(authed_json_request(
            &uri,
            "PATCH",
            &intruder_token,
            serde_json::json!({"name": "Stolen"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let body = body_json(response).await;
    assert_eq!(
        body["detail"],
        "You do not have permission to perform this action."
    );

    let response = app
        .oneshot(authed_request(&uri, "DELETE", &intruder_token))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_missing_resources_return_404() {
    let state = setup_test_state().await;
    let db = state.db().clone();
    let (_, token) = create_test_user(&db, "chef").await;
    let app = test_app(state);

    for uri in ["/recipes/424242", "/users/424242", "/tags/424242", "/ingredients/424242"] {
        let response = app
            .clone()
            .oneshot(authed_request(uri, "GET", &token))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND, "expected 404 for {uri}");
    }

    // Marking a missing recipe is 404, not 400
    let response = app
        .oneshot(authed_request("/recipes/424242/favorite", "POST", &token))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_subscribe_to_self_rejected() {
    let state = setup_test_state().await;
    let db = state.db().clone();
    let (user_id, token) = create_test_user(&db, "loner").await;
    let app = test_app(state);

    let response = app
        .oneshot(authed_request(
            &format!("/users/{}/subscribe", user_id),
            "POST",
            &token,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert!(body["errors"].as_str().unwrap().contains("yourself"));
}

#[tokio::test]
async fn test_set_password_with_wrong_current() {
    let state = setup_test_state().await;
    let db = state.db().clone();
    let (_, token) = create_test_user(&db, "chef").await;
    let app = test_app(state);

    let response = app
        .oneshot(authed_json_request(
            "/users/set_password",
            "POST",
            &token,
            serde_json::json!({
                "current_password": "not-my-password",
                "new_password": "another-secret-9"
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert!(body.get("current_password").is_some());
}
