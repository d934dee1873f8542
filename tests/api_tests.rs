use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use http_body_util::BodyExt;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};
use serde_json::{Value, json};
use std::sync::Arc;
use tempero::api::AppState;
use tempero::config::Config;
use tempero::entities::recipes;
use tower::ServiceExt;

async fn spawn_app() -> (Router, Arc<AppState>) {
    let mut config = Config::default();
    config.general.database_path = "sqlite::memory:".to_string();
    // A pool of in-memory sqlite connections would be a pool of separate
    // databases; pin it to one connection.
    config.general.max_db_connections = 1;
    config.general.min_db_connections = 1;
    config.server.secure_cookies = false;

    let state = tempero::api::create_app_state_from_config(config)
        .await
        .expect("Failed to create app state");
    let app = tempero::api::router(state.clone()).await;
    (app, state)
}

fn json_request(method: &str, uri: &str, cookie: Option<&str>, body: Option<&Value>) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, mime::APPLICATION_JSON.as_ref());

    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }

    let body = body.map_or_else(Body::empty, |v| Body::from(v.to_string()));
    builder.body(body).unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap_or(Value::Null)
}

fn register_payload(username: &str, email: &str) -> Value {
    json!({
        "username": username,
        "first_name": "first",
        "last_name": "last",
        "email": email,
        "password": "Str0ngPassword1",
        "password2": "Str0ngPassword1",
    })
}

fn recipe_payload(title: &str) -> Value {
    json!({
        "title": title,
        "description": "A rich black bean stew",
        "preparation_time": 90,
        "preparation_time_unit": "minutes",
        "servings": 6,
        "servings_unit": "portions",
        "preparation_steps": "Soak the beans overnight, then simmer.",
    })
}

async fn register(app: &Router, username: &str, email: &str) {
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/auth/register",
            None,
            Some(&register_payload(username, email)),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

/// Logs in and returns the session cookie to replay on later requests.
async fn login(app: &Router, username: &str, password: &str) -> String {
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/auth/login",
            None,
            Some(&json!({"username": username, "password": password})),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let set_cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .expect("login should set a session cookie")
        .to_str()
        .unwrap();

    set_cookie.split(';').next().unwrap().to_string()
}

async fn create_recipe(app: &Router, cookie: &str, payload: &Value) -> i64 {
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/dashboard/recipes",
            Some(cookie),
            Some(payload),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    body["data"]["id"].as_i64().expect("saved recipe id")
}

#[tokio::test]
async fn test_register_then_login() {
    let (app, _state) = spawn_app().await;

    register(&app, "testuser", "testuser@anyemail.com").await;

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/auth/login",
            None,
            Some(&json!({"username": "testuser", "password": "Str0ngPassword1"})),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["username"], "testuser");
}

#[tokio::test]
async fn test_register_rejects_get() {
    let (app, _state) = spawn_app().await;

    let response = app
        .clone()
        .oneshot(json_request("GET", "/api/auth/register", None, None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_register_reports_field_errors() {
    let (app, _state) = spawn_app().await;

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/auth/register",
            None,
            Some(&json!({
                "username": "",
                "first_name": "",
                "last_name": "",
                "email": "",
                "password": "",
                "password2": "",
            })),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = body_json(response).await;
    assert_eq!(body["success"], false);

    let errors = body["errors"].as_array().unwrap();
    let expected = [
        ("username", "This field must not be empty"),
        ("first_name", "Write your first name"),
        ("last_name", "Write your last name"),
        ("email", "Write your email"),
        ("password", "Password must not be empty"),
        ("password2", "Password confirmation must not be empty"),
    ];

    for (field, message) in expected {
        let entry = errors
            .iter()
            .find(|e| e["field"] == field)
            .unwrap_or_else(|| panic!("missing errors for {field}"));
        let messages = entry["messages"].as_array().unwrap();
        assert!(
            messages.iter().any(|m| m == message),
            "expected {message:?} on {field}, got {messages:?}"
        );
    }
}

#[tokio::test]
async fn test_password_mismatch_attaches_to_password() {
    let (app, _state) = spawn_app().await;

    let mut payload = register_payload("mismatch", "mismatch@anyemail.com");
    payload["password2"] = json!("Different1A");

    let response = app
        .clone()
        .oneshot(json_request("POST", "/api/auth/register", None, Some(&payload)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = body_json(response).await;
    let errors = body["errors"].as_array().unwrap();

    let message = "Password and password confirmation must be equal";
    let password_entry = errors.iter().find(|e| e["field"] == "password").unwrap();
    assert!(
        password_entry["messages"]
            .as_array()
            .unwrap()
            .iter()
            .any(|m| m == message)
    );
    assert!(!errors.iter().any(|e| e["field"] == "password2"
        && e["messages"].as_array().unwrap().iter().any(|m| m == message)));
}

#[tokio::test]
async fn test_duplicate_email_rejected() {
    let (app, _state) = spawn_app().await;

    register(&app, "first_author", "shared@anyemail.com").await;

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/auth/register",
            None,
            Some(&register_payload("second_author", "shared@anyemail.com")),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = body_json(response).await;
    let errors = body["errors"].as_array().unwrap();
    let email_entry = errors.iter().find(|e| e["field"] == "email").unwrap();
    assert!(
        email_entry["messages"]
            .as_array()
            .unwrap()
            .iter()
            .any(|m| m == "User email is already in use")
    );
}

#[tokio::test]
async fn test_login_with_wrong_password() {
    let (app, _state) = spawn_app().await;

    register(&app, "testuser", "testuser@anyemail.com").await;

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/auth/login",
            None,
            Some(&json!({"username": "testuser", "password": "WrongPassword1"})),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_dashboard_redirects_anonymous_to_login_with_next() {
    let (app, _state) = spawn_app().await;

    let response = app
        .clone()
        .oneshot(json_request("GET", "/api/dashboard", None, None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    let location = response
        .headers()
        .get(header::LOCATION)
        .unwrap()
        .to_str()
        .unwrap();
    assert_eq!(location, "/api/auth/login?next=%2Fapi%2Fdashboard");
}

#[tokio::test]
async fn test_create_recipe_forces_draft_flags() {
    let (app, _state) = spawn_app().await;

    register(&app, "author_a", "author_a@anyemail.com").await;
    let cookie = login(&app, "author_a", "Str0ngPassword1").await;

    // Client-submitted flags must be ignored entirely.
    let mut payload = recipe_payload("Feijoada completa");
    payload["is_published"] = json!(true);
    payload["preparation_step_is_html"] = json!(true);

    let id = create_recipe(&app, &cookie, &payload).await;

    let response = app
        .clone()
        .oneshot(json_request(
            "GET",
            &format!("/api/dashboard/recipes/{id}"),
            Some(&cookie),
            None,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    let recipe = &body["data"]["recipe"];
    assert_eq!(recipe["is_published"], false);
    assert_eq!(recipe["preparation_step_is_html"], false);
    assert_eq!(recipe["title"], "Feijoada completa");
}

#[tokio::test]
async fn test_save_redirects_to_edit_view() {
    let (app, _state) = spawn_app().await;

    register(&app, "author_a", "author_a@anyemail.com").await;
    let cookie = login(&app, "author_a", "Str0ngPassword1").await;

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/dashboard/recipes",
            Some(&cookie),
            Some(&recipe_payload("Feijoada completa")),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    let id = body["data"]["id"].as_i64().unwrap();
    assert_eq!(body["data"]["message"], "Your recipe was successfully saved");
    assert_eq!(
        body["data"]["redirect"],
        format!("/api/dashboard/recipes/{id}")
    );
}

#[tokio::test]
async fn test_recipe_form_validation_does_not_persist() {
    let (app, _state) = spawn_app().await;

    register(&app, "author_a", "author_a@anyemail.com").await;
    let cookie = login(&app, "author_a", "Str0ngPassword1").await;

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/dashboard/recipes",
            Some(&cookie),
            Some(&json!({"title": "Soup"})),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let response = app
        .clone()
        .oneshot(json_request("GET", "/api/dashboard", Some(&cookie), None))
        .await
        .unwrap();

    let body = body_json(response).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_update_owned_draft() {
    let (app, _state) = spawn_app().await;

    register(&app, "author_a", "author_a@anyemail.com").await;
    let cookie = login(&app, "author_a", "Str0ngPassword1").await;
    let id = create_recipe(&app, &cookie, &recipe_payload("Feijoada completa")).await;

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            &format!("/api/dashboard/recipes/{id}"),
            Some(&cookie),
            Some(&recipe_payload("Moqueca baiana")),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(json_request(
            "GET",
            &format!("/api/dashboard/recipes/{id}"),
            Some(&cookie),
            None,
        ))
        .await
        .unwrap();

    let body = body_json(response).await;
    assert_eq!(body["data"]["recipe"]["title"], "Moqueca baiana");
}

#[tokio::test]
async fn test_other_authors_recipe_is_not_found() {
    let (app, _state) = spawn_app().await;

    register(&app, "author_a", "author_a@anyemail.com").await;
    register(&app, "author_b", "author_b@anyemail.com").await;

    let cookie_a = login(&app, "author_a", "Str0ngPassword1").await;
    let id = create_recipe(&app, &cookie_a, &recipe_payload("Feijoada completa")).await;

    let cookie_b = login(&app, "author_b", "Str0ngPassword1").await;

    // Fetch, edit and delete must all fail closed for the non-owner.
    let fetch = app
        .clone()
        .oneshot(json_request(
            "GET",
            &format!("/api/dashboard/recipes/{id}"),
            Some(&cookie_b),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(fetch.status(), StatusCode::NOT_FOUND);
    let foreign_body = body_json(fetch).await;

    let edit = app
        .clone()
        .oneshot(json_request(
            "POST",
            &format!("/api/dashboard/recipes/{id}"),
            Some(&cookie_b),
            Some(&recipe_payload("Hijacked title")),
        ))
        .await
        .unwrap();
    assert_eq!(edit.status(), StatusCode::NOT_FOUND);

    let delete = app
        .clone()
        .oneshot(json_request(
            "DELETE",
            &format!("/api/dashboard/recipes/{id}"),
            Some(&cookie_b),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(delete.status(), StatusCode::NOT_FOUND);

    // The body must be identical to a genuinely nonexistent id.
    let missing = app
        .clone()
        .oneshot(json_request(
            "GET",
            "/api/dashboard/recipes/999999",
            Some(&cookie_b),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(missing).await, foreign_body);

    // And the owner still has the untouched draft.
    let mine = app
        .clone()
        .oneshot(json_request(
            "GET",
            &format!("/api/dashboard/recipes/{id}"),
            Some(&cookie_a),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(mine.status(), StatusCode::OK);
    let body = body_json(mine).await;
    assert_eq!(body["data"]["recipe"]["title"], "Feijoada completa");
}

#[tokio::test]
async fn test_published_recipe_is_hidden_from_owner() {
    let (app, state) = spawn_app().await;

    register(&app, "author_a", "author_a@anyemail.com").await;
    let cookie = login(&app, "author_a", "Str0ngPassword1").await;
    let id = create_recipe(&app, &cookie, &recipe_payload("Feijoada completa")).await;

    // Publishing happens outside this subsystem; flip the flag directly.
    recipes::Entity::update_many()
        .col_expr(
            recipes::Column::IsPublished,
            sea_orm::sea_query::Expr::value(true),
        )
        .filter(recipes::Column::Id.eq(id as i32))
        .exec(&state.store().conn)
        .await
        .unwrap();

    let response = app
        .clone()
        .oneshot(json_request(
            "GET",
            &format!("/api/dashboard/recipes/{id}"),
            Some(&cookie),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app
        .clone()
        .oneshot(json_request(
            "DELETE",
            &format!("/api/dashboard/recipes/{id}"),
            Some(&cookie),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    // Published rows drop out of the dashboard listing too.
    let response = app
        .clone()
        .oneshot(json_request("GET", "/api/dashboard", Some(&cookie), None))
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_delete_owned_draft() {
    let (app, _state) = spawn_app().await;

    register(&app, "author_a", "author_a@anyemail.com").await;
    let cookie = login(&app, "author_a", "Str0ngPassword1").await;
    let id = create_recipe(&app, &cookie, &recipe_payload("Feijoada completa")).await;

    let response = app
        .clone()
        .oneshot(json_request(
            "DELETE",
            &format!("/api/dashboard/recipes/{id}"),
            Some(&cookie),
            None,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["message"], "Deleted successfully");
    assert_eq!(body["data"]["redirect"], "/api/dashboard");

    let response = app
        .clone()
        .oneshot(json_request(
            "GET",
            &format!("/api/dashboard/recipes/{id}"),
            Some(&cookie),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_logout_flow() {
    let (app, _state) = spawn_app().await;

    register(&app, "my_user", "my_user@anyemail.com").await;
    let cookie = login(&app, "my_user", "Str0ngPassword1").await;

    // Logout is POST-only.
    let response = app
        .clone()
        .oneshot(json_request("GET", "/api/auth/logout", Some(&cookie), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = body_json(response).await;
    assert_eq!(body["error"], "Invalid logout request");

    // Logging out another user is rejected.
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/auth/logout",
            Some(&cookie),
            Some(&json!({"username": "another_user"})),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"], "Wrong user logout");

    // Matching username signs out and kills the session.
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/auth/logout",
            Some(&cookie),
            Some(&json!({"username": "my_user"})),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["message"], "You signed out");

    let response = app
        .clone()
        .oneshot(json_request("GET", "/api/dashboard", Some(&cookie), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
}

#[tokio::test]
async fn test_new_recipe_form_is_blank() {
    let (app, _state) = spawn_app().await;

    register(&app, "author_a", "author_a@anyemail.com").await;
    let cookie = login(&app, "author_a", "Str0ngPassword1").await;

    let response = app
        .clone()
        .oneshot(json_request(
            "GET",
            "/api/dashboard/recipes/new",
            Some(&cookie),
            None,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["recipe"], Value::Null);
}

#[tokio::test]
async fn test_me_returns_current_author() {
    let (app, _state) = spawn_app().await;

    register(&app, "author_a", "author_a@anyemail.com").await;
    let cookie = login(&app, "author_a", "Str0ngPassword1").await;

    let response = app
        .clone()
        .oneshot(json_request("GET", "/api/auth/me", Some(&cookie), None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["username"], "author_a");
    assert_eq!(body["data"]["email"], "author_a@anyemail.com");
    assert!(body["data"].get("password_hash").is_none());
}
