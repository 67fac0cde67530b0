//! HTTP API 端到端测试
//! 需要 PostgreSQL：TEST_DATABASE_URL=... cargo test -- --ignored

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use boarding_service::routes::create_router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

mod common;
use common::*;

async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

async fn register_and_login(app: &Router) -> (String, String) {
    let username = unique("api");
    let (status, _) = send(
        app,
        Method::POST,
        "/register",
        None,
        Some(json!({
            "username": username,
            "email": format!("{}@example.com", username),
            "password": TEST_PASSWORD,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = send(
        app,
        Method::POST,
        "/login",
        None,
        Some(json!({ "username": username, "password": TEST_PASSWORD })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let token = body["data"]["access_token"].as_str().unwrap().to_string();
    (username, token)
}

#[tokio::test]
#[ignore]
async fn test_health_endpoints() {
    let app = create_router(create_test_app_state().await);

    let (status, body) = send(&app, Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");

    let (status, body) = send(&app, Method::GET, "/ready", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ready"], true);
}

#[tokio::test]
#[ignore]
async fn test_duplicate_registration_conflicts() {
    let app = create_router(create_test_app_state().await);
    let username = unique("dup");
    let payload = json!({
        "username": username,
        "email": format!("{}@example.com", username),
        "password": TEST_PASSWORD,
    });

    let (status, _) = send(&app, Method::POST, "/register", None, Some(payload.clone())).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = send(&app, Method::POST, "/register", None, Some(payload)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["success"], false);
}

#[tokio::test]
#[ignore]
async fn test_malformed_input_uses_error_envelope() {
    let state = create_test_app_state().await;
    let app = create_router(state.clone());
    let (username, token) = register_and_login(&app).await;
    grant_admin(&state, &username).await;

    // 字段类型错误
    let (status, body) = send(
        &app,
        Method::POST,
        "/register",
        None,
        Some(json!({ "username": 5 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert!(body["errors"].is_string());

    // 无法解析的请求体
    let request = Request::builder()
        .method(Method::POST)
        .uri("/login")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "Invalid request");

    let (status, body) = send(&app, Method::GET, "/api/roles/not-a-uuid", Some(&token), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);

    let (status, body) = send(&app, Method::GET, "/api/roles?page=abc", Some(&token), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
}

#[tokio::test]
#[ignore]
async fn test_current_user_and_permission_gate() {
    let state = create_test_app_state().await;
    let app = create_router(state.clone());
    let (username, token) = register_and_login(&app).await;

    let (status, body) = send(&app, Method::GET, "/api/users/_current", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["username"], username.as_str());
    assert!(body["data"]["password_hash"].is_null());

    // 无角色：无权访问角色列表
    let (status, _) = send(&app, Method::GET, "/api/roles", Some(&token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    grant_admin(&state, &username).await;

    let (status, body) = send(&app, Method::GET, "/api/roles?page=1&size=5", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["meta"]["current_page"], 1);
    assert_eq!(body["meta"]["per_page"], 5);
}

#[tokio::test]
#[ignore]
async fn test_harbor_crud_and_scoped_listing() {
    let state = create_test_app_state().await;
    let app = create_router(state.clone());
    let (username, token) = register_and_login(&app).await;
    grant_admin(&state, &username).await;

    let code = unique("R");
    let (status, body) = send(
        &app,
        Method::POST,
        "/api/harbors",
        Some(&token),
        Some(json!({
            "harbor_code": code,
            "harbor_name": "Port of Rotterdam",
            "country": "NL",
            "province": "South Holland",
            "city": "Rotterdam",
            "latitude": 51.95,
            "longitude": 4.14,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let harbor_id = body["data"]["id"].as_str().unwrap().to_string();

    // admin 尚未被授予该港口
    let uri = format!("/api/harbors/{}", harbor_id);
    let (status, _) = send(&app, Method::GET, &uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let role = create_test_role(&state).await;
    let (status, _) = send(
        &app,
        Method::POST,
        &format!("/api/roles/{}/harbors", role.id),
        Some(&token),
        Some(json!({ "harbor_ids": [harbor_id] })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let user_id = state
        .auth_service
        .login(boarding_service::models::auth::LoginRequest {
            username: username.clone(),
            password: TEST_PASSWORD.to_string(),
        })
        .await
        .unwrap()
        .user
        .id;
    let (status, _) = send(
        &app,
        Method::POST,
        &format!("/api/users/{}/roles", user_id),
        Some(&token),
        Some(json!({ "role_ids": [role.id] })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(
        &app,
        Method::GET,
        "/api/harbors?name=rotterdam",
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["meta"]["total"], 1);
    assert_eq!(body["data"][0]["harbor_code"], code.as_str());

    let (status, body) = send(
        &app,
        Method::GET,
        "/api/harbors?name=amsterdam",
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["meta"]["total"], 0);

    let (status, body) = send(
        &app,
        Method::PUT,
        &uri,
        Some(&token),
        Some(json!({ "berth_count": 42 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["berth_count"], 42);
    assert_eq!(body["data"]["harbor_name"], "Port of Rotterdam");

    let (status, _) = send(&app, Method::DELETE, &uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = send(&app, Method::GET, &uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
#[ignore]
async fn test_ship_requires_live_operator_and_blocks_operator_delete() {
    let state = create_test_app_state().await;
    let app = create_router(state.clone());
    let (username, token) = register_and_login(&app).await;
    grant_admin(&state, &username).await;
    let owner = create_test_user(&state).await;

    let ship = |operator_id: Value| {
        json!({
            "operator_id": operator_id,
            "ship_name": "Ever Given",
            "ship_type": "container",
            "flag_state": "PA",
            "port_of_registry": "Panama",
        })
    };

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/ships",
        Some(&token),
        Some(ship(json!(uuid::Uuid::new_v4()))),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/operators",
        Some(&token),
        Some(json!({
            "user_id": owner.id,
            "operator_code": unique("OP"),
            "company_name": "Evergreen Marine",
            "license_number": unique("LIC"),
            "contact_person": "Chang Yung-fa",
            "contact_phone": "+886225001234",
            "contact_email": "ops@evergreen.example.com",
            "address": "166 Minsheng East Road",
            "city": "Taipei",
            "province": "Taipei",
            "country": "TW",
            "postal_code": "104",
            "operator_type": "carrier",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    let operator_id = body["data"]["id"].clone();

    let (status, body) = send(&app, Method::POST, "/api/ships", Some(&token), Some(ship(operator_id.clone()))).await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    let ship_id = body["data"]["id"].as_str().unwrap().to_string();

    let operator_uri = format!("/api/operators/{}", operator_id.as_str().unwrap());
    let (status, _) = send(&app, Method::DELETE, &operator_uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = send(&app, Method::DELETE, &format!("/api/ships/{}", ship_id), Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = send(&app, Method::DELETE, &operator_uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
#[ignore]
async fn test_logout_blocks_refresh() {
    let app = create_router(create_test_app_state().await);
    let username = unique("out");
    send(
        &app,
        Method::POST,
        "/register",
        None,
        Some(json!({
            "username": username,
            "email": format!("{}@example.com", username),
            "password": TEST_PASSWORD,
        })),
    )
    .await;
    let (_, body) = send(
        &app,
        Method::POST,
        "/login",
        None,
        Some(json!({ "username": username, "password": TEST_PASSWORD })),
    )
    .await;
    let access = body["data"]["access_token"].as_str().unwrap().to_string();
    let refresh = body["data"]["refresh_token"].as_str().unwrap().to_string();

    let (status, _) = send(&app, Method::DELETE, "/api/users", Some(&access), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(
        &app,
        Method::POST,
        "/refresh",
        None,
        Some(json!({ "refresh_token": refresh })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}
