//! JWT 中间件集成测试（无需数据库）

use axum::{
    body::Body,
    http::{header::AUTHORIZATION, Request, StatusCode},
    middleware::from_fn_with_state,
    routing::get,
    Json, Router,
};
use boarding_service::{
    auth::{jwt_auth_middleware, AuthContext, JwtService},
    models::user::User,
};
use http_body_util::BodyExt;
use std::sync::Arc;
use tower::ServiceExt;

mod common;

async fn whoami(ctx: AuthContext) -> Json<serde_json::Value> {
    Json(serde_json::json!({ "id": ctx.id, "username": ctx.username }))
}

fn app(jwt: Arc<JwtService>) -> Router {
    Router::new()
        .route("/whoami", get(whoami))
        .layer(from_fn_with_state(jwt, jwt_auth_middleware))
}

fn jwt() -> Arc<JwtService> {
    Arc::new(JwtService::from_config(&common::create_test_security_config()).unwrap())
}

fn request(auth: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri("/whoami");
    if let Some(value) = auth {
        builder = builder.header(AUTHORIZATION, value);
    }
    builder.body(Body::empty()).unwrap()
}

#[tokio::test]
async fn test_valid_token_reaches_handler() {
    let jwt = jwt();
    let user = User::new(
        "pilot".to_string(),
        "pilot@example.com".to_string(),
        "hash".to_string(),
    );
    let (token, _) = jwt.issue_access_token(&user).unwrap();

    let response = app(jwt)
        .oneshot(request(Some(&format!("Bearer {}", token))))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["id"], user.id.to_string());
    assert_eq!(body["username"], "pilot");
}

#[tokio::test]
async fn test_missing_or_bad_token_is_unauthorized() {
    for auth in [None, Some("Bearer "), Some("Basic abc"), Some("Bearer not.a.jwt")] {
        let response = app(jwt()).oneshot(request(auth)).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{:?}", auth);

        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["success"], false);
    }
}

#[tokio::test]
async fn test_refresh_token_is_rejected_by_middleware() {
    let jwt = jwt();
    let user = User::new(
        "pilot".to_string(),
        "pilot@example.com".to_string(),
        "hash".to_string(),
    );
    let (refresh, _) = jwt.issue_refresh_token(&user).unwrap();

    let response = app(jwt)
        .oneshot(request(Some(&format!("Bearer {}", refresh))))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
