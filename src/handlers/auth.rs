//! 认证相关的 HTTP 处理器（公开端点）

use crate::{
    error::AppError,
    handlers::extract::AppJson,
    middleware::AppState,
    models::{auth::*, pagination::WebResponse, user::RegisterUserRequest},
};
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use std::sync::Arc;

/// 注册
pub async fn register(
    State(state): State<Arc<AppState>>,
    AppJson(req): AppJson<RegisterUserRequest>,
) -> Result<impl IntoResponse, AppError> {
    let user = state.auth_service.register(req).await?;

    Ok((
        StatusCode::CREATED,
        Json(WebResponse::ok("User registered", user)),
    ))
}

/// 登录
pub async fn login(
    State(state): State<Arc<AppState>>,
    AppJson(req): AppJson<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    let response = state.auth_service.login(req).await?;
    Ok(Json(WebResponse::ok("Login successful", response)))
}

/// 刷新令牌（轮换）
pub async fn refresh(
    State(state): State<Arc<AppState>>,
    AppJson(req): AppJson<RefreshTokenRequest>,
) -> Result<impl IntoResponse, AppError> {
    let response = state.auth_service.refresh(req).await?;
    Ok(Json(WebResponse::ok("Token refreshed", response)))
}
