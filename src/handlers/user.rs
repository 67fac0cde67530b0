//! 用户相关的 HTTP 处理器

use crate::{
    auth::middleware::AuthContext,
    error::AppError,
    handlers::extract::{AppJson, AppPath},
    middleware::AppState,
    models::{pagination::WebResponse, user::*},
};
use axum::{
    extract::State,
    response::IntoResponse,
    Json,
};
use std::sync::Arc;
use uuid::Uuid;

/// 登出：清除已存储的会话
pub async fn logout(
    State(state): State<Arc<AppState>>,
    auth_context: AuthContext,
) -> Result<impl IntoResponse, AppError> {
    state.auth_service.logout(auth_context.id).await?;
    Ok(Json(WebResponse::ok("Logged out", ())))
}

/// 当前用户及其角色
pub async fn get_current(
    State(state): State<Arc<AppState>>,
    auth_context: AuthContext,
) -> Result<impl IntoResponse, AppError> {
    let user = state.user_service.current(auth_context.id).await?;
    Ok(Json(WebResponse::ok("Current user", user)))
}

/// 部分更新当前用户
pub async fn update_current(
    State(state): State<Arc<AppState>>,
    auth_context: AuthContext,
    AppJson(req): AppJson<UpdateUserRequest>,
) -> Result<impl IntoResponse, AppError> {
    let user = state
        .user_service
        .update_current(auth_context.id, req)
        .await?;
    Ok(Json(WebResponse::ok("User updated", user)))
}

/// 为用户分配角色
pub async fn assign_roles(
    State(state): State<Arc<AppState>>,
    auth_context: AuthContext,
    AppPath(id): AppPath<Uuid>,
    AppJson(req): AppJson<UserRolesRequest>,
) -> Result<impl IntoResponse, AppError> {
    state
        .permission_service
        .require_permission(auth_context.id, "user", "write")
        .await?;

    let roles = state.user_service.assign_roles(id, req).await?;
    Ok(Json(WebResponse::ok("Roles assigned", roles)))
}

/// 移除用户角色
pub async fn remove_roles(
    State(state): State<Arc<AppState>>,
    auth_context: AuthContext,
    AppPath(id): AppPath<Uuid>,
    AppJson(req): AppJson<UserRolesRequest>,
) -> Result<impl IntoResponse, AppError> {
    state
        .permission_service
        .require_permission(auth_context.id, "user", "write")
        .await?;

    let roles = state.user_service.remove_roles(id, req).await?;
    Ok(Json(WebResponse::ok("Roles removed", roles)))
}
