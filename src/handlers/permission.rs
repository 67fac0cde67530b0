//! 权限管理的 HTTP 处理器

use crate::{
    auth::middleware::AuthContext,
    error::AppError,
    handlers::extract::{AppJson, AppPath, AppQuery},
    middleware::AppState,
    models::{pagination::WebResponse, role::*},
};
use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use std::sync::Arc;
use uuid::Uuid;

pub async fn list_permissions(
    State(state): State<Arc<AppState>>,
    auth_context: AuthContext,
    AppQuery(filter): AppQuery<ListPermissionRequest>,
) -> Result<impl IntoResponse, AppError> {
    state
        .permission_service
        .require_permission(auth_context.id, "permission", "read")
        .await?;

    let page = state.permission_service.list(filter).await?;
    Ok(Json(WebResponse::with_meta("Permissions", page.items, page.meta)))
}

pub async fn create_permission(
    State(state): State<Arc<AppState>>,
    auth_context: AuthContext,
    AppJson(req): AppJson<CreatePermissionRequest>,
) -> Result<impl IntoResponse, AppError> {
    state
        .permission_service
        .require_permission(auth_context.id, "permission", "write")
        .await?;

    let permission = state.permission_service.create(req).await?;
    Ok((
        StatusCode::CREATED,
        Json(WebResponse::ok("Permission created", permission)),
    ))
}

pub async fn get_permission(
    State(state): State<Arc<AppState>>,
    auth_context: AuthContext,
    AppPath(id): AppPath<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    state
        .permission_service
        .require_permission(auth_context.id, "permission", "read")
        .await?;

    let permission = state.permission_service.get(id).await?;
    Ok(Json(WebResponse::ok("Permission", permission)))
}

pub async fn update_permission(
    State(state): State<Arc<AppState>>,
    auth_context: AuthContext,
    AppPath(id): AppPath<Uuid>,
    AppJson(req): AppJson<UpdatePermissionRequest>,
) -> Result<impl IntoResponse, AppError> {
    state
        .permission_service
        .require_permission(auth_context.id, "permission", "write")
        .await?;

    let permission = state.permission_service.update(id, req).await?;
    Ok(Json(WebResponse::ok("Permission updated", permission)))
}

/// 删除权限；仍被角色引用时返回 409
pub async fn delete_permission(
    State(state): State<Arc<AppState>>,
    auth_context: AuthContext,
    AppPath(id): AppPath<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    state
        .permission_service
        .require_permission(auth_context.id, "permission", "write")
        .await?;

    state.permission_service.delete(id).await?;
    Ok(Json(WebResponse::ok("Permission deleted", ())))
}
