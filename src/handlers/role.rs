//! 角色管理的 HTTP 处理器

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

// ==================== Roles ====================

/// 分页列出角色
pub async fn list_roles(
    State(state): State<Arc<AppState>>,
    auth_context: AuthContext,
    AppQuery(filter): AppQuery<ListRoleRequest>,
) -> Result<impl IntoResponse, AppError> {
    state
        .permission_service
        .require_permission(auth_context.id, "role", "read")
        .await?;

    let page = state.role_service.list(filter).await?;
    Ok(Json(WebResponse::with_meta("Roles", page.items, page.meta)))
}

pub async fn create_role(
    State(state): State<Arc<AppState>>,
    auth_context: AuthContext,
    AppJson(req): AppJson<CreateRoleRequest>,
) -> Result<impl IntoResponse, AppError> {
    state
        .permission_service
        .require_permission(auth_context.id, "role", "write")
        .await?;

    let role = state.role_service.create(req).await?;
    Ok((StatusCode::CREATED, Json(WebResponse::ok("Role created", role))))
}

/// 角色详情（含权限与港口授权）
pub async fn get_role(
    State(state): State<Arc<AppState>>,
    auth_context: AuthContext,
    AppPath(id): AppPath<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    state
        .permission_service
        .require_permission(auth_context.id, "role", "read")
        .await?;

    let detail = state.role_service.get(id).await?;
    Ok(Json(WebResponse::ok("Role", detail)))
}

pub async fn update_role(
    State(state): State<Arc<AppState>>,
    auth_context: AuthContext,
    AppPath(id): AppPath<Uuid>,
    AppJson(req): AppJson<UpdateRoleRequest>,
) -> Result<impl IntoResponse, AppError> {
    state
        .permission_service
        .require_permission(auth_context.id, "role", "write")
        .await?;

    let role = state.role_service.update(id, req).await?;
    Ok(Json(WebResponse::ok("Role updated", role)))
}

pub async fn delete_role(
    State(state): State<Arc<AppState>>,
    auth_context: AuthContext,
    AppPath(id): AppPath<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    state
        .permission_service
        .require_permission(auth_context.id, "role", "write")
        .await?;

    state.role_service.delete(id).await?;
    Ok(Json(WebResponse::ok("Role deleted", ())))
}

// ==================== Role Edges ====================

pub async fn assign_permissions(
    State(state): State<Arc<AppState>>,
    auth_context: AuthContext,
    AppPath(id): AppPath<Uuid>,
    AppJson(req): AppJson<RolePermissionsRequest>,
) -> Result<impl IntoResponse, AppError> {
    state
        .permission_service
        .require_permission(auth_context.id, "role", "write")
        .await?;

    let permissions = state.role_service.assign_permissions(id, req).await?;
    Ok(Json(WebResponse::ok("Permissions assigned", permissions)))
}

pub async fn remove_permissions(
    State(state): State<Arc<AppState>>,
    auth_context: AuthContext,
    AppPath(id): AppPath<Uuid>,
    AppJson(req): AppJson<RolePermissionsRequest>,
) -> Result<impl IntoResponse, AppError> {
    state
        .permission_service
        .require_permission(auth_context.id, "role", "write")
        .await?;

    let permissions = state.role_service.remove_permissions(id, req).await?;
    Ok(Json(WebResponse::ok("Permissions removed", permissions)))
}

/// 授予角色港口可见范围
pub async fn assign_harbors(
    State(state): State<Arc<AppState>>,
    auth_context: AuthContext,
    AppPath(id): AppPath<Uuid>,
    AppJson(req): AppJson<RoleHarborsRequest>,
) -> Result<impl IntoResponse, AppError> {
    state
        .permission_service
        .require_permission(auth_context.id, "role", "write")
        .await?;

    let harbor_ids = state.role_service.assign_harbors(id, req).await?;
    Ok(Json(WebResponse::ok("Harbors assigned", harbor_ids)))
}

pub async fn remove_harbors(
    State(state): State<Arc<AppState>>,
    auth_context: AuthContext,
    AppPath(id): AppPath<Uuid>,
    AppJson(req): AppJson<RoleHarborsRequest>,
) -> Result<impl IntoResponse, AppError> {
    state
        .permission_service
        .require_permission(auth_context.id, "role", "write")
        .await?;

    let harbor_ids = state.role_service.remove_harbors(id, req).await?;
    Ok(Json(WebResponse::ok("Harbors removed", harbor_ids)))
}
