//! 运营商管理的 HTTP 处理器

use crate::{
    auth::middleware::AuthContext,
    error::AppError,
    handlers::extract::{AppJson, AppPath, AppQuery},
    middleware::AppState,
    models::{operator::*, pagination::WebResponse},
};
use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use std::sync::Arc;
use uuid::Uuid;

pub async fn list_operators(
    State(state): State<Arc<AppState>>,
    auth_context: AuthContext,
    AppQuery(filter): AppQuery<ListOperatorRequest>,
) -> Result<impl IntoResponse, AppError> {
    state
        .permission_service
        .require_permission(auth_context.id, "operator", "read")
        .await?;

    let page = state.operator_service.list(filter).await?;
    Ok(Json(WebResponse::with_meta("Operators", page.items, page.meta)))
}

pub async fn create_operator(
    State(state): State<Arc<AppState>>,
    auth_context: AuthContext,
    AppJson(req): AppJson<CreateOperatorRequest>,
) -> Result<impl IntoResponse, AppError> {
    state
        .permission_service
        .require_permission(auth_context.id, "operator", "write")
        .await?;

    let operator = state.operator_service.create(req).await?;
    Ok((
        StatusCode::CREATED,
        Json(WebResponse::ok("Operator created", operator)),
    ))
}

pub async fn get_operator(
    State(state): State<Arc<AppState>>,
    auth_context: AuthContext,
    AppPath(id): AppPath<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    state
        .permission_service
        .require_permission(auth_context.id, "operator", "read")
        .await?;

    let operator = state.operator_service.get(id).await?;
    Ok(Json(WebResponse::ok("Operator", operator)))
}

/// 按关联用户查询运营商
pub async fn get_operator_by_user(
    State(state): State<Arc<AppState>>,
    auth_context: AuthContext,
    AppPath(user_id): AppPath<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    state
        .permission_service
        .require_permission(auth_context.id, "operator", "read")
        .await?;

    let operator = state.operator_service.get_by_user(user_id).await?;
    Ok(Json(WebResponse::ok("Operator", operator)))
}

pub async fn update_operator(
    State(state): State<Arc<AppState>>,
    auth_context: AuthContext,
    AppPath(id): AppPath<Uuid>,
    AppJson(req): AppJson<UpdateOperatorRequest>,
) -> Result<impl IntoResponse, AppError> {
    state
        .permission_service
        .require_permission(auth_context.id, "operator", "write")
        .await?;

    let operator = state.operator_service.update(id, req).await?;
    Ok(Json(WebResponse::ok("Operator updated", operator)))
}

/// 仍有船舶挂靠时拒绝删除
pub async fn delete_operator(
    State(state): State<Arc<AppState>>,
    auth_context: AuthContext,
    AppPath(id): AppPath<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    state
        .permission_service
        .require_permission(auth_context.id, "operator", "write")
        .await?;

    state.operator_service.delete(id).await?;
    Ok(Json(WebResponse::ok("Operator deleted", ())))
}
