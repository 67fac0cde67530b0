//! 港口管理的 HTTP 处理器
//! 列表与详情按调用者的角色授权范围过滤

use crate::{
    auth::middleware::AuthContext,
    error::AppError,
    handlers::extract::{AppJson, AppPath, AppQuery},
    middleware::AppState,
    models::{harbor::*, pagination::WebResponse},
};
use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use std::sync::Arc;
use uuid::Uuid;

pub async fn list_harbors(
    State(state): State<Arc<AppState>>,
    auth_context: AuthContext,
    AppQuery(filter): AppQuery<ListHarborRequest>,
) -> Result<impl IntoResponse, AppError> {
    state
        .permission_service
        .require_permission(auth_context.id, "harbor", "read")
        .await?;

    let page = state
        .harbor_service
        .list_visible(auth_context.id, filter)
        .await?;
    Ok(Json(WebResponse::with_meta("Harbors", page.items, page.meta)))
}

pub async fn create_harbor(
    State(state): State<Arc<AppState>>,
    auth_context: AuthContext,
    AppJson(req): AppJson<CreateHarborRequest>,
) -> Result<impl IntoResponse, AppError> {
    state
        .permission_service
        .require_permission(auth_context.id, "harbor", "write")
        .await?;

    let harbor = state.harbor_service.create(req).await?;
    Ok((
        StatusCode::CREATED,
        Json(WebResponse::ok("Harbor created", harbor)),
    ))
}

pub async fn get_harbor(
    State(state): State<Arc<AppState>>,
    auth_context: AuthContext,
    AppPath(id): AppPath<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    state
        .permission_service
        .require_permission(auth_context.id, "harbor", "read")
        .await?;

    let harbor = state.harbor_service.get_visible(auth_context.id, id).await?;
    Ok(Json(WebResponse::ok("Harbor", harbor)))
}

pub async fn update_harbor(
    State(state): State<Arc<AppState>>,
    auth_context: AuthContext,
    AppPath(id): AppPath<Uuid>,
    AppJson(req): AppJson<UpdateHarborRequest>,
) -> Result<impl IntoResponse, AppError> {
    state
        .permission_service
        .require_permission(auth_context.id, "harbor", "write")
        .await?;

    let harbor = state.harbor_service.update(id, req).await?;
    Ok(Json(WebResponse::ok("Harbor updated", harbor)))
}

pub async fn delete_harbor(
    State(state): State<Arc<AppState>>,
    auth_context: AuthContext,
    AppPath(id): AppPath<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    state
        .permission_service
        .require_permission(auth_context.id, "harbor", "write")
        .await?;

    state.harbor_service.delete(id).await?;
    Ok(Json(WebResponse::ok("Harbor deleted", ())))
}
