//! 船舶管理的 HTTP 处理器

use crate::{
    auth::middleware::AuthContext,
    error::AppError,
    handlers::extract::{AppJson, AppPath, AppQuery},
    middleware::AppState,
    models::{pagination::WebResponse, ship::*},
};
use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use std::sync::Arc;
use uuid::Uuid;

pub async fn list_ships(
    State(state): State<Arc<AppState>>,
    auth_context: AuthContext,
    AppQuery(filter): AppQuery<ListShipRequest>,
) -> Result<impl IntoResponse, AppError> {
    state
        .permission_service
        .require_permission(auth_context.id, "ship", "read")
        .await?;

    let page = state.ship_service.list(filter).await?;
    Ok(Json(WebResponse::with_meta("Ships", page.items, page.meta)))
}

pub async fn create_ship(
    State(state): State<Arc<AppState>>,
    auth_context: AuthContext,
    AppJson(req): AppJson<CreateShipRequest>,
) -> Result<impl IntoResponse, AppError> {
    state
        .permission_service
        .require_permission(auth_context.id, "ship", "write")
        .await?;

    let ship = state.ship_service.create(req).await?;
    Ok((StatusCode::CREATED, Json(WebResponse::ok("Ship created", ship))))
}

pub async fn get_ship(
    State(state): State<Arc<AppState>>,
    auth_context: AuthContext,
    AppPath(id): AppPath<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    state
        .permission_service
        .require_permission(auth_context.id, "ship", "read")
        .await?;

    let ship = state.ship_service.get(id).await?;
    Ok(Json(WebResponse::ok("Ship", ship)))
}

pub async fn update_ship(
    State(state): State<Arc<AppState>>,
    auth_context: AuthContext,
    AppPath(id): AppPath<Uuid>,
    AppJson(req): AppJson<UpdateShipRequest>,
) -> Result<impl IntoResponse, AppError> {
    state
        .permission_service
        .require_permission(auth_context.id, "ship", "write")
        .await?;

    let ship = state.ship_service.update(id, req).await?;
    Ok(Json(WebResponse::ok("Ship updated", ship)))
}

pub async fn delete_ship(
    State(state): State<Arc<AppState>>,
    auth_context: AuthContext,
    AppPath(id): AppPath<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    state
        .permission_service
        .require_permission(auth_context.id, "ship", "write")
        .await?;

    state.ship_service.delete(id).await?;
    Ok(Json(WebResponse::ok("Ship deleted", ())))
}
