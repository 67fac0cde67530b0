//! 路由注册
//! 创建所有 API 路由并应用中间件

use axum::{
    middleware::{from_fn, from_fn_with_state},
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{
    compression::CompressionLayer, cors::CorsLayer, limit::RequestBodyLimitLayer,
    trace::TraceLayer,
};

use crate::{auth::middleware::jwt_auth_middleware, handlers, middleware::AppState};

/// 请求体上限（1 MiB）
const MAX_BODY_BYTES: usize = 1024 * 1024;

/// 创建应用路由
pub fn create_router(state: Arc<AppState>) -> Router {
    // 公开端点
    let public_routes = Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/ready", get(handlers::health::readiness_check))
        .route("/register", post(handlers::auth::register))
        .route("/login", post(handlers::auth::login))
        .route("/refresh", post(handlers::auth::refresh));

    // 需要 Bearer 令牌的端点
    let api_routes = Router::new()
        // 当前用户
        .route("/api/users", delete(handlers::user::logout))
        .route(
            "/api/users/_current",
            get(handlers::user::get_current).patch(handlers::user::update_current),
        )
        .route(
            "/api/users/{id}/roles",
            post(handlers::user::assign_roles).delete(handlers::user::remove_roles),
        )

        // 角色
        .route(
            "/api/roles",
            get(handlers::role::list_roles).post(handlers::role::create_role),
        )
        .route(
            "/api/roles/{id}",
            get(handlers::role::get_role)
                .put(handlers::role::update_role)
                .delete(handlers::role::delete_role),
        )
        .route(
            "/api/roles/{id}/permissions",
            post(handlers::role::assign_permissions).delete(handlers::role::remove_permissions),
        )
        .route(
            "/api/roles/{id}/harbors",
            post(handlers::role::assign_harbors).delete(handlers::role::remove_harbors),
        )

        // 权限
        .route(
            "/api/permissions",
            get(handlers::permission::list_permissions)
                .post(handlers::permission::create_permission),
        )
        .route(
            "/api/permissions/{id}",
            get(handlers::permission::get_permission)
                .put(handlers::permission::update_permission)
                .delete(handlers::permission::delete_permission),
        )

        // 港口
        .route(
            "/api/harbors",
            get(handlers::harbor::list_harbors).post(handlers::harbor::create_harbor),
        )
        .route(
            "/api/harbors/{id}",
            get(handlers::harbor::get_harbor)
                .put(handlers::harbor::update_harbor)
                .delete(handlers::harbor::delete_harbor),
        )

        // 船舶
        .route(
            "/api/ships",
            get(handlers::ship::list_ships).post(handlers::ship::create_ship),
        )
        .route(
            "/api/ships/{id}",
            get(handlers::ship::get_ship)
                .put(handlers::ship::update_ship)
                .delete(handlers::ship::delete_ship),
        )

        // 运营商
        .route(
            "/api/operators",
            get(handlers::operator::list_operators).post(handlers::operator::create_operator),
        )
        .route(
            "/api/operators/{id}",
            get(handlers::operator::get_operator)
                .put(handlers::operator::update_operator)
                .delete(handlers::operator::delete_operator),
        )
        .route(
            "/api/operators/user/{user_id}",
            get(handlers::operator::get_operator_by_user),
        )
        .layer(from_fn_with_state(
            state.jwt_service.clone(),
            jwt_auth_middleware,
        ));

    Router::new()
        .merge(public_routes)
        .merge(api_routes)
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .layer(from_fn(crate::middleware::request_tracking_middleware))
        .with_state(state)
}
