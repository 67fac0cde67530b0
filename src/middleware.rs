//! HTTP 中间件与应用状态

use crate::{
    auth::{JwtService, PasswordHasher},
    config::AppConfig,
    error::AppError,
    services::{
        AuthService, HarborService, OperatorService, PermissionService, RoleService, ShipService,
        UserEventPublisher, UserService,
    },
};
use axum::{
    extract::Request,
    http::{HeaderMap, HeaderValue},
    middleware::Next,
    response::Response,
};
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Instant;
use tracing::Instrument;
use uuid::Uuid;

/// 应用状态：所有服务在启动时显式构建一次，按 Arc 共享
#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub db: PgPool,
    pub jwt_service: Arc<JwtService>,
    pub auth_service: Arc<AuthService>,
    pub user_service: Arc<UserService>,
    pub role_service: Arc<RoleService>,
    pub permission_service: Arc<PermissionService>,
    pub harbor_service: Arc<HarborService>,
    pub ship_service: Arc<ShipService>,
    pub operator_service: Arc<OperatorService>,
}

impl AppState {
    pub fn new(
        config: AppConfig,
        db: PgPool,
        publisher: Arc<dyn UserEventPublisher>,
    ) -> Result<Self, AppError> {
        let jwt_service = Arc::new(JwtService::from_config(&config.security)?);
        let hasher = PasswordHasher::from_config(&config.security)?;

        let auth_service = Arc::new(AuthService::new(
            db.clone(),
            jwt_service.clone(),
            hasher.clone(),
            config.security.clone(),
            publisher.clone(),
        ));
        let user_service = Arc::new(UserService::new(
            db.clone(),
            hasher,
            config.security.clone(),
            publisher,
        ));

        Ok(Self {
            jwt_service,
            auth_service,
            user_service,
            role_service: Arc::new(RoleService::new(db.clone())),
            permission_service: Arc::new(PermissionService::new(db.clone())),
            harbor_service: Arc::new(HarborService::new(db.clone())),
            ship_service: Arc::new(ShipService::new(db.clone())),
            operator_service: Arc::new(OperatorService::new(db.clone())),
            config,
            db,
        })
    }
}

/// 请求追踪中间件
/// 为每个请求生成 trace_id 和 request_id，并记录指标
pub async fn request_tracking_middleware(req: Request, next: Next) -> Response {
    let trace_id = extract_or_generate_trace_id(req.headers());
    let request_id = Uuid::new_v4().to_string();

    let method = req.method().clone();
    let path = req.uri().path().to_string();

    let span = tracing::info_span!(
        "http_request",
        trace_id = %trace_id,
        request_id = %request_id,
        method = %method,
        path = %path,
    );

    async move {
        let start = Instant::now();
        let mut response = next.run(req).await;
        let elapsed = start.elapsed();

        let status = response.status();
        metrics::counter!(
            "http_requests_total",
            "method" => method_label(method.as_str()),
            "status" => status_class(status.as_u16()),
        )
        .increment(1);
        metrics::histogram!("http_request_duration_seconds").record(elapsed.as_secs_f64());

        tracing::info!(
            status = status.as_u16(),
            elapsed_ms = elapsed.as_millis() as u64,
            "Request completed"
        );

        let headers = response.headers_mut();
        if let Ok(value) = HeaderValue::from_str(&trace_id) {
            headers.insert("x-trace-id", value);
        }
        if let Ok(value) = HeaderValue::from_str(&request_id) {
            headers.insert("x-request-id", value);
        }

        response
    }
    .instrument(span)
    .await
}

/// 从请求头中提取或生成 trace_id
fn extract_or_generate_trace_id(headers: &HeaderMap) -> String {
    headers
        .get("x-trace-id")
        .and_then(|v| v.to_str().ok())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
        .unwrap_or_else(|| Uuid::new_v4().to_string())
}

// metrics 标签必须是静态字符串
fn method_label(method: &str) -> &'static str {
    match method {
        "GET" => "GET",
        "POST" => "POST",
        "PUT" => "PUT",
        "PATCH" => "PATCH",
        "DELETE" => "DELETE",
        _ => "OTHER",
    }
}

fn status_class(status: u16) -> &'static str {
    match status {
        200..=299 => "2xx",
        300..=399 => "3xx",
        400..=499 => "4xx",
        _ => "5xx",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_or_generate_trace_id() {
        let mut headers = HeaderMap::new();
        headers.insert("x-trace-id", "voyage-trace-42".parse().unwrap());
        assert_eq!(extract_or_generate_trace_id(&headers), "voyage-trace-42");

        let generated = extract_or_generate_trace_id(&HeaderMap::new());
        assert!(Uuid::parse_str(&generated).is_ok());
    }

    #[test]
    fn test_metric_labels() {
        assert_eq!(method_label("PUT"), "PUT");
        assert_eq!(method_label("OPTIONS"), "OTHER");
        assert_eq!(status_class(201), "2xx");
        assert_eq!(status_class(404), "4xx");
        assert_eq!(status_class(503), "5xx");
    }
}
