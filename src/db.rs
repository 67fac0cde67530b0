//! PostgreSQL 连接池、迁移与就绪检查

use crate::config::DatabaseConfig;
use secrecy::ExposeSecret;
use serde::Serialize;
use sqlx::{
    migrate::Migrator,
    postgres::{PgConnectOptions, PgPoolOptions},
    PgPool,
};
use std::{str::FromStr, time::Duration};
use tokio::time::{timeout, Instant};

static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

const APPLICATION_NAME: &str = "boarding-service";

/// 就绪检查的查询超时
const PING_TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("invalid database url: {0}")]
    InvalidUrl(String),

    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    #[error("migration failed: {0}")]
    MigrationFailed(String),
}

/// 数据库探测结果
#[derive(Debug, Clone, PartialEq)]
pub enum HealthStatus {
    Healthy { latency_ms: u64 },
    Unhealthy(String),
}

/// 连接池快照
#[derive(Debug, Clone, Copy, Serialize)]
pub struct PoolStats {
    pub size: u32,
    pub idle: u32,
}

/// 创建连接池；连接在 pg_stat_activity 中以服务名标识
pub async fn create_pool(config: &DatabaseConfig) -> Result<PgPool, DbError> {
    // 错误信息不能回显 URL，其中可能含有密码
    let options = PgConnectOptions::from_str(config.url.expose_secret())
        .map_err(|_| DbError::InvalidUrl("cannot parse BOARDING_DATABASE__URL".to_string()))?
        .application_name(APPLICATION_NAME);

    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
        .idle_timeout(Duration::from_secs(config.idle_timeout_secs))
        .max_lifetime(Duration::from_secs(config.max_lifetime_secs))
        .connect_with(options)
        .await
        .map_err(|e| DbError::ConnectionFailed(e.to_string()))?;

    tracing::info!(
        max_connections = config.max_connections,
        min_connections = config.min_connections,
        "Database pool ready"
    );

    Ok(pool)
}

/// 执行内嵌迁移（包含系统权限与 admin 角色种子）
pub async fn run_migrations(pool: &PgPool) -> Result<(), DbError> {
    MIGRATOR
        .run(pool)
        .await
        .map_err(|e| DbError::MigrationFailed(e.to_string()))?;

    tracing::info!(known = MIGRATOR.iter().count(), "Migrations up to date");
    Ok(())
}

/// 带超时的 `SELECT 1`
pub async fn health_check(pool: &PgPool) -> HealthStatus {
    record_pool_metrics(pool);

    let started = Instant::now();
    match timeout(PING_TIMEOUT, sqlx::query("SELECT 1").execute(pool)).await {
        Ok(Ok(_)) => HealthStatus::Healthy {
            latency_ms: started.elapsed().as_millis() as u64,
        },
        Ok(Err(e)) => {
            tracing::warn!(error = %e, "Database ping failed");
            HealthStatus::Unhealthy(e.to_string())
        }
        Err(_) => {
            tracing::warn!("Database ping timed out");
            HealthStatus::Unhealthy(format!("no response within {:?}", PING_TIMEOUT))
        }
    }
}

pub fn pool_stats(pool: &PgPool) -> PoolStats {
    PoolStats {
        size: pool.size(),
        idle: pool.num_idle() as u32,
    }
}

pub fn record_pool_metrics(pool: &PgPool) {
    let stats = pool_stats(pool);
    metrics::gauge!("db_pool_connections").set(stats.size as f64);
    metrics::gauge!("db_pool_idle_connections").set(stats.idle as f64);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_migrations_are_embedded() {
        let descriptions: Vec<_> = MIGRATOR.iter().map(|m| m.description.to_string()).collect();
        assert_eq!(descriptions.len(), 2);
        assert!(descriptions[0].contains("rbac"));
    }

    #[tokio::test]
    async fn test_invalid_url_does_not_leak_secret() {
        let config = DatabaseConfig {
            url: secrecy::Secret::new("not a url with hunter2".to_string()),
            max_connections: 1,
            min_connections: 0,
            acquire_timeout_secs: 1,
            idle_timeout_secs: 1,
            max_lifetime_secs: 1,
        };

        let err = create_pool(&config).await.unwrap_err();
        assert!(matches!(err, DbError::InvalidUrl(_)));
        assert!(!err.to_string().contains("hunter2"));
    }
}
