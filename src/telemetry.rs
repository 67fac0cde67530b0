//! tracing 订阅器初始化

use crate::config::LoggingConfig;
use tracing_subscriber::{
    fmt::format::FmtSpan, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer,
};

/// 安装全局订阅器；`RUST_LOG` 优先于配置中的级别
///
/// 重复安装（例如测试中）返回错误而不是 panic。
pub fn init_telemetry(config: &LoggingConfig) -> Result<(), String> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_directives(&config.level)))
        .map_err(|e| format!("invalid log filter: {}", e))?;

    let fmt_layer = if config.format.eq_ignore_ascii_case("json") {
        tracing_subscriber::fmt::layer()
            .json()
            .with_current_span(true)
            .with_span_list(false)
            .with_span_events(FmtSpan::CLOSE)
            .boxed()
    } else {
        tracing_subscriber::fmt::layer()
            .pretty()
            .with_target(false)
            .boxed()
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init()
        .map_err(|e| format!("tracing already initialised: {}", e))?;

    tracing::info!(
        service = "boarding-service",
        version = env!("CARGO_PKG_VERSION"),
        level = %config.level,
        format = %config.format,
        "Telemetry initialized"
    );
    Ok(())
}

/// 本服务按配置级别输出，sqlx 与 lapin 仅保留警告
fn default_directives(level: &str) -> String {
    format!("{level},sqlx=warn,lapin=warn,tower_http={level}", level = level)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_directives_parse() {
        for level in ["trace", "debug", "info", "warn", "error"] {
            let directives = default_directives(level);
            assert!(directives.starts_with(level));
            assert!(EnvFilter::try_new(&directives).is_ok());
        }
    }
}
