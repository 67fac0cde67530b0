//! 登船业务后端主入口

use boarding_service::{
    config::AppConfig, db, handlers::health, middleware::AppState, routes, services, telemetry,
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // ===== CLI 参数处理 =====
    let args: Vec<String> = std::env::args().collect();

    let command = match args.get(1).map(String::as_str) {
        None => Command::Serve,
        Some("--version") => {
            println!("boarding-service {}", env!("CARGO_PKG_VERSION"));
            return Ok(());
        }
        Some("--help") => {
            print_help();
            return Ok(());
        }
        Some("grant-role") => match (args.get(2), args.get(3)) {
            (Some(username), Some(role)) => Command::GrantRole {
                username: username.clone(),
                role: role.clone(),
            },
            _ => {
                eprintln!("用法: boarding-service grant-role <username> <role_name>");
                std::process::exit(2);
            }
        },
        Some(other) => {
            eprintln!("未知参数: {}", other);
            print_help();
            std::process::exit(1);
        }
    };

    // 加载 .env 文件（开发环境）
    if let Ok(env) = std::env::var("BOARDING_ENV") {
        dotenv::from_filename(format!(".env.{}", env)).ok();
    } else {
        dotenv::from_filename(".env.local").ok();
        dotenv::dotenv().ok();
    }

    health::set_start_time();

    // 1. 加载配置
    let config = AppConfig::from_env()
        .map_err(|e| anyhow::anyhow!("Failed to load configuration: {}", e))?;

    // 2. 初始化日志
    telemetry::init_telemetry(&config.logging).map_err(|e| anyhow::anyhow!(e))?;

    // 3. 数据库连接池 + 迁移
    let db_pool = db::create_pool(&config.database).await?;
    db::run_migrations(&db_pool).await?;

    // 4. 用户事件发布器与应用状态
    let publisher = services::build_publisher(&config.messaging).await;
    let app_state = Arc::new(AppState::new(config.clone(), db_pool, publisher)?);

    if let Command::GrantRole { username, role } = command {
        app_state
            .user_service
            .grant_role_by_name(&username, &role)
            .await?;
        println!("granted role {} to {}", role, username);
        return Ok(());
    }

    // 5. 构建路由并启动服务器
    let app = routes::create_router(app_state);

    let addr = &config.server.addr;
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(addr = %addr, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(config.server.graceful_shutdown_timeout_secs))
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

enum Command {
    Serve,
    GrantRole { username: String, role: String },
}

/// 优雅关闭信号处理；超时后强制退出
async fn shutdown_signal(timeout_secs: u64) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("Ctrl+C received, starting graceful shutdown"),
        _ = terminate => tracing::info!("Terminate signal received, starting graceful shutdown"),
    }

    tokio::spawn(async move {
        tokio::time::sleep(std::time::Duration::from_secs(timeout_secs)).await;
        tracing::warn!("Graceful shutdown timeout reached, forcing exit");
        std::process::exit(1);
    });
}

fn print_help() {
    println!("boarding-service {}", env!("CARGO_PKG_VERSION"));
    println!();
    println!("用法: boarding-service [命令]");
    println!();
    println!("命令:");
    println!("  (无)                          启动 HTTP 服务");
    println!("  grant-role <user> <role>      为用户授予角色（引导首个管理员）");
    println!();
    println!("选项:");
    println!("  --version     打印版本信息并退出");
    println!("  --help        打印此帮助信息并退出");
    println!();
    println!("环境变量:");
    println!("  所有配置通过 BOARDING_ 前缀的环境变量完成，参考 .env.example");
}
