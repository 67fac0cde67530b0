//! 用户生命周期事件
//!
//! 事件以 fire-and-forget 方式发布：在独立任务中执行，失败只记日志，
//! 不影响请求结果。

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use lapin::{options::*, BasicProperties, Channel, Connection, ConnectionProperties, ExchangeKind};
use secrecy::ExposeSecret;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{config::MessagingConfig, models::user::User};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UserEventKind {
    Registered,
    Updated,
}

impl UserEventKind {
    pub fn routing_key(&self) -> &'static str {
        match self {
            UserEventKind::Registered => "user.registered",
            UserEventKind::Updated => "user.updated",
        }
    }
}

/// 用户事件载荷（不含凭据）
#[derive(Debug, Clone, Serialize)]
pub struct UserEvent {
    pub kind: UserEventKind,
    pub user_id: Uuid,
    pub username: String,
    pub email: String,
    pub occurred_at: DateTime<Utc>,
}

impl UserEvent {
    pub fn new(kind: UserEventKind, user: &User) -> Self {
        Self {
            kind,
            user_id: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
            occurred_at: Utc::now(),
        }
    }
}

/// 用户事件发布器
#[async_trait]
pub trait UserEventPublisher: Send + Sync {
    async fn publish(&self, event: &UserEvent) -> Result<()>;
}

/// 在后台任务中发布事件
pub fn emit(publisher: Arc<dyn UserEventPublisher>, event: UserEvent) {
    tokio::spawn(async move {
        if let Err(e) = publisher.publish(&event).await {
            warn!(
                user_id = %event.user_id,
                routing_key = event.kind.routing_key(),
                "Failed to publish user event: {:#}",
                e
            );
        }
    });
}

/// 只写日志的发布器（未启用消息总线时使用）
#[derive(Debug, Default, Clone)]
pub struct LogPublisher;

#[async_trait]
impl UserEventPublisher for LogPublisher {
    async fn publish(&self, event: &UserEvent) -> Result<()> {
        info!(
            user_id = %event.user_id,
            username = %event.username,
            routing_key = event.kind.routing_key(),
            "User event"
        );
        Ok(())
    }
}

/// RabbitMQ 用户事件发布器
pub struct RabbitMqUserPublisher {
    exchange: String,
    // 连接关闭后 channel 随之失效
    _connection: Connection,
    channel: Channel,
}

impl RabbitMqUserPublisher {
    /// 连接 RabbitMQ 并声明用户事件交换机
    pub async fn connect(config: &MessagingConfig) -> Result<Self> {
        let connection = Connection::connect(
            config.amqp_url.expose_secret(),
            ConnectionProperties::default(),
        )
        .await
        .context("Failed to connect to RabbitMQ")?;

        let channel = connection
            .create_channel()
            .await
            .context("Failed to create channel")?;

        channel
            .exchange_declare(
                &config.exchange,
                ExchangeKind::Topic,
                ExchangeDeclareOptions {
                    durable: true,
                    ..Default::default()
                },
                lapin::types::FieldTable::default(),
            )
            .await
            .context("Failed to declare user exchange")?;

        info!(exchange = %config.exchange, "RabbitMQ user event publisher ready");

        Ok(Self {
            exchange: config.exchange.clone(),
            _connection: connection,
            channel,
        })
    }
}

#[async_trait]
impl UserEventPublisher for RabbitMqUserPublisher {
    async fn publish(&self, event: &UserEvent) -> Result<()> {
        let payload = serde_json::to_vec(event).context("Failed to serialize user event")?;
        let routing_key = event.kind.routing_key();

        self.channel
            .basic_publish(
                &self.exchange,
                routing_key,
                BasicPublishOptions::default(),
                &payload,
                BasicProperties::default()
                    .with_delivery_mode(2) // 持久化
                    .with_content_type("application/json".into()),
            )
            .await?;

        debug!(routing_key, "User event published");
        Ok(())
    }
}

/// 按配置选择发布器；RabbitMQ 不可用时退回日志发布器
pub async fn build_publisher(config: &MessagingConfig) -> Arc<dyn UserEventPublisher> {
    if !config.enabled {
        return Arc::new(LogPublisher);
    }

    match RabbitMqUserPublisher::connect(config).await {
        Ok(publisher) => Arc::new(publisher),
        Err(e) => {
            warn!("RabbitMQ unavailable, user events will only be logged: {:#}", e);
            Arc::new(LogPublisher)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    struct ChannelPublisher(mpsc::UnboundedSender<UserEvent>);

    #[async_trait]
    impl UserEventPublisher for ChannelPublisher {
        async fn publish(&self, event: &UserEvent) -> Result<()> {
            self.0.send(event.clone())?;
            Ok(())
        }
    }

    struct FailingPublisher;

    #[async_trait]
    impl UserEventPublisher for FailingPublisher {
        async fn publish(&self, _event: &UserEvent) -> Result<()> {
            anyhow::bail!("broker down")
        }
    }

    fn user() -> User {
        User::new(
            "bosun".to_string(),
            "bosun@example.com".to_string(),
            "hash".to_string(),
        )
    }

    #[tokio::test]
    async fn test_emit_delivers_in_background() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let user = user();

        emit(
            Arc::new(ChannelPublisher(tx)),
            UserEvent::new(UserEventKind::Registered, &user),
        );

        let event = rx.recv().await.unwrap();
        assert_eq!(event.kind, UserEventKind::Registered);
        assert_eq!(event.user_id, user.id);
    }

    #[tokio::test]
    async fn test_emit_swallows_failures() {
        emit(
            Arc::new(FailingPublisher),
            UserEvent::new(UserEventKind::Updated, &user()),
        );
        tokio::task::yield_now().await;
    }

    #[test]
    fn test_payload_has_no_credentials() {
        let body = serde_json::to_value(UserEvent::new(UserEventKind::Updated, &user())).unwrap();
        assert_eq!(body["kind"], "updated");
        assert!(body.get("password_hash").is_none());
        assert_eq!(UserEventKind::Updated.routing_key(), "user.updated");
    }

    #[tokio::test]
    async fn test_disabled_messaging_uses_log_publisher() {
        let config = MessagingConfig {
            enabled: false,
            amqp_url: secrecy::Secret::new("amqp://localhost:5672/%2f".to_string()),
            exchange: "boarding.users".to_string(),
        };
        let publisher = build_publisher(&config).await;
        assert!(publisher
            .publish(&UserEvent::new(UserEventKind::Registered, &user()))
            .await
            .is_ok());
    }
}
