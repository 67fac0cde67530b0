//! 认证服务：注册、登录、令牌刷新、登出

use crate::{
    auth::{jwt::TokenPair, JwtService, PasswordHasher},
    config::SecurityConfig,
    error::AppError,
    models::{auth::*, user::*},
    repository::{user_repo::SessionDigests, UserRepository},
    services::events::{emit, UserEvent, UserEventKind, UserEventPublisher},
};
use chrono::Utc;
use sha2::{Digest, Sha256};
use sqlx::PgPool;
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;
use validator::Validate;

/// 持久化前的令牌摘要（SHA-256，十六进制）
pub fn token_digest(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

pub struct AuthService {
    db: PgPool,
    jwt_service: Arc<JwtService>,
    hasher: PasswordHasher,
    security: SecurityConfig,
    publisher: Arc<dyn UserEventPublisher>,
}

impl AuthService {
    pub fn new(
        db: PgPool,
        jwt_service: Arc<JwtService>,
        hasher: PasswordHasher,
        security: SecurityConfig,
        publisher: Arc<dyn UserEventPublisher>,
    ) -> Self {
        Self {
            db,
            jwt_service,
            hasher,
            security,
            publisher,
        }
    }

    /// 用户注册；用户名或邮箱冲突由唯一索引裁决为 Conflict
    #[instrument(skip(self, req), fields(username = %req.username))]
    pub async fn register(&self, req: RegisterUserRequest) -> Result<UserResponse, AppError> {
        req.validate()?;
        PasswordHasher::validate_password_policy(&req.password, &self.security)?;

        let password_hash = self.hasher.hash_blocking(req.password).await?;

        let mut user = User::new(req.username, req.email, password_hash);
        user.first_name = req.first_name.unwrap_or_default();
        user.last_name = req.last_name.unwrap_or_default();
        user.phone = req.phone;

        let mut tx = self.db.begin().await?;
        let user = UserRepository::insert(&mut tx, &user).await?;
        tx.commit().await?;

        info!(user_id = %user.id, "User registered");
        emit(
            self.publisher.clone(),
            UserEvent::new(UserEventKind::Registered, &user),
        );

        Ok(UserResponse::from(user))
    }

    /// 用户登录
    ///
    /// 用户名不存在返回 NotFound，密码错误或账户停用返回 Unauthorized。
    #[instrument(skip(self, req), fields(username = %req.username))]
    pub async fn login(&self, req: LoginRequest) -> Result<LoginResponse, AppError> {
        req.validate()?;

        let mut conn = self.db.acquire().await?;
        let user = UserRepository::find_by_username(&mut conn, &req.username)
            .await?
            .ok_or_else(|| AppError::not_found("user"))?;
        drop(conn);

        if let Err(e) = self
            .hasher
            .verify_blocking(req.password, user.password_hash.clone())
            .await
        {
            warn!(user_id = %user.id, "Login failed: bad password");
            return Err(e);
        }

        if !user.is_active {
            warn!(user_id = %user.id, "Login refused: account inactive");
            return Err(AppError::Unauthorized);
        }

        let pair = self.jwt_service.issue_token_pair(&user)?;

        let mut tx = self.db.begin().await?;
        let user = UserRepository::store_session(&mut tx, user.id, &digests(&pair), true).await?;
        tx.commit().await?;

        info!(user_id = %user.id, "User logged in");
        Ok(self.login_response(pair, user))
    }

    /// 刷新令牌（轮换）
    ///
    /// 刷新令牌须由刷新密钥签发，且其摘要与库中保存的一致、未过期。
    /// 登出后库中摘要已清空，刷新必然失败。
    #[instrument(skip(self, req))]
    pub async fn refresh(&self, req: RefreshTokenRequest) -> Result<LoginResponse, AppError> {
        req.validate()?;

        let claims = self.jwt_service.validate_refresh_token(&req.refresh_token)?;

        let mut tx = self.db.begin().await?;
        let user = UserRepository::find_by_id_for_update(&mut tx, claims.user_id)
            .await?
            .ok_or(AppError::Unauthorized)?;

        if !user.is_active {
            return Err(AppError::Unauthorized);
        }

        let presented = token_digest(&req.refresh_token);
        let stored_matches = user.refresh_token.as_deref() == Some(presented.as_str());
        let still_valid = user.refresh_expires_at.is_some_and(|exp| exp > Utc::now());
        if !stored_matches || !still_valid {
            warn!(user_id = %user.id, "Refresh token rejected: not the current session");
            return Err(AppError::Unauthorized);
        }

        let pair = self.jwt_service.issue_token_pair(&user)?;
        let user = UserRepository::store_session(&mut tx, user.id, &digests(&pair), false).await?;
        tx.commit().await?;

        info!(user_id = %user.id, "Session refreshed");
        Ok(self.login_response(pair, user))
    }

    /// 登出：清空会话字段
    ///
    /// 已签发的访问令牌在过期前仍然有效。
    #[instrument(skip(self))]
    pub async fn logout(&self, user_id: Uuid) -> Result<(), AppError> {
        let mut tx = self.db.begin().await?;
        let cleared = UserRepository::clear_session(&mut tx, user_id).await?;
        tx.commit().await?;

        if !cleared {
            return Err(AppError::not_found("user"));
        }

        info!(user_id = %user_id, "User logged out");
        Ok(())
    }

    fn login_response(&self, pair: TokenPair, user: User) -> LoginResponse {
        LoginResponse {
            access_token: pair.access_token,
            refresh_token: pair.refresh_token,
            token_type: "Bearer",
            expires_in: self.jwt_service.access_token_exp_secs(),
            refresh_expires_in: self.jwt_service.refresh_token_exp_secs(),
            user: UserResponse::from(user),
        }
    }
}

fn digests(pair: &TokenPair) -> SessionDigests {
    SessionDigests {
        token: token_digest(&pair.access_token),
        token_expires_at: pair.access_expires_at,
        refresh_token: token_digest(&pair.refresh_token),
        refresh_expires_at: pair.refresh_expires_at,
    }
}
