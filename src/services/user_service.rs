//! 用户服务：个人资料与用户↔角色关联

use crate::{
    auth::PasswordHasher,
    config::SecurityConfig,
    error::AppError,
    models::{
        role::{dedup_ids, Role},
        user::*,
    },
    repository::{ensure_all_live, RoleRepository, UserRepository},
    services::events::{emit, UserEvent, UserEventKind, UserEventPublisher},
};
use chrono::Utc;
use sqlx::PgPool;
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;
use validator::Validate;

pub struct UserService {
    db: PgPool,
    hasher: PasswordHasher,
    security: SecurityConfig,
    publisher: Arc<dyn UserEventPublisher>,
}

impl UserService {
    pub fn new(
        db: PgPool,
        hasher: PasswordHasher,
        security: SecurityConfig,
        publisher: Arc<dyn UserEventPublisher>,
    ) -> Self {
        Self {
            db,
            hasher,
            security,
            publisher,
        }
    }

    /// 当前用户及其角色
    pub async fn current(&self, user_id: Uuid) -> Result<UserWithRoles, AppError> {
        let mut conn = self.db.acquire().await?;
        let user = UserRepository::find_by_id(&mut conn, user_id)
            .await?
            .ok_or_else(|| AppError::not_found("user"))?;
        let roles = RoleRepository::roles_of_user(&mut conn, user_id).await?;

        Ok(UserWithRoles {
            user: UserResponse::from(user),
            roles,
        })
    }

    /// 部分更新当前用户；密码非空时重新哈希
    #[instrument(skip(self, req))]
    pub async fn update_current(
        &self,
        user_id: Uuid,
        req: UpdateUserRequest,
    ) -> Result<UserResponse, AppError> {
        req.validate()?;

        let new_hash = match req.new_password() {
            Some(password) => {
                PasswordHasher::validate_password_policy(password, &self.security)?;
                Some(self.hasher.hash_blocking(password.to_string()).await?)
            }
            None => None,
        };

        let mut tx = self.db.begin().await?;
        let mut user = UserRepository::find_by_id_for_update(&mut tx, user_id)
            .await?
            .ok_or_else(|| AppError::not_found("user"))?;

        req.apply(&mut user);
        if let Some(hash) = new_hash {
            user.password_hash = hash;
            user.password_changed_at = Some(Utc::now());
        }

        let user = UserRepository::update_profile(&mut tx, &user).await?;
        tx.commit().await?;

        info!(user_id = %user_id, "User updated");
        emit(
            self.publisher.clone(),
            UserEvent::new(UserEventKind::Updated, &user),
        );

        Ok(UserResponse::from(user))
    }

    /// 为用户分配角色：所有角色必须存在，否则整体失败
    #[instrument(skip(self, req))]
    pub async fn assign_roles(
        &self,
        user_id: Uuid,
        req: UserRolesRequest,
    ) -> Result<Vec<Role>, AppError> {
        req.validate()?;
        let role_ids = dedup_ids(&req.role_ids);

        let mut tx = self.db.begin().await?;
        UserRepository::find_by_id_for_update(&mut tx, user_id)
            .await?
            .ok_or_else(|| AppError::not_found("user"))?;

        ensure_all_live(&mut tx, "roles", "role", &role_ids).await?;
        let added = RoleRepository::add_user_roles(&mut tx, user_id, &role_ids).await?;

        let roles = RoleRepository::roles_of_user(&mut tx, user_id).await?;
        tx.commit().await?;

        info!(user_id = %user_id, added, "Roles assigned");
        Ok(roles)
    }

    /// 移除用户角色；不存在的边静默忽略
    #[instrument(skip(self, req))]
    pub async fn remove_roles(
        &self,
        user_id: Uuid,
        req: UserRolesRequest,
    ) -> Result<Vec<Role>, AppError> {
        req.validate()?;

        let mut tx = self.db.begin().await?;
        UserRepository::find_by_id_for_update(&mut tx, user_id)
            .await?
            .ok_or_else(|| AppError::not_found("user"))?;

        let removed = RoleRepository::remove_user_roles(&mut tx, user_id, &req.role_ids).await?;

        let roles = RoleRepository::roles_of_user(&mut tx, user_id).await?;
        tx.commit().await?;

        info!(user_id = %user_id, removed, "Roles removed");
        Ok(roles)
    }

    /// 按名称授予角色（命令行引导首个管理员）
    #[instrument(skip(self))]
    pub async fn grant_role_by_name(&self, username: &str, role_name: &str) -> Result<(), AppError> {
        let mut tx = self.db.begin().await?;
        let user = UserRepository::find_by_username(&mut tx, username)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("user {}", username)))?;
        let role = RoleRepository::find_by_name(&mut tx, role_name)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("role {}", role_name)))?;

        RoleRepository::add_user_roles(&mut tx, user.id, &[role.id]).await?;
        tx.commit().await?;

        info!(user_id = %user.id, role_id = %role.id, "Role granted");
        Ok(())
    }
}
