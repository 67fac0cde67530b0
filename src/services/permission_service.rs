//! 权限服务：权限 CRUD 与权限检查

use crate::{
    error::AppError,
    models::{
        pagination::{Page, PageMetadata, PageQuery},
        role::*,
    },
    repository::PermissionRepository,
};
use sqlx::PgPool;
use tracing::{info, instrument, warn};
use uuid::Uuid;
use validator::Validate;

pub struct PermissionService {
    db: PgPool,
}

impl PermissionService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// 检查用户是否通过任一有效角色拥有权限
    pub async fn check_permission(
        &self,
        user_id: Uuid,
        resource: &str,
        action: &str,
    ) -> Result<bool, AppError> {
        let mut conn = self.db.acquire().await?;
        PermissionRepository::user_has_permission(&mut conn, user_id, resource, action).await
    }

    /// 检查权限，如果无权限则返回 Forbidden
    pub async fn require_permission(
        &self,
        user_id: Uuid,
        resource: &str,
        action: &str,
    ) -> Result<(), AppError> {
        if !self.check_permission(user_id, resource, action).await? {
            warn!(
                user_id = %user_id,
                resource = %resource,
                action = %action,
                "Permission denied"
            );
            return Err(AppError::Forbidden);
        }

        Ok(())
    }

    /// 创建权限；名称冲突由唯一索引裁决
    #[instrument(skip(self, req), fields(name = %req.name))]
    pub async fn create(&self, req: CreatePermissionRequest) -> Result<Permission, AppError> {
        req.validate()?;

        let mut tx = self.db.begin().await?;
        let permission = PermissionRepository::insert(&mut tx, &req.into_permission()).await?;
        tx.commit().await?;

        info!(permission_id = %permission.id, "Permission created");
        Ok(permission)
    }

    /// 更新权限（系统权限不可修改）
    #[instrument(skip(self, req))]
    pub async fn update(
        &self,
        id: Uuid,
        req: UpdatePermissionRequest,
    ) -> Result<Permission, AppError> {
        req.validate()?;

        let mut tx = self.db.begin().await?;
        let mut permission = PermissionRepository::find_by_id_for_update(&mut tx, id)
            .await?
            .ok_or_else(|| AppError::not_found("permission"))?;
        permission.ensure_mutable()?;

        req.apply(&mut permission);
        let permission = PermissionRepository::update(&mut tx, &permission).await?;
        tx.commit().await?;

        info!(permission_id = %id, "Permission updated");
        Ok(permission)
    }

    /// 删除权限
    ///
    /// 行锁先于引用计数获取；并发的分配操作持有 `FOR SHARE`，
    /// 两者互斥，检查与删除之间不会混入新边。
    #[instrument(skip(self))]
    pub async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        let mut tx = self.db.begin().await?;
        let permission = PermissionRepository::find_by_id_for_update(&mut tx, id)
            .await?
            .ok_or_else(|| AppError::not_found("permission"))?;
        permission.ensure_mutable()?;

        let edges = PermissionRepository::count_role_edges(&mut tx, id).await?;
        if edges > 0 {
            return Err(AppError::Conflict(format!(
                "permission is still assigned to {} role(s)",
                edges
            )));
        }

        PermissionRepository::soft_delete(&mut tx, id).await?;
        tx.commit().await?;

        info!(permission_id = %id, "Permission deleted");
        Ok(())
    }

    pub async fn get(&self, id: Uuid) -> Result<Permission, AppError> {
        let mut conn = self.db.acquire().await?;
        PermissionRepository::find_by_id(&mut conn, id)
            .await?
            .ok_or_else(|| AppError::not_found("permission"))
    }

    pub async fn list(&self, filter: ListPermissionRequest) -> Result<Page<Permission>, AppError> {
        let page = PageQuery::new(filter.page, filter.size)?;

        let mut conn = self.db.acquire().await?;
        let (items, total) = PermissionRepository::list(&mut conn, &filter, page).await?;

        Ok(Page {
            items,
            meta: PageMetadata::new(page, total),
        })
    }
}
