//! 角色服务：角色 CRUD 以及角色→权限、角色→港口两类边的管理

use crate::{
    error::AppError,
    models::{
        pagination::{Page, PageMetadata, PageQuery},
        role::*,
    },
    repository::{ensure_all_live, RoleRepository},
};
use sqlx::{PgConnection, PgPool};
use tracing::{info, instrument};
use uuid::Uuid;
use validator::Validate;

pub struct RoleService {
    db: PgPool,
}

impl RoleService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// 创建角色
    #[instrument(skip(self, req), fields(name = %req.name))]
    pub async fn create(&self, req: CreateRoleRequest) -> Result<Role, AppError> {
        req.validate()?;

        let mut tx = self.db.begin().await?;
        let role = RoleRepository::insert(&mut tx, &req.into_role()).await?;
        tx.commit().await?;

        info!(role_id = %role.id, "Role created");
        Ok(role)
    }

    /// 更新角色（系统角色不可修改）
    #[instrument(skip(self, req))]
    pub async fn update(&self, id: Uuid, req: UpdateRoleRequest) -> Result<Role, AppError> {
        req.validate()?;

        let mut tx = self.db.begin().await?;
        let mut role = Self::lock_role(&mut tx, id).await?;
        role.ensure_mutable()?;

        req.apply(&mut role);
        let role = RoleRepository::update(&mut tx, &role).await?;
        tx.commit().await?;

        info!(role_id = %id, "Role updated");
        Ok(role)
    }

    /// 删除角色，并级联删除用户、权限、港口关联
    #[instrument(skip(self))]
    pub async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        let mut tx = self.db.begin().await?;
        let role = Self::lock_role(&mut tx, id).await?;
        role.ensure_mutable()?;

        RoleRepository::soft_delete(&mut tx, id).await?;
        tx.commit().await?;

        info!(role_id = %id, "Role deleted");
        Ok(())
    }

    /// 角色详情：权限列表与可见港口
    pub async fn get(&self, id: Uuid) -> Result<RoleDetail, AppError> {
        let mut conn = self.db.acquire().await?;
        let role = RoleRepository::find_by_id(&mut conn, id)
            .await?
            .ok_or_else(|| AppError::not_found("role"))?;

        let permissions = RoleRepository::permissions_of(&mut conn, id).await?;
        let harbor_ids = RoleRepository::harbor_ids_of(&mut conn, id).await?;

        Ok(RoleDetail {
            role,
            permissions,
            harbor_ids,
        })
    }

    pub async fn list(&self, filter: ListRoleRequest) -> Result<Page<Role>, AppError> {
        let page = PageQuery::new(filter.page, filter.size)?;

        let mut conn = self.db.acquire().await?;
        let (items, total) = RoleRepository::list(&mut conn, &filter, page).await?;

        Ok(Page {
            items,
            meta: PageMetadata::new(page, total),
        })
    }

    /// 分配权限：所有权限必须存在，否则整体失败；重复分配为空操作
    #[instrument(skip(self, req))]
    pub async fn assign_permissions(
        &self,
        id: Uuid,
        req: RolePermissionsRequest,
    ) -> Result<Vec<Permission>, AppError> {
        req.validate()?;
        let permission_ids = dedup_ids(&req.permission_ids);

        let mut tx = self.db.begin().await?;
        Self::lock_role(&mut tx, id).await?.ensure_mutable()?;

        ensure_all_live(&mut tx, "permissions", "permission", &permission_ids).await?;
        let added = RoleRepository::add_permissions(&mut tx, id, &permission_ids).await?;

        let permissions = RoleRepository::permissions_of(&mut tx, id).await?;
        tx.commit().await?;

        info!(role_id = %id, added, "Permissions assigned");
        Ok(permissions)
    }

    /// 移除权限：不存在的边静默忽略
    #[instrument(skip(self, req))]
    pub async fn remove_permissions(
        &self,
        id: Uuid,
        req: RolePermissionsRequest,
    ) -> Result<Vec<Permission>, AppError> {
        req.validate()?;

        let mut tx = self.db.begin().await?;
        Self::lock_role(&mut tx, id).await?.ensure_mutable()?;

        let removed = RoleRepository::remove_permissions(&mut tx, id, &req.permission_ids).await?;

        let permissions = RoleRepository::permissions_of(&mut tx, id).await?;
        tx.commit().await?;

        info!(role_id = %id, removed, "Permissions removed");
        Ok(permissions)
    }

    /// 授予港口可见范围（系统角色同样允许）
    #[instrument(skip(self, req))]
    pub async fn assign_harbors(
        &self,
        id: Uuid,
        req: RoleHarborsRequest,
    ) -> Result<Vec<Uuid>, AppError> {
        req.validate()?;
        let harbor_ids = dedup_ids(&req.harbor_ids);

        let mut tx = self.db.begin().await?;
        Self::lock_role(&mut tx, id).await?;

        ensure_all_live(&mut tx, "harbors", "harbor", &harbor_ids).await?;
        let added = RoleRepository::add_harbors(&mut tx, id, &harbor_ids).await?;

        let granted = RoleRepository::harbor_ids_of(&mut tx, id).await?;
        tx.commit().await?;

        info!(role_id = %id, added, "Harbors granted");
        Ok(granted)
    }

    /// 撤销港口可见范围
    #[instrument(skip(self, req))]
    pub async fn remove_harbors(
        &self,
        id: Uuid,
        req: RoleHarborsRequest,
    ) -> Result<Vec<Uuid>, AppError> {
        req.validate()?;

        let mut tx = self.db.begin().await?;
        Self::lock_role(&mut tx, id).await?;

        let removed = RoleRepository::remove_harbors(&mut tx, id, &req.harbor_ids).await?;

        let granted = RoleRepository::harbor_ids_of(&mut tx, id).await?;
        tx.commit().await?;

        info!(role_id = %id, removed, "Harbors revoked");
        Ok(granted)
    }

    async fn lock_role(conn: &mut PgConnection, id: Uuid) -> Result<Role, AppError> {
        RoleRepository::find_by_id_for_update(conn, id)
            .await?
            .ok_or_else(|| AppError::not_found("role"))
    }
}
