//! Permission repository (权限数据访问)

use super::{contains_pattern, non_empty, push_page};
use crate::{
    error::AppError,
    models::{pagination::PageQuery, role::*},
};
use sqlx::{PgConnection, Postgres, QueryBuilder};
use uuid::Uuid;

pub struct PermissionRepository;

impl PermissionRepository {
    /// 创建权限
    pub async fn insert(
        conn: &mut PgConnection,
        permission: &Permission,
    ) -> Result<Permission, AppError> {
        let permission = sqlx::query_as::<_, Permission>(
            r#"
            INSERT INTO permissions
                (id, name, display_name, description, resource, action, is_active, is_system)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(permission.id)
        .bind(&permission.name)
        .bind(&permission.display_name)
        .bind(&permission.description)
        .bind(&permission.resource)
        .bind(&permission.action)
        .bind(permission.is_active)
        .bind(permission.is_system)
        .fetch_one(&mut *conn)
        .await?;

        Ok(permission)
    }

    pub async fn find_by_id(
        conn: &mut PgConnection,
        id: Uuid,
    ) -> Result<Option<Permission>, AppError> {
        let permission = sqlx::query_as::<_, Permission>(
            "SELECT * FROM permissions WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

        Ok(permission)
    }

    /// 查找并锁定权限行，直到事务结束
    pub async fn find_by_id_for_update(
        conn: &mut PgConnection,
        id: Uuid,
    ) -> Result<Option<Permission>, AppError> {
        let permission = sqlx::query_as::<_, Permission>(
            "SELECT * FROM permissions WHERE id = $1 AND deleted_at IS NULL FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

        Ok(permission)
    }

    /// 写回权限的可变字段
    pub async fn update(
        conn: &mut PgConnection,
        permission: &Permission,
    ) -> Result<Permission, AppError> {
        let permission = sqlx::query_as::<_, Permission>(
            r#"
            UPDATE permissions
            SET
                name = $2,
                display_name = $3,
                description = $4,
                resource = $5,
                action = $6,
                is_active = $7,
                updated_at = NOW()
            WHERE id = $1 AND deleted_at IS NULL
            RETURNING *
            "#,
        )
        .bind(permission.id)
        .bind(&permission.name)
        .bind(&permission.display_name)
        .bind(&permission.description)
        .bind(&permission.resource)
        .bind(&permission.action)
        .bind(permission.is_active)
        .fetch_one(&mut *conn)
        .await?;

        Ok(permission)
    }

    /// 引用该权限的角色边数量
    pub async fn count_role_edges(conn: &mut PgConnection, id: Uuid) -> Result<i64, AppError> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM role_permissions WHERE permission_id = $1",
        )
        .bind(id)
        .fetch_one(&mut *conn)
        .await?;

        Ok(count)
    }

    /// 软删除权限
    pub async fn soft_delete(conn: &mut PgConnection, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query(
            "UPDATE permissions SET deleted_at = NOW(), updated_at = NOW() WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .execute(&mut *conn)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    fn push_filters(qb: &mut QueryBuilder<'_, Postgres>, filter: &ListPermissionRequest) {
        if let Some(name) = non_empty(&filter.name) {
            qb.push(" AND name = ").push_bind(name);
        }
        if let Some(display_name) = non_empty(&filter.display_name) {
            qb.push(" AND display_name ILIKE ")
                .push_bind(contains_pattern(&display_name));
        }
        if let Some(resource) = non_empty(&filter.resource) {
            qb.push(" AND resource = ").push_bind(resource);
        }
        if let Some(action) = non_empty(&filter.action) {
            qb.push(" AND action = ").push_bind(action);
        }
        if let Some(is_active) = filter.is_active {
            qb.push(" AND is_active = ").push_bind(is_active);
        }
        if let Some(is_system) = filter.is_system {
            qb.push(" AND is_system = ").push_bind(is_system);
        }
    }

    /// 列出权限（过滤 + 分页）
    pub async fn list(
        conn: &mut PgConnection,
        filter: &ListPermissionRequest,
        page: PageQuery,
    ) -> Result<(Vec<Permission>, i64), AppError> {
        let mut count =
            QueryBuilder::new("SELECT COUNT(*) FROM permissions WHERE deleted_at IS NULL");
        Self::push_filters(&mut count, filter);
        let total = count.build_query_scalar::<i64>().fetch_one(&mut *conn).await?;

        let mut query = QueryBuilder::new("SELECT * FROM permissions WHERE deleted_at IS NULL");
        Self::push_filters(&mut query, filter);
        push_page(&mut query, "resource, action", page);
        let permissions = query
            .build_query_as::<Permission>()
            .fetch_all(&mut *conn)
            .await?;

        Ok((permissions, total))
    }

    /// 有效用户是否通过任一有效角色持有 (resource, action) 权限
///
/// 停用或已删除的用户即使令牌未过期也没有任何权限。
    pub async fn user_has_permission(
        conn: &mut PgConnection,
        user_id: Uuid,
        resource: &str,
        action: &str,
    ) -> Result<bool, AppError> {
        let granted = sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS (
                SELECT 1
                FROM user_roles ur
                JOIN users u ON u.id = ur.user_id
                JOIN roles r ON r.id = ur.role_id
                JOIN role_permissions rp ON rp.role_id = r.id
                JOIN permissions p ON p.id = rp.permission_id
                WHERE ur.user_id = $1
                  AND u.is_active AND u.deleted_at IS NULL
                  AND r.is_active AND r.deleted_at IS NULL
                  AND p.is_active AND p.deleted_at IS NULL
                  AND p.resource = $2
                  AND p.action = $3
            )
            "#,
        )
        .bind(user_id)
        .bind(resource)
        .bind(action)
        .fetch_one(&mut *conn)
        .await?;

        Ok(granted)
    }
}
