//! Role repository (角色数据访问)

use super::{contains_pattern, non_empty, push_page};
use crate::{
    error::AppError,
    models::{pagination::PageQuery, role::*},
};
use sqlx::{PgConnection, Postgres, QueryBuilder};
use uuid::Uuid;

pub struct RoleRepository;

impl RoleRepository {
    // ==================== Roles ====================

    /// 创建角色
    pub async fn insert(conn: &mut PgConnection, role: &Role) -> Result<Role, AppError> {
        let role = sqlx::query_as::<_, Role>(
            r#"
            INSERT INTO roles (id, name, display_name, description, is_active, is_system)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(role.id)
        .bind(&role.name)
        .bind(&role.display_name)
        .bind(&role.description)
        .bind(role.is_active)
        .bind(role.is_system)
        .fetch_one(&mut *conn)
        .await?;

        Ok(role)
    }

    /// 根据 ID 查找角色
    pub async fn find_by_id(conn: &mut PgConnection, id: Uuid) -> Result<Option<Role>, AppError> {
        let role = sqlx::query_as::<_, Role>(
            "SELECT * FROM roles WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

        Ok(role)
    }

    /// 根据 ID 查找并锁定角色（事务内使用）
    pub async fn find_by_id_for_update(
        conn: &mut PgConnection,
        id: Uuid,
    ) -> Result<Option<Role>, AppError> {
        let role = sqlx::query_as::<_, Role>(
            "SELECT * FROM roles WHERE id = $1 AND deleted_at IS NULL FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

        Ok(role)
    }

    /// 根据名称查找角色
    pub async fn find_by_name(
        conn: &mut PgConnection,
        name: &str,
    ) -> Result<Option<Role>, AppError> {
        let role = sqlx::query_as::<_, Role>(
            "SELECT * FROM roles WHERE name = $1 AND deleted_at IS NULL",
        )
        .bind(name)
        .fetch_optional(&mut *conn)
        .await?;

        Ok(role)
    }

    /// 写回角色的可变字段
    pub async fn update(conn: &mut PgConnection, role: &Role) -> Result<Role, AppError> {
        let role = sqlx::query_as::<_, Role>(
            r#"
            UPDATE roles
            SET
                name = $2,
                display_name = $3,
                description = $4,
                is_active = $5,
                updated_at = NOW()
            WHERE id = $1 AND deleted_at IS NULL
            RETURNING *
            "#,
        )
        .bind(role.id)
        .bind(&role.name)
        .bind(&role.display_name)
        .bind(&role.description)
        .bind(role.is_active)
        .fetch_one(&mut *conn)
        .await?;

        Ok(role)
    }

    /// 软删除角色，并在同一事务内级联删除所有关联边
    pub async fn soft_delete(conn: &mut PgConnection, id: Uuid) -> Result<bool, AppError> {
        for sql in [
            "DELETE FROM user_roles WHERE role_id = $1",
            "DELETE FROM role_permissions WHERE role_id = $1",
            "DELETE FROM role_harbors WHERE role_id = $1",
        ] {
            sqlx::query(sql).bind(id).execute(&mut *conn).await?;
        }

        let result = sqlx::query(
            "UPDATE roles SET deleted_at = NOW(), updated_at = NOW() WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .execute(&mut *conn)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    fn push_filters(qb: &mut QueryBuilder<'_, Postgres>, filter: &ListRoleRequest) {
        if let Some(name) = non_empty(&filter.name) {
            qb.push(" AND name = ").push_bind(name);
        }
        if let Some(display_name) = non_empty(&filter.display_name) {
            qb.push(" AND display_name ILIKE ")
                .push_bind(contains_pattern(&display_name));
        }
        if let Some(is_active) = filter.is_active {
            qb.push(" AND is_active = ").push_bind(is_active);
        }
        if let Some(is_system) = filter.is_system {
            qb.push(" AND is_system = ").push_bind(is_system);
        }
    }

    /// 列出角色（过滤 + 分页），返回当前页与总数
    pub async fn list(
        conn: &mut PgConnection,
        filter: &ListRoleRequest,
        page: PageQuery,
    ) -> Result<(Vec<Role>, i64), AppError> {
        let mut count = QueryBuilder::new("SELECT COUNT(*) FROM roles WHERE deleted_at IS NULL");
        Self::push_filters(&mut count, filter);
        let total: i64 = count.build_query_scalar::<i64>().fetch_one(&mut *conn).await?;

        let mut query = QueryBuilder::new("SELECT * FROM roles WHERE deleted_at IS NULL");
        Self::push_filters(&mut query, filter);
        push_page(&mut query, "name", page);
        let roles = query.build_query_as::<Role>().fetch_all(&mut *conn).await?;

        Ok((roles, total))
    }

    // ==================== Role ↔ Permission ====================

    /// 获取角色的所有权限
    pub async fn permissions_of(
        conn: &mut PgConnection,
        role_id: Uuid,
    ) -> Result<Vec<Permission>, AppError> {
        let permissions = sqlx::query_as::<_, Permission>(
            r#"
            SELECT p.*
            FROM permissions p
            JOIN role_permissions rp ON p.id = rp.permission_id
            WHERE rp.role_id = $1 AND p.deleted_at IS NULL
            ORDER BY p.resource, p.action
            "#,
        )
        .bind(role_id)
        .fetch_all(&mut *conn)
        .await?;

        Ok(permissions)
    }

    /// 添加角色权限（幂等）
    pub async fn add_permissions(
        conn: &mut PgConnection,
        role_id: Uuid,
        permission_ids: &[Uuid],
    ) -> Result<u64, AppError> {
        let result = sqlx::query(
            r#"
            INSERT INTO role_permissions (role_id, permission_id)
            SELECT $1, UNNEST($2::uuid[])
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(role_id)
        .bind(permission_ids)
        .execute(&mut *conn)
        .await?;

        Ok(result.rows_affected())
    }

    /// 移除角色权限（不存在的边静默忽略）
    pub async fn remove_permissions(
        conn: &mut PgConnection,
        role_id: Uuid,
        permission_ids: &[Uuid],
    ) -> Result<u64, AppError> {
        let result = sqlx::query(
            "DELETE FROM role_permissions WHERE role_id = $1 AND permission_id = ANY($2)",
        )
        .bind(role_id)
        .bind(permission_ids)
        .execute(&mut *conn)
        .await?;

        Ok(result.rows_affected())
    }

    // ==================== Role ↔ Harbor ====================

    /// 获取角色可见的港口 ID
    pub async fn harbor_ids_of(
        conn: &mut PgConnection,
        role_id: Uuid,
    ) -> Result<Vec<Uuid>, AppError> {
        let ids = sqlx::query_scalar::<_, Uuid>(
            r#"
            SELECT rh.harbor_id
            FROM role_harbors rh
            JOIN harbors h ON h.id = rh.harbor_id
            WHERE rh.role_id = $1 AND h.deleted_at IS NULL
            ORDER BY rh.created_at
            "#,
        )
        .bind(role_id)
        .fetch_all(&mut *conn)
        .await?;

        Ok(ids)
    }

    /// 授予角色港口可见范围（幂等）
    pub async fn add_harbors(
        conn: &mut PgConnection,
        role_id: Uuid,
        harbor_ids: &[Uuid],
    ) -> Result<u64, AppError> {
        let result = sqlx::query(
            r#"
            INSERT INTO role_harbors (role_id, harbor_id)
            SELECT $1, UNNEST($2::uuid[])
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(role_id)
        .bind(harbor_ids)
        .execute(&mut *conn)
        .await?;

        Ok(result.rows_affected())
    }

    /// 撤销角色港口可见范围
    pub async fn remove_harbors(
        conn: &mut PgConnection,
        role_id: Uuid,
        harbor_ids: &[Uuid],
    ) -> Result<u64, AppError> {
        let result =
            sqlx::query("DELETE FROM role_harbors WHERE role_id = $1 AND harbor_id = ANY($2)")
                .bind(role_id)
                .bind(harbor_ids)
                .execute(&mut *conn)
                .await?;

        Ok(result.rows_affected())
    }

    // ==================== User ↔ Role ====================

    /// 获取用户的所有角色
    pub async fn roles_of_user(
        conn: &mut PgConnection,
        user_id: Uuid,
    ) -> Result<Vec<Role>, AppError> {
        let roles = sqlx::query_as::<_, Role>(
            r#"
            SELECT r.*
            FROM roles r
            JOIN user_roles ur ON r.id = ur.role_id
            WHERE ur.user_id = $1 AND r.deleted_at IS NULL
            ORDER BY r.name
            "#,
        )
        .bind(user_id)
        .fetch_all(&mut *conn)
        .await?;

        Ok(roles)
    }

    /// 用户持有的有效角色数量
    pub async fn count_active_roles_of_user(
        conn: &mut PgConnection,
        user_id: Uuid,
    ) -> Result<i64, AppError> {
        let count = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*)
            FROM user_roles ur
            JOIN roles r ON r.id = ur.role_id
            WHERE ur.user_id = $1 AND r.is_active AND r.deleted_at IS NULL
            "#,
        )
        .bind(user_id)
        .fetch_one(&mut *conn)
        .await?;

        Ok(count)
    }

    /// 为用户分配角色（幂等）
    pub async fn add_user_roles(
        conn: &mut PgConnection,
        user_id: Uuid,
        role_ids: &[Uuid],
    ) -> Result<u64, AppError> {
        let result = sqlx::query(
            r#"
            INSERT INTO user_roles (user_id, role_id)
            SELECT $1, UNNEST($2::uuid[])
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(user_id)
        .bind(role_ids)
        .execute(&mut *conn)
        .await?;

        Ok(result.rows_affected())
    }

    /// 移除用户角色
    pub async fn remove_user_roles(
        conn: &mut PgConnection,
        user_id: Uuid,
        role_ids: &[Uuid],
    ) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM user_roles WHERE user_id = $1 AND role_id = ANY($2)")
            .bind(user_id)
            .bind(role_ids)
            .execute(&mut *conn)
            .await?;

        Ok(result.rows_affected())
    }
}
