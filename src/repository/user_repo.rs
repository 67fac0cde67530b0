//! User repository (用户数据访问)

use crate::{error::AppError, models::user::User};
use chrono::{DateTime, Utc};
use sqlx::PgConnection;
use uuid::Uuid;

/// 登录或刷新时写入的会话摘要
#[derive(Debug, Clone)]
pub struct SessionDigests {
    pub token: String,
    pub token_expires_at: DateTime<Utc>,
    pub refresh_token: String,
    pub refresh_expires_at: DateTime<Utc>,
}

pub struct UserRepository;

impl UserRepository {
    /// 创建用户
    pub async fn insert(conn: &mut PgConnection, user: &User) -> Result<User, AppError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users
                (id, username, email, password_hash, first_name, last_name, phone,
                 is_active, is_verified)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING *
            "#,
        )
        .bind(user.id)
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.phone)
        .bind(user.is_active)
        .bind(user.is_verified)
        .fetch_one(&mut *conn)
        .await?;

        Ok(user)
    }

    /// 根据 ID 查找用户
    pub async fn find_by_id(conn: &mut PgConnection, id: Uuid) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(
            "SELECT * FROM users WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

        Ok(user)
    }

    /// 查找并锁定用户行
    pub async fn find_by_id_for_update(
        conn: &mut PgConnection,
        id: Uuid,
    ) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(
            "SELECT * FROM users WHERE id = $1 AND deleted_at IS NULL FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

        Ok(user)
    }

    /// 根据用户名查找用户
    pub async fn find_by_username(
        conn: &mut PgConnection,
        username: &str,
    ) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(
            "SELECT * FROM users WHERE username = $1 AND deleted_at IS NULL",
        )
        .bind(username)
        .fetch_optional(&mut *conn)
        .await?;

        Ok(user)
    }

    /// 写回资料与密码字段
    pub async fn update_profile(conn: &mut PgConnection, user: &User) -> Result<User, AppError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET
                first_name = $2,
                last_name = $3,
                phone = $4,
                avatar = $5,
                password_hash = $6,
                password_changed_at = $7,
                updated_at = NOW()
            WHERE id = $1 AND deleted_at IS NULL
            RETURNING *
            "#,
        )
        .bind(user.id)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.phone)
        .bind(&user.avatar)
        .bind(&user.password_hash)
        .bind(user.password_changed_at)
        .fetch_one(&mut *conn)
        .await?;

        Ok(user)
    }

    /// 保存会话令牌摘要
    pub async fn store_session(
        conn: &mut PgConnection,
        id: Uuid,
        session: &SessionDigests,
        mark_login: bool,
    ) -> Result<User, AppError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET
                token = $2,
                token_expires_at = $3,
                refresh_token = $4,
                refresh_expires_at = $5,
                last_login_at = CASE WHEN $6 THEN NOW() ELSE last_login_at END,
                updated_at = NOW()
            WHERE id = $1 AND deleted_at IS NULL
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&session.token)
        .bind(session.token_expires_at)
        .bind(&session.refresh_token)
        .bind(session.refresh_expires_at)
        .bind(mark_login)
        .fetch_one(&mut *conn)
        .await?;

        Ok(user)
    }

    /// 清空四个会话字段（软登出）
    pub async fn clear_session(conn: &mut PgConnection, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET
                token = NULL,
                token_expires_at = NULL,
                refresh_token = NULL,
                refresh_expires_at = NULL,
                updated_at = NOW()
            WHERE id = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(id)
        .execute(&mut *conn)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
